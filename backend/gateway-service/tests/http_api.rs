//! HTTP surface of the gateway, backed by the in-process pipeline

mod common;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use common::{png, Pipeline};
use error_types::ErrorResponse;
use gateway_service::config::AppConfig;
use gateway_service::configure;
use gateway_service::handlers::pictures::UploadResponse;
use picture_schema::{buckets, Album, PictureMetadata};
use serde_json::json;

const BOUNDARY: &str = "picture-test-boundary";

fn multipart_body(field: &str, file_name: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(field: &str, file_name: &str, data: &[u8]) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/v1/pictures")
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(multipart_body(field, file_name, data))
}

macro_rules! gateway {
    ($pipeline:expr) => {
        gateway!($pipeline, AppConfig::default())
    };
    ($pipeline:expr, $limits:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pipeline.ingest()))
                .app_data(web::Data::new($pipeline.catalog()))
                .app_data(web::Data::new($limits))
                .app_data(web::Data::<dyn blob_store::ObjectStore>::from($pipeline.objects()))
                .configure(configure),
        )
        .await
    };
}

#[actix_web::test]
async fn test_health() {
    let pipeline = Pipeline::start().await;
    let app = gateway!(pipeline);

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"status": "ok"}));
}

#[actix_web::test]
async fn test_upload_then_read_and_amend() {
    let pipeline = Pipeline::start().await;
    let app = gateway!(pipeline);
    let data = png(120, 80);

    let resp = test::call_service(&app, upload_request("file", "park.png", &data).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let uploaded: UploadResponse = test::read_body_json(resp).await;
    assert_eq!(uploaded.ext, "png");
    assert_eq!(uploaded.bytes_count, data.len() as i64);
    assert_eq!(uploaded.object_key, format!("{}.png", uploaded.key));

    let resp = test::call_service(&app, upload_request("file", "park.png", &data).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.code, "PICTURE_ALREADY_EXISTS");
    assert_eq!(body.error_type, "conflict_error");

    let req = test::TestRequest::get().uri("/api/v1/pictures").to_request();
    let all: Vec<PictureMetadata> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, uploaded.key);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/pictures/{}", uploaded.key))
        .set_json(json!({"favourite": true, "description": "park bench"}))
        .to_request();
    let amended: PictureMetadata = test::call_and_read_body_json(&app, req).await;
    assert!(amended.favourite);
    assert_eq!(amended.description, "park bench");
    assert!(!amended.content_warning);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/pictures/{}", uploaded.key))
        .to_request();
    let fetched: PictureMetadata = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched, amended);
    assert_eq!((fetched.width, fetched.height), (120, 80));
}

#[actix_web::test]
async fn test_serves_rendition_bytes() {
    let pipeline = Pipeline::start().await;
    let app = gateway!(pipeline);
    let data = png(120, 80);

    let resp = test::call_service(&app, upload_request("file", "park.png", &data).to_request()).await;
    let uploaded: UploadResponse = test::read_body_json(resp).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/pictures/{}/full", uploaded.key))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    assert_eq!(test::read_body(resp).await.as_ref(), data.as_slice());

    for (size, bucket) in [("half", buckets::HALF), ("thumb", buckets::THUMB)] {
        let stored = blob_store::ObjectStore::get(&*pipeline.store, bucket, &uploaded.object_key)
            .await
            .unwrap();
        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/pictures/{}/{size}", uploaded.key))
            .to_request();
        assert_eq!(test::call_and_read_body(&app, req).await, stored);
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/pictures/{}/huge", uploaded.key))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get().uri("/api/v1/pictures/12345/thumb").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.code, "PICTURE_NOT_FOUND");
}

#[actix_web::test]
async fn test_read_errors() {
    let pipeline = Pipeline::start().await;
    let app = gateway!(pipeline);

    let req = test::TestRequest::get().uri("/api/v1/pictures/12345").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.code, "PICTURE_NOT_FOUND");

    let req = test::TestRequest::get().uri("/api/v1/pictures/not-a-number").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::patch()
        .uri("/api/v1/pictures/12345")
        .set_json(json!({"favourite": true}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_upload_rejections() {
    let pipeline = Pipeline::start().await;
    let app = gateway!(
        pipeline,
        AppConfig {
            max_upload_bytes: 64,
            ..AppConfig::default()
        }
    );

    let resp = test::call_service(&app, upload_request("file", "notes", b"abc").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.code, "UNSUPPORTED_FORMAT");

    let resp = test::call_service(&app, upload_request("image", "a.png", b"abc").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.code, "INVALID_REQUEST");

    let resp = test::call_service(&app, upload_request("file", "a.png", &[0u8; 65]).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.code, "UPLOAD_TOO_LARGE");

    assert!(pipeline.store.keys(buckets::ORIGINAL).is_empty());
}

#[actix_web::test]
async fn test_stage_failure_is_500() {
    let pipeline = Pipeline::start().await;
    let app = gateway!(pipeline);
    pipeline.store.fail_puts_to(buckets::HALF);

    let resp = test::call_service(&app, upload_request("file", "a.png", &png(30, 20)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error_type, "upstream_error");
    assert_eq!(body.code, "UPSTREAM_FAILURE");
    assert_eq!(body.details.as_deref(), Some("stage: resize"));

    let req = test::TestRequest::get().uri("/api/v1/pictures").to_request();
    let all: Vec<PictureMetadata> = test::call_and_read_body_json(&app, req).await;
    assert!(all.is_empty());
}

#[actix_web::test]
async fn test_album_endpoints() {
    let pipeline = Pipeline::start().await;
    let app = gateway!(pipeline);

    let req = test::TestRequest::post()
        .uri("/api/v1/albums")
        .set_json(json!({"title": "Holidays"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let album: Album = test::read_body_json(resp).await;
    assert_eq!(album.title, "Holidays");
    assert!(album.description.is_empty());

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/albums/{}/pictures", album.id))
        .set_json(json!({"pictures": [7, 3, 7]}))
        .to_request();
    let updated: Album = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated.pictures, vec![7, 3]);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/albums/{}", album.id))
        .to_request();
    let fetched: Album = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched, updated);

    let req = test::TestRequest::get().uri("/api/v1/albums").to_request();
    let all: Vec<Album> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(all, vec![updated]);

    let req = test::TestRequest::get()
        .uri("/api/v1/albums/6f1c1c3e-9d4e-4b7a-9a51-0c2f3b7d2e10")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.code, "ALBUM_NOT_FOUND");

    let req = test::TestRequest::get().uri("/api/v1/albums/nope").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
