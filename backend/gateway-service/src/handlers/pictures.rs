/// Picture handlers - upload and catalog endpoints
use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, CONTENT_DISPOSITION};
use actix_web::{web, HttpResponse};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use blob_store::{get_optional, ObjectStore};
use picture_schema::{buckets, Picture, PictureUpdate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::services::{CatalogService, IngestService};

/// Multipart field carrying the picture
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub key: u64,
    pub ext: String,
    pub bytes_count: i64,
    pub object_key: String,
}

impl From<Picture> for UploadResponse {
    fn from(picture: Picture) -> Self {
        Self {
            object_key: picture.object_key(),
            key: picture.key,
            ext: picture.ext,
            bytes_count: picture.bytes_count,
        }
    }
}

/// User-mutable fields accepted by `PATCH /pictures/{id}`
#[derive(Debug, Default, Deserialize)]
pub struct PictureChanges {
    pub favourite: Option<bool>,
    pub content_warning: Option<bool>,
    pub description: Option<String>,
}

fn parse_picture_id(raw: &str) -> Result<u64> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid picture ID: {raw}")))
}

/// Upload a picture (multipart field `file`)
pub async fn upload_picture(
    ingest: web::Data<IngestService>,
    limits: web::Data<AppConfig>,
    mut payload: Multipart,
) -> Result<HttpResponse> {
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = payload.next().await {
        let mut field = field.map_err(|e| AppError::BadRequest(format!("Multipart error: {}", e)))?;

        let disposition = field
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| ContentDisposition::from_raw(value).ok());
        let is_file = disposition
            .as_ref()
            .and_then(|cd| cd.get_name())
            .map_or(false, |name| name == FILE_FIELD);
        let file_name = disposition
            .as_ref()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        let mut data = BytesMut::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::BadRequest(format!("Multipart error: {}", e)))?;
            if is_file {
                if data.len() + chunk.len() > limits.max_upload_bytes {
                    return Err(AppError::PayloadTooLarge {
                        limit: limits.max_upload_bytes,
                    });
                }
                data.extend_from_slice(&chunk);
            }
        }

        if is_file && upload.is_none() {
            let file_name = file_name
                .ok_or_else(|| AppError::BadRequest("File name is required".to_string()))?;
            upload = Some((file_name, data.freeze()));
        }
    }

    let (file_name, data) =
        upload.ok_or_else(|| AppError::BadRequest(format!("Missing `{FILE_FIELD}` field")))?;
    debug!(file_name = %file_name, bytes = data.len(), "Upload received");

    let picture = ingest.ingest(data, &file_name).await?;
    Ok(HttpResponse::Ok().json(UploadResponse::from(picture)))
}

/// List every picture in insertion order
pub async fn list_pictures(catalog: web::Data<CatalogService>) -> Result<HttpResponse> {
    let pictures = catalog.list_pictures().await?;
    Ok(HttpResponse::Ok().json(pictures))
}

pub async fn get_picture(
    catalog: web::Data<CatalogService>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let id = parse_picture_id(&id)?;
    let picture = catalog.get_picture(id).await?;
    Ok(HttpResponse::Ok().json(picture))
}

/// Bucket holding the requested size; `full` is an alias for the original
fn rendition_bucket(size: &str) -> Result<&'static str> {
    match size {
        "original" | "full" => Ok(buckets::ORIGINAL),
        "half" => Ok(buckets::HALF),
        "thumb" => Ok(buckets::THUMB),
        other => Err(AppError::BadRequest(format!(
            "unknown size '{other}', expected original, half or thumb"
        ))),
    }
}

fn content_type(ext: &str) -> &'static str {
    match ext {
        "jpg" => "image/jpeg",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

/// Serve the stored bytes of one rendition
pub async fn get_rendition(
    catalog: web::Data<CatalogService>,
    store: web::Data<dyn ObjectStore>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (id, size) = path.into_inner();
    let id = parse_picture_id(&id)?;
    let bucket = rendition_bucket(&size)?;

    let picture = catalog.get_picture(id).await?;
    let object_key = format!("{}.{}", picture.id, picture.ext);
    let data = get_optional(store.get_ref(), bucket, &object_key)
        .await?
        .ok_or(AppError::PictureNotFound(id))?;

    debug!(bucket = %bucket, object_key = %object_key, bytes = data.len(), "Serving rendition");
    Ok(HttpResponse::Ok()
        .content_type(content_type(&picture.ext))
        .body(data))
}

/// Amend favourite / content warning / description
pub async fn update_picture(
    catalog: web::Data<CatalogService>,
    id: web::Path<String>,
    changes: web::Json<PictureChanges>,
) -> Result<HttpResponse> {
    let id = parse_picture_id(&id)?;
    let changes = changes.into_inner();
    let update = PictureUpdate {
        id,
        favourite: changes.favourite,
        content_warning: changes.content_warning,
        description: changes.description,
    };

    let picture = catalog.update_picture(&update).await?;
    Ok(HttpResponse::Ok().json(picture))
}
