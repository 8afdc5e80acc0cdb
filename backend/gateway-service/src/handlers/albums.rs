/// Album handlers
use actix_web::{web, HttpResponse};
use picture_schema::{AlbumPictures, NewAlbum};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::services::CatalogService;

#[derive(Debug, Deserialize)]
pub struct AddPicturesRequest {
    pub pictures: Vec<u64>,
}

fn parse_album_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid album ID".to_string()))
}

pub async fn list_albums(catalog: web::Data<CatalogService>) -> Result<HttpResponse> {
    let albums = catalog.list_albums().await?;
    Ok(HttpResponse::Ok().json(albums))
}

pub async fn create_album(
    catalog: web::Data<CatalogService>,
    req: web::Json<NewAlbum>,
) -> Result<HttpResponse> {
    let album = catalog.create_album(&req).await?;
    Ok(HttpResponse::Created().json(album))
}

pub async fn get_album(
    catalog: web::Data<CatalogService>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let album = catalog.get_album(parse_album_id(&id)?).await?;
    Ok(HttpResponse::Ok().json(album))
}

/// Append pictures to an album, skipping ones already in it
pub async fn add_album_pictures(
    catalog: web::Data<CatalogService>,
    id: web::Path<String>,
    req: web::Json<AddPicturesRequest>,
) -> Result<HttpResponse> {
    let request = AlbumPictures {
        id: parse_album_id(&id)?,
        pictures: req.into_inner().pictures,
    };
    let album = catalog.add_album_pictures(&request).await?;
    Ok(HttpResponse::Ok().json(album))
}
