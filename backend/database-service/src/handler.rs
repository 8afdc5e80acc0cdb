//! Bus handler for every `picture.*` and `album.*` subject

use crate::albums::AlbumStore;
use crate::error::{AppError, Result};
use crate::pictures::{InsertOutcome, MetadataStore};
use async_trait::async_trait;
use bytes::Bytes;
use message_bus::{DataResponse, RequestHandler, ServiceResponse};
use picture_schema::{
    groups, subjects, AlbumId, AlbumPictures, NewAlbum, PictureId, PictureMetadata, PictureUpdate,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Subjects served by the database role and the queue group of each
pub const ROUTES: [(&str, &str); 8] = [
    (subjects::STORE, groups::DATABASE_STORE),
    (subjects::GET_ALL, groups::DATABASE_GET),
    (subjects::GET, groups::DATABASE_GET),
    (subjects::UPDATE, groups::DATABASE_UPDATE),
    (subjects::ALBUM_CREATE, groups::DATABASE_ALBUMS),
    (subjects::ALBUM_GET_ALL, groups::DATABASE_ALBUMS),
    (subjects::ALBUM_GET, groups::DATABASE_ALBUMS),
    (subjects::ALBUM_ADD_PICTURES, groups::DATABASE_ALBUMS),
];

pub struct DatabaseHandler {
    pictures: Arc<dyn MetadataStore>,
    albums: Arc<AlbumStore>,
}

fn parse<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    serde_json::from_slice(payload).map_err(|e| AppError::InvalidRequest(e.to_string()))
}

fn error_status(subject: &str, err: &AppError) -> ServiceResponse {
    match err {
        AppError::InvalidRequest(_) => {
            warn!(subject = %subject, error = %err, "Rejected request");
            ServiceResponse {
                code: 400,
                msg: err.to_string(),
            }
        }
        _ => {
            error!(subject = %subject, error = %err, "Request failed");
            ServiceResponse::failure(err.to_string())
        }
    }
}

/// Reply for a query: data, 404 when absent, or the error status
fn query_reply<T: Serialize>(subject: &str, result: Result<Option<T>>, missing: impl FnOnce() -> String) -> Bytes {
    match result {
        Ok(Some(data)) => DataResponse::ok(data).to_bytes(),
        Ok(None) => DataResponse::<T>::from(ServiceResponse::not_found(missing())).to_bytes(),
        Err(e) => DataResponse::<T>::from(error_status(subject, &e)).to_bytes(),
    }
}

impl DatabaseHandler {
    pub fn new(pictures: Arc<dyn MetadataStore>, albums: Arc<AlbumStore>) -> Self {
        Self { pictures, albums }
    }

    async fn store(&self, payload: &[u8]) -> Result<ServiceResponse> {
        let row: PictureMetadata = parse(payload)?;
        let id = row.id;
        Ok(match self.pictures.insert(row).await? {
            InsertOutcome::Inserted => ServiceResponse::ok(format!("picture {id} stored")),
            InsertOutcome::AlreadyPresent => {
                ServiceResponse::ok(format!("picture {id} already stored"))
            }
        })
    }
}

#[async_trait]
impl RequestHandler for DatabaseHandler {
    async fn handle(&self, subject: &str, payload: Bytes) -> Bytes {
        debug!(subject = %subject, size = payload.len(), "Database request");

        match subject {
            subjects::STORE => match self.store(&payload).await {
                Ok(status) => status.to_bytes(),
                Err(e) => error_status(subject, &e).to_bytes(),
            },

            subjects::GET_ALL => {
                let result = self.pictures.get_all().await.map(Some);
                query_reply(subject, result, String::new)
            }

            subjects::GET => {
                let result = match parse::<PictureId>(&payload) {
                    Ok(PictureId { id }) => self.pictures.get(id).await,
                    Err(e) => Err(e),
                };
                query_reply(subject, result, || "picture not found".to_string())
            }

            subjects::UPDATE => {
                let result = match parse::<PictureUpdate>(&payload) {
                    Ok(update) => self.pictures.update(&update).await,
                    Err(e) => Err(e),
                };
                query_reply(subject, result, || "picture not found".to_string())
            }

            subjects::ALBUM_CREATE => {
                let result = match parse::<NewAlbum>(&payload) {
                    Ok(new) => self.albums.create(new).await.map(Some),
                    Err(e) => Err(e),
                };
                query_reply(subject, result, String::new)
            }

            subjects::ALBUM_GET_ALL => {
                let result = self.albums.get_all().await.map(Some);
                query_reply(subject, result, String::new)
            }

            subjects::ALBUM_GET => {
                let result = match parse::<AlbumId>(&payload) {
                    Ok(AlbumId { id }) => self.albums.get(id).await,
                    Err(e) => Err(e),
                };
                query_reply(subject, result, || "album not found".to_string())
            }

            subjects::ALBUM_ADD_PICTURES => {
                let result = match parse::<AlbumPictures>(&payload) {
                    Ok(request) => self.albums.add_pictures(&request).await,
                    Err(e) => Err(e),
                };
                query_reply(subject, result, || "album not found".to_string())
            }

            other => {
                warn!(subject = %other, "No route for subject");
                ServiceResponse::not_found(format!("no route for {other}")).to_bytes()
            }
        }
    }
}
