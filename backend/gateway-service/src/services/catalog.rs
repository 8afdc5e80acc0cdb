/// Catalog service
///
/// Read and administrative operations, answered by the database role.
use crate::error::{AppError, Result};
use message_bus::{request_data, MessageBus, RequestError, Timeouts};
use picture_schema::{
    subjects, Album, AlbumId, AlbumPictures, NewAlbum, PictureId, PictureMetadata, PictureUpdate,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub struct CatalogService {
    bus: Arc<dyn MessageBus>,
    timeouts: Timeouts,
}

impl CatalogService {
    pub fn new(bus: Arc<dyn MessageBus>, timeouts: Timeouts) -> Self {
        Self { bus, timeouts }
    }

    async fn query<T, R>(&self, subject: &str, payload: &T, timeout: Duration) -> std::result::Result<R, RequestError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        request_data(&*self.bus, subject, payload, timeout).await
    }

    pub async fn list_pictures(&self) -> Result<Vec<PictureMetadata>> {
        self.query(subjects::GET_ALL, &(), self.timeouts.query)
            .await
            .map_err(|e| AppError::upstream("list pictures", e))
    }

    pub async fn get_picture(&self, id: u64) -> Result<PictureMetadata> {
        self.query(subjects::GET, &PictureId { id }, self.timeouts.query)
            .await
            .map_err(|e| picture_error(id, "get picture", e))
    }

    pub async fn update_picture(&self, update: &PictureUpdate) -> Result<PictureMetadata> {
        self.query(subjects::UPDATE, update, self.timeouts.stage)
            .await
            .map_err(|e| picture_error(update.id, "update picture", e))
    }

    pub async fn create_album(&self, new: &NewAlbum) -> Result<Album> {
        if new.title.trim().is_empty() {
            return Err(AppError::BadRequest("album title is required".to_string()));
        }
        self.query(subjects::ALBUM_CREATE, new, self.timeouts.stage)
            .await
            .map_err(|e| AppError::upstream("create album", e))
    }

    pub async fn list_albums(&self) -> Result<Vec<Album>> {
        self.query(subjects::ALBUM_GET_ALL, &(), self.timeouts.query)
            .await
            .map_err(|e| AppError::upstream("list albums", e))
    }

    pub async fn get_album(&self, id: Uuid) -> Result<Album> {
        self.query(subjects::ALBUM_GET, &AlbumId { id }, self.timeouts.query)
            .await
            .map_err(|e| album_error(id, "get album", e))
    }

    pub async fn add_album_pictures(&self, request: &AlbumPictures) -> Result<Album> {
        self.query(subjects::ALBUM_ADD_PICTURES, request, self.timeouts.stage)
            .await
            .map_err(|e| album_error(request.id, "add album pictures", e))
    }
}

fn picture_error(id: u64, stage: &str, err: RequestError) -> AppError {
    match err.failure_code() {
        Some(404) => AppError::PictureNotFound(id),
        Some(400) => AppError::BadRequest(err.to_string()),
        _ => AppError::upstream(stage, err),
    }
}

fn album_error(id: Uuid, stage: &str, err: RequestError) -> AppError {
    match err.failure_code() {
        Some(404) => AppError::AlbumNotFound(id.to_string()),
        Some(400) => AppError::BadRequest(err.to_string()),
        _ => AppError::upstream(stage, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use message_bus::{DataResponse, InMemoryBus, ServiceResponse};

    fn catalog(bus: &InMemoryBus) -> CatalogService {
        CatalogService::new(
            Arc::new(bus.clone()),
            Timeouts {
                stage: Duration::from_millis(200),
                query: Duration::from_millis(200),
            },
        )
    }

    #[tokio::test]
    async fn test_missing_picture_maps_to_not_found() {
        let bus = InMemoryBus::new();
        let mut sub = bus.queue_subscribe(subjects::GET, "db").await.unwrap();
        tokio::spawn(async move {
            if let Some(message) = sub.next().await {
                let reply = DataResponse::<PictureMetadata>::from(ServiceResponse::not_found("gone"));
                message.respond(reply.to_bytes()).await.unwrap();
            }
        });

        let err = catalog(&bus).get_picture(42).await.unwrap_err();
        assert!(matches!(err, AppError::PictureNotFound(42)));
    }

    #[tokio::test]
    async fn test_list_without_database_is_upstream_failure() {
        let bus = InMemoryBus::new();
        let err = catalog(&bus).list_pictures().await.unwrap_err();
        assert!(matches!(err, AppError::UpstreamFailure { .. }));
    }

    #[tokio::test]
    async fn test_blank_album_title_rejected() {
        let bus = InMemoryBus::new();
        let err = catalog(&bus)
            .create_album(&NewAlbum {
                title: "  ".to_string(),
                description: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
