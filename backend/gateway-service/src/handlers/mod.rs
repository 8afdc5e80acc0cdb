/// HTTP handlers
///
/// - Pictures: upload, list, fetch, amend, serve renditions
/// - Albums: create, list, fetch, add pictures
/// - Health
use actix_web::web;

pub mod albums;
pub mod health;
pub mod pictures;

pub use albums::{add_album_pictures, create_album, get_album, list_albums};
pub use health::health;
pub use pictures::{get_picture, get_rendition, list_pictures, update_picture, upload_picture};

/// Register every route under `/api/v1`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health))
            .service(
                web::scope("/pictures")
                    .route("", web::post().to(upload_picture))
                    .route("", web::get().to(list_pictures))
                    .route("/{id}", web::get().to(get_picture))
                    .route("/{id}", web::patch().to(update_picture))
                    .route("/{id}/{size}", web::get().to(get_rendition)),
            )
            .service(
                web::scope("/albums")
                    .route("", web::get().to(list_albums))
                    .route("", web::post().to(create_album))
                    .route("/{id}", web::get().to(get_album))
                    .route("/{id}/pictures", web::post().to(add_album_pictures)),
            ),
    );
}
