/// Picture schema shared by every pipeline service
///
/// Defines the payloads that travel over the message bus, the bucket and
/// subject names the services agree on, and the content fingerprint that
/// names every stored object.
pub mod album;
pub mod metadata;
pub mod picture;

pub use album::{Album, AlbumId, AlbumPictures, NewAlbum};
pub use metadata::{Orientation, PictureId, PictureMetadata, PictureUpdate};
pub use picture::{fingerprint, normalize_extension, Picture, SchemaError};

/// Object-store buckets
pub mod buckets {
    pub const ORIGINAL: &str = "original";
    pub const HALF: &str = "half";
    pub const THUMB: &str = "thumb";

    /// Every rendition a complete picture has, original included
    pub const RENDITIONS: [&str; 3] = [ORIGINAL, HALF, THUMB];
}

/// Message-bus subjects
pub mod subjects {
    pub const RESIZE: &str = "picture.resize";
    pub const EXTRACT: &str = "picture.extract";
    pub const STORE: &str = "picture.store";
    pub const GET_ALL: &str = "picture.get_all";
    pub const GET: &str = "picture.get";
    pub const UPDATE: &str = "picture.update";

    pub const ALBUM_CREATE: &str = "album.create";
    pub const ALBUM_GET_ALL: &str = "album.get_all";
    pub const ALBUM_GET: &str = "album.get";
    pub const ALBUM_ADD_PICTURES: &str = "album.add_pictures";
}

/// Consumer-group names, one per role and subject
pub mod groups {
    pub const RESIZER: &str = "resizer_queue";
    pub const EXTRACTOR: &str = "extractor_queue";
    pub const DATABASE_STORE: &str = "database_queue_store";
    pub const DATABASE_GET: &str = "database_queue_get";
    pub const DATABASE_UPDATE: &str = "database_queue_update";
    pub const DATABASE_ALBUMS: &str = "database_queue_albums";
}
