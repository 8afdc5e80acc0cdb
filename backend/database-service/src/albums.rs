use crate::columnar::{check_len, ColumnarError, ColumnarRecord};
use crate::error::Result;
use crate::table::ColumnarTable;
use blob_store::ObjectStore;
use picture_schema::{Album, AlbumPictures, NewAlbum};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Albums, kept in their own columnar object
pub struct AlbumStore {
    table: ColumnarTable<Album>,
}

impl AlbumStore {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: &str, key: &str) -> Self {
        Self {
            table: ColumnarTable::new(store, bucket, key),
        }
    }

    pub async fn create(&self, new: NewAlbum) -> Result<Album> {
        let album = Album::create(new);
        let created = album.clone();
        self.table
            .modify(move |rows| {
                rows.push(album);
                ((), true)
            })
            .await?;

        info!(album_id = %created.id, title = %created.title, "Album created");
        Ok(created)
    }

    pub async fn get_all(&self) -> Result<Vec<Album>> {
        self.table.load().await
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Album>> {
        Ok(self.table.load().await?.into_iter().find(|album| album.id == id))
    }

    /// Append pictures to an album. `None` when the album is unknown.
    pub async fn add_pictures(&self, request: &AlbumPictures) -> Result<Option<Album>> {
        self.table
            .modify(|rows| match rows.iter_mut().find(|album| album.id == request.id) {
                Some(album) => {
                    let added = album.add_pictures(&request.pictures);
                    (Some(album.clone()), added > 0)
                }
                None => (None, false),
            })
            .await
    }
}

#[derive(Serialize, Deserialize)]
pub struct AlbumColumns {
    id: Vec<Uuid>,
    title: Vec<String>,
    description: Vec<String>,
    pictures: Vec<Vec<u64>>,
}

impl ColumnarRecord for Album {
    type Columns = AlbumColumns;

    fn to_columns(rows: &[Self]) -> AlbumColumns {
        AlbumColumns {
            id: rows.iter().map(|a| a.id).collect(),
            title: rows.iter().map(|a| a.title.clone()).collect(),
            description: rows.iter().map(|a| a.description.clone()).collect(),
            pictures: rows.iter().map(|a| a.pictures.clone()).collect(),
        }
    }

    fn from_columns(c: AlbumColumns, rows: usize) -> std::result::Result<Vec<Self>, ColumnarError> {
        check_len("id", &c.id, rows)?;
        check_len("title", &c.title, rows)?;
        check_len("description", &c.description, rows)?;
        check_len("pictures", &c.pictures, rows)?;

        Ok(c.id
            .into_iter()
            .zip(c.title)
            .zip(c.description)
            .zip(c.pictures)
            .map(|(((id, title), description), pictures)| Album {
                id,
                title,
                description,
                pictures,
            })
            .collect())
    }
}
