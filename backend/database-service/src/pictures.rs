//! Picture metadata store

use crate::columnar::{check_len, ColumnarError, ColumnarRecord};
use crate::error::Result;
use crate::table::ColumnarTable;
use async_trait::async_trait;
use blob_store::ObjectStore;
use picture_schema::{PictureMetadata, PictureUpdate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with the same id exists and was left untouched
    AlreadyPresent,
}

/// Storage of picture metadata rows.
///
/// The columnar implementation rewrites the whole object on every write;
/// callers never depend on that.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn insert(&self, row: PictureMetadata) -> Result<InsertOutcome>;

    /// All rows in insertion order
    async fn get_all(&self) -> Result<Vec<PictureMetadata>>;

    async fn get(&self, id: u64) -> Result<Option<PictureMetadata>>;

    /// Amend the user-mutable fields. `None` when the id is unknown.
    async fn update(&self, update: &PictureUpdate) -> Result<Option<PictureMetadata>>;
}

pub struct ColumnarMetadataStore {
    table: ColumnarTable<PictureMetadata>,
}

impl ColumnarMetadataStore {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: &str, key: &str) -> Self {
        Self {
            table: ColumnarTable::new(store, bucket, key),
        }
    }
}

#[async_trait]
impl MetadataStore for ColumnarMetadataStore {
    async fn insert(&self, row: PictureMetadata) -> Result<InsertOutcome> {
        let id = row.id;
        let outcome = self
            .table
            .modify(move |rows| {
                if rows.iter().any(|existing| existing.id == row.id) {
                    return (InsertOutcome::AlreadyPresent, false);
                }
                rows.push(row);
                (InsertOutcome::Inserted, true)
            })
            .await?;

        info!(picture_key = id, outcome = ?outcome, "Picture metadata insert");
        Ok(outcome)
    }

    async fn get_all(&self) -> Result<Vec<PictureMetadata>> {
        self.table.load().await
    }

    async fn get(&self, id: u64) -> Result<Option<PictureMetadata>> {
        Ok(self.table.load().await?.into_iter().find(|row| row.id == id))
    }

    async fn update(&self, update: &PictureUpdate) -> Result<Option<PictureMetadata>> {
        self.table
            .modify(|rows| match rows.iter_mut().find(|row| row.id == update.id) {
                Some(row) => {
                    update.apply(row);
                    (Some(row.clone()), true)
                }
                None => (None, false),
            })
            .await
    }
}

#[derive(Serialize, Deserialize)]
pub struct PictureColumns {
    id: Vec<u64>,
    ext: Vec<String>,
    timestamp: Vec<i64>,
    camera: Vec<String>,
    exposure_mode: Vec<String>,
    aperture: Vec<f32>,
    iso_speed: Vec<i32>,
    shutter_speed: Vec<String>,
    focal_length: Vec<f32>,
    lens: Vec<String>,
    width: Vec<u32>,
    height: Vec<u32>,
    is_landscape: Vec<bool>,
    is_panoramic: Vec<bool>,
    favourite: Vec<bool>,
    content_warning: Vec<bool>,
    description: Vec<String>,
}

impl ColumnarRecord for PictureMetadata {
    type Columns = PictureColumns;

    fn to_columns(rows: &[Self]) -> PictureColumns {
        fn column<T>(rows: &[PictureMetadata], f: impl Fn(&PictureMetadata) -> T) -> Vec<T> {
            rows.iter().map(f).collect()
        }

        PictureColumns {
            id: column(rows, |r| r.id),
            ext: column(rows, |r| r.ext.clone()),
            timestamp: column(rows, |r| r.timestamp),
            camera: column(rows, |r| r.camera.clone()),
            exposure_mode: column(rows, |r| r.exposure_mode.clone()),
            aperture: column(rows, |r| r.aperture),
            iso_speed: column(rows, |r| r.iso_speed),
            shutter_speed: column(rows, |r| r.shutter_speed.clone()),
            focal_length: column(rows, |r| r.focal_length),
            lens: column(rows, |r| r.lens.clone()),
            width: column(rows, |r| r.width),
            height: column(rows, |r| r.height),
            is_landscape: column(rows, |r| r.is_landscape),
            is_panoramic: column(rows, |r| r.is_panoramic),
            favourite: column(rows, |r| r.favourite),
            content_warning: column(rows, |r| r.content_warning),
            description: column(rows, |r| r.description.clone()),
        }
    }

    fn from_columns(c: PictureColumns, rows: usize) -> std::result::Result<Vec<Self>, ColumnarError> {
        check_len("id", &c.id, rows)?;
        check_len("ext", &c.ext, rows)?;
        check_len("timestamp", &c.timestamp, rows)?;
        check_len("camera", &c.camera, rows)?;
        check_len("exposure_mode", &c.exposure_mode, rows)?;
        check_len("aperture", &c.aperture, rows)?;
        check_len("iso_speed", &c.iso_speed, rows)?;
        check_len("shutter_speed", &c.shutter_speed, rows)?;
        check_len("focal_length", &c.focal_length, rows)?;
        check_len("lens", &c.lens, rows)?;
        check_len("width", &c.width, rows)?;
        check_len("height", &c.height, rows)?;
        check_len("is_landscape", &c.is_landscape, rows)?;
        check_len("is_panoramic", &c.is_panoramic, rows)?;
        check_len("favourite", &c.favourite, rows)?;
        check_len("content_warning", &c.content_warning, rows)?;
        check_len("description", &c.description, rows)?;

        let mut ext = c.ext.into_iter();
        let mut camera = c.camera.into_iter();
        let mut exposure_mode = c.exposure_mode.into_iter();
        let mut shutter_speed = c.shutter_speed.into_iter();
        let mut lens = c.lens.into_iter();
        let mut description = c.description.into_iter();

        Ok((0..rows)
            .map(|i| PictureMetadata {
                id: c.id[i],
                ext: ext.next().unwrap_or_default(),
                timestamp: c.timestamp[i],
                camera: camera.next().unwrap_or_default(),
                exposure_mode: exposure_mode.next().unwrap_or_default(),
                aperture: c.aperture[i],
                iso_speed: c.iso_speed[i],
                shutter_speed: shutter_speed.next().unwrap_or_default(),
                focal_length: c.focal_length[i],
                lens: lens.next().unwrap_or_default(),
                width: c.width[i],
                height: c.height[i],
                is_landscape: c.is_landscape[i],
                is_panoramic: c.is_panoramic[i],
                favourite: c.favourite[i],
                content_warning: c.content_warning[i],
                description: description.next().unwrap_or_default(),
            })
            .collect())
    }
}
