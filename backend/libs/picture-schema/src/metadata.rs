//! Durable picture metadata rows

use serde::{Deserialize, Serialize};

/// One row of the metadata store
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PictureMetadata {
    pub id: u64,
    pub ext: String,

    /// Capture time, Unix seconds; 0 when unknown
    pub timestamp: i64,
    pub camera: String,
    pub exposure_mode: String,
    pub aperture: f32,
    pub iso_speed: i32,
    pub shutter_speed: String,
    pub focal_length: f32,
    pub lens: String,

    pub width: u32,
    pub height: u32,
    pub is_landscape: bool,
    pub is_panoramic: bool,

    pub favourite: bool,
    pub content_warning: bool,
    pub description: String,
}

/// Orientation facts derived from pixel dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Orientation {
    pub is_landscape: bool,
    pub is_panoramic: bool,
}

impl Orientation {
    /// Landscape when wider than tall; panoramic when landscape with a
    /// ratio strictly above 1.5.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        let is_landscape = width > height;
        let is_panoramic = is_landscape && f64::from(width) / f64::from(height) > 1.5;

        Self {
            is_landscape,
            is_panoramic,
        }
    }
}

/// Point lookup payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PictureId {
    pub id: u64,
}

/// Amendment of the user-mutable fields; `None` leaves a field untouched
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PictureUpdate {
    pub id: u64,
    #[serde(default)]
    pub favourite: Option<bool>,
    #[serde(default)]
    pub content_warning: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
}

impl PictureUpdate {
    pub fn apply(&self, row: &mut PictureMetadata) {
        if let Some(favourite) = self.favourite {
            row.favourite = favourite;
        }
        if let Some(content_warning) = self.content_warning {
            row.content_warning = content_warning;
        }
        if let Some(description) = &self.description {
            row.description = description.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_boundary_is_strict() {
        let o = Orientation::from_dimensions(3000, 2000);
        assert!(o.is_landscape);
        assert!(!o.is_panoramic);

        let o = Orientation::from_dimensions(3000, 1800);
        assert!(o.is_landscape);
        assert!(o.is_panoramic);
    }

    #[test]
    fn test_orientation_portrait_and_square() {
        assert_eq!(
            Orientation::from_dimensions(2000, 3000),
            Orientation {
                is_landscape: false,
                is_panoramic: false
            }
        );
        assert!(!Orientation::from_dimensions(100, 100).is_landscape);
    }

    #[test]
    fn test_update_only_touches_given_fields() {
        let mut row = PictureMetadata {
            id: 1,
            description: "old".to_string(),
            ..Default::default()
        };

        let update: PictureUpdate =
            serde_json::from_str(r#"{"id": 1, "favourite": true}"#).unwrap();
        update.apply(&mut row);

        assert!(row.favourite);
        assert!(!row.content_warning);
        assert_eq!(row.description, "old");
    }
}
