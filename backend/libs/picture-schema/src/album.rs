use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ordered collection of pictures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub pictures: Vec<u64>,
}

impl Album {
    pub fn create(new: NewAlbum) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            pictures: Vec::new(),
        }
    }

    /// Append pictures not already in the album, keeping order.
    ///
    /// Returns how many were added.
    pub fn add_pictures(&mut self, pictures: &[u64]) -> usize {
        let before = self.pictures.len();
        for id in pictures {
            if !self.pictures.contains(id) {
                self.pictures.push(*id);
            }
        }
        self.pictures.len() - before
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAlbum {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Point lookup payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumId {
    pub id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumPictures {
    pub id: Uuid,
    pub pictures: Vec<u64>,
}
