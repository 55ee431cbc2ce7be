//! Fixed object store schemas, one per widget

use serde::{Deserialize, Serialize};

/// Record field a secondary index is built on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexField {
    /// Original file name
    Source,
    /// Display name
    Name,
}

impl IndexField {
    /// Pick the indexed value out of a record's fields
    pub fn key_of<'a>(&self, display_name: &'a str, source: &'a str) -> &'a str {
        match self {
            IndexField::Source => source,
            IndexField::Name => display_name,
        }
    }
}

/// Layout of a widget's object store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSchema {
    /// Database (directory) name
    pub database: &'static str,
    /// Object store name
    pub store: &'static str,
    /// Identity key, always auto-incremented
    pub key_path: &'static str,
    /// Secondary index name
    pub index_name: &'static str,
    /// Field the secondary index covers
    pub index_field: IndexField,
    /// Whether the secondary index enforces uniqueness
    pub index_unique: bool,
}

/// Image gallery: `images` keyed by id, indexed on source
pub const GALLERY_SCHEMA: StoreSchema = StoreSchema {
    database: "imageGallery",
    store: "images",
    key_path: "id",
    index_name: "src",
    index_field: IndexField::Source,
    index_unique: false,
};

/// Music player: `tracks` keyed by id, indexed on name
pub const PLAYER_SCHEMA: StoreSchema = StoreSchema {
    database: "MusicDB",
    store: "tracks",
    key_path: "id",
    index_name: "name",
    index_field: IndexField::Name,
    index_unique: false,
};
