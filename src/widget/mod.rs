//! Gallery and player controllers
//!
//! One controller per widget instance, built at startup and handed by `&mut`
//! to every event handler.

pub mod gallery;
pub mod player;
pub mod slideshow;

use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::collection::CursorError;
use crate::media::{MediaError, MediaKind};
use crate::store::{FileStore, GALLERY_SCHEMA, MemoryStore, ObjectStore, PLAYER_SCHEMA, StoreError, StoreSchema};

pub use gallery::GalleryController;
pub use player::PlayerController;
pub use slideshow::Slideshow;

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cursor(#[from] CursorError),

    #[error(transparent)]
    Media(#[from] MediaError),
}

/// Which widget a command addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    Gallery,
    Player,
}

impl WidgetKind {
    pub fn schema(&self) -> StoreSchema {
        match self {
            WidgetKind::Gallery => GALLERY_SCHEMA,
            WidgetKind::Player => PLAYER_SCHEMA,
        }
    }

    pub fn media_kind(&self) -> MediaKind {
        match self {
            WidgetKind::Gallery => MediaKind::Image,
            WidgetKind::Player => MediaKind::Audio,
        }
    }

    /// Singular noun for messages
    pub fn noun(&self) -> &'static str {
        match self {
            WidgetKind::Gallery => "image",
            WidgetKind::Player => "track",
        }
    }

    /// Message shown in place of the main surface when nothing is stored
    pub fn empty_message(&self) -> &'static str {
        match self {
            WidgetKind::Gallery => "No images yet. Add some with `mediashelf gallery add`.",
            WidgetKind::Player => "No music available.\nPlease upload a playlist to get started.",
        }
    }
}

/// Open the widget's persistent store
pub async fn open_store(root: &Path, kind: WidgetKind) -> Result<Box<dyn ObjectStore>, StoreError> {
    let store = FileStore::open(root, kind.schema()).await?;
    Ok(Box::new(store))
}

/// Open the persistent store, or fall back to a session-only one
pub async fn open_store_or_session(root: &Path, kind: WidgetKind) -> Box<dyn ObjectStore> {
    match open_store(root, kind).await {
        Ok(store) => store,
        Err(e) => {
            warn!("{}; continuing with a session-only {} store", e, kind.noun());
            Box::new(MemoryStore::open(kind.schema()))
        }
    }
}
