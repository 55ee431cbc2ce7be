//! Render-ready projections of controller state
//!
//! Snapshots hold only what changes with the shelf revision. Values that move
//! with the clock (slideshow countdown, playback position) are read from the
//! controller at draw time.

use tracing::debug;

use crate::collection::{NavigationInfo, Shelf};
use crate::media::image_dimensions;
use crate::store::RecordId;
use crate::widget::{GalleryController, PlayerController, WidgetKind};

/// One line of the entry list
#[derive(Debug, Clone, PartialEq)]
pub struct EntryRow {
    pub id: RecordId,
    pub label: String,
    pub active: bool,
}

/// The image on the main display
#[derive(Debug, Clone, PartialEq)]
pub struct MainImage {
    pub name: String,
    /// Original file name
    pub source: String,
    pub media_type: String,
    /// Pixel size, when the payload decodes
    pub dimensions: Option<(u32, u32)>,
    pub size: usize,
    pub position: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GallerySnapshot {
    pub rows: Vec<EntryRow>,
    /// Message shown instead of the main display
    pub empty: Option<&'static str>,
    pub main: Option<MainImage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub rows: Vec<EntryRow>,
    pub empty: Option<&'static str>,
    pub now_playing: String,
    pub playing: bool,
    /// Playback ran off the end of the playlist
    pub stopped_at_end: bool,
    pub shuffle: bool,
    pub repeat: bool,
    pub navigation: NavigationInfo,
}

fn rows(shelf: &Shelf) -> Vec<EntryRow> {
    let active = shelf.cursor().active_id();
    shelf
        .view()
        .iter()
        .map(|entry| EntryRow {
            id: entry.id,
            label: entry.name.clone(),
            active: Some(entry.id) == active,
        })
        .collect()
}

impl GallerySnapshot {
    pub fn build(gallery: &GalleryController) -> Self {
        let shelf = gallery.shelf();
        let total = shelf.view().len();

        let main = shelf.active_index().zip(shelf.active_entry()).map(|(position, entry)| {
            let dimensions = match image_dimensions(&entry.handle) {
                Ok(dimensions) => Some(dimensions),
                Err(e) => {
                    debug!("No dimensions for {}: {:#}", entry.name, e);
                    None
                }
            };
            MainImage {
                name: entry.name.clone(),
                source: entry.source.clone(),
                media_type: entry.media_type.clone(),
                dimensions,
                size: entry.handle.len(),
                position,
                total,
            }
        });

        Self {
            rows: rows(shelf),
            empty: (total == 0).then(|| WidgetKind::Gallery.empty_message()),
            main,
        }
    }
}

impl PlayerSnapshot {
    pub fn build(player: &PlayerController) -> Self {
        let shelf = player.shelf();
        let mode = player.mode();

        // Only a track that is actually loaded counts as now playing
        let now_playing = player
            .loaded_id()
            .and_then(|id| shelf.view().iter().find(|entry| entry.id == id))
            .map(|entry| format!("Now Playing: {}", entry.name))
            .unwrap_or_else(|| "Now Playing: None".to_string());

        Self {
            rows: rows(shelf),
            empty: shelf
                .view()
                .is_empty()
                .then(|| WidgetKind::Player.empty_message()),
            now_playing,
            playing: player.is_playing(),
            stopped_at_end: shelf.cursor().is_stopped_at_end(),
            shuffle: mode.shuffle,
            repeat: mode.repeat_at_end,
            navigation: player.navigation(),
        }
    }
}

/// Caches a snapshot until the revision it was built from changes
#[derive(Debug)]
pub struct ViewSync<S> {
    revision: Option<u64>,
    snapshot: Option<S>,
    rebuilds: u64,
}

impl<S> Default for ViewSync<S> {
    fn default() -> Self {
        Self {
            revision: None,
            snapshot: None,
            rebuilds: 0,
        }
    }
}

impl<S> ViewSync<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The snapshot for `revision`, rebuilt only when it moved
    pub fn sync(&mut self, revision: u64, build: impl FnOnce() -> S) -> &S {
        if self.revision != Some(revision) {
            self.snapshot = None;
        }
        self.revision = Some(revision);
        self.snapshot.get_or_insert_with(|| {
            self.rebuilds += 1;
            build()
        })
    }

    /// How many times a snapshot was built
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }
}
