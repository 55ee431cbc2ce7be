//! Media probing, transport and time reporting

pub mod element;
pub mod probe;
pub mod time;

use thiserror::Error;

use crate::store::RecordId;

pub use element::{ClockBackend, MediaBackend, MediaElement};
pub use probe::{MediaKind, image_dimensions, sniff_media_type, track_duration};
pub use time::{Progress, progress, seek_position};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MediaError {
    /// A play request was superseded by a newer one
    #[error("playback interrupted by a newer request")]
    PlaybackInterrupted,

    /// No playable element could be resolved for a record
    #[error("no playable media for record {id} ({name})")]
    MediaUnavailable { id: RecordId, name: String },
}
