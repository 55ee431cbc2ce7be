//! Playable media elements
//!
//! The player drives an element through play/pause/seek and reads back its
//! position, duration and ended state. Decoding stays behind the element.

use std::time::Instant;
use tracing::debug;

use super::{MediaError, track_duration};
use crate::collection::ViewEntry;

/// A loaded, seekable piece of media
pub trait MediaElement: Send {
    /// Start or resume playback
    fn play(&mut self) -> Result<(), MediaError>;

    fn pause(&mut self);

    fn is_paused(&self) -> bool;

    /// Position in seconds
    fn current_time(&self) -> f64;

    /// Jump to a position; clears the ended state
    fn set_current_time(&mut self, seconds: f64);

    /// Length in seconds, once known
    fn duration(&self) -> Option<f64>;

    /// Playback reached the end
    fn ended(&self) -> bool;
}

/// Resolves view entries into playable elements
pub trait MediaBackend: Send {
    /// `None` when the entry cannot be played
    fn resolve(&self, entry: &ViewEntry) -> Option<Box<dyn MediaElement>>;
}

/// Transport clock for a track of known length
///
/// Tracks position against the wall clock while playing. No audio is
/// produced.
#[derive(Debug, Clone)]
pub struct ClockMedia {
    duration: f64,
    /// Position when the clock last stopped or was seeked
    offset: f64,
    /// Set while playing
    started_at: Option<Instant>,
}

impl ClockMedia {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            offset: 0.0,
            started_at: None,
        }
    }

    fn position_at(&self, now: Instant) -> f64 {
        let running = self
            .started_at
            .map(|start| now.saturating_duration_since(start).as_secs_f64())
            .unwrap_or(0.0);
        (self.offset + running).min(self.duration)
    }
}

impl MediaElement for ClockMedia {
    fn play(&mut self) -> Result<(), MediaError> {
        if self.started_at.is_some() {
            return Ok(());
        }
        if self.offset >= self.duration {
            self.offset = 0.0;
        }
        self.started_at = Some(Instant::now());
        Ok(())
    }

    fn pause(&mut self) {
        if self.started_at.is_some() {
            self.offset = self.position_at(Instant::now());
            self.started_at = None;
        }
    }

    fn is_paused(&self) -> bool {
        self.started_at.is_none() || self.ended()
    }

    fn current_time(&self) -> f64 {
        self.position_at(Instant::now())
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.offset = seconds.clamp(0.0, self.duration);
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
    }

    fn duration(&self) -> Option<f64> {
        Some(self.duration)
    }

    fn ended(&self) -> bool {
        self.started_at.is_some() && self.current_time() >= self.duration
    }
}

/// Backend handing out [`ClockMedia`] sized by the track's decoded duration
#[derive(Debug, Default)]
pub struct ClockBackend;

impl MediaBackend for ClockBackend {
    fn resolve(&self, entry: &ViewEntry) -> Option<Box<dyn MediaElement>> {
        match track_duration(&entry.handle) {
            Ok(duration) => Some(Box::new(ClockMedia::new(duration))),
            Err(e) => {
                debug!("Cannot open {} for playback: {:#}", entry.name, e);
                None
            }
        }
    }
}
