//! Playlist player controller
//!
//! Owns the track shelf, the shuffle/repeat toggles and at most one loaded
//! media element. Selecting a track always pauses and rewinds the previous
//! element before the next one starts.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, error, warn};

use super::WidgetError;
use crate::collection::advance::previous_index;
use crate::collection::{Advance, AdvancePolicy, NavigationInfo, PlaybackMode, Removed, Shelf};
use crate::config::Settings;
use crate::ingest::{IncomingFile, IngestFailure, IngestReport, store_batch};
use crate::media::{MediaBackend, MediaElement, MediaError, Progress, progress, seek_position};
use crate::store::{ObjectStore, RecordId};

/// The element currently bound to a track
struct LoadedMedia {
    id: RecordId,
    element: Box<dyn MediaElement>,
}

pub struct PlayerController {
    shelf: Shelf,
    mode: PlaybackMode,
    backend: Box<dyn MediaBackend>,
    media: Option<LoadedMedia>,
    rng: StdRng,
    skip_secs: f64,
    restart_threshold_secs: f64,
}

impl PlayerController {
    /// Load the stored tracks; nothing plays until asked
    pub async fn open(
        store: Box<dyn ObjectStore>,
        backend: Box<dyn MediaBackend>,
        settings: &Settings,
    ) -> Self {
        let mut shelf = Shelf::new(store);
        if let Err(e) = shelf.reload().await {
            error!("Failed to load tracks: {}", e);
        }

        Self {
            shelf,
            mode: PlaybackMode::default(),
            backend,
            media: None,
            rng: StdRng::from_entropy(),
            skip_secs: settings.skip_secs,
            restart_threshold_secs: settings.restart_threshold_secs,
        }
    }

    pub fn with_mode(mut self, mode: PlaybackMode) -> Self {
        self.mode = mode;
        self
    }

    #[cfg(test)]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn shelf(&self) -> &Shelf {
        &self.shelf
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn loaded_id(&self) -> Option<RecordId> {
        self.media.as_ref().map(|m| m.id)
    }

    pub fn is_playing(&self) -> bool {
        self.media
            .as_ref()
            .is_some_and(|m| !m.element.is_paused())
    }

    /// Elapsed/remaining labels and bar fill for the loaded track
    pub fn progress(&self) -> Progress {
        match &self.media {
            Some(m) => progress(m.element.current_time(), m.element.duration()),
            None => Progress::default(),
        }
    }

    pub fn navigation(&self) -> NavigationInfo {
        NavigationInfo::for_playlist(self.shelf.active_index(), self.shelf.view().len(), self.mode)
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.mode.shuffle = !self.mode.shuffle;
        self.shelf.touch();
        self.mode.shuffle
    }

    pub fn toggle_repeat(&mut self) -> bool {
        self.mode.repeat_at_end = !self.mode.repeat_at_end;
        self.shelf.touch();
        self.mode.repeat_at_end
    }

    /// Play the track at `index`
    pub fn play_index(&mut self, index: usize) -> Result<(), WidgetError> {
        self.shelf.select(index)?;
        self.release_media();
        self.start_active()
    }

    /// Play/pause button: resume or pause the loaded track, or start the
    /// current one when nothing is loaded
    pub fn toggle_play(&mut self) -> Result<(), WidgetError> {
        if self.media.is_none() {
            return match self.shelf.active_index() {
                Some(index) => self.play_index(index),
                None => Ok(()),
            };
        }
        let Some(media) = self.media.as_mut() else {
            return Ok(());
        };

        if media.element.is_paused() {
            start_element(media.element.as_mut());
            self.shelf.resume();
        } else {
            media.element.pause();
        }
        self.shelf.touch();
        Ok(())
    }

    /// Pause and rewind the loaded track
    pub fn stop(&mut self) {
        if let Some(media) = self.media.as_mut() {
            media.element.pause();
            media.element.set_current_time(0.0);
            self.shelf.touch();
        }
    }

    pub fn skip_forward(&mut self) {
        let skip = self.skip_secs;
        if let Some(media) = self.media.as_mut() {
            let Some(duration) = media.element.duration() else {
                return;
            };
            let target = (media.element.current_time() + skip).min(duration);
            media.element.set_current_time(target);
        }
    }

    pub fn skip_backward(&mut self) {
        let skip = self.skip_secs;
        if let Some(media) = self.media.as_mut() {
            let target = (media.element.current_time() - skip).max(0.0);
            media.element.set_current_time(target);
        }
    }

    /// Seek from a click `x` cells into a progress control `width` wide
    pub fn seek_click(&mut self, x: f64, width: f64) -> bool {
        let Some(media) = self.media.as_mut() else {
            return false;
        };
        let Some(target) = media
            .element
            .duration()
            .and_then(|duration| seek_position(x, width, duration))
        else {
            return false;
        };
        media.element.set_current_time(target);
        true
    }

    /// Next button and end-of-track: step, shuffle, wrap or halt per mode
    pub fn next(&mut self) -> Result<(), WidgetError> {
        let policy = AdvancePolicy::Playlist(self.mode);
        match self.shelf.advance(policy, &mut self.rng) {
            Some(Advance::To(_)) => {
                self.release_media();
                self.start_active()
            }
            Some(Advance::StopAtEnd) => {
                debug!("Reached the end of the playlist");
                if let Some(media) = self.media.as_mut() {
                    media.element.pause();
                    media.element.set_current_time(0.0);
                }
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Previous button: rewind a track that is well underway, else step back
    pub fn previous(&mut self) -> Result<(), WidgetError> {
        let Some(media) = self.media.as_mut() else {
            return Ok(());
        };

        if media.element.current_time() > self.restart_threshold_secs {
            media.element.set_current_time(0.0);
            return Ok(());
        }

        match self.shelf.active_index() {
            Some(index) => self.play_index(previous_index(index)),
            None => Ok(()),
        }
    }

    /// Time-update hook: moves on when the loaded track has ended
    pub fn tick(&mut self) -> Result<bool, WidgetError> {
        let ended = self.media.as_ref().is_some_and(|m| m.element.ended());
        if ended {
            self.next()?;
        }
        Ok(ended)
    }

    /// Store each read file; the first track of an empty playlist starts playing
    pub async fn ingest(&mut self, batch: Vec<Result<IncomingFile, IngestFailure>>) -> IngestReport {
        let report = store_batch(&mut self.shelf, batch).await;
        if report.first.is_some()
            && let Err(e) = self.start_active()
        {
            debug!("First track did not start: {}", e);
        }
        report
    }

    /// Delete a track; deleting the loaded one moves playback to the track
    /// that takes its place
    pub async fn delete(&mut self, id: RecordId) -> Result<Removed, WidgetError> {
        let removed = self.shelf.remove(id).await.inspect_err(|e| {
            error!("Failed to delete track {}: {}", id, e);
        })?;

        let was_loaded = self.loaded_id() == Some(id);
        if removed.now_empty {
            self.release_media();
        } else if removed.was_active {
            self.release_media();
            if was_loaded && let Err(e) = self.start_active() {
                debug!("Replacement track did not start: {}", e);
            }
        }
        Ok(removed)
    }

    /// Pause and rewind the loaded element, then drop it
    fn release_media(&mut self) {
        if let Some(mut media) = self.media.take() {
            media.element.pause();
            media.element.set_current_time(0.0);
        }
    }

    /// Bind and start an element for the current track
    fn start_active(&mut self) -> Result<(), WidgetError> {
        let Some(entry) = self.shelf.active_entry() else {
            return Ok(());
        };

        let Some(mut element) = self.backend.resolve(entry) else {
            let err = MediaError::MediaUnavailable {
                id: entry.id,
                name: entry.name.clone(),
            };
            warn!("{}", err);
            self.shelf.touch();
            return Err(err.into());
        };

        let id = entry.id;
        debug!("Now playing {} ({})", entry.name, id);
        start_element(element.as_mut());
        self.media = Some(LoadedMedia { id, element });
        self.shelf.touch();
        Ok(())
    }
}

fn start_element(element: &mut dyn MediaElement) {
    match element.play() {
        Ok(()) | Err(MediaError::PlaybackInterrupted) => {}
        Err(e) => warn!("Playback failed: {}", e),
    }
}
