//! Image gallery controller

use rand::thread_rng;
use std::time::{Duration, Instant};
use tracing::error;

use super::Slideshow;
use crate::collection::{AdvancePolicy, CursorError, Removed, Shelf};
use crate::ingest::{IncomingFile, IngestFailure, IngestReport, store_batch};
use crate::store::{ObjectStore, RecordId, StoreError};

/// Gallery state: stored images, the shown image and the slideshow timer
pub struct GalleryController {
    shelf: Shelf,
    slideshow: Slideshow,
}

impl GalleryController {
    /// Load the stored images and start the slideshow if there are any
    pub async fn open(store: Box<dyn ObjectStore>, interval: Duration, now: Instant) -> Self {
        let mut shelf = Shelf::new(store);
        if let Err(e) = shelf.reload().await {
            error!("Failed to load images: {}", e);
        }

        let mut slideshow = Slideshow::new(interval);
        if !shelf.view().is_empty() {
            slideshow.start(now);
        }

        Self { shelf, slideshow }
    }

    pub fn shelf(&self) -> &Shelf {
        &self.shelf
    }

    pub fn slideshow(&self) -> &Slideshow {
        &self.slideshow
    }

    /// Store each read file; the first image of an empty gallery starts the slideshow
    pub async fn ingest(
        &mut self,
        batch: Vec<Result<IncomingFile, IngestFailure>>,
        now: Instant,
    ) -> IngestReport {
        let report = store_batch(&mut self.shelf, batch).await;
        if report.first.is_some() {
            self.slideshow.start(now);
        }
        report
    }

    /// Show the image at `index` and restart the slideshow from it
    pub fn select(&mut self, index: usize, now: Instant) -> Result<(), CursorError> {
        self.shelf.select(index)?;
        self.slideshow.start(now);
        Ok(())
    }

    /// Delete an image; the slideshow stops when the gallery empties
    pub async fn delete(&mut self, id: RecordId, now: Instant) -> Result<Removed, StoreError> {
        let removed = self.shelf.remove(id).await.inspect_err(|e| {
            error!("Failed to delete image {}: {}", id, e);
        })?;

        if removed.now_empty {
            self.slideshow.stop();
        } else if removed.was_active {
            self.slideshow.start(now);
        }
        Ok(removed)
    }

    /// Advance to the next image when the slideshow is due; wraps at the end
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.slideshow.poll(now) {
            return false;
        }
        self.shelf
            .advance(AdvancePolicy::Wrap, &mut thread_rng())
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{GALLERY_SCHEMA, MemoryStore, NewRecord};
    use bytes::Bytes;
    use std::path::PathBuf;

    const INTERVAL: Duration = Duration::from_secs(5);

    fn file(name: &str) -> Result<IncomingFile, IngestFailure> {
        Ok(IncomingFile {
            path: PathBuf::from(format!("{}.png", name)),
            record: NewRecord {
                display_name: name.to_string(),
                source: format!("{}.png", name),
                media_type: "image/png".to_string(),
                payload: Bytes::from(name.as_bytes().to_vec()),
            },
        })
    }

    async fn empty_gallery(now: Instant) -> GalleryController {
        GalleryController::open(Box::new(MemoryStore::open(GALLERY_SCHEMA)), INTERVAL, now).await
    }

    fn shown(gallery: &GalleryController) -> String {
        gallery.shelf().active_entry().unwrap().name.clone()
    }

    #[tokio::test]
    async fn test_upload_three_then_one_tick() {
        let start = Instant::now();
        let mut gallery = empty_gallery(start).await;
        assert!(!gallery.slideshow().is_running());

        let report = gallery
            .ingest(vec![file("one"), file("two"), file("three")], start)
            .await;

        assert_eq!(report.added.len(), 3);
        assert_eq!(gallery.shelf().view().len(), 3);
        assert_eq!(shown(&gallery), "one");
        assert!(gallery.slideshow().is_running());

        assert!(!gallery.tick(start + Duration::from_secs(4)));
        assert!(gallery.tick(start + INTERVAL));
        assert_eq!(shown(&gallery), "two");
    }

    #[tokio::test]
    async fn test_slideshow_wraps_unconditionally() {
        let start = Instant::now();
        let mut gallery = empty_gallery(start).await;
        gallery.ingest(vec![file("a"), file("b")], start).await;

        gallery.tick(start + INTERVAL);
        gallery.tick(start + INTERVAL * 2);
        assert_eq!(shown(&gallery), "a");
    }

    #[tokio::test]
    async fn test_select_restarts_timer() {
        let start = Instant::now();
        let mut gallery = empty_gallery(start).await;
        gallery
            .ingest(vec![file("a"), file("b"), file("c")], start)
            .await;

        gallery.select(2, start + Duration::from_secs(4)).unwrap();
        assert_eq!(shown(&gallery), "c");

        // The old deadline at 5s was cancelled
        assert!(!gallery.tick(start + INTERVAL));
        assert!(gallery.tick(start + Duration::from_secs(9)));
        assert_eq!(shown(&gallery), "a");

        assert!(gallery.select(7, start).is_err());
    }

    #[tokio::test]
    async fn test_failed_reads_do_not_abort_batch() {
        let start = Instant::now();
        let mut gallery = empty_gallery(start).await;
        let unreadable = Err(IngestFailure {
            path: PathBuf::from("gone.png"),
            error: crate::ingest::IngestError::Unreadable {
                path: PathBuf::from("gone.png"),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            },
        });

        let report = gallery.ingest(vec![unreadable, file("kept")], start).await;
        assert_eq!(report.added, vec![1]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(shown(&gallery), "kept");
        assert!(gallery.slideshow().is_running());
    }

    #[tokio::test]
    async fn test_deleting_last_image_stops_slideshow() {
        let start = Instant::now();
        let mut gallery = empty_gallery(start).await;
        gallery.ingest(vec![file("only")], start).await;

        let removed = gallery.delete(1, start).await.unwrap();
        assert!(removed.now_empty);
        assert!(!gallery.slideshow().is_running());
        assert!(gallery.shelf().active_entry().is_none());
        assert!(!gallery.tick(start + INTERVAL));
    }

    #[tokio::test]
    async fn test_reopen_shows_first_stored_image() {
        let start = Instant::now();
        let mut store = MemoryStore::open(GALLERY_SCHEMA);
        for name in ["x", "y"] {
            store.add(file(name).unwrap().record).await.unwrap();
        }

        let gallery = GalleryController::open(Box::new(store), INTERVAL, start).await;
        assert_eq!(shown(&gallery), "x");
        assert!(gallery.slideshow().is_running());
    }
}
