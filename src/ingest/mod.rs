//! Reading user-supplied files into records
//!
//! Files are read concurrently with bounded parallelism, like the download
//! stage of a sync, but come back in the order they were given so records are
//! inserted in batch order.

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::collection::Shelf;
use crate::media::{MediaKind, sniff_media_type};
use crate::store::{NewRecord, RecordId, StoreError};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A file that was read and is ready to be stored
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub path: PathBuf,
    pub record: NewRecord,
}

/// A file that did not make it into the collection
#[derive(Debug)]
pub struct IngestFailure {
    pub path: PathBuf,
    pub error: IngestError,
}

/// Outcome of one batch
#[derive(Debug, Default)]
pub struct IngestReport {
    pub added: Vec<RecordId>,
    pub failed: Vec<IngestFailure>,
    /// Record that landed in a previously empty collection
    pub first: Option<RecordId>,
}

impl IngestReport {
    pub fn record_failure(&mut self, path: PathBuf, error: IngestError) {
        warn!("Skipping {}: {}", path.display(), error);
        self.failed.push(IngestFailure { path, error });
    }
}

/// Display name for a file: its name minus the final extension segment
///
/// `holiday.beach.jpg` becomes `holiday.beach`; a name with no extension is
/// kept whole.
pub fn display_name(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Reads batches of files for one kind of widget
#[derive(Debug, Clone)]
pub struct Ingestor {
    kind: MediaKind,
    parallel: usize,
}

impl Ingestor {
    pub fn new(kind: MediaKind, parallel: usize) -> Self {
        Self {
            kind,
            parallel: parallel.max(1),
        }
    }

    /// Read every file; each one succeeds or fails on its own
    pub async fn read_batch(
        &self,
        paths: Vec<PathBuf>,
        progress: &ProgressBar,
    ) -> Vec<Result<IncomingFile, IngestFailure>> {
        progress.set_length(paths.len() as u64);
        let kind = self.kind;

        let results: Vec<Result<IncomingFile, IngestFailure>> = stream::iter(paths)
            .map(|path| read_one(kind, path))
            .buffered(self.parallel)
            .inspect(|result| {
                progress.inc(1);
                if let Ok(file) = result {
                    progress.set_message(file.record.display_name.clone());
                }
            })
            .collect()
            .await;

        progress.finish_with_message("Read complete");
        results
    }
}

/// Persist a read batch through `shelf`, in batch order
///
/// Each file stands alone: a failed read or write is reported and the rest
/// of the batch carries on.
pub async fn store_batch(
    shelf: &mut Shelf,
    batch: Vec<Result<IncomingFile, IngestFailure>>,
) -> IngestReport {
    let mut report = IngestReport::default();

    for item in batch {
        let file = match item {
            Ok(file) => file,
            Err(failure) => {
                report.record_failure(failure.path, failure.error);
                continue;
            }
        };

        match shelf.insert(file.record).await {
            Ok(inserted) => {
                info!("Added record {} from {}", inserted.id, file.path.display());
                report.added.push(inserted.id);
                if inserted.first {
                    report.first = Some(inserted.id);
                }
            }
            Err(e) => report.record_failure(file.path, e.into()),
        }
    }

    report
}

async fn read_one(kind: MediaKind, path: PathBuf) -> Result<IncomingFile, IngestFailure> {
    let data = match tokio::fs::read(&path).await {
        Ok(data) => data,
        Err(source) => {
            return Err(IngestFailure {
                error: IngestError::Unreadable {
                    path: path.clone(),
                    source,
                },
                path,
            });
        }
    };

    let media_type = sniff_media_type(kind, &data);
    let source = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    debug!("Read {} ({} bytes, {})", path.display(), data.len(), media_type);

    Ok(IncomingFile {
        record: NewRecord {
            display_name: display_name(&path),
            source,
            media_type,
            payload: Bytes::from(data),
        },
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn test_display_name_strips_last_extension() {
        assert_eq!(display_name(Path::new("/music/Song.mp3")), "Song");
        assert_eq!(display_name(Path::new("holiday.beach.jpg")), "holiday.beach");
        assert_eq!(display_name(Path::new("README")), "README");
    }

    #[tokio::test]
    async fn test_read_batch_keeps_order_and_isolates_failures() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let dir = std::env::temp_dir().join(format!("mediashelf_ingest_{}_{}", std::process::id(), suffix));
        std::fs::create_dir_all(&dir).unwrap();

        let first = dir.join("first.mp3");
        let missing = dir.join("missing.mp3");
        let third = dir.join("third.mp3");
        std::fs::write(&first, b"one").unwrap();
        std::fs::write(&third, b"three").unwrap();

        let ingestor = Ingestor::new(MediaKind::Audio, 2);
        let results = ingestor
            .read_batch(vec![first, missing.clone(), third], &ProgressBar::hidden())
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().record.display_name, "first");
        assert_eq!(results[0].as_ref().unwrap().record.source, "first.mp3");
        assert_eq!(results[1].as_ref().unwrap_err().path, missing);
        assert_eq!(
            results[2].as_ref().unwrap().record.payload,
            Bytes::from_static(b"three")
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_store_batch_marks_first_record() {
        use crate::store::{MemoryStore, PLAYER_SCHEMA};

        let mut shelf = Shelf::new(Box::new(MemoryStore::open(PLAYER_SCHEMA)));
        let record = |name: &str| {
            Ok(IncomingFile {
                path: PathBuf::from(name),
                record: NewRecord {
                    display_name: name.to_string(),
                    source: name.to_string(),
                    media_type: "audio/mpeg".to_string(),
                    payload: Bytes::from_static(b"x"),
                },
            })
        };

        let report = store_batch(&mut shelf, vec![record("a"), record("b")]).await;
        assert_eq!(report.added, vec![1, 2]);
        assert_eq!(report.first, Some(1));

        let report = store_batch(&mut shelf, vec![record("c")]).await;
        assert_eq!(report.added, vec![3]);
        assert_eq!(report.first, None);
        assert_eq!(shelf.active_index(), Some(0));
    }
}
