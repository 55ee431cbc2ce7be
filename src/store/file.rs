//! Directory-backed object store
//!
//! Layout under the data directory:
//!
//! ```text
//! <database>/<store>.json     catalog: schema, next id, record metadata
//! <database>/<store>/<id>.bin payloads
//! <database>/<store>.lock    present while a writer holds the catalog
//! ```
//!
//! The catalog is rewritten through a temp file and a rename, so a crash
//! mid-write leaves the previous catalog intact.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs;
use tracing::{debug, warn};

use super::index::SecondaryIndex;
use super::{
    IndexField, MediaRecord, NewRecord, ObjectStore, RecordId, RecordSummary, StoreError,
    StoreSchema,
};

const CATALOG_VERSION: u32 = 1;

/// How long a writer waits for another to release the catalog
const LOCK_TIMEOUT: Duration = Duration::from_secs(10);
const LOCK_RETRY: Duration = Duration::from_millis(20);
/// Age after which a lock file is treated as abandoned
const LOCK_STALE: Duration = Duration::from_secs(30);

/// On-disk catalog for one object store
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Catalog {
    /// Catalog format version
    version: u32,
    /// Object store name
    store: String,
    /// Identity key path
    key_path: String,
    /// Secondary index definition
    index: CatalogIndex,
    /// Next id to hand out
    next_id: RecordId,
    /// Records in insertion order
    records: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct CatalogIndex {
    name: String,
    field: IndexField,
    unique: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogEntry {
    id: RecordId,
    display_name: String,
    source: String,
    media_type: String,
    added_at: DateTime<Utc>,
    /// Payload length in bytes
    size: u64,
    /// Hex SHA-256 of the payload
    sha256: String,
}

impl Catalog {
    fn new(schema: &StoreSchema) -> Self {
        Self {
            version: CATALOG_VERSION,
            store: schema.store.to_string(),
            key_path: schema.key_path.to_string(),
            index: CatalogIndex {
                name: schema.index_name.to_string(),
                field: schema.index_field,
                unique: schema.index_unique,
            },
            next_id: 1,
            records: Vec::new(),
        }
    }

    /// Describe how this catalog differs from the expected schema, if at all
    fn schema_mismatch(&self, schema: &StoreSchema) -> Option<String> {
        let expected = Catalog::new(schema);
        if self.version != CATALOG_VERSION {
            Some(format!("unsupported catalog version {}", self.version))
        } else if self.store != expected.store || self.key_path != expected.key_path {
            Some(format!(
                "catalog describes store '{}' keyed by '{}'",
                self.store, self.key_path
            ))
        } else if self.index != expected.index {
            Some(format!("catalog has index '{}'", self.index.name))
        } else {
            None
        }
    }
}

/// Object store persisted to a directory
///
/// The catalog on disk is the only source of truth. Every call reads it
/// afresh, and writers hold `<store>.lock` while they read, modify and
/// rewrite it, so several processes can share one store.
pub struct FileStore {
    dir: PathBuf,
    schema: StoreSchema,
}

impl FileStore {
    /// Open the store under `root`, creating it on first use
    pub async fn open(root: &Path, schema: StoreSchema) -> Result<Self, StoreError> {
        let store = Self {
            dir: root.join(schema.database),
            schema,
        };
        let unavailable = |reason: String| StoreError::StorageUnavailable {
            path: store.dir.clone(),
            reason,
        };

        fs::create_dir_all(store.dir.join(schema.store))
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let path = store.catalog_path();
        if !fs::try_exists(&path).await.map_err(|e| unavailable(e.to_string()))? {
            let _lock = store.lock().await.map_err(|e| unavailable(e.to_string()))?;
            // Another process may have created it while we waited
            if !fs::try_exists(&path).await.map_err(|e| unavailable(e.to_string()))? {
                write_catalog(&path, &Catalog::new(&schema))
                    .await
                    .map_err(|e| unavailable(e.to_string()))?;
                debug!("Created {}/{}", schema.database, schema.store);
            }
        }

        let catalog = store.read_catalog().await.map_err(unavailable)?;
        debug!(
            "Opened {}/{} with {} records",
            schema.database,
            schema.store,
            catalog.records.len()
        );

        Ok(store)
    }

    fn catalog_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.schema.store))
    }

    fn blob_path(&self, id: RecordId) -> PathBuf {
        self.dir.join(self.schema.store).join(format!("{}.bin", id))
    }

    async fn lock(&self) -> std::io::Result<CatalogLock> {
        CatalogLock::acquire(self.dir.join(format!("{}.lock", self.schema.store))).await
    }

    /// Current catalog as written on disk
    async fn read_catalog(&self) -> Result<Catalog, String> {
        let content = fs::read_to_string(self.catalog_path())
            .await
            .map_err(|e| e.to_string())?;
        let catalog: Catalog =
            serde_json::from_str(&content).map_err(|e| format!("corrupt catalog: {}", e))?;
        match catalog.schema_mismatch(&self.schema) {
            Some(reason) => Err(reason),
            None => Ok(catalog),
        }
    }

    fn read_failed(&self, reason: String) -> StoreError {
        StoreError::ReadFailed {
            store: self.schema.store.to_string(),
            reason,
        }
    }

    async fn load_entry(&self, entry: &CatalogEntry) -> Result<MediaRecord, StoreError> {
        let data = fs::read(self.blob_path(entry.id))
            .await
            .map_err(|e| self.read_failed(format!("record {}: {}", entry.id, e)))?;

        if hex::encode(Sha256::digest(&data)) != entry.sha256 {
            return Err(self.read_failed(format!(
                "record {}: payload checksum mismatch",
                entry.id
            )));
        }

        Ok(MediaRecord {
            id: entry.id,
            display_name: entry.display_name.clone(),
            source: entry.source.clone(),
            media_type: entry.media_type.clone(),
            added_at: entry.added_at,
            payload: Bytes::from(data),
        })
    }

    /// Load the payloads of `entries`, leaving out the ones that cannot be read
    async fn load_readable<'a>(
        &self,
        entries: impl Iterator<Item = &'a CatalogEntry>,
    ) -> Vec<MediaRecord> {
        let mut records = Vec::new();
        for entry in entries {
            match self.load_entry(entry).await {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping {} '{}': {}", entry.id, entry.display_name, e),
            }
        }
        records
    }
}

#[async_trait]
impl ObjectStore for FileStore {
    fn schema(&self) -> &StoreSchema {
        &self.schema
    }

    async fn add(&mut self, record: NewRecord) -> Result<RecordId, StoreError> {
        let write_failed = |reason: String| StoreError::WriteFailed {
            store: self.schema.store.to_string(),
            reason,
        };

        let _lock = self.lock().await.map_err(|e| write_failed(e.to_string()))?;
        let mut catalog = self.read_catalog().await.map_err(write_failed)?;

        let id = catalog.next_id;
        let blob_path = self.blob_path(id);

        fs::write(&blob_path, &record.payload)
            .await
            .map_err(|e| write_failed(e.to_string()))?;

        catalog.next_id = id + 1;
        catalog.records.push(CatalogEntry {
            id,
            display_name: record.display_name,
            source: record.source.clone(),
            media_type: record.media_type,
            added_at: Utc::now(),
            size: record.payload.len() as u64,
            sha256: hex::encode(Sha256::digest(&record.payload)),
        });

        if let Err(e) = write_catalog(&self.catalog_path(), &catalog).await {
            if let Err(cleanup) = fs::remove_file(&blob_path).await {
                debug!("Leaving orphaned payload {}: {}", blob_path.display(), cleanup);
            }
            return Err(write_failed(e.to_string()));
        }

        debug!("Stored {} as {}/{}", record.source, self.schema.store, id);
        Ok(id)
    }

    async fn get_all(&self) -> Result<Vec<MediaRecord>, StoreError> {
        let catalog = self.read_catalog().await.map_err(|e| self.read_failed(e))?;
        Ok(self.load_readable(catalog.records.iter()).await)
    }

    async fn summaries(&self) -> Result<Vec<RecordSummary>, StoreError> {
        let catalog = self.read_catalog().await.map_err(|e| self.read_failed(e))?;
        Ok(catalog
            .records
            .into_iter()
            .map(|entry| RecordSummary {
                id: entry.id,
                display_name: entry.display_name,
                source: entry.source,
                media_type: entry.media_type,
                added_at: entry.added_at,
                size: entry.size,
            })
            .collect())
    }

    async fn get_all_by_index(&self, key: &str) -> Result<Vec<MediaRecord>, StoreError> {
        let catalog = self.read_catalog().await.map_err(|e| self.read_failed(e))?;

        let mut index = SecondaryIndex::new(self.schema.index_field);
        for entry in &catalog.records {
            index.insert(entry.id, &entry.display_name, &entry.source);
        }
        let ids = index.lookup(key);

        Ok(self
            .load_readable(catalog.records.iter().filter(|e| ids.contains(&e.id)))
            .await)
    }

    async fn delete(&mut self, id: RecordId) -> Result<(), StoreError> {
        let delete_failed = |reason: String| StoreError::DeleteFailed { id, reason };

        let _lock = self.lock().await.map_err(|e| delete_failed(e.to_string()))?;
        let mut catalog = self.read_catalog().await.map_err(delete_failed)?;

        let Some(position) = catalog.records.iter().position(|e| e.id == id) else {
            debug!("Record {} not in {}, nothing to delete", id, self.schema.store);
            return Ok(());
        };
        catalog.records.remove(position);

        write_catalog(&self.catalog_path(), &catalog)
            .await
            .map_err(|e| delete_failed(e.to_string()))?;

        // The catalog no longer references the blob; a leftover file is harmless.
        match fs::remove_file(self.blob_path(id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove payload of record {}: {}", id, e),
        }

        debug!("Deleted {}/{}", self.schema.store, id);
        Ok(())
    }
}

/// Exclusive hold on a store's catalog, released on drop
struct CatalogLock {
    path: PathBuf,
}

impl CatalogLock {
    async fn acquire(path: PathBuf) -> std::io::Result<Self> {
        let deadline = Instant::now() + LOCK_TIMEOUT;
        loop {
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(_) => return Ok(Self { path }),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if lock_is_stale(&path).await {
                        warn!("Breaking stale lock {}", path.display());
                        match fs::remove_file(&path).await {
                            Ok(()) => continue,
                            Err(e) if e.kind() == ErrorKind::NotFound => continue,
                            Err(e) => return Err(e),
                        }
                    }
                    if Instant::now() >= deadline {
                        return Err(std::io::Error::new(
                            ErrorKind::WouldBlock,
                            format!("{} is held by another process", path.display()),
                        ));
                    }
                    tokio::time::sleep(LOCK_RETRY).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Drop for CatalogLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("Failed to release {}: {}", self.path.display(), e);
        }
    }
}

/// A lock older than any write could take was left by a crashed process
async fn lock_is_stale(path: &Path) -> bool {
    match fs::metadata(path).await.and_then(|meta| meta.modified()) {
        Ok(modified) => modified
            .elapsed()
            .map(|age| age > LOCK_STALE)
            .unwrap_or(false),
        Err(_) => false,
    }
}

async fn write_catalog(path: &Path, catalog: &Catalog) -> std::io::Result<()> {
    let content = serde_json::to_string_pretty(catalog)?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, content).await?;
    fs::rename(&tmp_path, path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{GALLERY_SCHEMA, PLAYER_SCHEMA};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_root(label: &str) -> PathBuf {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!(
            "mediashelf_{}_{}_{}",
            label,
            std::process::id(),
            suffix
        ))
    }

    fn track(name: &str, payload: &'static [u8]) -> NewRecord {
        NewRecord {
            display_name: name.to_string(),
            source: format!("{}.mp3", name),
            media_type: "audio/mpeg".to_string(),
            payload: Bytes::from_static(payload),
        }
    }

    #[tokio::test]
    async fn test_add_then_get_all_round_trip() {
        let root = temp_root("roundtrip");
        let mut store = FileStore::open(&root, PLAYER_SCHEMA).await.unwrap();

        let first = store.add(track("Opening", b"first")).await.unwrap();
        let second = store.add(track("Closing", b"second")).await.unwrap();
        assert_eq!((first, second), (1, 2));

        let records = store.get_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].display_name, "Opening");
        assert_eq!(records[0].payload, Bytes::from_static(b"first"));
        assert_eq!(records[1].id, 2);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_reopen_keeps_records_and_id_sequence() {
        let root = temp_root("reopen");
        {
            let mut store = FileStore::open(&root, GALLERY_SCHEMA).await.unwrap();
            store.add(track("a", b"1")).await.unwrap();
            store.add(track("b", b"2")).await.unwrap();
            store.delete(2).await.unwrap();
        }

        let mut store = FileStore::open(&root, GALLERY_SCHEMA).await.unwrap();
        let records = store.get_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].display_name, "a");

        // Ids are never reused, even after a delete
        assert_eq!(store.add(track("c", b"3")).await.unwrap(), 3);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_noop() {
        let root = temp_root("delete");
        let mut store = FileStore::open(&root, PLAYER_SCHEMA).await.unwrap();
        store.add(track("only", b"x")).await.unwrap();

        store.delete(42).await.unwrap();
        store.delete(1).await.unwrap();
        store.delete(1).await.unwrap();

        assert!(store.get_all().await.unwrap().is_empty());
        assert!(!store.blob_path(1).exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_index_lookup_by_source() {
        let root = temp_root("index");
        let mut store = FileStore::open(&root, GALLERY_SCHEMA).await.unwrap();
        store.add(track("sunset", b"1")).await.unwrap();
        store.add(track("beach", b"2")).await.unwrap();
        store.add(track("sunset", b"3")).await.unwrap();

        let hits = store.get_all_by_index("sunset.mp3").await.unwrap();
        let ids: Vec<RecordId> = hits.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_unreadable_payload_skips_only_that_record() {
        let root = temp_root("tamper");
        let mut store = FileStore::open(&root, PLAYER_SCHEMA).await.unwrap();
        store.add(track("good1", b"one")).await.unwrap();
        let tampered = store.add(track("bad", b"original")).await.unwrap();
        store.add(track("good2", b"two")).await.unwrap();
        let missing = store.add(track("gone", b"three")).await.unwrap();

        std::fs::write(store.blob_path(tampered), b"changed").unwrap();
        std::fs::remove_file(store.blob_path(missing)).unwrap();

        let names: Vec<String> = store
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.display_name)
            .collect();
        assert_eq!(names, vec!["good1", "good2"]);
        assert!(store.get_all_by_index("bad").await.unwrap().is_empty());

        // Metadata stays visible so the broken records can still be removed
        let ids: Vec<RecordId> = store.summaries().await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, tampered, 3, missing]);

        store.delete(tampered).await.unwrap();
        store.delete(missing).await.unwrap();
        let ids: Vec<RecordId> = store.summaries().await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(store.get_all().await.unwrap().len(), 2);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_two_handles_do_not_clobber_each_other() {
        let root = temp_root("handles");
        let mut viewer = FileStore::open(&root, GALLERY_SCHEMA).await.unwrap();
        let mut cli = FileStore::open(&root, GALLERY_SCHEMA).await.unwrap();

        assert_eq!(viewer.add(track("a", b"a")).await.unwrap(), 1);
        assert_eq!(cli.add(track("b", b"b")).await.unwrap(), 2);
        viewer.delete(1).await.unwrap();

        // Both handles see the other's writes
        let names: Vec<String> = viewer
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.display_name)
            .collect();
        assert_eq!(names, vec!["b"]);

        let mut reopened = FileStore::open(&root, GALLERY_SCHEMA).await.unwrap();
        let records = reopened.get_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].display_name, "b");
        assert_eq!(records[0].payload, Bytes::from_static(b"b"));
        assert_eq!(reopened.add(track("c", b"c")).await.unwrap(), 3);

        let lock = root
            .join(GALLERY_SCHEMA.database)
            .join(format!("{}.lock", GALLERY_SCHEMA.store));
        assert!(!lock.exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_stale_lock_is_broken() {
        let root = temp_root("stale");
        let mut store = FileStore::open(&root, PLAYER_SCHEMA).await.unwrap();

        let lock = root
            .join(PLAYER_SCHEMA.database)
            .join(format!("{}.lock", PLAYER_SCHEMA.store));
        let file = std::fs::File::create(&lock).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(120))
            .unwrap();
        drop(file);

        assert_eq!(store.add(track("after crash", b"x")).await.unwrap(), 1);
        assert!(!lock.exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_foreign_catalog_is_unavailable() {
        let root = temp_root("schema");
        let dir = root.join(PLAYER_SCHEMA.database);
        std::fs::create_dir_all(&dir).unwrap();

        let mut foreign = Catalog::new(&PLAYER_SCHEMA);
        foreign.key_path = "uuid".to_string();
        std::fs::write(
            dir.join(format!("{}.json", PLAYER_SCHEMA.store)),
            serde_json::to_string(&foreign).unwrap(),
        )
        .unwrap();

        let err = FileStore::open(&root, PLAYER_SCHEMA).await.err().unwrap();
        assert!(matches!(err, StoreError::StorageUnavailable { .. }));

        let _ = std::fs::remove_dir_all(&root);
    }
}
