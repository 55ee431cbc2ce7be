//! Persistent media store module
//!
//! Each widget owns one object store holding its media records. Records get an
//! auto-incremented id on insert and are never modified afterwards.

pub mod error;
pub mod file;
pub mod index;
pub mod memory;
pub mod record;
pub mod schema;

use async_trait::async_trait;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use record::{MediaRecord, NewRecord, RecordId, RecordSummary};
pub use schema::{IndexField, StoreSchema, GALLERY_SCHEMA, PLAYER_SCHEMA};

/// Key-value object store for media records
///
/// Every call is atomic on its own. There is no update operation.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Schema this store was opened with
    fn schema(&self) -> &StoreSchema;

    /// Insert a record and return the id assigned to it
    async fn add(&mut self, record: NewRecord) -> Result<RecordId, StoreError>;

    /// All readable records in insertion order
    async fn get_all(&self) -> Result<Vec<MediaRecord>, StoreError>;

    /// Metadata of every record in insertion order, payloads not loaded
    async fn summaries(&self) -> Result<Vec<RecordSummary>, StoreError>;

    /// Records whose secondary index key equals `key`, in insertion order
    async fn get_all_by_index(&self, key: &str) -> Result<Vec<MediaRecord>, StoreError>;

    /// Remove a record. Removing an unknown id succeeds.
    async fn delete(&mut self, id: RecordId) -> Result<(), StoreError>;
}
