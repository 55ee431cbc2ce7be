//! Session-only object store

use async_trait::async_trait;
use chrono::Utc;

use super::index::SecondaryIndex;
use super::{MediaRecord, NewRecord, ObjectStore, RecordId, RecordSummary, StoreError, StoreSchema};

/// Object store that lives only as long as the process
///
/// Used when the persistent store cannot be opened, so a widget can still run
/// for the current session.
pub struct MemoryStore {
    schema: StoreSchema,
    records: Vec<MediaRecord>,
    next_id: RecordId,
    index: SecondaryIndex,
}

impl MemoryStore {
    pub fn open(schema: StoreSchema) -> Self {
        Self {
            schema,
            records: Vec::new(),
            next_id: 1,
            index: SecondaryIndex::new(schema.index_field),
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn schema(&self) -> &StoreSchema {
        &self.schema
    }

    async fn add(&mut self, record: NewRecord) -> Result<RecordId, StoreError> {
        let id = self.next_id;
        self.next_id += 1;
        self.index.insert(id, &record.display_name, &record.source);
        self.records.push(record.into_record(id, Utc::now()));
        Ok(id)
    }

    async fn get_all(&self) -> Result<Vec<MediaRecord>, StoreError> {
        Ok(self.records.clone())
    }

    async fn summaries(&self) -> Result<Vec<RecordSummary>, StoreError> {
        Ok(self.records.iter().map(MediaRecord::summary).collect())
    }

    async fn get_all_by_index(&self, key: &str) -> Result<Vec<MediaRecord>, StoreError> {
        let ids = self.index.lookup(key);
        Ok(self
            .records
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn delete(&mut self, id: RecordId) -> Result<(), StoreError> {
        if let Some(position) = self.records.iter().position(|r| r.id == id) {
            let record = self.records.remove(position);
            self.index.remove(id, &record.display_name, &record.source);
        }
        Ok(())
    }
}
