//! In-memory projection of a store's records

use bytes::Bytes;

use crate::store::{MediaRecord, RecordId};

/// Read-only projection of one record
#[derive(Debug, Clone, PartialEq)]
pub struct ViewEntry {
    pub id: RecordId,
    pub name: String,
    pub source: String,
    pub media_type: String,
    /// Shared handle to the payload, handed to decoders
    pub handle: Bytes,
}

impl From<MediaRecord> for ViewEntry {
    fn from(record: MediaRecord) -> Self {
        Self {
            id: record.id,
            name: record.display_name,
            source: record.source,
            media_type: record.media_type,
            handle: record.payload,
        }
    }
}

/// Records in store enumeration order
#[derive(Debug, Clone, Default)]
pub struct CollectionView {
    entries: Vec<ViewEntry>,
}

impl CollectionView {
    pub fn from_records(records: Vec<MediaRecord>) -> Self {
        Self {
            entries: records.into_iter().map(ViewEntry::from).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ViewEntry> {
        self.entries.get(index)
    }

    /// Current position of a record
    pub fn position(&self, id: RecordId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn push(&mut self, entry: ViewEntry) {
        self.entries.push(entry);
    }

    /// Remove a record, returning the position it held
    pub fn remove(&mut self, id: RecordId) -> Option<usize> {
        let position = self.position(id)?;
        self.entries.remove(position);
        Some(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ViewEntry> {
        self.entries.iter()
    }
}
