//! Media record types

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Store-assigned record identity
pub type RecordId = u64;

/// A persisted media item
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRecord {
    /// Auto-incremented id, unique within one store
    pub id: RecordId,
    /// Name shown in lists (file name without its extension)
    pub display_name: String,
    /// Original file name
    pub source: String,
    /// Sniffed MIME type
    pub media_type: String,
    /// When the record was inserted
    pub added_at: DateTime<Utc>,
    /// Raw file contents
    pub payload: Bytes,
}

/// A record waiting to be inserted; the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub display_name: String,
    pub source: String,
    pub media_type: String,
    pub payload: Bytes,
}

impl NewRecord {
    /// Attach the identity assigned by a store
    pub fn into_record(self, id: RecordId, added_at: DateTime<Utc>) -> MediaRecord {
        MediaRecord {
            id,
            display_name: self.display_name,
            source: self.source,
            media_type: self.media_type,
            added_at,
            payload: self.payload,
        }
    }
}

/// Record metadata without the payload
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSummary {
    pub id: RecordId,
    pub display_name: String,
    pub source: String,
    pub media_type: String,
    pub added_at: DateTime<Utc>,
    /// Payload length in bytes
    pub size: u64,
}

impl MediaRecord {
    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            id: self.id,
            display_name: self.display_name.clone(),
            source: self.source.clone(),
            media_type: self.media_type.clone(),
            added_at: self.added_at,
            size: self.payload.len() as u64,
        }
    }
}
