//! A widget's store, its live view and the cursor over it
//!
//! Every store call is awaited before the view or cursor changes, so a failed
//! call leaves the shelf exactly as it was.

use rand::Rng;
use tracing::debug;

use super::advance::next_index;
use super::{Advance, AdvancePolicy, CollectionView, Cursor, CursorError, ViewEntry};
use crate::store::{NewRecord, ObjectStore, RecordId, StoreError};

/// Result of inserting a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inserted {
    pub id: RecordId,
    /// This was the first record of the collection
    pub first: bool,
}

/// Result of deleting a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removed {
    /// The deleted record was the current one
    pub was_active: bool,
    /// The collection is now empty
    pub now_empty: bool,
}

pub struct Shelf {
    store: Box<dyn ObjectStore>,
    view: CollectionView,
    cursor: Cursor,
    revision: u64,
}

impl Shelf {
    /// Wrap an open store with an empty view; call [`Shelf::reload`] to fill it
    pub fn new(store: Box<dyn ObjectStore>) -> Self {
        Self {
            store,
            view: CollectionView::default(),
            cursor: Cursor::Empty,
            revision: 0,
        }
    }

    /// Replace the view with the store's contents and point at the first entry
    pub async fn reload(&mut self) -> Result<(), StoreError> {
        let records = self.store.get_all().await?;
        debug!("Loaded {} records from {}", records.len(), self.store.schema().store);

        self.view = CollectionView::from_records(records);
        self.cursor = self
            .view
            .get(0)
            .map(|entry| Cursor::at(entry.id))
            .unwrap_or(Cursor::Empty);
        self.touch();
        Ok(())
    }

    pub fn view(&self) -> &CollectionView {
        &self.view
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Bumped on every change a view needs to reflect
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Mark the shelf changed without touching the collection
    pub fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn active_index(&self) -> Option<usize> {
        self.cursor.index_in(&self.view)
    }

    pub fn active_entry(&self) -> Option<&ViewEntry> {
        self.active_index().and_then(|index| self.view.get(index))
    }

    /// Persist a record and append it to the view
    pub async fn insert(&mut self, record: NewRecord) -> Result<Inserted, StoreError> {
        let stored = record.clone();
        let id = self.store.add(record).await?;

        let first = self.view.is_empty();
        self.view.push(ViewEntry {
            id,
            name: stored.display_name,
            source: stored.source,
            media_type: stored.media_type,
            handle: stored.payload,
        });
        if first {
            self.cursor = Cursor::at(id);
        }
        self.touch();
        Ok(Inserted { id, first })
    }

    /// Delete a record from the store, then from the view
    ///
    /// When the current record goes, the cursor moves to the entry that took
    /// its place, or to the new last entry.
    pub async fn remove(&mut self, id: RecordId) -> Result<Removed, StoreError> {
        self.store.delete(id).await?;

        let was_active = self.cursor.active_id() == Some(id);
        if let Some(position) = self.view.remove(id) {
            if self.view.is_empty() {
                self.cursor = Cursor::Empty;
            } else if was_active {
                let clamped = position.min(self.view.len() - 1);
                self.cursor = self
                    .view
                    .get(clamped)
                    .map(|entry| Cursor::at(entry.id))
                    .unwrap_or(Cursor::Empty);
            }
            self.touch();
        }

        Ok(Removed {
            was_active,
            now_empty: self.view.is_empty(),
        })
    }

    /// Make the entry at `index` current
    pub fn select(&mut self, index: usize) -> Result<RecordId, CursorError> {
        let entry = self.view.get(index).ok_or(CursorError::IndexOutOfRange {
            index,
            len: self.view.len(),
        })?;
        let id = entry.id;
        self.cursor = Cursor::at(id);
        self.touch();
        Ok(id)
    }

    /// Move the cursor per `policy`; `None` when the collection is empty
    pub fn advance<R: Rng>(&mut self, policy: AdvancePolicy, rng: &mut R) -> Option<Advance> {
        let current = self.active_index()?;
        let advance = next_index(current, self.view.len(), policy, rng)?;

        match advance {
            Advance::To(index) => {
                if let Some(entry) = self.view.get(index) {
                    self.cursor = Cursor::at(entry.id);
                }
            }
            Advance::StopAtEnd => {
                if let Cursor::Active { id, .. } = self.cursor {
                    self.cursor = Cursor::Active {
                        id,
                        stopped_at_end: true,
                    };
                }
            }
        }
        self.touch();
        Some(advance)
    }

    /// Leave the stopped-at-end state without moving
    pub fn resume(&mut self) {
        if let Cursor::Active {
            id,
            stopped_at_end: true,
        } = self.cursor
        {
            self.cursor = Cursor::at(id);
            self.touch();
        }
    }
}
