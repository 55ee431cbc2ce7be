//! Current-item cursor

use thiserror::Error;

use super::CollectionView;
use crate::store::RecordId;

/// Which entry of the view is current
///
/// The active entry is remembered by record id, so deleting other entries
/// never moves the cursor onto a different record. Its index is recomputed
/// from the view whenever it is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    /// The collection is empty
    #[default]
    Empty,
    /// An entry is current
    Active {
        id: RecordId,
        /// Playback ran off the end of the list and halted here
        stopped_at_end: bool,
    },
}

impl Cursor {
    pub fn at(id: RecordId) -> Self {
        Cursor::Active {
            id,
            stopped_at_end: false,
        }
    }

    pub fn active_id(&self) -> Option<RecordId> {
        match self {
            Cursor::Empty => None,
            Cursor::Active { id, .. } => Some(*id),
        }
    }

    pub fn index_in(&self, view: &CollectionView) -> Option<usize> {
        self.active_id().and_then(|id| view.position(id))
    }

    pub fn is_stopped_at_end(&self) -> bool {
        matches!(
            self,
            Cursor::Active {
                stopped_at_end: true,
                ..
            }
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CursorError {
    #[error("index {index} is out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },
}
