//! Ordered media collection and its current-item cursor

pub mod advance;
pub mod cursor;
pub mod shelf;
pub mod view;

pub use advance::{Advance, AdvancePolicy, NavigationInfo, PlaybackMode};
pub use cursor::{Cursor, CursorError};
pub use shelf::{Removed, Shelf};
pub use view::{CollectionView, ViewEntry};
