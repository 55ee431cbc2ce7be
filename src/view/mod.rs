//! Snapshots and terminal surfaces

pub mod snapshot;
pub mod tui;

pub use tui::{run_gallery, run_player};
