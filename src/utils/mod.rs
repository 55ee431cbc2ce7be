//! Utility functions

pub mod tui_log;

pub use tui_log::{set_tui_mode, ConditionalStderrLayer};
