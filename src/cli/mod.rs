//! CLI module for mediashelf

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser, Debug)]
#[command(name = "mediashelf", about = "Keep an image gallery and a music playlist on disk")]
#[command(version, author)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding the media stores
    #[arg(long, global = true, env = "MEDIASHELF_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage and view the image gallery
    Gallery {
        #[command(subcommand)]
        command: GalleryCommand,
    },

    /// Manage and play the music playlist
    Player {
        #[command(subcommand)]
        command: PlayerCommand,
    },

    /// Show or change settings
    Config {
        /// Seconds between slideshow advances
        #[arg(long, value_name = "SECS")]
        slideshow_secs: Option<u64>,

        /// Seconds skipped by the forward/back controls
        #[arg(long, value_name = "SECS")]
        skip_secs: Option<f64>,

        /// Store the data directory in the settings file
        #[arg(long = "set-data-dir", value_name = "DIR")]
        set_data_dir: Option<PathBuf>,

        /// Restore default settings
        #[arg(long, conflicts_with_all = ["slideshow_secs", "skip_secs", "set_data_dir"])]
        reset: bool,
    },

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

/// Files to ingest
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Files to add, in order
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Number of files read at once (defaults to the settings value)
    #[arg(short, long)]
    pub parallel: Option<usize>,
}

/// Record to delete
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Record id, as shown by `list`
    pub id: u64,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Subcommand, Debug)]
pub enum GalleryCommand {
    /// Add images to the gallery
    Add(AddArgs),

    /// List stored images
    List {
        /// Only images whose source file name matches exactly
        #[arg(long, value_name = "NAME")]
        source: Option<String>,
    },

    /// Delete an image
    Remove(RemoveArgs),

    /// Run the slideshow in the terminal
    Show,
}

#[derive(Subcommand, Debug)]
pub enum PlayerCommand {
    /// Add tracks to the playlist
    Add(AddArgs),

    /// List stored tracks
    List {
        /// Only tracks with this display name
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
    },

    /// Delete a track
    Remove(RemoveArgs),

    /// Open the player in the terminal
    Play {
        /// Start with shuffle on
        #[arg(long)]
        shuffle: bool,

        /// Start with repeat-at-end on
        #[arg(long)]
        repeat: bool,
    },
}
