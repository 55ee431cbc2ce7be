//! CLI command handlers

use anyhow::{Context, Result};
use clap_complete::generate;
use colored::Colorize;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::Path;
use std::time::Instant;

use super::{AddArgs, RemoveArgs};
use crate::collection::{PlaybackMode, Shelf};
use crate::config::Settings;
use crate::ingest::{Ingestor, store_batch};
use crate::media::ClockBackend;
use crate::store::{MediaRecord, ObjectStore};
use crate::view;
use crate::widget::{self, GalleryController, PlayerController, WidgetKind};

/// Open the persistent store for a command that writes to it
///
/// Writes to a session-only store would be lost, so there is no fallback here.
async fn open_persistent(root: &Path, kind: WidgetKind) -> Result<Box<dyn ObjectStore>> {
    widget::open_store(root, kind)
        .await
        .with_context(|| format!("Cannot open the {} store in {}", kind.noun(), root.display()))
}

/// Handle the `add` command
pub async fn add(kind: WidgetKind, root: &Path, settings: &Settings, args: AddArgs) -> Result<()> {
    let store = open_persistent(root, kind).await?;
    let mut shelf = Shelf::new(store);
    shelf
        .reload()
        .await
        .with_context(|| format!("Failed to load the {} store", kind.noun()))?;

    let parallel = args.parallel.unwrap_or(settings.read_parallelism);
    let ingestor = Ingestor::new(kind.media_kind(), parallel);

    let pb = ProgressBar::new(args.files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    let batch = ingestor.read_batch(args.files, &pb).await;
    let report = store_batch(&mut shelf, batch).await;

    println!();
    if !report.added.is_empty() {
        println!(
            "{}",
            format!("Added {} {}(s)", report.added.len(), kind.noun()).green().bold()
        );
    }
    if !report.failed.is_empty() {
        println!("{}", format!("Skipped {} file(s):", report.failed.len()).yellow().bold());
        for failure in &report.failed {
            println!("  {} - {}", failure.path.display(), failure.error);
        }
    }
    println!("  Total: {} {}(s)", shelf.view().len(), kind.noun());

    if report.added.is_empty() && !report.failed.is_empty() {
        anyhow::bail!("No files were added");
    }
    Ok(())
}

/// Handle the `list` command
pub async fn list(kind: WidgetKind, root: &Path, filter: Option<String>) -> Result<()> {
    let store = open_persistent(root, kind).await?;

    let records = match &filter {
        Some(key) => store.get_all_by_index(key).await?,
        None => store.get_all().await?,
    };

    if records.is_empty() {
        match filter {
            Some(key) => println!(
                "{}",
                format!("No {} matches '{}'.", kind.noun(), key).yellow()
            ),
            None => println!("{}", kind.empty_message().yellow()),
        }
        return Ok(());
    }

    println!("{}", format!("{} {}(s):", records.len(), kind.noun()).green().bold());
    for record in &records {
        print_record(record);
    }

    Ok(())
}

fn print_record(record: &MediaRecord) {
    println!(
        "  {:>4}  {}  {} ({}, {:.1} KB, added {})",
        record.id.to_string().cyan(),
        record.display_name.bold(),
        record.source,
        record.media_type,
        record.payload.len() as f64 / 1024.0,
        record.added_at.format("%Y-%m-%d %H:%M")
    );
}

/// Handle the `remove` command
pub async fn remove(kind: WidgetKind, root: &Path, args: RemoveArgs) -> Result<()> {
    let mut store = open_persistent(root, kind).await?;

    // Metadata only, so a record whose payload is damaged can still go
    let record = store
        .summaries()
        .await?
        .into_iter()
        .find(|r| r.id == args.id)
        .ok_or_else(|| anyhow::anyhow!("No {} with id {}", kind.noun(), args.id))?;

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {} '{}'?", kind.noun(), record.display_name))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", "Nothing deleted.".yellow());
            return Ok(());
        }
    }

    store
        .delete(record.id)
        .await
        .with_context(|| format!("Failed to delete {} {}", kind.noun(), record.id))?;

    println!(
        "{} {} '{}'",
        "Deleted".green().bold(),
        kind.noun(),
        record.display_name
    );
    Ok(())
}

/// Handle the `gallery show` command
pub async fn show(root: &Path, settings: &Settings) -> Result<()> {
    let store = widget::open_store_or_session(root, WidgetKind::Gallery).await;
    let mut gallery =
        GalleryController::open(store, settings.slideshow_interval(), Instant::now()).await;

    let ingestor = Ingestor::new(WidgetKind::Gallery.media_kind(), settings.read_parallelism);
    view::run_gallery(&mut gallery, &ingestor).await?;

    println!(
        "Gallery closed ({} images).",
        gallery.shelf().view().len()
    );
    Ok(())
}

/// Handle the `player play` command
pub async fn play(root: &Path, settings: &Settings, shuffle: bool, repeat: bool) -> Result<()> {
    let store = widget::open_store_or_session(root, WidgetKind::Player).await;
    let mut player = PlayerController::open(store, Box::new(ClockBackend), settings)
        .await
        .with_mode(PlaybackMode {
            shuffle,
            repeat_at_end: repeat,
        });

    let ingestor = Ingestor::new(WidgetKind::Player.media_kind(), settings.read_parallelism);
    view::run_player(&mut player, &ingestor).await?;

    println!("Player closed ({} tracks).", player.shelf().view().len());
    Ok(())
}

/// Handle the `config` command
pub fn config(
    slideshow_secs: Option<u64>,
    skip_secs: Option<f64>,
    data_dir: Option<std::path::PathBuf>,
    reset: bool,
) -> Result<()> {
    let path = Settings::settings_path()?;
    let mut settings = if reset {
        Settings::default()
    } else {
        Settings::load_from(&path)?
    };

    let changed = reset || slideshow_secs.is_some() || skip_secs.is_some() || data_dir.is_some();
    if let Some(secs) = slideshow_secs {
        settings.slideshow_interval_secs = secs;
    }
    if let Some(secs) = skip_secs {
        settings.skip_secs = secs;
    }
    if let Some(dir) = data_dir {
        settings.data_dir = Some(dir);
    }
    settings.validate()?;

    if changed {
        settings.save_to(&path)?;
        println!("{}", "Settings saved.".green().bold());
    }

    println!("{} {}", "Settings:".bold(), path.display());
    let data_dir = settings
        .data_dir(None)
        .map(|d| d.display().to_string())
        .unwrap_or_else(|_| "(unknown)".to_string());
    println!("  Data directory:    {}", data_dir);
    println!("  Slideshow:         every {}s", settings.slideshow_interval_secs);
    println!("  Skip:              {}s", settings.skip_secs);
    println!("  Previous restarts: after {}s", settings.restart_threshold_secs);
    println!("  Parallel reads:    {}", settings.read_parallelism);

    Ok(())
}

/// Handle the `completion` command
pub fn completion(shell: clap_complete::Shell) {
    let mut cmd = super::Cli::command();
    generate(shell, &mut cmd, "mediashelf", &mut io::stdout());
}

// Extension trait for Cli to get clap Command
impl super::Cli {
    fn command() -> clap::Command {
        <Self as clap::CommandFactory>::command()
    }
}
