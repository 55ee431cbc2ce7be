//! mediashelf - Image gallery and music playlist kept on disk

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod collection;
mod config;
mod ingest;
mod media;
mod store;
mod utils;
mod view;
mod widget;

use cli::{Cli, Commands, GalleryCommand, PlayerCommand};
use config::Settings;
use widget::WidgetKind;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "mediashelf=debug"
    } else {
        "mediashelf=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(utils::ConditionalStderrLayer::new(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        ))
        .init();

    match cli.command {
        Commands::Gallery { command } => {
            let (settings, root) = load_settings(cli.data_dir)?;
            match command {
                GalleryCommand::Add(args) => {
                    cli::commands::add(WidgetKind::Gallery, &root, &settings, args).await?;
                }
                GalleryCommand::List { source } => {
                    cli::commands::list(WidgetKind::Gallery, &root, source).await?;
                }
                GalleryCommand::Remove(args) => {
                    cli::commands::remove(WidgetKind::Gallery, &root, args).await?;
                }
                GalleryCommand::Show => {
                    cli::commands::show(&root, &settings).await?;
                }
            }
        }
        Commands::Player { command } => {
            let (settings, root) = load_settings(cli.data_dir)?;
            match command {
                PlayerCommand::Add(args) => {
                    cli::commands::add(WidgetKind::Player, &root, &settings, args).await?;
                }
                PlayerCommand::List { name } => {
                    cli::commands::list(WidgetKind::Player, &root, name).await?;
                }
                PlayerCommand::Remove(args) => {
                    cli::commands::remove(WidgetKind::Player, &root, args).await?;
                }
                PlayerCommand::Play { shuffle, repeat } => {
                    cli::commands::play(&root, &settings, shuffle, repeat).await?;
                }
            }
        }
        Commands::Config {
            slideshow_secs,
            skip_secs,
            set_data_dir,
            reset,
        } => {
            cli::commands::config(slideshow_secs, skip_secs, set_data_dir, reset)?;
        }
        Commands::Completion { shell } => {
            cli::commands::completion(shell);
        }
    }

    Ok(())
}

/// Settings plus the resolved data directory
fn load_settings(data_dir: Option<PathBuf>) -> Result<(Settings, PathBuf)> {
    let settings = Settings::load()?;
    let root = settings.data_dir(data_dir)?;
    Ok((settings, root))
}
