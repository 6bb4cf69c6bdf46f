//! CLI definition.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tsundoku_core::SourceManager;

use crate::{app, commands};

/// Install manga sources from a registry and browse them from one interface.
#[derive(Debug, Parser)]
#[command(name = "tsundoku")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, env = "TSUNDOKU_CONFIG")]
    pub config: Option<PathBuf>,

    /// Source registry URL or directory, overriding the configuration
    #[arg(long, global = true, env = "TSUNDOKU_REGISTRY")]
    pub registry: Option<String>,

    /// Data directory, overriding the configuration
    #[arg(long, global = true, env = "TSUNDOKU_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage sources (remote, list, info, install, uninstall, latest)
    Source(commands::source::SourceArgs),

    /// Search an installed source
    Search(commands::search::SearchArgs),

    /// Show manga details and chapters
    Manga(commands::manga::MangaArgs),

    /// Show a chapter
    Chapter(commands::manga::ChapterArgs),

    /// Log in to a source
    Login(commands::login::LoginArgs),

    /// Manage favorites (add, remove, list)
    Favorite(commands::favorite::FavoriteArgs),
}

impl Cli {
    /// Runs the CLI command.
    pub fn run(self) -> Result<()> {
        let config = app::load_config(&self)?;
        app::init_logging(&config, self.verbose);

        let manager = app::open_manager(&config)?;

        // Create a tokio runtime for async operations
        let rt = tokio::runtime::Runtime::new().context("failed to create async runtime")?;

        rt.block_on(dispatch(&manager, self.command))
    }
}

async fn dispatch(manager: &SourceManager, command: Commands) -> Result<()> {
    match command {
        Commands::Source(args) => commands::source::run(manager, args).await,
        Commands::Search(args) => commands::search::run(manager, &args).await,
        Commands::Manga(args) => commands::manga::run(manager, args).await,
        Commands::Chapter(ref args) => commands::manga::chapter(manager, args),
        Commands::Login(args) => commands::login::run(manager, args).await,
        Commands::Favorite(args) => commands::favorite::run(manager, args),
    }
}
