//! Favorites commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use tsundoku_core::SourceManager;

use crate::output::{print_manga, update_line};

/// Favorites commands.
#[derive(Debug, Args)]
pub struct FavoriteArgs {
    #[command(subcommand)]
    pub command: FavoriteCommand,
}

#[derive(Debug, Subcommand)]
pub enum FavoriteCommand {
    /// Mark a manga as favorite
    Add(IdArgs),

    /// Remove a manga from the favorites
    Remove(IdArgs),

    /// List favorite manga
    List,

    /// Show chapters of favorite manga, newest release first
    Updates(UpdatesArgs),
}

/// Arguments naming a manga.
#[derive(Debug, Args)]
pub struct IdArgs {
    /// Manga ID
    pub id: u64,
}

/// Arguments of `favorite updates`.
#[derive(Debug, Args)]
pub struct UpdatesArgs {
    /// Maximum number of chapters to show
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Runs the favorite command.
pub fn run(manager: &SourceManager, args: FavoriteArgs) -> Result<()> {
    match args.command {
        FavoriteCommand::Add(args) => {
            manager.save_favorite(args.id)?;
            println!("Added {} to favorites", args.id);
        }
        FavoriteCommand::Remove(args) => {
            manager.delete_favorite(args.id)?;
            println!("Removed {} from favorites", args.id);
        }
        FavoriteCommand::List => {
            print_manga(&manager.list_favorites(), "No favorites yet.");
        }
        FavoriteCommand::Updates(args) => {
            let updates = manager.recent_updates(args.limit);
            if updates.is_empty() {
                println!("No chapters of favorites fetched yet.");
            }
            for update in &updates {
                println!("{}", update_line(update));
            }
        }
    }
    Ok(())
}
