//! Manga and chapter commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use tsundoku_core::SourceManager;

use crate::output::{chapter_line, print_chapters};

/// Manga commands.
#[derive(Debug, Args)]
pub struct MangaArgs {
    #[command(subcommand)]
    pub command: MangaCommand,
}

#[derive(Debug, Subcommand)]
pub enum MangaCommand {
    /// Fetch fresh details of a manga
    Details(DetailsArgs),

    /// Fetch the chapter list of a manga
    Chapters(IdArgs),
}

/// Arguments for the `manga details` command.
#[derive(Debug, Args)]
pub struct DetailsArgs {
    /// Manga ID
    pub id: u64,

    /// Include the chapter list
    #[arg(short, long)]
    pub chapters: bool,
}

/// Arguments naming a manga.
#[derive(Debug, Args)]
pub struct IdArgs {
    /// Manga ID
    pub id: u64,
}

/// Arguments for the `chapter` command.
#[derive(Debug, Args)]
pub struct ChapterArgs {
    /// Chapter ID
    pub id: u64,
}

/// Runs the manga command.
pub async fn run(manager: &SourceManager, args: MangaArgs) -> Result<()> {
    match args.command {
        MangaCommand::Details(args) => details(manager, &args).await,
        MangaCommand::Chapters(args) => {
            let chapters = manager.get_chapters(args.id).await?;
            print_chapters(&chapters);
            Ok(())
        }
    }
}

async fn details(manager: &SourceManager, args: &DetailsArgs) -> Result<()> {
    let manga = manager.get_manga_details(args.id, args.chapters).await?;

    println!("{}", manga.title);
    println!("  ID:       {}", manga.id);
    println!("  Source:   {} ({})", manga.source_name, manga.source_native_id);
    if !manga.metadata.authors.is_empty() {
        println!("  Authors:  {}", manga.metadata.authors.join(", "));
    }
    if !manga.metadata.genres.is_empty() {
        println!("  Genres:   {}", manga.metadata.genres.join(", "));
    }
    if let Some(status) = &manga.metadata.status {
        println!("  Status:   {status}");
    }
    if manga.is_favorite {
        println!("  Favorite: yes");
    }
    if let Some(description) = &manga.metadata.description {
        println!();
        println!("{description}");
    }

    if let Some(chapters) = &manga.chapters {
        println!();
        print_chapters(chapters);
    }
    Ok(())
}

/// Runs the chapter command.
pub fn chapter(manager: &SourceManager, args: &ChapterArgs) -> Result<()> {
    let chapter = manager.get_chapter(args.id)?;
    println!("{}", chapter_line(&chapter));
    println!("  Manga:    {}", chapter.manga_id);
    println!("  Source:   {}", chapter.source_native_id);
    Ok(())
}
