//! Source management commands.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use tsundoku_core::SourceManager;

use crate::output::{print_manga, source_line};

/// Source management commands.
#[derive(Debug, Args)]
pub struct SourceArgs {
    #[command(subcommand)]
    pub command: SourceCommand,
}

#[derive(Debug, Subcommand)]
pub enum SourceCommand {
    /// List sources published by the registry
    Remote,

    /// List installed sources
    List,

    /// Show information about an installed source
    Info(NameArgs),

    /// Install a source from the registry
    Install(NameArgs),

    /// Uninstall a source
    Uninstall(NameArgs),

    /// List recently updated manga of a source
    Latest(LatestArgs),
}

/// Arguments naming a source.
#[derive(Debug, Args)]
pub struct NameArgs {
    /// Source name
    pub name: String,
}

/// Arguments for the `source latest` command.
#[derive(Debug, Args)]
pub struct LatestArgs {
    /// Source name
    pub name: String,

    /// Page number, starting at 1
    #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
    pub page: i64,
}

/// Runs the source command.
pub async fn run(manager: &SourceManager, args: SourceArgs) -> Result<()> {
    match args.command {
        SourceCommand::Remote => remote(manager).await,
        SourceCommand::List => {
            list(manager);
            Ok(())
        }
        SourceCommand::Info(ref args) => info(manager, args),
        SourceCommand::Install(ref args) => install(manager, args).await,
        SourceCommand::Uninstall(ref args) => uninstall(manager, args),
        SourceCommand::Latest(ref args) => latest(manager, args).await,
    }
}

async fn remote(manager: &SourceManager) -> Result<()> {
    let sources = manager.list_remote_sources().await?;

    if sources.is_empty() {
        println!("The registry lists no sources.");
        return Ok(());
    }

    for source in &sources {
        println!("{}", source_line(source));
    }
    Ok(())
}

fn list(manager: &SourceManager) {
    let sources = manager.list();

    if sources.is_empty() {
        println!("No sources installed.");
        println!();
        println!("Install one with: tsundoku source install <name>");
        return;
    }

    println!("Installed sources:");
    for source in &sources {
        println!("  {}", source_line(source));
    }
}

fn info(manager: &SourceManager, args: &NameArgs) -> Result<()> {
    let Some(source) = manager.get(&args.name) else {
        bail!("source {} is not installed", args.name);
    };

    println!("Name:         {}", source.name);
    println!("Display name: {}", source.display_name);
    println!("Version:      {}", source.version);
    println!("Capabilities: {}", source.capabilities);
    if let Some(description) = &source.description {
        println!("Description:  {description}");
    }
    if let Some(session) = manager.session(&source.name) {
        let remembered = if session.remember { " (remembered)" } else { "" };
        println!(
            "Logged in:    since {}{remembered}",
            session.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

async fn install(manager: &SourceManager, args: &NameArgs) -> Result<()> {
    println!("Installing {}...", args.name);
    let source = manager.install_source(&args.name).await?;
    println!(
        "Installed {} v{} ({})",
        source.name, source.version, source.capabilities
    );
    Ok(())
}

fn uninstall(manager: &SourceManager, args: &NameArgs) -> Result<()> {
    manager.uninstall_source(&args.name)?;
    println!("Uninstalled {}", args.name);
    Ok(())
}

async fn latest(manager: &SourceManager, args: &LatestArgs) -> Result<()> {
    let manga = manager.get_latest_updates(&args.name, args.page).await?;
    print_manga(&manga, "No updates on this page.");
    Ok(())
}
