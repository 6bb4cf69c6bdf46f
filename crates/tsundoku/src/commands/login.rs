//! Login command.

use anyhow::{Result, bail};
use clap::Args;
use tsundoku_core::SourceManager;

/// Arguments for the `login` command.
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Source name
    pub source: String,

    /// Account name
    #[arg(short, long)]
    pub username: String,

    /// Account password
    #[arg(short, long, env = "TSUNDOKU_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Two-factor code
    #[arg(short, long)]
    pub two_factor: Option<String>,

    /// Keep the session across restarts
    #[arg(short, long)]
    pub remember: bool,
}

/// Runs the login command.
pub async fn run(manager: &SourceManager, args: LoginArgs) -> Result<()> {
    let Some(password) = args.password.as_deref() else {
        bail!("a password is required: pass --password or set TSUNDOKU_PASSWORD");
    };

    let session = manager
        .login(
            &args.source,
            &args.username,
            password,
            args.two_factor.as_deref(),
            args.remember,
        )
        .await?;

    print!("Logged in to {} as {}", session.source_name, args.username);
    if let Some(expires_at) = session.expires_at {
        print!(" (expires {})", expires_at.format("%Y-%m-%d %H:%M"));
    }
    println!();
    if session.remember {
        println!("Session will be remembered.");
    }
    Ok(())
}
