//! Tsundoku CLI - Install manga sources and browse them from one interface.

use std::process::ExitCode;

use clap::Parser;
use tsundoku_core::{ErrorKind, ManagerError};

mod app;
mod cli;
mod commands;
mod output;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    match cli.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            if err
                .downcast_ref::<ManagerError>()
                .is_some_and(|e| e.kind() == ErrorKind::TwoFactorRequired)
            {
                eprintln!("hint: retry with --two-factor <CODE>");
            }
            ExitCode::FAILURE
        }
    }
}
