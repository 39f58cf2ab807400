//! containerd-templates CLI entry point
//!
//! Parses arguments, runs the selected command, and prints errors with
//! suggestions before exiting non-zero.

use anyhow::Result;
use clap::Parser;
use containerd_templates::cli;
use containerd_templates::core::user_friendly_error;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute() {
        Ok(()) => Ok(()),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
