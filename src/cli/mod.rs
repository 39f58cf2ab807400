//! Command-line interface for containerd-templates.
//!
//! # Commands
//!
//! - `containerd` - render containerd `config.toml` (schema 2 or 3), optionally
//!   layered with an override template
//! - `hosts` - render a registry's `hosts.toml`
//! - `helpers` - list the helper filters available to templates
//!
//! # Global Options
//!
//! - `--verbose` - debug logging
//! - `--quiet` - errors only
//!
//! `RUST_LOG` takes precedence over both when set.
//!
//! # Examples
//!
//! ```bash
//! containerd-templates containerd --schema 3 --context node.yaml
//! containerd-templates containerd --context node.yaml --output /var/lib/rancher/k3s/agent/etc/containerd/config.toml
//! containerd-templates hosts --context docker.io.yaml --output certs.d/docker.io/hosts.toml --check
//! ```

mod common;
mod containerd;
mod helpers;
mod hosts;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

pub use containerd::ContainerdCommand;
pub use helpers::HelpersCommand;
pub use hosts::HostsCommand;

/// Runtime settings derived from the global flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl CliConfig {
    /// Install the global tracing subscriber. Logs go to stderr so rendered
    /// output on stdout stays clean.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.log_level));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Render containerd configuration files from typed node and registry settings.
#[derive(Parser, Debug)]
#[command(name = "containerd-templates", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render containerd config.toml
    Containerd(ContainerdCommand),

    /// Render a registry hosts.toml
    Hosts(HostsCommand),

    /// List template helper filters
    Helpers(HelpersCommand),
}

impl Cli {
    /// Map global flags to a [`CliConfig`].
    ///
    /// ```rust,ignore
    /// let cli = Cli::parse_from(["containerd-templates", "--verbose", "helpers"]);
    /// assert_eq!(cli.build_config().log_level, "debug");
    /// ```
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        };
        CliConfig {
            log_level: log_level.to_string(),
        }
    }

    /// Initialise logging and run the selected command.
    ///
    /// # Errors
    ///
    /// Whatever the command returns; see [`crate::core::TemplatesError`].
    pub fn execute(self) -> Result<()> {
        self.build_config().init_logging();

        match self.command {
            Commands::Containerd(cmd) => cmd.execute(),
            Commands::Hosts(cmd) => cmd.execute(),
            Commands::Helpers(cmd) => cmd.execute(),
        }
    }
}
