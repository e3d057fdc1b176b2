// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Parser
//!
//! Command-line surface for the `aetherframe` binary. This is operator
//! tooling for starting processes and running migrations, not a rich
//! terminal front-end for submitting or browsing analysis jobs — that stays
//! behind the HTTP API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "aetherframe")]
#[command(about = concat!("AetherFrame pipeline orchestration engine v", env!("CARGO_PKG_VERSION")))]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose (debug-level) logging regardless of the configured
    /// log level.
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to a layered configuration file (TOML/YAML/JSON, resolved by
    /// the `config` crate); environment variables and subcommand flags
    /// still take precedence over values read from it.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the SQLite connection string (e.g. `sqlite://data/aetherframe.db`).
    #[arg(long)]
    pub database_url: Option<String>,

    /// Override the structured log format (`json` or `pretty`).
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP API and the worker pool in a single process.
    Serve {
        /// Override the HTTP bind address (e.g. `0.0.0.0:8080`).
        #[arg(long)]
        http_bind: Option<String>,

        /// Override the number of jobs processed concurrently.
        #[arg(long)]
        max_concurrent_jobs: Option<usize>,
    },

    /// Run only the HTTP API; jobs are enqueued but not executed here.
    ApiOnly {
        #[arg(long)]
        http_bind: Option<String>,
    },

    /// Run only the worker pool against the shared queue and store; no HTTP
    /// listener is bound.
    WorkerOnly {
        #[arg(long)]
        max_concurrent_jobs: Option<usize>,
    },

    /// Apply pending database migrations and exit.
    Migrate {
        /// Report which migrations would run without applying them.
        #[arg(long)]
        dry_run: bool,
    },
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_internally_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_serve_with_overrides() {
        let cli = Cli::parse_from(["aetherframe", "serve", "--http-bind", "0.0.0.0:9000", "--max-concurrent-jobs", "4"]);
        match cli.command {
            Commands::Serve { http_bind, max_concurrent_jobs } => {
                assert_eq!(http_bind.as_deref(), Some("0.0.0.0:9000"));
                assert_eq!(max_concurrent_jobs, Some(4));
            }
            other => panic!("expected Serve, got {other:?}"),
        }
    }

    #[test]
    fn parses_migrate_dry_run() {
        let cli = Cli::parse_from(["aetherframe", "migrate", "--dry-run"]);
        assert!(matches!(cli.command, Commands::Migrate { dry_run: true }));
    }

    #[test]
    fn global_flags_are_shared_across_subcommands() {
        let cli = Cli::parse_from(["aetherframe", "--verbose", "--config", "/tmp", "worker-only"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp")));
    }
}
