// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Layered application configuration: a config file, then environment
//! variables (prefix `AETHERFRAME_`), then CLI flags, each overriding the
//! last. Every key has a sensible default so the binary runs unconfigured
//! in a throwaway environment.

use std::path::PathBuf;

use aetherframe_bootstrap::cli::Cli;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Fully-resolved application settings, after file/env/CLI layering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root directory under which each job gets its own `workspace_dir`,
    /// named by job id.
    pub workspace_base: PathBuf,

    /// Root directory under which each job gets its own `artifacts_dir`.
    /// Unlike `workspace_base`, this directory is never deleted.
    pub artifacts_base: PathBuf,

    /// How many jobs a worker process runs concurrently.
    pub max_concurrent_jobs: usize,

    /// Pipeline id used when a job submission omits one.
    pub default_pipeline: String,

    /// Whether the worker deletes a job's workspace directory once the
    /// job reaches a terminal state.
    pub cleanup_workspace: bool,

    /// Origins allowed by the HTTP API's CORS layer. An empty list means
    /// no cross-origin requests are permitted.
    pub cors_origins: Vec<String>,

    /// Free-form deployment environment label, surfaced by `GET /status`.
    pub environment: String,

    /// SQLite connection string, e.g. `sqlite://data/aetherframe.db`.
    pub database_url: String,

    /// Address the HTTP API binds to in `serve`/`api-only` mode.
    pub http_bind_addr: String,

    /// Address the Prometheus scrape endpoint would bind to if run as a
    /// standalone listener. Not used while `/metrics` is served from the
    /// same `http_bind_addr` app (see `aetherframe_core::http`); carried
    /// as a configuration key for a future split deployment.
    pub metrics_bind_addr: String,

    /// `"json"` or `"pretty"`.
    pub log_format: String,

    /// `trace`/`debug`/`info`/`warn`/`error`, or a `tracing_subscriber`
    /// filter directive string.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            workspace_base: PathBuf::from("./data/workspace"),
            artifacts_base: PathBuf::from("./data/artifacts"),
            max_concurrent_jobs: 4,
            default_pipeline: "quicklook".to_string(),
            cleanup_workspace: true,
            cors_origins: Vec::new(),
            environment: "development".to_string(),
            database_url: "sqlite://aetherframe.db".to_string(),
            http_bind_addr: "0.0.0.0:8080".to_string(),
            metrics_bind_addr: "0.0.0.0:9090".to_string(),
            log_format: "pretty".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads settings layered as: the config file named on the CLI (if
    /// any, any format the `config` crate sniffs from its extension) →
    /// `AETHERFRAME_*` environment variables → explicit CLI overrides.
    /// Every layer is optional; defaults apply where none supply a key.
    pub fn load(cli: &Cli) -> Result<AppConfig, config::ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

        if let Some(path) = &cli.config {
            builder = builder.add_source(File::from(path.clone()).required(true));
        }

        builder = builder.add_source(Environment::with_prefix("AETHERFRAME").separator("__"));

        let mut settings: AppConfig = builder.build()?.try_deserialize()?;

        if let Some(database_url) = &cli.database_url {
            settings.database_url = database_url.clone();
        }
        if let Some(log_format) = &cli.log_format {
            settings.log_format = log_format.clone();
        }
        if cli.verbose {
            settings.log_level = "debug".to_string();
        }

        apply_subcommand_overrides(&mut settings, &cli.command);

        Ok(settings)
    }
}

fn apply_subcommand_overrides(settings: &mut AppConfig, command: &aetherframe_bootstrap::Commands) {
    use aetherframe_bootstrap::Commands;

    match command {
        Commands::Serve { http_bind, max_concurrent_jobs } => {
            if let Some(bind) = http_bind {
                settings.http_bind_addr = bind.clone();
            }
            if let Some(n) = max_concurrent_jobs {
                settings.max_concurrent_jobs = *n;
            }
        }
        Commands::ApiOnly { http_bind } => {
            if let Some(bind) = http_bind {
                settings.http_bind_addr = bind.clone();
            }
        }
        Commands::WorkerOnly { max_concurrent_jobs } => {
            if let Some(n) = max_concurrent_jobs {
                settings.max_concurrent_jobs = *n;
            }
        }
        Commands::Migrate { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aetherframe_bootstrap::Commands;

    fn cli_with(command: Commands) -> Cli {
        Cli {
            command,
            verbose: false,
            config: None,
            database_url: None,
            log_format: None,
        }
    }

    #[test]
    fn defaults_apply_with_no_file_or_env() {
        let cli = cli_with(Commands::WorkerOnly { max_concurrent_jobs: None });
        let settings = AppConfig::load(&cli).unwrap();
        assert_eq!(settings.max_concurrent_jobs, 4);
        assert_eq!(settings.default_pipeline, "quicklook");
        assert!(settings.cleanup_workspace);
    }

    #[test]
    fn serve_subcommand_flags_override_the_defaults() {
        let cli = cli_with(Commands::Serve {
            http_bind: Some("127.0.0.1:9999".to_string()),
            max_concurrent_jobs: Some(16),
        });
        let settings = AppConfig::load(&cli).unwrap();
        assert_eq!(settings.http_bind_addr, "127.0.0.1:9999");
        assert_eq!(settings.max_concurrent_jobs, 16);
    }

    #[test]
    fn verbose_flag_forces_debug_logging() {
        let mut cli = cli_with(Commands::WorkerOnly { max_concurrent_jobs: None });
        cli.verbose = true;
        let settings = AppConfig::load(&cli).unwrap();
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn explicit_database_url_flag_wins_over_the_default() {
        let mut cli = cli_with(Commands::WorkerOnly { max_concurrent_jobs: None });
        cli.database_url = Some("sqlite://custom.db".to_string());
        let settings = AppConfig::load(&cli).unwrap();
        assert_eq!(settings.database_url, "sqlite://custom.db");
    }
}
