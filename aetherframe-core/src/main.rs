// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Process entry point. Parses the CLI, loads layered configuration,
//! installs structured logging, opens the store, and dispatches to one
//! of four run modes: `serve` (API + worker pool in one process),
//! `api-only`, `worker-only`, or `migrate`.

use std::sync::Arc;
use std::time::Duration;

use aetherframe_bootstrap::shutdown::{ShutdownCoordinator, DEFAULT_GRACE_PERIOD_SECS};
use aetherframe_bootstrap::{create_signal_handler, parse_cli, Commands, ExitCode};
use aetherframe_core::config::AppConfig;
use aetherframe_core::http::{build_router, AppState};
use aetherframe_core::orchestrator::{Worker, WorkerConfig};
use aetherframe_core::queue::{run_dispatch_loop, TaskQueue};
use aetherframe_core::registry::PluginRegistry;
use aetherframe_core::store::SqliteStore;
use aetherframe_core::{logging, MetricsService, PipelineCatalogue, PipelineExecutor};

const TASK_QUEUE_CAPACITY: usize = 1024;

fn main() {
    let cli = parse_cli();

    let config = match AppConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            std::process::exit(ExitCode::Config.as_i32());
        }
    };

    if let Err(e) = logging::init(&config) {
        eprintln!("logging already initialized: {e}");
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start async runtime: {e}");
            std::process::exit(ExitCode::Software.as_i32());
        }
    };

    let exit_code = runtime.block_on(run(cli.command, config));
    std::process::exit(exit_code.as_i32());
}

async fn run(command: Commands, config: AppConfig) -> ExitCode {
    match run_fallible(command, config).await {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            tracing::error!(error = %e, "aetherframe exited with an error");
            ExitCode::from_error(e.as_ref())
        }
    }
}

async fn run_fallible(command: Commands, config: AppConfig) -> anyhow::Result<()> {
    if let Commands::Migrate { dry_run } = &command {
        return run_migrate(&config, *dry_run).await;
    }

    let store = Arc::new(SqliteStore::connect(&config.database_url).await?);
    let registry = Arc::new(PluginRegistry::with_builtin_plugins());
    let catalogue = Arc::new(PipelineCatalogue::with_builtin_pipelines());
    let metrics = Arc::new(MetricsService::new()?);
    let config = Arc::new(config);

    let executor = Arc::new(PipelineExecutor::new(registry.clone(), catalogue.clone(), metrics.clone()));
    let worker_config = WorkerConfig {
        workspace_base: config.workspace_base.clone(),
        artifacts_base: config.artifacts_base.clone(),
        cleanup_workspace: config.cleanup_workspace,
    };
    let worker = Arc::new(Worker::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        executor,
        metrics.clone(),
        worker_config,
    ));

    let (queue, receiver) = TaskQueue::new(TASK_QUEUE_CAPACITY);
    let shutdown = ShutdownCoordinator::new(Duration::from_secs(DEFAULT_GRACE_PERIOD_SECS));

    let signal_handler = create_signal_handler();
    let shutdown_for_signal = shutdown.clone();
    tokio::spawn(async move {
        signal_handler.wait_for_signal(Box::new(move || shutdown_for_signal.initiate_shutdown())).await;
    });

    match command {
        Commands::Serve { .. } => {
            let state = AppState::new(store, queue.clone(), catalogue, registry, metrics, config.clone());
            let dispatch = tokio::spawn(run_dispatch_loop(
                receiver,
                worker,
                config.max_concurrent_jobs,
                queue.in_flight_handle(),
                shutdown.token(),
            ));
            serve_http(state, &config.http_bind_addr, &shutdown).await?;
            dispatch.await?;
            shutdown.complete_shutdown();
        }
        Commands::ApiOnly { .. } => {
            drop(receiver);
            let state = AppState::new(store, queue, catalogue, registry, metrics, config.clone());
            serve_http(state, &config.http_bind_addr, &shutdown).await?;
            shutdown.complete_shutdown();
        }
        Commands::WorkerOnly { .. } => {
            run_dispatch_loop(receiver, worker, config.max_concurrent_jobs, queue.in_flight_handle(), shutdown.token())
                .await;
            shutdown.complete_shutdown();
        }
        Commands::Migrate { .. } => unreachable!("handled above"),
    }

    Ok(())
}

async fn serve_http(state: AppState, bind_addr: &str, shutdown: &ShutdownCoordinator) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(bind_addr, "HTTP API listening");

    let shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.token().cancelled().await })
        .await?;
    Ok(())
}

async fn run_migrate(config: &AppConfig, dry_run: bool) -> anyhow::Result<()> {
    if dry_run {
        tracing::info!(database_url = %config.database_url, "dry run: would apply pending migrations");
        return Ok(());
    }

    let _store = SqliteStore::connect(&config.database_url).await?;
    tracing::info!(database_url = %config.database_url, "migrations applied");
    Ok(())
}
