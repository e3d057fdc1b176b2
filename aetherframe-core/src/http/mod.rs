// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The HTTP API: a thin transport layer over the store and task queue.
//! Stateless beyond the cloned [`AppState`]; never executes a pipeline.

mod dto;
mod error;
mod handlers;
mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builds the full route table over the given state, with CORS (per the
/// `cors_origins` config key) and per-request structured logging layered
/// on top.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .route("/plugins", post(handlers::create_plugin).get(handlers::list_plugins))
        .route("/jobs", post(handlers::create_job).get(handlers::list_jobs))
        .route("/jobs/{id}", get(handlers::get_job))
        .route("/jobs/{id}/cancel", post(handlers::cancel_job))
        .route("/jobs/{id}/findings", get(handlers::list_findings))
        .route("/jobs/{id}/artifacts", get(handlers::list_artifacts))
        .route("/jobs/{id}/events", get(handlers::list_job_events))
        .route("/events", post(handlers::create_event).get(handlers::list_events))
        .route("/pipelines", get(handlers::list_pipelines))
        .route("/pipelines/{id}", get(handlers::get_pipeline))
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(cors_origins: &[String]) -> CorsLayer {
    if cors_origins.is_empty() {
        return CorsLayer::new();
    }

    let origins: Vec<_> = cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(tower_http::cors::Any)
}
