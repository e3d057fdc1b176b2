// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Shared application state, cloned into every handler.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::AppConfig;
use crate::metrics::MetricsService;
use crate::queue::TaskQueue;
use crate::registry::PluginRegistry;
use crate::store::SqliteStore;
use crate::PipelineCatalogue;

/// Everything a handler needs, as an explicitly-constructed value passed
/// in rather than a process-global. One instance is built at startup and
/// cloned into each request (cheap: every field is an `Arc` or a
/// `TaskQueue`, itself a clone of a channel sender).
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SqliteStore>,
    pub queue: TaskQueue,
    pub catalogue: Arc<PipelineCatalogue>,
    pub registry: Arc<PluginRegistry>,
    pub metrics: Arc<MetricsService>,
    pub config: Arc<AppConfig>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        store: Arc<SqliteStore>,
        queue: TaskQueue,
        catalogue: Arc<PipelineCatalogue>,
        registry: Arc<PluginRegistry>,
        metrics: Arc<MetricsService>,
        config: Arc<AppConfig>,
    ) -> AppState {
        AppState {
            store,
            queue,
            catalogue,
            registry,
            metrics,
            config,
            started_at: Utc::now(),
        }
    }
}
