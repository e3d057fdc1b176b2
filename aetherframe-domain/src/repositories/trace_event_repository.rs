// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Port for persisting and querying [`TraceEvent`]s.

use async_trait::async_trait;

use crate::entities::TraceEvent;
use crate::error::PipelineResult;

/// Query filters for `GET /jobs/{id}/events`.
#[derive(Debug, Clone, Default)]
pub struct TraceEventFilter {
    pub source: Option<String>,
    pub event_type: Option<String>,
}

#[async_trait]
pub trait TraceEventRepository: Send + Sync {
    async fn create(&self, job_id: i64, event: TraceEvent) -> PipelineResult<TraceEvent>;

    /// Trace events for a job, oldest first — the order the invariant in
    /// §8 requires for `(ts, sequence)` ordering to be meaningful to a
    /// reader.
    async fn list_for_job(&self, job_id: i64, filter: &TraceEventFilter) -> PipelineResult<Vec<TraceEvent>>;
}
