// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! A time-stamped event contributing to a job's execution trace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// One event in a job's trace. Distinct from [`crate::entities::Event`],
/// which is a simpler audit row not produced by stages.
///
/// Within one job, trace events are totally ordered by `(ts, sequence)`:
/// `sequence` is assigned monotonically per job by whichever component
/// emits the event (the executor for `orchestrator`-sourced events, the
/// plugin itself otherwise).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    pub id: i64,
    pub job_id: i64,
    pub ts: DateTime<Utc>,
    pub source: String,
    pub event_type: String,
    pub symbol: Option<String>,
    pub address: Option<String>,
    pub thread_id: Option<i64>,
    pub process_id: Option<i64>,
    pub sequence: i64,
    pub payload: Json,
}

/// A trace event before the store assigns it an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTraceEvent {
    pub ts: DateTime<Utc>,
    pub source: String,
    pub event_type: String,
    pub symbol: Option<String>,
    pub address: Option<String>,
    pub thread_id: Option<i64>,
    pub process_id: Option<i64>,
    pub sequence: i64,
    pub payload: Json,
}

/// Source tag used for events the executor itself emits, as opposed to
/// ones a plugin reports.
pub const ORCHESTRATOR_SOURCE: &str = "orchestrator";

/// Event type tags the executor emits around each stage.
pub mod event_type {
    pub const STAGE_START: &str = "stage_start";
    pub const STAGE_COMPLETE: &str = "stage_complete";
    pub const STAGE_ERROR: &str = "stage_error";
}
