// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! A generic, audit-style event posted directly through the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// An ad-hoc event, distinct from [`crate::entities::TraceEvent`]: this
/// table is used only for direct API posts and job-failure notices, never
/// produced by a pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub event_type: String,
    pub payload: Json,
    pub job_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub event_type: String,
    pub payload: Json,
    pub job_id: Option<i64>,
}

/// Event type the worker emits when a job dies on an unhandled error.
pub const JOB_FAILED_EVENT: &str = "job_failed";
