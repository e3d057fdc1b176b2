// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Request/response bodies for the HTTP API: distinct from the domain
//! entities so the wire shape can evolve without touching them.

use std::collections::HashMap;

use aetherframe_domain::value_objects::{Severity, TargetType};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub target: String,
    #[serde(default)]
    pub target_type: Option<TargetType>,
    #[serde(default)]
    pub pipeline_id: Option<String>,
    #[serde(default)]
    pub options: Option<Json>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePluginRequest {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub event_type: String,
    pub payload: Json,
    #[serde(default)]
    pub job_id: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FindingQuery {
    pub severity: Option<Severity>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct TraceEventQuery {
    pub source: Option<String>,
    pub event_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub service: &'static str,
    pub environment: String,
    pub queue_reachable: bool,
    pub jobs_in_flight: usize,
    pub jobs_total: i64,
    pub jobs_by_status: HashMap<String, i64>,
    pub avg_execution_time_ms: Option<f64>,
}
