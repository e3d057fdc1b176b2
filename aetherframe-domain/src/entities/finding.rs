// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! A security-relevant observation produced by a stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::value_objects::Severity;

/// One piece of supporting evidence for a [`Finding`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(rename = "type")]
    pub kind: String,
    pub location: Option<String>,
    pub value: Json,
    pub context: Option<String>,
    pub reference: Option<String>,
}

/// An observation a plugin attributes to a specific stage of a specific
/// job. Findings exist only within a job: the job's deletion cascades to
/// all of its findings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub id: i64,
    pub job_id: i64,
    pub plugin_id: String,
    pub stage: String,
    pub severity: Severity,
    pub category: String,
    pub title: String,
    pub description: Option<String>,
    pub evidence: Vec<Evidence>,
    pub confidence: f64,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A finding as returned by a plugin, before the executor stamps it with
/// `plugin_id`/`stage` and the store assigns it an id and `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFinding {
    pub severity: Severity,
    pub category: String,
    pub title: String,
    pub description: Option<String>,
    pub evidence: Vec<Evidence>,
    pub confidence: f64,
    pub tags: Vec<String>,
}
