// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! A file produced by a stage and referenced by URI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::value_objects::ArtifactType;

/// A file a stage wrote into the job's artifacts directory, described by a
/// `file://` or `s3://` URI. Artifacts survive workspace cleanup; only the
/// owning job's deletion removes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub id: i64,
    pub job_id: i64,
    pub plugin_id: String,
    pub stage: String,
    pub artifact_type: ArtifactType,
    pub name: String,
    pub description: Option<String>,
    pub uri: String,
    pub sha256: Option<String>,
    pub size_bytes: Option<u64>,
    pub meta: Json,
    pub created_at: DateTime<Utc>,
}

/// An artifact as returned by a plugin, before stamping and persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArtifact {
    pub artifact_type: ArtifactType,
    pub name: String,
    pub description: Option<String>,
    pub uri: String,
    pub sha256: Option<String>,
    pub size_bytes: Option<u64>,
    pub meta: Json,
}
