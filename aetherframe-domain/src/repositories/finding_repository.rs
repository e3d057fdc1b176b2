// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Port for persisting and querying [`Finding`]s.

use async_trait::async_trait;

use crate::entities::Finding;
use crate::error::PipelineResult;
use crate::value_objects::Severity;

/// Query filters for `GET /jobs/{id}/findings`.
#[derive(Debug, Clone, Default)]
pub struct FindingFilter {
    pub severity: Option<Severity>,
    pub category: Option<String>,
}

#[async_trait]
pub trait FindingRepository: Send + Sync {
    /// Persists one stamped finding, failures are logged by the caller and
    /// never roll back sibling writes in the same batch.
    async fn create(&self, job_id: i64, finding: Finding) -> PipelineResult<Finding>;

    /// Findings for a job, newest first, filtered if requested.
    async fn list_for_job(&self, job_id: i64, filter: &FindingFilter) -> PipelineResult<Vec<Finding>>;
}
