// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Port for persisting and querying [`Artifact`]s.

use async_trait::async_trait;

use crate::entities::Artifact;
use crate::error::PipelineResult;

#[async_trait]
pub trait ArtifactRepository: Send + Sync {
    async fn create(&self, job_id: i64, artifact: Artifact) -> PipelineResult<Artifact>;

    async fn list_for_job(&self, job_id: i64) -> PipelineResult<Vec<Artifact>>;
}
