// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Port for persisting and querying [`Job`] rows.

use async_trait::async_trait;

use crate::entities::{Job, NewJob};
use crate::error::PipelineResult;

/// Storage contract for jobs. Implemented by the SQLite-backed store in
/// the application layer; the domain crate only sees the trait.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Inserts a new job in status `pending` and returns it with its
    /// store-assigned id and `created_at`.
    async fn create(&self, new: NewJob) -> PipelineResult<Job>;

    async fn find_by_id(&self, id: i64) -> PipelineResult<Option<Job>>;

    /// All jobs, newest first.
    async fn list_all(&self) -> PipelineResult<Vec<Job>>;

    /// Persists the full row, including status/progress/result/timestamps.
    /// Used for every lifecycle transition (running/completed/failed/cancelled).
    async fn update(&self, job: &Job) -> PipelineResult<()>;
}
