// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Port for persisting and querying generic audit [`Event`]s.

use async_trait::async_trait;

use crate::entities::{Event, NewEvent};
use crate::error::PipelineResult;

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, new: NewEvent) -> PipelineResult<Event>;

    /// All generic events, newest first.
    async fn list_all(&self) -> PipelineResult<Vec<Event>>;
}
