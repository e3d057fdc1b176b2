// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Port for the `Plugin` catalogue table — purely descriptive rows, never
//! to be confused with the in-process plugin registry.

use async_trait::async_trait;

use crate::entities::{NewPluginRow, PluginRow};
use crate::error::PipelineResult;

#[async_trait]
pub trait PluginCatalogRepository: Send + Sync {
    async fn create(&self, new: NewPluginRow) -> PipelineResult<PluginRow>;

    async fn list_all(&self) -> PipelineResult<Vec<PluginRow>>;
}
