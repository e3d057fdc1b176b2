// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `mnemosyne` — state reconstructor. Snapshots the coarse state the
//! pipeline has observed so far into a single artifact.

use aetherframe_domain::job_context::JobContext;
use aetherframe_domain::plugin::{AnalyzerPlugin, PluginConfig, PluginResult, PluginValidationError};
use async_trait::async_trait;
use serde_json::json;

use super::write_json_artifact;

pub struct Mnemosyne {
    capabilities: Vec<String>,
}

impl Mnemosyne {
    pub fn new(_config: PluginConfig) -> Mnemosyne {
        Mnemosyne {
            capabilities: vec!["state.reconstruct".to_string()],
        }
    }
}

#[async_trait]
impl AnalyzerPlugin for Mnemosyne {
    fn id(&self) -> &str {
        "mnemosyne"
    }

    fn name(&self) -> &str {
        "Mnemosyne state reconstructor"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    async fn validate(&self, _ctx: &JobContext) -> Result<(), PluginValidationError> {
        Ok(())
    }

    async fn run(&self, ctx: &JobContext) -> PluginResult {
        let snapshot = json!({
            "plugin": self.id(),
            "prior_findings": ctx.previous_findings.len(),
            "prior_artifacts": ctx.previous_artifacts.len(),
            "risk_score_at_entry": ctx.risk_score(),
        });

        let artifact = match write_json_artifact(ctx, "state_snapshot.json", &snapshot).await {
            Ok(artifact) => artifact,
            Err(e) => return PluginResult::failed(format!("failed to write snapshot: {e}")),
        };

        let mut result = PluginResult::ok();
        result.artifacts = vec![artifact];
        result
    }
}
