// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `noema` — intent inferencer. Summarizes the findings accumulated by
//! earlier stages into a coarse intent classification.

use aetherframe_domain::job_context::JobContext;
use aetherframe_domain::plugin::{AnalyzerPlugin, PluginConfig, PluginResult, PluginValidationError};
use async_trait::async_trait;
use serde_json::json;

use super::write_json_artifact;

pub struct Noema {
    capabilities: Vec<String>,
}

impl Noema {
    pub fn new(_config: PluginConfig) -> Noema {
        Noema {
            capabilities: vec!["intent.infer".to_string()],
        }
    }
}

#[async_trait]
impl AnalyzerPlugin for Noema {
    fn id(&self) -> &str {
        "noema"
    }

    fn name(&self) -> &str {
        "Noema intent inferencer"
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
        let finding_count = ctx.previous_findings.len();
        let intent = if finding_count == 0 {
            "benign"
        } else if finding_count <= 2 {
            "suspicious"
        } else {
            "malicious"
        };

        // Intent is a summary of what's already been observed, not a new
        // discovery, so it nudges the running score rather than dominating
        // it.
        let inferred_risk = (finding_count as f64 * 0.05).min(0.3);

        let report = json!({
            "plugin": self.id(),
            "intent": intent,
            "findings_considered": finding_count,
        });

        let artifact = match write_json_artifact(ctx, "intent_report.json", &report).await {
            Ok(artifact) => artifact,
            Err(e) => return PluginResult::failed(format!("failed to write report: {e}")),
        };

        let mut result = PluginResult::ok();
        result.artifacts = vec![artifact];
        result.risk_score = Some(inferred_risk);
        result.recommendations = vec![format!("classified target as {intent}")];
        result
    }
}
