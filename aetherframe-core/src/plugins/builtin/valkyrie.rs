// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `valkyrie` — binary differ. Compares the target against a reference
//! binary named in the stage config (`reference_path`) or the job's
//! `options.reference_path`, and flags newly-introduced API references.

use aetherframe_domain::entities::{Evidence, NewFinding};
use aetherframe_domain::job_context::JobContext;
use aetherframe_domain::plugin::{AnalyzerPlugin, PluginConfig, PluginResult, PluginValidationError};
use aetherframe_domain::value_objects::Severity;
use async_trait::async_trait;
use serde_json::json;

use super::{read_target, write_json_artifact};

const WATCHED_APIS: &[&str] = &["CreateRemoteThread", "WriteProcessMemory", "VirtualAllocEx"];

pub struct Valkyrie {
    config: PluginConfig,
    capabilities: Vec<String>,
}

impl Valkyrie {
    pub fn new(config: PluginConfig) -> Valkyrie {
        Valkyrie {
            config,
            capabilities: vec!["binary_diff.compare".to_string()],
        }
    }

    fn reference_path(&self, ctx: &JobContext) -> Option<String> {
        self.config
            .get("reference_path")
            .or_else(|| ctx.job.options.get("reference_path"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

#[async_trait]
impl AnalyzerPlugin for Valkyrie {
    fn id(&self) -> &str {
        "valkyrie"
    }

    fn name(&self) -> &str {
        "Valkyrie binary differ"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    async fn validate(&self, ctx: &JobContext) -> Result<(), PluginValidationError> {
        if !ctx.target_path.exists() {
            return Err(PluginValidationError(format!(
                "target path does not exist: {}",
                ctx.target_path.display()
            )));
        }
        Ok(())
    }

    async fn run(&self, ctx: &JobContext) -> PluginResult {
        let target_bytes = match read_target(ctx).await {
            Ok(bytes) => bytes,
            Err(e) => return PluginResult::failed(format!("failed to read target: {e}")),
        };

        let Some(reference_path) = self.reference_path(ctx) else {
            let report = json!({"plugin": self.id(), "diff": "no reference_path supplied, skipped"});
            let artifact = match write_json_artifact(ctx, "binary_diff_report.json", &report).await {
                Ok(artifact) => artifact,
                Err(e) => return PluginResult::failed(format!("failed to write report: {e}")),
            };
            let mut result = PluginResult::ok();
            result.artifacts = vec![artifact];
            result.risk_score = Some(0.0);
            return result;
        };

        let reference_bytes = match tokio::fs::read(&reference_path).await {
            Ok(bytes) => bytes,
            Err(e) => return PluginResult::failed(format!("failed to read reference: {e}")),
        };

        let target_text = String::from_utf8_lossy(&target_bytes);
        let reference_text = String::from_utf8_lossy(&reference_bytes);

        let mut findings = Vec::new();
        let mut new_apis = Vec::new();
        for api in WATCHED_APIS {
            let in_target = target_text.contains(api);
            let in_reference = reference_text.contains(api);
            if in_target && !in_reference {
                new_apis.push(*api);
                findings.push(NewFinding {
                    severity: Severity::High,
                    category: "new-code".to_string(),
                    title: format!("New code path calls {api}"),
                    description: Some(format!(
                        "'{api}' is referenced in the target but absent from the reference binary"
                    )),
                    evidence: vec![Evidence {
                        kind: "diff".to_string(),
                        location: None,
                        value: json!(api),
                        context: None,
                        reference: Some(reference_path.clone()),
                    }],
                    confidence: 0.7,
                    tags: vec!["binary-diff".to_string()],
                });
            }
        }

        let size_delta = (target_bytes.len() as i64 - reference_bytes.len() as i64).unsigned_abs();
        let risk_score = if !new_apis.is_empty() { 0.8 } else { 0.0 };

        let report = json!({
            "plugin": self.id(),
            "reference_path": reference_path,
            "size_delta_bytes": size_delta,
            "new_api_references": new_apis,
        });

        let artifact = match write_json_artifact(ctx, "binary_diff_report.json", &report).await {
            Ok(artifact) => artifact,
            Err(e) => return PluginResult::failed(format!("failed to write report: {e}")),
        };

        PluginResult {
            success: true,
            findings,
            artifacts: vec![artifact],
            risk_score: Some(risk_score),
            ..PluginResult::ok()
        }
    }
}
