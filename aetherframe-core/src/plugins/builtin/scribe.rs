// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `scribe` — report generator. Aggregates everything accumulated by
//! prior stages into a single human-readable summary artifact.

use aetherframe_domain::job_context::JobContext;
use aetherframe_domain::plugin::{AnalyzerPlugin, PluginConfig, PluginResult, PluginValidationError};
use aetherframe_domain::value_objects::ArtifactType;
use async_trait::async_trait;
use sha2::Digest;
use serde_json::json;

pub struct Scribe {
    capabilities: Vec<String>,
}

impl Scribe {
    pub fn new(_config: PluginConfig) -> Scribe {
        Scribe {
            capabilities: vec!["report.generate".to_string()],
        }
    }
}

#[async_trait]
impl AnalyzerPlugin for Scribe {
    fn id(&self) -> &str {
        "scribe"
    }

    fn name(&self) -> &str {
        "Scribe report generator"
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
        let findings_by_severity: Vec<_> = ctx
            .previous_findings
            .iter()
            .map(|f| json!({"severity": f.severity.to_string(), "title": f.title}))
            .collect();

        let report = json!({
            "plugin": self.id(),
            "job_id": ctx.job.id,
            "pipeline_id": ctx.job.pipeline_id,
            "risk_score": ctx.risk_score(),
            "findings": findings_by_severity,
            "artifact_count": ctx.previous_artifacts.len(),
        });

        let body = match serde_json::to_vec_pretty(&report) {
            Ok(body) => body,
            Err(e) => return PluginResult::failed(format!("failed to render report: {e}")),
        };

        if let Err(e) = tokio::fs::create_dir_all(&ctx.artifacts_dir).await {
            return PluginResult::failed(format!("failed to prepare artifacts dir: {e}"));
        }
        let path = ctx.get_artifact_path("final_report.html");
        let html = format!(
            "<html><body><pre>{}</pre></body></html>",
            String::from_utf8_lossy(&body)
        );
        if let Err(e) = tokio::fs::write(&path, html.as_bytes()).await {
            return PluginResult::failed(format!("failed to write report: {e}"));
        }

        let artifact = aetherframe_domain::entities::NewArtifact {
            artifact_type: ArtifactType::Report,
            name: "final_report.html".to_string(),
            description: Some("Aggregated findings and risk summary".to_string()),
            uri: format!("file://{}", path.display()),
            sha256: Some(hex::encode(sha2::Sha256::digest(html.as_bytes()))),
            size_bytes: Some(html.len() as u64),
            meta: serde_json::Value::Null,
        };

        let mut result = PluginResult::ok();
        result.artifacts = vec![artifact];
        result
    }
}
