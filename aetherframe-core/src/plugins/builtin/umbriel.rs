// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `umbriel` — anti-analysis detector. Scans the target for a small set
//! of known anti-debug / anti-VM string signatures.

use aetherframe_domain::entities::{Evidence, NewFinding};
use aetherframe_domain::job_context::JobContext;
use aetherframe_domain::plugin::{AnalyzerPlugin, PluginConfig, PluginResult, PluginValidationError};
use aetherframe_domain::value_objects::Severity;
use async_trait::async_trait;
use serde_json::json;

use super::{read_target, write_json_artifact};

const SIGNATURES: &[(&str, Severity)] = &[
    ("IsDebuggerPresent", Severity::Medium),
    ("CheckRemoteDebuggerPresent", Severity::Medium),
    ("VirtualBox", Severity::Low),
    ("vmware", Severity::Low),
    ("NtQueryInformationProcess", Severity::Low),
];

pub struct Umbriel {
    capabilities: Vec<String>,
}

impl Umbriel {
    pub fn new(_config: PluginConfig) -> Umbriel {
        Umbriel {
            capabilities: vec!["anti_analysis.scan".to_string()],
        }
    }
}

#[async_trait]
impl AnalyzerPlugin for Umbriel {
    fn id(&self) -> &str {
        "umbriel"
    }

    fn name(&self) -> &str {
        "Umbriel anti-analysis detector"
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
        let bytes = match read_target(ctx).await {
            Ok(bytes) => bytes,
            Err(e) => return PluginResult::failed(format!("failed to read target: {e}")),
        };

        let mut findings = Vec::new();
        let mut hit_names = Vec::new();
        for (signature, severity) in SIGNATURES {
            if contains_subslice(&bytes, signature.as_bytes()) {
                hit_names.push(*signature);
                findings.push(NewFinding {
                    severity: *severity,
                    category: "anti_debug".to_string(),
                    title: format!("Anti-analysis signature: {signature}"),
                    description: Some(format!("Target contains the byte sequence for '{signature}'")),
                    evidence: vec![Evidence {
                        kind: "string_match".to_string(),
                        location: None,
                        value: json!(signature),
                        context: None,
                        reference: None,
                    }],
                    confidence: 0.6,
                    tags: vec!["anti-analysis".to_string()],
                });
            }
        }

        let risk_score = match hit_names.len() {
            0 => 0.0,
            1 => 0.2,
            n if n <= 2 => 0.4,
            _ => 0.7,
        };

        let report = json!({
            "plugin": self.id(),
            "signatures_checked": SIGNATURES.iter().map(|(s, _)| *s).collect::<Vec<_>>(),
            "signatures_found": hit_names,
            "target_size_bytes": bytes.len(),
        });

        let artifact = match write_json_artifact(ctx, "anti_analysis_report.json", &report).await {
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

fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() || haystack.len() < needle.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_a_known_signature() {
        let haystack = b"...IsDebuggerPresent...";
        assert!(contains_subslice(haystack, b"IsDebuggerPresent"));
        assert!(!contains_subslice(haystack, b"CreateRemoteThread"));
    }
}
