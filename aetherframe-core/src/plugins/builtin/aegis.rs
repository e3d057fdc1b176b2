// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `aegis` — static analyzer. Extracts printable strings and flags a
//! small set of suspicious API names.

use aetherframe_domain::entities::{Evidence, NewFinding};
use aetherframe_domain::job_context::JobContext;
use aetherframe_domain::plugin::{AnalyzerPlugin, PluginConfig, PluginResult, PluginValidationError};
use aetherframe_domain::value_objects::Severity;
use async_trait::async_trait;
use serde_json::json;

use super::{read_target, write_json_artifact};

const SUSPICIOUS_APIS: &[(&str, Severity)] = &[
    ("CreateRemoteThread", Severity::High),
    ("WriteProcessMemory", Severity::High),
    ("VirtualAllocEx", Severity::Medium),
    ("SetWindowsHookEx", Severity::Medium),
];

const MIN_STRING_LEN: usize = 5;

pub struct Aegis {
    capabilities: Vec<String>,
}

impl Aegis {
    pub fn new(_config: PluginConfig) -> Aegis {
        Aegis {
            capabilities: vec!["static.analyze".to_string()],
        }
    }
}

#[async_trait]
impl AnalyzerPlugin for Aegis {
    fn id(&self) -> &str {
        "aegis"
    }

    fn name(&self) -> &str {
        "Aegis static analyzer"
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

        let strings = extract_printable_strings(&bytes, MIN_STRING_LEN);

        let mut findings = Vec::new();
        for (api, severity) in SUSPICIOUS_APIS {
            if strings.iter().any(|s| s.contains(api)) {
                findings.push(NewFinding {
                    severity: *severity,
                    category: "intent_malicious".to_string(),
                    title: format!("Suspicious API reference: {api}"),
                    description: Some(format!("Static strings reference '{api}'")),
                    evidence: vec![Evidence {
                        kind: "string_match".to_string(),
                        location: None,
                        value: json!(api),
                        context: None,
                        reference: None,
                    }],
                    confidence: 0.5,
                    tags: vec!["static".to_string()],
                });
            }
        }

        let risk_score = findings
            .iter()
            .map(|f| severity_weight(f.severity))
            .fold(0.0_f64, f64::max);

        let report = json!({
            "plugin": self.id(),
            "string_count": strings.len(),
            "sample_strings": strings.iter().take(10).collect::<Vec<_>>(),
        });

        let artifact = match write_json_artifact(ctx, "static_report.json", &report).await {
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

fn severity_weight(severity: Severity) -> f64 {
    match severity {
        Severity::Info => 0.1,
        Severity::Low => 0.2,
        Severity::Medium => 0.4,
        Severity::High => 0.7,
        Severity::Critical => 0.95,
    }
}

fn extract_printable_strings(bytes: &[u8], min_len: usize) -> Vec<String> {
    let mut strings = Vec::new();
    let mut current = String::new();
    for &byte in bytes {
        if byte.is_ascii_graphic() || byte == b' ' {
            current.push(byte as char);
        } else {
            if current.len() >= min_len {
                strings.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        }
    }
    if current.len() >= min_len {
        strings.push(current);
    }
    strings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_runs_of_printable_characters() {
        let bytes = b"\x00\x01hello world\x00\x02ok\x00binary\x03";
        let strings = extract_printable_strings(bytes, 5);
        assert!(strings.contains(&"hello world".to_string()));
        assert!(strings.contains(&"binary".to_string()));
        assert!(!strings.iter().any(|s| s == "ok"));
    }
}
