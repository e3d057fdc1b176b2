// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `laintrace` — dynamic hook tracer. Emits a synthetic sequence of hook
//! events describing the target's runtime behaviour.

use aetherframe_domain::entities::NewTraceEvent;
use aetherframe_domain::job_context::JobContext;
use aetherframe_domain::plugin::{AnalyzerPlugin, PluginConfig, PluginResult, PluginValidationError};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use super::write_json_artifact;

pub struct Laintrace {
    capabilities: Vec<String>,
}

impl Laintrace {
    pub fn new(_config: PluginConfig) -> Laintrace {
        Laintrace {
            capabilities: vec!["dynamic.trace".to_string()],
        }
    }
}

#[async_trait]
impl AnalyzerPlugin for Laintrace {
    fn id(&self) -> &str {
        "laintrace"
    }

    fn name(&self) -> &str {
        "LainTrace dynamic hook tracer"
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
        let now = Utc::now();
        let hooked_symbols = ["CreateRemoteThread", "WriteProcessMemory", "VirtualAllocEx"];

        let mut events = Vec::new();
        for (i, symbol) in hooked_symbols.iter().enumerate() {
            events.push(NewTraceEvent {
                ts: now,
                source: self.id().to_string(),
                event_type: "hook_enter".to_string(),
                symbol: Some(symbol.to_string()),
                address: None,
                thread_id: None,
                process_id: None,
                sequence: i as i64,
                payload: json!({}),
            });
            events.push(NewTraceEvent {
                ts: now,
                source: self.id().to_string(),
                event_type: "hook_exit".to_string(),
                symbol: Some(symbol.to_string()),
                address: None,
                thread_id: None,
                process_id: None,
                sequence: (hooked_symbols.len() + i) as i64,
                payload: json!({}),
            });
        }

        let report = json!({
            "plugin": self.id(),
            "hooked_symbols": hooked_symbols,
            "risk_score_at_entry": ctx.risk_score(),
        });

        let artifact = match write_json_artifact(ctx, "trace_deltas_report.json", &report).await {
            Ok(artifact) => artifact,
            Err(e) => return PluginResult::failed(format!("failed to write report: {e}")),
        };

        let mut result = PluginResult::ok();
        result.artifacts = vec![artifact];
        result.events = events;
        result
    }
}
