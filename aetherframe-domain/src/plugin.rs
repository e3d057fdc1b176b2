// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The plugin contract: what every analyzer exposes to the executor, and
//! the on-disk manifest that describes it.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::entities::{NewArtifact, NewFinding, NewTraceEvent};
use crate::error::ManifestError;
use crate::job_context::JobContext;
use crate::value_objects::PluginKind;

/// The on-disk description of an analyzer bundle (`plugin.yaml`).
///
/// Required fields: `id`, `name`, `version`, `kind`. Everything else is
/// optional and carried through opaquely — the registry only reasons
/// about `id`, `kind`, `capabilities`, and `dependencies`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    pub id: String,
    pub name: String,
    pub version: String,
    pub kind: PluginKind,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub config_schema: Json,
}

impl PluginManifest {
    /// Collects every validation problem rather than stopping at the
    /// first: an empty id, an id containing characters outside
    /// `[A-Za-z0-9_-]`, an empty version, or empty capabilities.
    pub fn validate(&self) -> Vec<ManifestError> {
        let mut errors = Vec::new();

        let valid_id = !self.id.is_empty()
            && self
                .id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid_id {
            errors.push(ManifestError::InvalidId(self.id.clone()));
        }

        if self.version.trim().is_empty() {
            errors.push(ManifestError::EmptyVersion);
        }

        if self.capabilities.is_empty() {
            errors.push(ManifestError::EmptyCapabilities);
        }

        errors
    }

    pub fn supports_capability(&self, cap: &str) -> bool {
        self.capabilities.iter().any(|c| c == cap)
    }
}

/// A plugin's configuration, merged from the stage's `config` map at
/// instantiation time.
pub type PluginConfig = HashMap<String, Json>;

/// What `run` hands back to the executor.
///
/// A plugin must not throw on an ordinary analysis failure: it sets
/// `success=false` and populates `error` instead. Throwing is reserved for
/// truly unexpected conditions, which the executor catches and records as
/// a stage error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginResult {
    pub success: bool,
    pub findings: Vec<NewFinding>,
    pub artifacts: Vec<NewArtifact>,
    pub events: Vec<NewTraceEvent>,
    pub error: Option<String>,
    pub risk_score: Option<f64>,
    pub skip_remaining: bool,
    pub context_data: HashMap<String, Json>,
    pub recommendations: Vec<String>,
}

impl PluginResult {
    pub fn ok() -> PluginResult {
        PluginResult {
            success: true,
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> PluginResult {
        PluginResult {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// An error a plugin's `validate` raises to refuse to run against a
/// context (e.g. the target file is missing, the wrong format, or over a
/// size limit).
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct PluginValidationError(pub String);

/// An analyzer: manifest-bound code that, given a [`JobContext`], produces
/// findings, artifacts, and trace events.
#[async_trait]
pub trait AnalyzerPlugin: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn version(&self) -> &str;
    fn capabilities(&self) -> &[String];

    fn supports_capability(&self, cap: &str) -> bool {
        self.capabilities().iter().any(|c| c == cap)
    }

    /// Refuses to run against this context by returning an error.
    async fn validate(&self, ctx: &JobContext) -> Result<(), PluginValidationError>;

    /// Runs the analysis. Must not panic on an ordinary analysis failure;
    /// see [`PluginResult::failed`].
    async fn run(&self, ctx: &JobContext) -> PluginResult;
}

/// A factory bound to a manifest id, used by the registry to instantiate a
/// plugin without dynamic module loading.
pub type PluginFactory = fn(config: PluginConfig) -> Box<dyn AnalyzerPlugin>;

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(id: &str, version: &str, capabilities: Vec<&str>) -> PluginManifest {
        PluginManifest {
            id: id.to_string(),
            name: "test".to_string(),
            version: version.to_string(),
            kind: PluginKind::Analyzer,
            capabilities: capabilities.into_iter().map(String::from).collect(),
            description: None,
            author: None,
            inputs: vec![],
            outputs: vec![],
            dependencies: vec![],
            config_schema: Json::Null,
        }
    }

    #[test]
    fn validate_collects_every_problem() {
        let m = manifest("bad id!", "", vec![]);
        let errors = m.validate();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn validate_passes_a_well_formed_manifest() {
        let m = manifest("umbriel", "1.0.0", vec!["anti_analysis.scan"]);
        assert!(m.validate().is_empty());
    }

    #[test]
    fn supports_capability_matches_declared_capabilities() {
        let m = manifest("umbriel", "1.0.0", vec!["anti_analysis.scan"]);
        assert!(m.supports_capability("anti_analysis.scan"));
        assert!(!m.supports_capability("binary_diff.compare"));
    }
}
