// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The pipeline catalogue: named, ordered stage lists seeded at startup.

use std::collections::HashMap;
use std::sync::RwLock;

use aetherframe_domain::error::{PipelineError, PipelineResult};
use aetherframe_domain::pipeline::{Pipeline, PipelineStageBuilder};
use aetherframe_domain::value_objects::StageCondition;

pub struct PipelineCatalogue {
    pipelines: RwLock<HashMap<String, Pipeline>>,
}

impl PipelineCatalogue {
    pub fn new() -> PipelineCatalogue {
        PipelineCatalogue {
            pipelines: RwLock::new(HashMap::new()),
        }
    }

    /// A catalogue seeded with the five built-in pipelines.
    pub fn with_builtin_pipelines() -> PipelineCatalogue {
        let catalogue = PipelineCatalogue::new();
        for pipeline in seed_builtin_pipelines() {
            catalogue.register(pipeline);
        }
        catalogue
    }

    pub fn register(&self, pipeline: Pipeline) {
        self.pipelines.write().unwrap().insert(pipeline.id.clone(), pipeline);
    }

    pub fn get(&self, id: &str) -> PipelineResult<Pipeline> {
        self.pipelines
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| PipelineError::PipelineNotFound(id.to_string()))
    }

    /// Summaries for `GET /pipelines`: id, name, description, stage count.
    pub fn list_summaries(&self) -> Vec<PipelineSummary> {
        self.pipelines
            .read()
            .unwrap()
            .values()
            .map(|p| PipelineSummary {
                id: p.id.clone(),
                name: p.name.clone(),
                description: p.description.clone(),
                stage_count: p.stages.len(),
            })
            .collect()
    }
}

impl Default for PipelineCatalogue {
    fn default() -> Self {
        PipelineCatalogue::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PipelineSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub stage_count: usize,
}

/// Builds the five pipelines shipped out of the box. Mirrors a
/// bootstrap-time seed function rather than requiring external
/// pipeline-definition files.
pub fn seed_builtin_pipelines() -> Vec<Pipeline> {
    vec![quicklook(), deep_static(), dynamic_first(), release_watch(), full_audit()]
}

fn quicklook() -> Pipeline {
    Pipeline::new("quicklook", "Quicklook")
        .description("Fast triage: anti-analysis gate, static scan, intent summary.")
        .add_stage(stage("gate", "umbriel", StageCondition::Always))
        .add_stage(
            PipelineStageBuilder::new("static", "aegis", StageCondition::OnSuccess)
                .optional(true)
                .build()
                .expect("static stage condition is always parseable"),
        )
        .add_stage(stage("intent", "noema", StageCondition::OnSuccess))
}

fn deep_static() -> Pipeline {
    Pipeline::new("deep-static", "Deep Static")
        .description("Thorough static-only pass with a generated report.")
        .add_stage(stage("gate", "umbriel", StageCondition::Always))
        .add_stage(stage("static", "aegis", StageCondition::OnSuccess))
        .add_stage(
            PipelineStageBuilder::new("report", "scribe", StageCondition::OnSuccess)
                .optional(true)
                .build()
                .unwrap(),
        )
}

fn dynamic_first() -> Pipeline {
    Pipeline::new("dynamic-first", "Dynamic First")
        .description("Runs the tracer before any static heuristics.")
        .add_stage(stage("trace", "laintrace", StageCondition::Always))
        .add_stage(stage("reconstruct", "mnemosyne", StageCondition::OnSuccess))
        .add_stage(stage("intent", "noema", StageCondition::OnSuccess))
}

fn release_watch() -> Pipeline {
    Pipeline::new("release-watch", "Release Watch")
        .description("Diffs against a reference build and escalates to tracing on high risk.")
        .add_stage(stage("diff", "valkyrie", StageCondition::Always))
        .add_stage(
            PipelineStageBuilder::new("trace-deltas", "laintrace", StageCondition::OnHighRisk)
                .optional(true)
                .build()
                .unwrap(),
        )
}

fn full_audit() -> Pipeline {
    Pipeline::new("full-audit", "Full Audit")
        .description("Everything: gate, static, intent, diff, conditional tracing, report.")
        .add_stage(stage("gate", "umbriel", StageCondition::Always))
        .add_stage(stage("static", "aegis", StageCondition::OnSuccess))
        .add_stage(stage("intent", "noema", StageCondition::OnSuccess))
        .add_stage(
            PipelineStageBuilder::new("diff", "valkyrie", StageCondition::OnSuccess)
                .optional(true)
                .build()
                .unwrap(),
        )
        .add_stage(
            PipelineStageBuilder::new("trace-deltas", "laintrace", StageCondition::OnHighRisk)
                .optional(true)
                .build()
                .unwrap(),
        )
        .add_stage(
            PipelineStageBuilder::new("report", "scribe", StageCondition::Always)
                .optional(true)
                .build()
                .unwrap(),
        )
}

fn stage(
    name: &str,
    plugin_id: &str,
    condition: StageCondition,
) -> aetherframe_domain::pipeline::PipelineStage {
    PipelineStageBuilder::new(name, plugin_id, condition)
        .build()
        .expect("non-conditional stages always build")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_contains_all_five_builtin_pipelines() {
        let catalogue = PipelineCatalogue::with_builtin_pipelines();
        for id in ["quicklook", "deep-static", "dynamic-first", "release-watch", "full-audit"] {
            assert!(catalogue.get(id).is_ok(), "missing pipeline {id}");
        }
    }

    #[test]
    fn quicklook_matches_the_documented_stage_order() {
        let pipeline = quicklook();
        let names: Vec<_> = pipeline.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["gate", "static", "intent"]);
    }

    #[test]
    fn unknown_pipeline_id_is_a_not_found_error() {
        let catalogue = PipelineCatalogue::with_builtin_pipelines();
        assert!(matches!(
            catalogue.get("does-not-exist"),
            Err(PipelineError::PipelineNotFound(_))
        ));
    }
}
