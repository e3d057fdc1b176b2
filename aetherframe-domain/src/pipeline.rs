// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Named pipelines: ordered, conditionally-executed stages bound to
//! analyzer plugins.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value as Json;

use crate::condition_expr::{self, ConditionExpr};
use crate::value_objects::StageCondition;

/// Default per-stage timeout when a stage doesn't declare its own.
pub const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 300;

/// One step of a pipeline: a plugin binding plus the condition gating it.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStage {
    pub name: String,
    pub plugin_id: String,
    pub config: HashMap<String, Json>,
    pub condition: StageCondition,
    /// Parsed once at construction; `None` unless `condition` is
    /// `Conditional`.
    pub condition_expr: Option<ConditionExpr>,
    pub timeout_seconds: u64,
    pub optional: bool,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum StageBuildError {
    #[error("stage '{stage}' has condition=conditional but no condition_expr")]
    MissingExpr { stage: String },
    #[error("stage '{stage}' has an unparseable condition_expr: {source}")]
    BadExpr {
        stage: String,
        #[source]
        source: condition_expr::ParseError,
    },
}

impl PipelineStage {
    /// Builds a stage, parsing and rejecting a malformed `condition_expr`
    /// up front rather than at evaluation time.
    pub fn new(
        name: impl Into<String>,
        plugin_id: impl Into<String>,
        condition: StageCondition,
    ) -> Result<PipelineStage, StageBuildError> {
        PipelineStageBuilder::new(name, plugin_id, condition).build()
    }
}

/// Builder used by [`PipelineStage::new`] and the built-in pipeline seed
/// functions, mirroring the teacher's preference for explicit builder
/// methods over positional constructors.
pub struct PipelineStageBuilder {
    name: String,
    plugin_id: String,
    config: HashMap<String, Json>,
    condition: StageCondition,
    condition_expr_str: Option<String>,
    timeout_seconds: u64,
    optional: bool,
}

impl PipelineStageBuilder {
    pub fn new(name: impl Into<String>, plugin_id: impl Into<String>, condition: StageCondition) -> Self {
        PipelineStageBuilder {
            name: name.into(),
            plugin_id: plugin_id.into(),
            config: HashMap::new(),
            condition,
            condition_expr_str: None,
            timeout_seconds: DEFAULT_STAGE_TIMEOUT_SECS,
            optional: false,
        }
    }

    pub fn config(mut self, config: HashMap<String, Json>) -> Self {
        self.config = config;
        self
    }

    pub fn condition_expr(mut self, expr: impl Into<String>) -> Self {
        self.condition_expr_str = Some(expr.into());
        self
    }

    pub fn timeout_seconds(mut self, secs: u64) -> Self {
        self.timeout_seconds = secs;
        self
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn build(self) -> Result<PipelineStage, StageBuildError> {
        let condition_expr = match (self.condition, &self.condition_expr_str) {
            (StageCondition::Conditional, Some(expr)) => {
                Some(condition_expr::parse(expr).map_err(|source| StageBuildError::BadExpr {
                    stage: self.name.clone(),
                    source,
                })?)
            }
            (StageCondition::Conditional, None) => {
                return Err(StageBuildError::MissingExpr { stage: self.name });
            }
            _ => None,
        };

        Ok(PipelineStage {
            name: self.name,
            plugin_id: self.plugin_id,
            config: self.config,
            condition: self.condition,
            condition_expr,
            timeout_seconds: self.timeout_seconds,
            optional: self.optional,
        })
    }
}

/// A named, ordered list of stages.
#[derive(Debug, Clone, Serialize)]
pub struct Pipeline {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub stages: Vec<PipelineStage>,
}

impl Pipeline {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Pipeline {
        Pipeline {
            id: id.into(),
            name: name.into(),
            description: None,
            tags: Vec::new(),
            stages: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn add_stage(mut self, stage: PipelineStage) -> Self {
        self.stages.push(stage);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conditional_stage_requires_an_expression() {
        let err = PipelineStage::new("trace-deltas", "laintrace", StageCondition::OnHighRisk)
            .map(|_| ())
            .unwrap();
        let _ = err;

        let result = PipelineStageBuilder::new("cond", "plugin", StageCondition::Conditional).build();
        assert!(matches!(result, Err(StageBuildError::MissingExpr { .. })));
    }

    #[test]
    fn conditional_stage_parses_its_expression_up_front() {
        let stage = PipelineStageBuilder::new("cond", "plugin", StageCondition::Conditional)
            .condition_expr("risk_score >= 0.7")
            .build()
            .unwrap();
        assert!(stage.condition_expr.is_some());
    }

    #[test]
    fn non_conditional_stages_never_carry_a_parsed_expression() {
        let stage = PipelineStage::new("gate", "umbriel", StageCondition::Always).unwrap();
        assert!(stage.condition_expr.is_none());
    }

    #[test]
    fn pipeline_builder_accumulates_stages_in_order() {
        let pipeline = Pipeline::new("quicklook", "Quicklook")
            .add_stage(PipelineStage::new("gate", "umbriel", StageCondition::Always).unwrap())
            .add_stage(PipelineStage::new("static", "noema", StageCondition::OnSuccess).unwrap());
        assert_eq!(pipeline.stages.len(), 2);
        assert_eq!(pipeline.stages[0].name, "gate");
        assert_eq!(pipeline.stages[1].name, "static");
    }
}
