// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! When a pipeline stage is eligible to run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The predicate gating a stage, evaluated against the previous stage's
/// result and the running pipeline context.
///
/// `Conditional` stages additionally carry a [`crate::condition_expr::ConditionExpr`]
/// parsed from their `condition_expr` string at pipeline-registration time
/// (see [`crate::pipeline::PipelineStage`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageCondition {
    Always,
    OnSuccess,
    OnFailure,
    OnFindings,
    OnHighRisk,
    Conditional,
}

impl StageCondition {
    pub fn as_str(self) -> &'static str {
        match self {
            StageCondition::Always => "always",
            StageCondition::OnSuccess => "on_success",
            StageCondition::OnFailure => "on_failure",
            StageCondition::OnFindings => "on_findings",
            StageCondition::OnHighRisk => "on_high_risk",
            StageCondition::Conditional => "conditional",
        }
    }
}

impl fmt::Display for StageCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stage condition: {0:?}")]
pub struct ParseStageConditionError(String);

impl FromStr for StageCondition {
    type Err = ParseStageConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(StageCondition::Always),
            "on_success" => Ok(StageCondition::OnSuccess),
            "on_failure" => Ok(StageCondition::OnFailure),
            "on_findings" => Ok(StageCondition::OnFindings),
            "on_high_risk" => Ok(StageCondition::OnHighRisk),
            "conditional" => Ok(StageCondition::Conditional),
            other => Err(ParseStageConditionError(other.to_string())),
        }
    }
}
