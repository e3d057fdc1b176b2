// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The value threaded through a pipeline: job metadata, resolved paths,
//! and everything accumulated by prior stages.

use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::Value as Json;

use crate::entities::{Artifact, Finding, Job};

/// Per-stage context, rebuilt by the executor before each stage call by
/// copying the base context and appending the accumulators built up so
/// far. Cheap to clone: paths and the job are shared by value, the
/// accumulators are the only growing state.
#[derive(Debug, Clone)]
pub struct JobContext {
    pub job: Job,
    pub target_path: PathBuf,
    pub workspace_dir: PathBuf,
    pub artifacts_dir: PathBuf,
    pub previous_findings: Vec<Finding>,
    pub previous_artifacts: Vec<Artifact>,
    pub pipeline_context: HashMap<String, Json>,
}

/// Key under which the executor tracks the running risk score inside
/// `pipeline_context`.
pub const RISK_SCORE_KEY: &str = "_risk_score";

impl JobContext {
    pub fn new(job: Job, target_path: PathBuf, workspace_dir: PathBuf, artifacts_dir: PathBuf) -> JobContext {
        JobContext {
            job,
            target_path,
            workspace_dir,
            artifacts_dir,
            previous_findings: Vec::new(),
            previous_artifacts: Vec::new(),
            pipeline_context: HashMap::new(),
        }
    }

    pub fn get_workspace_path(&self, name: &str) -> PathBuf {
        self.workspace_dir.join(name)
    }

    pub fn get_artifact_path(&self, name: &str) -> PathBuf {
        self.artifacts_dir.join(name)
    }

    /// The running aggregated risk score, 0.0 if no stage has set one yet.
    pub fn risk_score(&self) -> f64 {
        self.pipeline_context
            .get(RISK_SCORE_KEY)
            .and_then(Json::as_f64)
            .unwrap_or(0.0)
    }

    /// Merges a stage's returned `result.risk_score` in as the running
    /// maximum, per the monotonic non-decreasing invariant.
    pub fn merge_risk_score(&mut self, candidate: f64) {
        let current = self.risk_score();
        let merged = current.max(candidate);
        self.pipeline_context
            .insert(RISK_SCORE_KEY.to_string(), Json::from(merged));
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::entities::NewJob;
    use crate::value_objects::TargetType;
    use chrono::Utc;

    fn sample_ctx() -> JobContext {
        let job = Job::new_pending(
            NewJob {
                target: "/samples/clean.bin".to_string(),
                target_type: TargetType::Binary,
                pipeline_id: None,
                options: Json::Null,
                tags: vec![],
                created_by: None,
            },
            Utc::now(),
        );
        JobContext::new(
            job,
            PathBuf::from("/samples/clean.bin"),
            PathBuf::from("/tmp/ws/1"),
            PathBuf::from("/tmp/artifacts/1"),
        )
    }

    #[test]
    fn risk_score_defaults_to_zero() {
        assert_eq!(sample_ctx().risk_score(), 0.0);
    }

    #[test]
    fn merge_risk_score_never_decreases() {
        let mut ctx = sample_ctx();
        ctx.merge_risk_score(0.5);
        assert_eq!(ctx.risk_score(), 0.5);
        ctx.merge_risk_score(0.3);
        assert_eq!(ctx.risk_score(), 0.5);
        ctx.merge_risk_score(0.9);
        assert_eq!(ctx.risk_score(), 0.9);
    }

    #[test]
    fn workspace_and_artifact_paths_join_the_base_dir() {
        let ctx = sample_ctx();
        assert_eq!(ctx.get_workspace_path("scratch.txt"), Path::new("/tmp/ws/1/scratch.txt"));
        assert_eq!(
            ctx.get_artifact_path("report.json"),
            Path::new("/tmp/artifacts/1/report.json")
        );
    }
}
