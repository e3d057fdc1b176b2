// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The pipeline executor: runs one pipeline against one job, honouring
//! stage conditions, threading [`JobContext`] between stages, and
//! aggregating findings, artifacts, and trace events.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use aetherframe_domain::condition_expr::EvalContext;
use aetherframe_domain::entities::{event_type, Artifact, Finding, TraceEvent, ORCHESTRATOR_SOURCE};
use aetherframe_domain::error::PipelineResult;
use aetherframe_domain::job_context::{JobContext, RISK_SCORE_KEY};
use aetherframe_domain::pipeline::{Pipeline, PipelineStage};
use aetherframe_domain::plugin::PluginResult;
use aetherframe_domain::repositories::JobRepository;
use aetherframe_domain::value_objects::{JobStatus, StageCondition};
use chrono::Utc;
use serde_json::Value as Json;
use tracing::{info, warn};

use crate::catalogue::PipelineCatalogue;
use crate::metrics::MetricsService;
use crate::registry::PluginRegistry;

/// What one pipeline run produced, aggregated across every stage.
#[derive(Debug, Clone)]
pub struct PipelineExecutionResult {
    pub job_id: i64,
    pub pipeline_id: String,
    pub success: bool,
    pub stages_executed: Vec<String>,
    pub stages_skipped: Vec<String>,
    pub stages_failed: Vec<String>,
    pub findings: Vec<Finding>,
    pub artifacts: Vec<Artifact>,
    pub events: Vec<TraceEvent>,
    pub execution_time_ms: u64,
    pub error: Option<String>,
    pub risk_score: f64,
    /// `true` if a between-stage cancellation check found the job row
    /// already `cancelled`, halting the run before every stage executed.
    pub cancelled: bool,
}

/// Outcome of the last executed (non-skipped) stage, used to evaluate the
/// next stage's condition. `None` until a stage has actually run.
struct LastOutcome {
    success: bool,
    produced_findings: bool,
}

/// Runs pipelines drawn from a [`PipelineCatalogue`] against plugins drawn
/// from a [`PluginRegistry`]. Stateless: all per-run state lives in
/// [`Execution`].
pub struct PipelineExecutor {
    registry: Arc<PluginRegistry>,
    catalogue: Arc<PipelineCatalogue>,
    metrics: Arc<MetricsService>,
}

impl PipelineExecutor {
    pub fn new(registry: Arc<PluginRegistry>, catalogue: Arc<PipelineCatalogue>, metrics: Arc<MetricsService>) -> PipelineExecutor {
        PipelineExecutor { registry, catalogue, metrics }
    }

    /// `job_repo` is consulted before every stage so a cancellation
    /// recorded mid-run (`POST /jobs/{id}/cancel` while the job is
    /// `running`) halts the pipeline at the next stage boundary instead
    /// of running to completion.
    pub async fn execute(
        &self,
        pipeline_id: &str,
        base_ctx: JobContext,
        job_repo: &Arc<dyn JobRepository>,
    ) -> PipelineResult<PipelineExecutionResult> {
        let pipeline = self.catalogue.get(pipeline_id)?;
        let mut run = Execution::new(base_ctx.job.id, &pipeline);

        run.emit_orchestrator_event(
            event_type::STAGE_START,
            serde_json::json!({
                "pipeline_id": pipeline.id,
                "stage_names": pipeline.stages.iter().map(|s| s.name.clone()).collect::<Vec<_>>(),
            }),
        );

        for stage in &pipeline.stages {
            if run.check_cancelled(job_repo).await {
                info!(job_id = run.job_id, stage = %stage.name, "job cancelled between stages, halting pipeline");
                break;
            }

            if !condition_holds(stage, &run.last_outcome, run.risk_score()) {
                run.stages_skipped.push(stage.name.clone());
                continue;
            }

            run.emit_orchestrator_event(event_type::STAGE_START, serde_json::json!({"stage": stage.name}));

            let stage_ctx = run.build_stage_context(&base_ctx);
            match self.run_stage(stage, &stage_ctx).await {
                Ok(output) => {
                    self.metrics.record_stage_execution(&stage.plugin_id, &stage.name, true);
                    let halt = run.apply_success(stage, output);
                    if halt {
                        break;
                    }
                }
                Err(reason) => {
                    self.metrics.record_stage_execution(&stage.plugin_id, &stage.name, false);
                    let halt = run.apply_failure(stage, reason);
                    if halt {
                        break;
                    }
                }
            }
        }

        Ok(run.finish())
    }

    async fn run_stage(&self, stage: &PipelineStage, ctx: &JobContext) -> Result<PluginResult, String> {
        let plugin = self
            .registry
            .get_instance(&stage.plugin_id, stage.config.clone())
            .map_err(|e| e.to_string())?;

        let timeout = Duration::from_secs(stage.timeout_seconds);

        match tokio::time::timeout(timeout, plugin.validate(ctx)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e.to_string()),
            Err(_) => return Err(format!("stage '{}' timed out during validate", stage.name)),
        }

        let result = match tokio::time::timeout(timeout, plugin.run(ctx)).await {
            Ok(result) => result,
            Err(_) => return Err(format!("stage '{}' timed out after {}s", stage.name, stage.timeout_seconds)),
        };

        if !result.success {
            return Err(result.error.clone().unwrap_or_else(|| "plugin reported failure".to_string()));
        }

        Ok(result)
    }
}

/// Mutable state threaded through one [`PipelineExecutor::execute`] call.
struct Execution {
    job_id: i64,
    pipeline_id: String,
    started: Instant,
    sequence: i64,
    pipeline_context: HashMap<String, Json>,
    findings: Vec<Finding>,
    artifacts: Vec<Artifact>,
    events: Vec<TraceEvent>,
    stages_executed: Vec<String>,
    stages_skipped: Vec<String>,
    stages_failed: Vec<String>,
    last_outcome: Option<LastOutcome>,
    halted_with_error: Option<String>,
    cancelled: bool,
}

impl Execution {
    fn new(job_id: i64, pipeline: &Pipeline) -> Execution {
        Execution {
            job_id,
            pipeline_id: pipeline.id.clone(),
            started: Instant::now(),
            sequence: 0,
            pipeline_context: HashMap::new(),
            findings: Vec::new(),
            artifacts: Vec::new(),
            events: Vec::new(),
            stages_executed: Vec::new(),
            stages_skipped: Vec::new(),
            stages_failed: Vec::new(),
            last_outcome: None,
            halted_with_error: None,
            cancelled: false,
        }
    }

    /// Re-reads the job row and marks this run cancelled if it's found
    /// `cancelled` there already. A plain DB read, not a push notification:
    /// cheap enough to afford between every stage at this engine's scale.
    async fn check_cancelled(&mut self, job_repo: &Arc<dyn JobRepository>) -> bool {
        if let Ok(Some(job)) = job_repo.find_by_id(self.job_id).await {
            if job.status == JobStatus::Cancelled {
                self.cancelled = true;
            }
        }
        self.cancelled
    }

    fn risk_score(&self) -> f64 {
        self.pipeline_context.get(RISK_SCORE_KEY).and_then(Json::as_f64).unwrap_or(0.0)
    }

    fn next_sequence(&mut self) -> i64 {
        let seq = self.sequence;
        self.sequence += 1;
        seq
    }

    fn emit_orchestrator_event(&mut self, event_type: &str, payload: Json) {
        let sequence = self.next_sequence();
        self.events.push(TraceEvent {
            id: 0,
            job_id: self.job_id,
            ts: Utc::now(),
            source: ORCHESTRATOR_SOURCE.to_string(),
            event_type: event_type.to_string(),
            symbol: None,
            address: None,
            thread_id: None,
            process_id: None,
            sequence,
            payload,
        });
    }

    fn build_stage_context(&self, base_ctx: &JobContext) -> JobContext {
        JobContext {
            job: base_ctx.job.clone(),
            target_path: base_ctx.target_path.clone(),
            workspace_dir: base_ctx.workspace_dir.clone(),
            artifacts_dir: base_ctx.artifacts_dir.clone(),
            previous_findings: self.findings.clone(),
            previous_artifacts: self.artifacts.clone(),
            pipeline_context: self.pipeline_context.clone(),
        }
    }

    /// Applies a successful stage outcome; returns `true` if the pipeline
    /// should halt (the stage asked to skip the remainder).
    fn apply_success(&mut self, stage: &PipelineStage, output: PluginResult) -> bool {
        let now = Utc::now();
        let findings_count = output.findings.len();
        let artifacts_count = output.artifacts.len();

        for new_finding in output.findings {
            self.findings.push(Finding {
                id: 0,
                job_id: self.job_id,
                plugin_id: stage.plugin_id.clone(),
                stage: stage.name.clone(),
                severity: new_finding.severity,
                category: new_finding.category,
                title: new_finding.title,
                description: new_finding.description,
                evidence: new_finding.evidence,
                confidence: new_finding.confidence,
                tags: new_finding.tags,
                created_at: now,
            });
        }

        for new_artifact in output.artifacts {
            self.artifacts.push(Artifact {
                id: 0,
                job_id: self.job_id,
                plugin_id: stage.plugin_id.clone(),
                stage: stage.name.clone(),
                artifact_type: new_artifact.artifact_type,
                name: new_artifact.name,
                description: new_artifact.description,
                uri: new_artifact.uri,
                sha256: new_artifact.sha256,
                size_bytes: new_artifact.size_bytes,
                meta: new_artifact.meta,
                created_at: now,
            });
        }

        for new_event in output.events {
            let sequence = self.next_sequence();
            self.events.push(TraceEvent {
                id: 0,
                job_id: self.job_id,
                ts: new_event.ts,
                source: new_event.source,
                event_type: new_event.event_type,
                symbol: new_event.symbol,
                address: new_event.address,
                thread_id: new_event.thread_id,
                process_id: new_event.process_id,
                sequence,
                payload: new_event.payload,
            });
        }

        for (key, value) in output.context_data {
            self.pipeline_context.insert(key, value);
        }

        if let Some(candidate) = output.risk_score {
            let merged = self.risk_score().max(candidate);
            self.pipeline_context.insert(RISK_SCORE_KEY.to_string(), Json::from(merged));
        }

        self.emit_orchestrator_event(
            event_type::STAGE_COMPLETE,
            serde_json::json!({
                "stage": stage.name,
                "plugin": stage.plugin_id,
                "findings_count": findings_count,
                "artifacts_count": artifacts_count,
            }),
        );

        self.stages_executed.push(stage.name.clone());
        self.last_outcome = Some(LastOutcome {
            success: true,
            produced_findings: findings_count > 0,
        });

        if output.skip_remaining {
            info!(stage = %stage.name, "stage requested skip_remaining, halting pipeline successfully");
            return true;
        }
        false
    }

    /// Applies a failed stage outcome; returns `true` if the pipeline
    /// should halt (the stage was non-optional).
    fn apply_failure(&mut self, stage: &PipelineStage, reason: String) -> bool {
        self.emit_orchestrator_event(event_type::STAGE_ERROR, serde_json::json!({"stage": stage.name, "error": reason}));

        self.stages_failed.push(stage.name.clone());
        self.last_outcome = Some(LastOutcome {
            success: false,
            produced_findings: false,
        });

        if !stage.optional {
            warn!(stage = %stage.name, error = %reason, "non-optional stage failed, halting pipeline");
            self.halted_with_error = Some(reason);
            return true;
        }
        false
    }

    fn finish(self) -> PipelineExecutionResult {
        let risk_score = self.risk_score();
        PipelineExecutionResult {
            job_id: self.job_id,
            pipeline_id: self.pipeline_id,
            success: self.halted_with_error.is_none() && !self.cancelled,
            stages_executed: self.stages_executed,
            stages_skipped: self.stages_skipped,
            stages_failed: self.stages_failed,
            risk_score,
            findings: self.findings,
            artifacts: self.artifacts,
            events: self.events,
            execution_time_ms: self.started.elapsed().as_millis() as u64,
            error: self.halted_with_error,
            cancelled: self.cancelled,
        }
    }
}

fn condition_holds(stage: &PipelineStage, last_outcome: &Option<LastOutcome>, risk_score: f64) -> bool {
    match stage.condition {
        StageCondition::Always => true,
        StageCondition::OnSuccess => last_outcome.as_ref().map(|o| o.success).unwrap_or(true),
        StageCondition::OnFailure => last_outcome.as_ref().map(|o| !o.success).unwrap_or(false),
        StageCondition::OnFindings => last_outcome.as_ref().map(|o| o.produced_findings).unwrap_or(false),
        StageCondition::OnHighRisk => risk_score >= 0.7,
        StageCondition::Conditional => {
            let Some(expr) = &stage.condition_expr else {
                return false;
            };
            let success = last_outcome.as_ref().map(|o| o.success).unwrap_or(true);
            expr.eval(&EvalContext { risk_score, success })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::PluginRegistry;
    use async_trait::async_trait;

    /// Never reports a job as cancelled; stands in for the real store in
    /// tests that don't exercise the cancellation path.
    struct NeverCancelledRepo;

    #[async_trait]
    impl JobRepository for NeverCancelledRepo {
        async fn create(&self, _new: aetherframe_domain::entities::NewJob) -> PipelineResult<aetherframe_domain::entities::Job> {
            unimplemented!("not exercised by these tests")
        }
        async fn find_by_id(&self, _id: i64) -> PipelineResult<Option<aetherframe_domain::entities::Job>> {
            Ok(None)
        }
        async fn list_all(&self) -> PipelineResult<Vec<aetherframe_domain::entities::Job>> {
            Ok(vec![])
        }
        async fn update(&self, _job: &aetherframe_domain::entities::Job) -> PipelineResult<()> {
            Ok(())
        }
    }

    fn executor_with(pipeline: Pipeline) -> (PipelineExecutor, Arc<PipelineCatalogue>, Arc<dyn JobRepository>) {
        let registry = Arc::new(PluginRegistry::with_builtin_plugins());
        let catalogue = Arc::new(PipelineCatalogue::new());
        catalogue.register(pipeline);
        let metrics = Arc::new(MetricsService::new().unwrap());
        let job_repo: Arc<dyn JobRepository> = Arc::new(NeverCancelledRepo);
        (PipelineExecutor::new(registry, catalogue.clone(), metrics), catalogue, job_repo)
    }

    fn sample_ctx(target_path: std::path::PathBuf) -> JobContext {
        use aetherframe_domain::entities::{Job, NewJob};
        use aetherframe_domain::value_objects::TargetType;
        let job = Job::new_pending(
            NewJob {
                target: target_path.display().to_string(),
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
            target_path,
            std::path::PathBuf::from("/tmp/aetherframe-test-ws"),
            std::path::PathBuf::from("/tmp/aetherframe-test-artifacts"),
        )
    }

    #[tokio::test]
    async fn unknown_plugin_id_fails_the_stage_without_a_panic() {
        let target = tempfile::NamedTempFile::new().unwrap();
        let pipeline = Pipeline::new("solo", "Solo").add_stage(
            PipelineStage::new("gate", "does-not-exist", StageCondition::Always).unwrap(),
        );
        let (executor, _catalogue, job_repo) = executor_with(pipeline);
        let result = executor.execute("solo", sample_ctx(target.path().to_path_buf()), &job_repo).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.stages_failed, vec!["gate"]);
    }

    #[tokio::test]
    async fn a_skipped_stage_never_appears_in_executed_or_failed() {
        let target = tempfile::NamedTempFile::new().unwrap();
        let pipeline = Pipeline::new("solo", "Solo")
            .add_stage(PipelineStage::new("gate", "umbriel", StageCondition::Always).unwrap())
            .add_stage(PipelineStage::new("trace", "laintrace", StageCondition::OnFailure).unwrap());
        let (executor, _catalogue, job_repo) = executor_with(pipeline);
        let result = executor.execute("solo", sample_ctx(target.path().to_path_buf()), &job_repo).await.unwrap();
        assert!(result.success);
        assert_eq!(result.stages_executed, vec!["gate"]);
        assert_eq!(result.stages_skipped, vec!["trace"]);
    }

    #[tokio::test]
    async fn a_cancelled_job_halts_before_its_next_stage_runs() {
        let target = tempfile::NamedTempFile::new().unwrap();
        let pipeline = Pipeline::new("solo", "Solo")
            .add_stage(PipelineStage::new("gate", "umbriel", StageCondition::Always).unwrap())
            .add_stage(PipelineStage::new("static", "aegis", StageCondition::Always).unwrap());
        let (executor, _catalogue, _never_cancelled) = executor_with(pipeline);

        struct AlwaysCancelledRepo;
        #[async_trait]
        impl JobRepository for AlwaysCancelledRepo {
            async fn create(&self, _new: aetherframe_domain::entities::NewJob) -> PipelineResult<aetherframe_domain::entities::Job> {
                unimplemented!("not exercised by this test")
            }
            async fn find_by_id(&self, id: i64) -> PipelineResult<Option<aetherframe_domain::entities::Job>> {
                let mut job = sample_ctx(std::path::PathBuf::from("/tmp")).job;
                job.id = id;
                job.status = JobStatus::Cancelled;
                Ok(Some(job))
            }
            async fn list_all(&self) -> PipelineResult<Vec<aetherframe_domain::entities::Job>> {
                Ok(vec![])
            }
            async fn update(&self, _job: &aetherframe_domain::entities::Job) -> PipelineResult<()> {
                Ok(())
            }
        }
        let job_repo: Arc<dyn JobRepository> = Arc::new(AlwaysCancelledRepo);

        let result = executor.execute("solo", sample_ctx(target.path().to_path_buf()), &job_repo).await.unwrap();
        assert!(result.cancelled);
        assert!(!result.success);
        assert!(result.stages_executed.is_empty());
    }
}
