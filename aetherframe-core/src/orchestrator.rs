// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The worker: owns the life of one job row from pickup to terminal
//! status. Implements the nine-step algorithm a dequeued task runs
//! through — load, resolve, stage, run, persist, summarize, transition,
//! clean up — with a single writer (this module) for every row the
//! pipeline run produces.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use aetherframe_domain::entities::{Job, NewEvent, JOB_FAILED_EVENT};
use aetherframe_domain::error::{PipelineError, PipelineResult};
use aetherframe_domain::job_context::JobContext;
use aetherframe_domain::repositories::{ArtifactRepository, EventRepository, FindingRepository, JobRepository, TraceEventRepository};
use aetherframe_domain::value_objects::JobStatus;
use chrono::Utc;
use serde_json::json;
use tracing::{error, info, warn};

use crate::executor::{PipelineExecutionResult, PipelineExecutor};
use crate::metrics::MetricsService;
use crate::resolver::resolver_for;

/// Base directories and cleanup policy the worker stages a job's files
/// under. Built from the `workspace_base`/`artifacts_base`/
/// `cleanup_workspace` configuration keys.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub workspace_base: PathBuf,
    pub artifacts_base: PathBuf,
    pub cleanup_workspace: bool,
}

/// Runs queued jobs to completion. One `Worker` is shared (behind an
/// `Arc`) by every concurrently-running slot in the dispatch loop; it
/// holds no per-job state itself.
pub struct Worker {
    job_repo: Arc<dyn JobRepository>,
    finding_repo: Arc<dyn FindingRepository>,
    artifact_repo: Arc<dyn ArtifactRepository>,
    trace_event_repo: Arc<dyn TraceEventRepository>,
    event_repo: Arc<dyn EventRepository>,
    executor: Arc<PipelineExecutor>,
    metrics: Arc<MetricsService>,
    config: WorkerConfig,
}

impl Worker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        job_repo: Arc<dyn JobRepository>,
        finding_repo: Arc<dyn FindingRepository>,
        artifact_repo: Arc<dyn ArtifactRepository>,
        trace_event_repo: Arc<dyn TraceEventRepository>,
        event_repo: Arc<dyn EventRepository>,
        executor: Arc<PipelineExecutor>,
        metrics: Arc<MetricsService>,
        config: WorkerConfig,
    ) -> Worker {
        Worker {
            job_repo,
            finding_repo,
            artifact_repo,
            trace_event_repo,
            event_repo,
            executor,
            metrics,
            config,
        }
    }

    /// Picks up one queued job id and runs it to a terminal status. Never
    /// propagates an error to the caller: a failure at any step still
    /// leaves the job row in a terminal state, because the dispatch loop
    /// has no other place to route an exception to.
    pub async fn process_job(&self, job_id: i64) {
        if let Err(e) = self.try_process_job(job_id).await {
            error!(job_id, error = %e, "job pickup could not reach a terminal status on its own");
            self.emit_job_failed_event(job_id, e.to_string()).await;
        }
    }

    async fn try_process_job(&self, job_id: i64) -> PipelineResult<()> {
        // 1. Load the job by id; fail the task if absent.
        let mut job = self
            .job_repo
            .find_by_id(job_id)
            .await?
            .ok_or(PipelineError::JobNotFound(job_id))?;

        // A redelivered or cancelled-while-pending task: detect an
        // already-terminal job and no-op rather than re-run it.
        if job.status != JobStatus::Pending {
            info!(job_id, status = %job.status, "skipping job not in pending status at pickup");
            return Ok(());
        }

        let workspace_dir = self.config.workspace_base.join(job_id.to_string());
        let artifacts_dir = self.config.artifacts_base.join(job_id.to_string());

        // 2. Resolve the target; a missing target is a fatal job failure
        // and never reaches `running`.
        let resolver = resolver_for(job.target_type);
        let target_path = match resolver.resolve(&job.target, job.target_type, &workspace_dir).await {
            Ok(path) => path,
            Err(e) => {
                self.finish_as_failed(&mut job, e.to_string(), None, &workspace_dir).await?;
                return Ok(());
            }
        };

        // 3. Create workspace_dir and artifacts_dir under configured
        // bases, namespaced by job id.
        if let Err(e) = create_job_dirs(&workspace_dir, &artifacts_dir).await {
            self.finish_as_failed(&mut job, e, None, &workspace_dir).await?;
            return Ok(());
        }

        // 4. Transition job row to running; set started_at.
        job.mark_running(Utc::now());
        self.job_repo.update(&job).await?;
        self.metrics.record_job_started();

        // 5. Build base_ctx and call the executor. `job_repo` lets the
        // executor re-check this job's row between stages, so a
        // cancellation recorded mid-run halts the pipeline there instead
        // of running to completion.
        let base_ctx = JobContext::new(job.clone(), target_path, workspace_dir.clone(), artifacts_dir);
        let pipeline_id = job.pipeline_id.clone();

        match self.executor.execute(&pipeline_id, base_ctx, &self.job_repo).await {
            Ok(result) => self.finish_execution(&mut job, result, &workspace_dir).await,
            Err(e) => self.finish_as_failed(&mut job, e.to_string(), None, &workspace_dir).await,
        }
    }

    /// Steps 6-9 for a pipeline that actually ran: persist its rows,
    /// compute the summary, transition to completed/failed, and clean up
    /// the workspace.
    async fn finish_execution(&self, job: &mut Job, result: PipelineExecutionResult, workspace_dir: &Path) -> PipelineResult<()> {
        let findings_count = result.findings.len();
        let artifacts_count = result.artifacts.len();

        // 6. Persist in this order: findings, artifacts, trace events.
        // Each failure is logged but never rolls back a sibling write;
        // the job is already committed to a terminal state regardless.
        for finding in result.findings {
            let severity = finding.severity;
            if let Err(e) = self.finding_repo.create(job.id, finding).await {
                warn!(job_id = job.id, error = %e, "failed to persist a finding");
            }
            self.metrics.record_finding(severity.as_str());
        }
        for artifact in result.artifacts {
            if let Err(e) = self.artifact_repo.create(job.id, artifact).await {
                warn!(job_id = job.id, error = %e, "failed to persist an artifact");
            }
        }
        for event in result.events {
            if let Err(e) = self.trace_event_repo.create(job.id, event).await {
                warn!(job_id = job.id, error = %e, "failed to persist a trace event");
            }
        }

        // The executor already halts between stages once it notices the
        // job row has been cancelled; this is the pre-write guard for the
        // remaining race where cancellation lands during the last stage's
        // own execution, after the executor's last between-stage check.
        if result.cancelled || self.is_cancelled(job.id).await {
            info!(job_id = job.id, "job was cancelled while running; discarding the pipeline's completed/failed outcome");
            self.metrics.record_job_terminal(JobStatus::Cancelled, job_duration_seconds(job));
            self.cleanup_workspace(workspace_dir).await;
            return Ok(());
        }

        // 7. Compute the final job result summary.
        let summary = json!({
            "pipeline_id": result.pipeline_id,
            "stages_executed": result.stages_executed,
            "stages_failed": result.stages_failed,
            "risk_score": result.risk_score,
            "execution_time_ms": result.execution_time_ms,
            "findings_count": findings_count,
            "artifacts_count": artifacts_count,
            "error": result.error,
        });

        let now = Utc::now();
        if result.success {
            job.mark_completed(summary, now);
        } else {
            job.mark_failed(result.error.unwrap_or_else(|| "pipeline reported failure".to_string()), Some(summary), now);
        }

        // 8. Transition job row to completed or failed; set completed_at.
        self.job_repo.update(job).await?;
        self.metrics.record_job_terminal(job.status, job_duration_seconds(job));

        // 9. Delete the workspace directory (artifacts directory persists).
        self.cleanup_workspace(workspace_dir).await;

        Ok(())
    }

    /// Re-reads the job row to check for a cancellation that slipped in
    /// after the executor's last between-stage check.
    async fn is_cancelled(&self, job_id: i64) -> bool {
        matches!(self.job_repo.find_by_id(job_id).await, Ok(Some(job)) if job.status == JobStatus::Cancelled)
    }

    /// A job that never reached `running` (missing target, directory
    /// creation failure) or whose executor call itself errored (unknown
    /// pipeline id). Goes straight to failed with the given error.
    async fn finish_as_failed(
        &self,
        job: &mut Job,
        error: String,
        result: Option<serde_json::Value>,
        workspace_dir: &Path,
    ) -> PipelineResult<()> {
        let ever_ran = job.started_at.is_some();
        job.mark_failed(error.clone(), result, Utc::now());
        self.job_repo.update(job).await?;
        if ever_ran {
            self.metrics.record_job_terminal(JobStatus::Failed, job_duration_seconds(job));
        }
        self.emit_job_failed_event(job.id, error).await;
        self.cleanup_workspace(workspace_dir).await;
        Ok(())
    }

    /// Emits the generic audit event a job failure always carries,
    /// independent of whether the failure happened before or after the
    /// job row itself could be updated.
    async fn emit_job_failed_event(&self, job_id: i64, error: String) {
        let new_event = NewEvent {
            event_type: JOB_FAILED_EVENT.to_string(),
            payload: json!({"error": error, "ts": Utc::now().to_rfc3339()}),
            job_id: Some(job_id),
        };
        if let Err(e) = self.event_repo.create(new_event).await {
            warn!(job_id, error = %e, "failed to persist the job_failed audit event");
        }
    }

    async fn cleanup_workspace(&self, workspace_dir: &Path) {
        if !self.config.cleanup_workspace {
            return;
        }
        if let Err(e) = tokio::fs::remove_dir_all(workspace_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(workspace_dir = %workspace_dir.display(), error = %e, "failed to remove workspace directory after job completion");
            }
        }
    }
}

/// Seconds between `started_at` and `completed_at`, or `0.0` if the job
/// never reached `running` — the caller is expected to skip recording
/// duration for jobs in that state instead of relying on this fallback.
fn job_duration_seconds(job: &Job) -> f64 {
    match (job.started_at, job.completed_at) {
        (Some(started), Some(completed)) => (completed - started).num_milliseconds() as f64 / 1000.0,
        _ => 0.0,
    }
}

async fn create_job_dirs(workspace_dir: &Path, artifacts_dir: &Path) -> Result<(), String> {
    tokio::fs::create_dir_all(workspace_dir)
        .await
        .map_err(|e| format!("failed to create workspace directory {}: {e}", workspace_dir.display()))?;
    tokio::fs::create_dir_all(artifacts_dir)
        .await
        .map_err(|e| format!("failed to create artifacts directory {}: {e}", artifacts_dir.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::PipelineCatalogue;
    use crate::registry::PluginRegistry;
    use aetherframe_domain::entities::{Artifact, Event, Finding, Job, NewJob, TraceEvent};
    use aetherframe_domain::pipeline::{Pipeline, PipelineStage};
    use aetherframe_domain::repositories::{FindingFilter, TraceEventFilter};
    use aetherframe_domain::value_objects::{StageCondition, TargetType};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::Value as Json;
    use std::collections::HashMap;

    #[derive(Default)]
    struct InMemoryStore {
        jobs: Mutex<HashMap<i64, Job>>,
        findings: Mutex<Vec<Finding>>,
        artifacts: Mutex<Vec<Artifact>>,
        trace_events: Mutex<Vec<TraceEvent>>,
        events: Mutex<Vec<Event>>,
        next_id: Mutex<i64>,
    }

    impl InMemoryStore {
        fn seed(job: Job) -> Arc<InMemoryStore> {
            let store = Arc::new(InMemoryStore::default());
            store.jobs.lock().insert(job.id, job);
            store
        }

        fn next(&self) -> i64 {
            let mut n = self.next_id.lock();
            *n += 1;
            *n
        }
    }

    #[async_trait]
    impl JobRepository for InMemoryStore {
        async fn create(&self, _new: NewJob) -> PipelineResult<Job> {
            unimplemented!("not exercised by these tests")
        }
        async fn find_by_id(&self, id: i64) -> PipelineResult<Option<Job>> {
            Ok(self.jobs.lock().get(&id).cloned())
        }
        async fn list_all(&self) -> PipelineResult<Vec<Job>> {
            Ok(self.jobs.lock().values().cloned().collect())
        }
        async fn update(&self, job: &Job) -> PipelineResult<()> {
            self.jobs.lock().insert(job.id, job.clone());
            Ok(())
        }
    }

    #[async_trait]
    impl FindingRepository for InMemoryStore {
        async fn create(&self, job_id: i64, mut finding: Finding) -> PipelineResult<Finding> {
            finding.id = self.next();
            finding.job_id = job_id;
            self.findings.lock().push(finding.clone());
            Ok(finding)
        }
        async fn list_for_job(&self, job_id: i64, _filter: &FindingFilter) -> PipelineResult<Vec<Finding>> {
            Ok(self.findings.lock().iter().filter(|f| f.job_id == job_id).cloned().collect())
        }
    }

    #[async_trait]
    impl ArtifactRepository for InMemoryStore {
        async fn create(&self, job_id: i64, mut artifact: Artifact) -> PipelineResult<Artifact> {
            artifact.id = self.next();
            artifact.job_id = job_id;
            self.artifacts.lock().push(artifact.clone());
            Ok(artifact)
        }
        async fn list_for_job(&self, job_id: i64) -> PipelineResult<Vec<Artifact>> {
            Ok(self.artifacts.lock().iter().filter(|a| a.job_id == job_id).cloned().collect())
        }
    }

    #[async_trait]
    impl TraceEventRepository for InMemoryStore {
        async fn create(&self, job_id: i64, mut event: TraceEvent) -> PipelineResult<TraceEvent> {
            event.id = self.next();
            event.job_id = job_id;
            self.trace_events.lock().push(event.clone());
            Ok(event)
        }
        async fn list_for_job(&self, job_id: i64, _filter: &TraceEventFilter) -> PipelineResult<Vec<TraceEvent>> {
            Ok(self.trace_events.lock().iter().filter(|e| e.job_id == job_id).cloned().collect())
        }
    }

    #[async_trait]
    impl EventRepository for InMemoryStore {
        async fn create(&self, new: NewEvent) -> PipelineResult<Event> {
            let event = Event {
                id: self.next(),
                event_type: new.event_type,
                payload: new.payload,
                job_id: new.job_id,
                created_at: Utc::now(),
            };
            self.events.lock().push(event.clone());
            Ok(event)
        }
        async fn list_all(&self) -> PipelineResult<Vec<Event>> {
            Ok(self.events.lock().clone())
        }
    }

    fn pending_job(id: i64, target: String) -> Job {
        let mut job = Job::new_pending(
            NewJob {
                target,
                target_type: TargetType::Binary,
                pipeline_id: Some("solo".to_string()),
                options: Json::Null,
                tags: vec![],
                created_by: None,
            },
            Utc::now(),
        );
        job.id = id;
        job
    }

    fn worker_with(store: Arc<InMemoryStore>, config: WorkerConfig, pipeline: Pipeline) -> Worker {
        let registry = Arc::new(PluginRegistry::with_builtin_plugins());
        let catalogue = Arc::new(PipelineCatalogue::new());
        catalogue.register(pipeline);
        let metrics = Arc::new(MetricsService::new().unwrap());
        let executor = Arc::new(PipelineExecutor::new(registry, catalogue, metrics.clone()));
        Worker::new(store.clone(), store.clone(), store.clone(), store.clone(), store, executor, metrics, config)
    }

    fn temp_dirs() -> (tempfile::TempDir, WorkerConfig) {
        let root = tempfile::tempdir().unwrap();
        let config = WorkerConfig {
            workspace_base: root.path().join("workspace"),
            artifacts_base: root.path().join("artifacts"),
            cleanup_workspace: true,
        };
        (root, config)
    }

    #[tokio::test]
    async fn a_missing_target_fails_the_job_without_ever_reaching_running() {
        let (_root, config) = temp_dirs();
        let job = pending_job(1, "/definitely/does/not/exist.bin".to_string());
        let store = InMemoryStore::seed(job);
        let pipeline = Pipeline::new("solo", "Solo").add_stage(PipelineStage::new("gate", "umbriel", StageCondition::Always).unwrap());
        let worker = worker_with(store.clone(), config, pipeline);

        worker.process_job(1).await;

        let job = store.jobs.lock().get(&1).cloned().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.started_at.is_none());
        assert!(store.events.lock().iter().any(|e| e.event_type == JOB_FAILED_EVENT));
    }

    #[tokio::test]
    async fn a_successful_pipeline_completes_the_job_and_persists_its_rows() {
        let (_root, config) = temp_dirs();
        let target = tempfile::NamedTempFile::new().unwrap();
        let job = pending_job(2, target.path().display().to_string());
        let store = InMemoryStore::seed(job);
        let pipeline = Pipeline::new("solo", "Solo").add_stage(PipelineStage::new("gate", "umbriel", StageCondition::Always).unwrap());
        let worker = worker_with(store.clone(), config, pipeline);

        worker.process_job(2).await;

        let job = store.jobs.lock().get(&2).cloned().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.started_at.is_some());
        assert!(job.completed_at.is_some());
        assert!(job.result.is_some());
    }

    #[tokio::test]
    async fn a_job_not_in_pending_status_is_skipped_not_rerun() {
        let (_root, config) = temp_dirs();
        let mut job = pending_job(3, "/tmp".to_string());
        job.status = JobStatus::Cancelled;
        let store = InMemoryStore::seed(job);
        let pipeline = Pipeline::new("solo", "Solo").add_stage(PipelineStage::new("gate", "umbriel", StageCondition::Always).unwrap());
        let worker = worker_with(store.clone(), config, pipeline);

        worker.process_job(3).await;

        let job = store.jobs.lock().get(&3).cloned().unwrap();
        assert_eq!(job.status, JobStatus::Cancelled);
        assert!(store.events.lock().is_empty());
    }

    #[tokio::test]
    async fn an_unknown_job_id_emits_a_job_failed_event_with_no_job_row_to_update() {
        let (_root, config) = temp_dirs();
        let store = Arc::new(InMemoryStore::default());
        let pipeline = Pipeline::new("solo", "Solo").add_stage(PipelineStage::new("gate", "umbriel", StageCondition::Always).unwrap());
        let worker = worker_with(store.clone(), config, pipeline);

        worker.process_job(999).await;

        assert!(store.events.lock().iter().any(|e| e.event_type == JOB_FAILED_EVENT && e.job_id == Some(999)));
    }
}
