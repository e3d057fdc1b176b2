// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end lifecycle coverage: a job submitted against a real SQLite
//! database, run by a real `Worker` against the built-in plugins, and
//! (for the HTTP-facing cases) driven through the actual router rather
//! than by calling a handler function directly.

use std::path::PathBuf;
use std::sync::Arc;

use aetherframe_core::http::{build_router, AppState};
use aetherframe_core::orchestrator::{Worker, WorkerConfig};
use aetherframe_core::queue::TaskQueue;
use aetherframe_core::registry::PluginRegistry;
use aetherframe_core::store::SqliteStore;
use aetherframe_core::{AppConfig, MetricsService, PipelineCatalogue, PipelineExecutor};
use aetherframe_domain::entities::{Job, NewJob};
use aetherframe_domain::error::PipelineError;
use aetherframe_domain::pipeline::{Pipeline, PipelineStageBuilder};
use aetherframe_domain::repositories::{ArtifactRepository, FindingRepository, JobRepository};
use aetherframe_domain::value_objects::{JobStatus, StageCondition, TargetType};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tempfile::{NamedTempFile, TempDir};
use tower::ServiceExt;

struct Harness {
    store: Arc<SqliteStore>,
    worker: Worker,
    _db_file: NamedTempFile,
    _workspace: TempDir,
}

async fn harness() -> Harness {
    let db_file = NamedTempFile::new().unwrap();
    let db_path = db_file.path().to_str().unwrap().to_string();
    let store = Arc::new(SqliteStore::connect(&format!("sqlite://{db_path}")).await.unwrap());

    let registry = Arc::new(PluginRegistry::with_builtin_plugins());
    let catalogue = Arc::new(PipelineCatalogue::with_builtin_pipelines());
    let metrics = Arc::new(MetricsService::new().unwrap());
    let executor = Arc::new(PipelineExecutor::new(registry, catalogue, metrics.clone()));

    let workspace = TempDir::new().unwrap();
    let worker_config = WorkerConfig {
        workspace_base: workspace.path().join("workspace"),
        artifacts_base: workspace.path().join("artifacts"),
        cleanup_workspace: true,
    };

    let worker = Worker::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        executor,
        metrics,
        worker_config,
    );

    Harness { store, worker, _db_file: db_file, _workspace: workspace }
}

async fn create_job(store: &SqliteStore, target: PathBuf, pipeline_id: &str) -> Job {
    JobRepository::create(
        store,
        NewJob {
            target: target.display().to_string(),
            target_type: TargetType::Binary,
            pipeline_id: Some(pipeline_id.to_string()),
            options: serde_json::Value::Null,
            tags: vec![],
            created_by: None,
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn a_quicklook_run_against_a_benign_file_completes_with_no_findings() {
    let h = harness().await;
    let target = NamedTempFile::new().unwrap();
    std::fs::write(target.path(), b"nothing interesting in here").unwrap();

    let job = create_job(&h.store, target.path().to_path_buf(), "quicklook").await;
    h.worker.process_job(job.id).await;

    let finished = JobRepository::find_by_id(h.store.as_ref(), job.id).await.unwrap().unwrap();
    assert_eq!(finished.status, JobStatus::Completed);
    assert!(finished.started_at.is_some());
    assert!(finished.completed_at.is_some());

    let result = finished.result.unwrap();
    assert_eq!(
        result["stages_executed"],
        serde_json::json!(["gate", "static", "intent"])
    );
    assert_eq!(result["stages_failed"], serde_json::json!([]));

    let artifacts = ArtifactRepository::list_for_job(h.store.as_ref(), job.id).await.unwrap();
    assert!(!artifacts.is_empty(), "each quicklook stage writes a report artifact");
}

#[tokio::test]
async fn a_missing_target_file_fails_the_job_without_running_any_stage() {
    let h = harness().await;
    let job = create_job(&h.store, PathBuf::from("/no/such/binary"), "quicklook").await;
    h.worker.process_job(job.id).await;

    let finished = JobRepository::find_by_id(h.store.as_ref(), job.id).await.unwrap().unwrap();
    assert_eq!(finished.status, JobStatus::Failed);
    assert!(finished.started_at.is_none(), "a job that never resolves its target never reaches running");

    let findings = FindingRepository::list_for_job(h.store.as_ref(), job.id, &Default::default()).await.unwrap();
    assert!(findings.is_empty());
}

#[tokio::test]
async fn a_non_optional_stage_failure_halts_the_pipeline_and_fails_the_job() {
    let h = harness().await;

    let pipeline = Pipeline::new("broken", "Broken")
        .add_stage(PipelineStageBuilder::new("gate", "does-not-exist", StageCondition::Always).build().unwrap())
        .add_stage(PipelineStageBuilder::new("follow-up", "umbriel", StageCondition::Always).build().unwrap());

    // The registry and catalogue aren't wired through `Harness` for this
    // case because it needs a pipeline that isn't one of the five
    // built-ins; build a second worker around the same store instead.
    let registry = Arc::new(PluginRegistry::with_builtin_plugins());
    let catalogue = Arc::new(PipelineCatalogue::new());
    catalogue.register(pipeline);
    let metrics = Arc::new(MetricsService::new().unwrap());
    let executor = Arc::new(PipelineExecutor::new(registry, catalogue, metrics.clone()));

    let workspace = TempDir::new().unwrap();
    let worker = Worker::new(
        h.store.clone(),
        h.store.clone(),
        h.store.clone(),
        h.store.clone(),
        h.store.clone(),
        executor,
        metrics,
        WorkerConfig {
            workspace_base: workspace.path().join("workspace"),
            artifacts_base: workspace.path().join("artifacts"),
            cleanup_workspace: true,
        },
    );

    let target = NamedTempFile::new().unwrap();
    let job = create_job(&h.store, target.path().to_path_buf(), "broken").await;
    worker.process_job(job.id).await;

    let finished = JobRepository::find_by_id(h.store.as_ref(), job.id).await.unwrap().unwrap();
    assert_eq!(finished.status, JobStatus::Failed);
    let result = finished.result.unwrap();
    assert_eq!(result["stages_executed"], serde_json::json!([]));
    assert_eq!(result["stages_failed"], serde_json::json!(["gate"]));
}

#[tokio::test]
async fn cancelling_a_job_before_the_worker_picks_it_up_leaves_it_untouched() {
    let h = harness().await;
    let target = NamedTempFile::new().unwrap();
    let mut job = create_job(&h.store, target.path().to_path_buf(), "quicklook").await;

    job.cancel(chrono::Utc::now());
    JobRepository::update(h.store.as_ref(), &job).await.unwrap();

    h.worker.process_job(job.id).await;

    let finished = JobRepository::find_by_id(h.store.as_ref(), job.id).await.unwrap().unwrap();
    assert_eq!(finished.status, JobStatus::Cancelled);
    assert!(finished.started_at.is_none(), "a cancelled-before-dequeue job never starts");

    let artifacts = ArtifactRepository::list_for_job(h.store.as_ref(), job.id).await.unwrap();
    assert!(artifacts.is_empty());
}

#[tokio::test]
async fn an_unknown_pipeline_id_fails_the_job_with_a_pipeline_not_found_error() {
    let h = harness().await;
    let target = NamedTempFile::new().unwrap();
    let job = create_job(&h.store, target.path().to_path_buf(), "does-not-exist-pipeline").await;
    h.worker.process_job(job.id).await;

    let finished = JobRepository::find_by_id(h.store.as_ref(), job.id).await.unwrap().unwrap();
    assert_eq!(finished.status, JobStatus::Failed);
    assert!(finished.error.as_deref().unwrap_or_default().contains("does-not-exist-pipeline"));
}

fn test_state(store: Arc<SqliteStore>) -> AppState {
    let (queue, _receiver) = TaskQueue::new(16);
    AppState::new(
        store,
        queue,
        Arc::new(PipelineCatalogue::with_builtin_pipelines()),
        Arc::new(PluginRegistry::with_builtin_plugins()),
        Arc::new(MetricsService::new().unwrap()),
        Arc::new(AppConfig::default()),
    )
}

#[tokio::test]
async fn the_health_endpoint_reports_ok() {
    let h = harness().await;
    let app = build_router(test_state(h.store));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn submitting_a_job_with_an_empty_target_is_rejected_as_unprocessable() {
    let h = harness().await;
    let app = build_router(test_state(h.store));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/jobs")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::json!({"target": ""}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn a_valid_job_submission_is_queued_and_visible_by_id() {
    let h = harness().await;
    let target = NamedTempFile::new().unwrap();
    let app = build_router(test_state(h.store.clone()));

    let create_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/jobs")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({"target": target.path().display().to_string()}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(create_response.status(), StatusCode::OK);

    let jobs = JobRepository::list_all(h.store.as_ref()).await.unwrap();
    assert_eq!(jobs.len(), 1);
    let job_id = jobs[0].id;

    let get_response = app
        .oneshot(Request::builder().uri(format!("/jobs/{job_id}")).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(get_response.status(), StatusCode::OK);
}

#[tokio::test]
async fn fetching_an_unknown_job_id_returns_not_found() {
    let h = harness().await;
    let app = build_router(test_state(h.store));

    let response = app
        .oneshot(Request::builder().uri("/jobs/999999").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(PipelineError::JobNotFound(999999).is_not_found());
}

#[tokio::test]
async fn the_metrics_endpoint_emits_the_mandatory_gauge_families() {
    let h = harness().await;
    let app = build_router(test_state(h.store));

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
