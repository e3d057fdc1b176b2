// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Route handlers. Stateless beyond the cloned [`AppState`]: every
//! handler delegates to the store and the task queue, never executes a
//! pipeline itself.

use std::collections::HashMap;

use aetherframe_domain::entities::{Job, NewEvent, NewJob, NewPluginRow};
use aetherframe_domain::error::PipelineError;
use aetherframe_domain::repositories::{
    ArtifactRepository, EventRepository, FindingFilter, FindingRepository, JobRepository, PluginCatalogRepository,
    TraceEventFilter, TraceEventRepository,
};
use aetherframe_domain::value_objects::{JobStatus, TargetType};
use axum::extract::{Path, Query, State};
use axum::Json;

use super::dto::{
    CreateEventRequest, CreateJobRequest, CreatePluginRequest, FindingQuery, HealthResponse, StatusResponse, TraceEventQuery,
};
use super::error::ApiError;
use super::state::AppState;
use crate::queue::JobTask;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let jobs = JobRepository::list_all(state.store.as_ref()).await?;

    let mut jobs_by_status: HashMap<String, i64> = HashMap::new();
    let mut total_execution_ms = 0u64;
    let mut terminal_count = 0u64;

    for job in &jobs {
        *jobs_by_status.entry(job.status.as_str().to_string()).or_insert(0) += 1;
        if let Some(result) = &job.result {
            if let Some(ms) = result.get("execution_time_ms").and_then(|v| v.as_u64()) {
                total_execution_ms += ms;
                terminal_count += 1;
            }
        }
    }

    let avg_execution_time_ms = if terminal_count > 0 {
        Some(total_execution_ms as f64 / terminal_count as f64)
    } else {
        None
    };

    Ok(Json(StatusResponse {
        service: "aetherframe",
        environment: state.config.environment.clone(),
        queue_reachable: state.queue.is_reachable(),
        jobs_in_flight: state.queue.in_flight(),
        jobs_total: jobs.len() as i64,
        jobs_by_status,
        avg_execution_time_ms,
    }))
}

pub async fn create_plugin(
    State(state): State<AppState>,
    Json(req): Json<CreatePluginRequest>,
) -> Result<Json<aetherframe_domain::entities::PluginRow>, ApiError> {
    let new_row = NewPluginRow {
        name: req.name,
        version: req.version,
        description: req.description,
    };
    new_row.validate().map_err(|e| ApiError(PipelineError::Validation(e)))?;
    let row = PluginCatalogRepository::create(state.store.as_ref(), new_row).await?;
    Ok(Json(row))
}

pub async fn list_plugins(State(state): State<AppState>) -> Result<Json<Vec<aetherframe_domain::entities::PluginRow>>, ApiError> {
    Ok(Json(PluginCatalogRepository::list_all(state.store.as_ref()).await?))
}

pub async fn create_job(State(state): State<AppState>, Json(req): Json<CreateJobRequest>) -> Result<Json<Job>, ApiError> {
    if req.target.trim().is_empty() {
        return Err(ApiError(PipelineError::Validation("target must not be empty".to_string())));
    }

    let new_job = NewJob {
        target: req.target,
        target_type: req.target_type.unwrap_or(TargetType::Binary),
        pipeline_id: req.pipeline_id,
        options: req.options.unwrap_or(serde_json::Value::Null),
        tags: req.tags,
        created_by: req.created_by,
    };

    let job = JobRepository::create(state.store.as_ref(), new_job).await?;

    if let Err(e) = state.queue.enqueue(JobTask { job_id: job.id, target: job.target.clone() }) {
        tracing::warn!(job_id = job.id, error = %e, "failed to enqueue job task immediately after creation");
    } else {
        state.metrics.record_job_submitted();
    }

    Ok(Json(job))
}

pub async fn list_jobs(State(state): State<AppState>) -> Result<Json<Vec<Job>>, ApiError> {
    Ok(Json(JobRepository::list_all(state.store.as_ref()).await?))
}

pub async fn get_job(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Job>, ApiError> {
    let job = JobRepository::find_by_id(state.store.as_ref(), id)
        .await?
        .ok_or(PipelineError::JobNotFound(id))?;
    Ok(Json(job))
}

pub async fn list_findings(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<FindingQuery>,
) -> Result<Json<Vec<aetherframe_domain::entities::Finding>>, ApiError> {
    let filter = FindingFilter { severity: query.severity, category: query.category };
    Ok(Json(FindingRepository::list_for_job(state.store.as_ref(), id, &filter).await?))
}

pub async fn list_artifacts(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<aetherframe_domain::entities::Artifact>>, ApiError> {
    Ok(Json(ArtifactRepository::list_for_job(state.store.as_ref(), id).await?))
}

pub async fn list_job_events(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<TraceEventQuery>,
) -> Result<Json<Vec<aetherframe_domain::entities::TraceEvent>>, ApiError> {
    let filter = TraceEventFilter { source: query.source, event_type: query.event_type };
    Ok(Json(TraceEventRepository::list_for_job(state.store.as_ref(), id, &filter).await?))
}

pub async fn cancel_job(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Job>, ApiError> {
    let mut job = JobRepository::find_by_id(state.store.as_ref(), id)
        .await?
        .ok_or(PipelineError::JobNotFound(id))?;

    job.cancel(chrono::Utc::now());
    JobRepository::update(state.store.as_ref(), &job).await?;
    Ok(Json(job))
}

pub async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> Result<Json<aetherframe_domain::entities::Event>, ApiError> {
    let new_event = NewEvent { event_type: req.event_type, payload: req.payload, job_id: req.job_id };
    Ok(Json(EventRepository::create(state.store.as_ref(), new_event).await?))
}

pub async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<aetherframe_domain::entities::Event>>, ApiError> {
    Ok(Json(EventRepository::list_all(state.store.as_ref()).await?))
}

pub async fn list_pipelines(State(state): State<AppState>) -> Json<Vec<crate::catalogue::PipelineSummary>> {
    Json(state.catalogue.list_summaries())
}

pub async fn get_pipeline(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<aetherframe_domain::pipeline::Pipeline>, ApiError> {
    Ok(Json(state.catalogue.get(&id)?))
}

pub async fn metrics(State(state): State<AppState>) -> Result<String, ApiError> {
    let jobs = JobRepository::list_all(state.store.as_ref()).await?;
    let jobs_total = jobs.len() as i64;

    let mut jobs_by_status: HashMap<String, i64> = HashMap::new();
    for status in [JobStatus::Pending, JobStatus::Running, JobStatus::Completed, JobStatus::Failed, JobStatus::Cancelled] {
        jobs_by_status.insert(status.as_str().to_string(), 0);
    }
    for job in &jobs {
        *jobs_by_status.entry(job.status.as_str().to_string()).or_insert(0) += 1;
    }

    Ok(state.metrics.render(jobs_total, &jobs_by_status)?)
}
