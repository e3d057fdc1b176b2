// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use std::str::FromStr;

use aetherframe_domain::entities::{Job, NewJob};
use aetherframe_domain::error::{PipelineError, PipelineResult};
use aetherframe_domain::repositories::JobRepository;
use aetherframe_domain::value_objects::{JobStatus, TargetType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::SqliteStore;

#[async_trait]
impl JobRepository for SqliteStore {
    async fn create(&self, new: NewJob) -> PipelineResult<Job> {
        let job = Job::new_pending(new, Utc::now());

        let row = sqlx::query(
            r#"
            INSERT INTO jobs (target, target_type, status, pipeline_id, options, tags, created_by, progress, result, created_at, started_at, completed_at, error)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, target, target_type, status, pipeline_id, options, tags, created_by, progress, result, created_at, started_at, completed_at, error
            "#,
        )
        .bind(&job.target)
        .bind(job.target_type.as_str())
        .bind(job.status.as_str())
        .bind(&job.pipeline_id)
        .bind(job.options.to_string())
        .bind(serde_json::to_string(&job.tags).unwrap_or_else(|_| "[]".to_string()))
        .bind(&job.created_by)
        .bind(job.progress as i64)
        .bind(job.result.as_ref().map(|r| r.to_string()))
        .bind(job.created_at.to_rfc3339())
        .bind(job.started_at.map(|t| t.to_rfc3339()))
        .bind(job.completed_at.map(|t| t.to_rfc3339()))
        .bind(&job.error)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PipelineError::Persistence(e.to_string()))?;

        row_to_job(&row)
    }

    async fn find_by_id(&self, id: i64) -> PipelineResult<Option<Job>> {
        let row = sqlx::query("SELECT * FROM jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PipelineError::Persistence(e.to_string()))?;

        row.as_ref().map(row_to_job).transpose()
    }

    async fn list_all(&self) -> PipelineResult<Vec<Job>> {
        let rows = sqlx::query("SELECT * FROM jobs ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PipelineError::Persistence(e.to_string()))?;

        rows.iter().map(row_to_job).collect()
    }

    async fn update(&self, job: &Job) -> PipelineResult<()> {
        sqlx::query(
            r#"
            UPDATE jobs SET
                target = ?, target_type = ?, status = ?, pipeline_id = ?, options = ?,
                tags = ?, created_by = ?, progress = ?, result = ?, created_at = ?,
                started_at = ?, completed_at = ?, error = ?
            WHERE id = ?
            "#,
        )
        .bind(&job.target)
        .bind(job.target_type.as_str())
        .bind(job.status.as_str())
        .bind(&job.pipeline_id)
        .bind(job.options.to_string())
        .bind(serde_json::to_string(&job.tags).unwrap_or_else(|_| "[]".to_string()))
        .bind(&job.created_by)
        .bind(job.progress as i64)
        .bind(job.result.as_ref().map(|r| r.to_string()))
        .bind(job.created_at.to_rfc3339())
        .bind(job.started_at.map(|t| t.to_rfc3339()))
        .bind(job.completed_at.map(|t| t.to_rfc3339()))
        .bind(&job.error)
        .bind(job.id)
        .execute(&self.pool)
        .await
        .map_err(|e| PipelineError::Persistence(e.to_string()))?;

        Ok(())
    }
}

fn row_to_job(row: &sqlx::sqlite::SqliteRow) -> PipelineResult<Job> {
    let parse_ts = |s: String| -> PipelineResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| PipelineError::Persistence(format!("bad timestamp '{s}': {e}")))
    };
    let parse_opt_ts = |s: Option<String>| -> PipelineResult<Option<DateTime<Utc>>> {
        s.map(parse_ts).transpose()
    };

    let options_raw: String = row.try_get("options").map_err(db_err)?;
    let result_raw: Option<String> = row.try_get("result").map_err(db_err)?;
    let tags_raw: String = row.try_get("tags").map_err(db_err)?;

    Ok(Job {
        id: row.try_get("id").map_err(db_err)?,
        target: row.try_get("target").map_err(db_err)?,
        target_type: TargetType::from_str(row.try_get::<String, _>("target_type").map_err(db_err)?.as_str())
            .map_err(|e| PipelineError::Persistence(e.to_string()))?,
        status: JobStatus::from_str(row.try_get::<String, _>("status").map_err(db_err)?.as_str())
            .map_err(|e| PipelineError::Persistence(e.to_string()))?,
        pipeline_id: row.try_get("pipeline_id").map_err(db_err)?,
        options: serde_json::from_str(&options_raw).unwrap_or(serde_json::Value::Null),
        tags: serde_json::from_str(&tags_raw).unwrap_or_default(),
        created_by: row.try_get("created_by").map_err(db_err)?,
        progress: row.try_get::<i64, _>("progress").map_err(db_err)? as u8,
        result: result_raw.and_then(|r| serde_json::from_str(&r).ok()),
        created_at: parse_ts(row.try_get("created_at").map_err(db_err)?)?,
        started_at: parse_opt_ts(row.try_get("started_at").map_err(db_err)?)?,
        completed_at: parse_opt_ts(row.try_get("completed_at").map_err(db_err)?)?,
        error: row.try_get("error").map_err(db_err)?,
    })
}

fn db_err(e: sqlx::Error) -> PipelineError {
    PipelineError::Persistence(e.to_string())
}
