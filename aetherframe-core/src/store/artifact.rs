// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use std::str::FromStr;

use aetherframe_domain::entities::Artifact;
use aetherframe_domain::error::{PipelineError, PipelineResult};
use aetherframe_domain::repositories::ArtifactRepository;
use aetherframe_domain::value_objects::ArtifactType;
use async_trait::async_trait;
use sqlx::Row;

use super::SqliteStore;

#[async_trait]
impl ArtifactRepository for SqliteStore {
    async fn create(&self, job_id: i64, artifact: Artifact) -> PipelineResult<Artifact> {
        let row = sqlx::query(
            r#"
            INSERT INTO artifacts (job_id, plugin_id, stage, artifact_type, name, description, uri, sha256, size_bytes, meta, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(&artifact.plugin_id)
        .bind(&artifact.stage)
        .bind(artifact.artifact_type.as_str())
        .bind(&artifact.name)
        .bind(&artifact.description)
        .bind(&artifact.uri)
        .bind(&artifact.sha256)
        .bind(artifact.size_bytes.map(|n| n as i64))
        .bind(artifact.meta.to_string())
        .bind(artifact.created_at.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PipelineError::Persistence(e.to_string()))?;

        row_to_artifact(&row)
    }

    async fn list_for_job(&self, job_id: i64) -> PipelineResult<Vec<Artifact>> {
        let rows = sqlx::query("SELECT * FROM artifacts WHERE job_id = ? ORDER BY created_at ASC")
            .bind(job_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PipelineError::Persistence(e.to_string()))?;

        rows.iter().map(row_to_artifact).collect()
    }
}

fn row_to_artifact(row: &sqlx::sqlite::SqliteRow) -> PipelineResult<Artifact> {
    let meta_raw: String = row.try_get("meta").map_err(db_err)?;
    let created_at: String = row.try_get("created_at").map_err(db_err)?;

    Ok(Artifact {
        id: row.try_get("id").map_err(db_err)?,
        job_id: row.try_get("job_id").map_err(db_err)?,
        plugin_id: row.try_get("plugin_id").map_err(db_err)?,
        stage: row.try_get("stage").map_err(db_err)?,
        artifact_type: ArtifactType::from_str(row.try_get::<String, _>("artifact_type").map_err(db_err)?.as_str())
            .map_err(|e| PipelineError::Persistence(e.to_string()))?,
        name: row.try_get("name").map_err(db_err)?,
        description: row.try_get("description").map_err(db_err)?,
        uri: row.try_get("uri").map_err(db_err)?,
        sha256: row.try_get("sha256").map_err(db_err)?,
        size_bytes: row.try_get::<Option<i64>, _>("size_bytes").map_err(db_err)?.map(|n| n as u64),
        meta: serde_json::from_str(&meta_raw).unwrap_or(serde_json::Value::Null),
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
            .map(|t| t.with_timezone(&chrono::Utc))
            .map_err(|e| PipelineError::Persistence(e.to_string()))?,
    })
}

fn db_err(e: sqlx::Error) -> PipelineError {
    PipelineError::Persistence(e.to_string())
}
