// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use std::str::FromStr;

use aetherframe_domain::entities::Finding;
use aetherframe_domain::error::{PipelineError, PipelineResult};
use aetherframe_domain::repositories::{FindingFilter, FindingRepository};
use aetherframe_domain::value_objects::Severity;
use async_trait::async_trait;
use sqlx::Row;

use super::SqliteStore;

#[async_trait]
impl FindingRepository for SqliteStore {
    async fn create(&self, job_id: i64, finding: Finding) -> PipelineResult<Finding> {
        let row = sqlx::query(
            r#"
            INSERT INTO findings (job_id, plugin_id, stage, severity, category, title, description, evidence, confidence, tags, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(&finding.plugin_id)
        .bind(&finding.stage)
        .bind(finding.severity.as_str())
        .bind(&finding.category)
        .bind(&finding.title)
        .bind(&finding.description)
        .bind(serde_json::to_string(&finding.evidence).unwrap_or_else(|_| "[]".to_string()))
        .bind(finding.confidence)
        .bind(serde_json::to_string(&finding.tags).unwrap_or_else(|_| "[]".to_string()))
        .bind(finding.created_at.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PipelineError::Persistence(e.to_string()))?;

        row_to_finding(&row)
    }

    async fn list_for_job(&self, job_id: i64, filter: &FindingFilter) -> PipelineResult<Vec<Finding>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM findings
            WHERE job_id = ?
              AND (?1 IS NULL OR severity = ?1)
              AND (?2 IS NULL OR category = ?2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(job_id)
        .bind(filter.severity.map(|s| s.as_str().to_string()))
        .bind(filter.category.clone())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PipelineError::Persistence(e.to_string()))?;

        rows.iter().map(row_to_finding).collect()
    }
}

fn row_to_finding(row: &sqlx::sqlite::SqliteRow) -> PipelineResult<Finding> {
    let evidence_raw: String = row.try_get("evidence").map_err(db_err)?;
    let tags_raw: String = row.try_get("tags").map_err(db_err)?;
    let created_at: String = row.try_get("created_at").map_err(db_err)?;

    Ok(Finding {
        id: row.try_get("id").map_err(db_err)?,
        job_id: row.try_get("job_id").map_err(db_err)?,
        plugin_id: row.try_get("plugin_id").map_err(db_err)?,
        stage: row.try_get("stage").map_err(db_err)?,
        severity: Severity::from_str(row.try_get::<String, _>("severity").map_err(db_err)?.as_str())
            .map_err(|e| PipelineError::Persistence(e.to_string()))?,
        category: row.try_get("category").map_err(db_err)?,
        title: row.try_get("title").map_err(db_err)?,
        description: row.try_get("description").map_err(db_err)?,
        evidence: serde_json::from_str(&evidence_raw).unwrap_or_default(),
        confidence: row.try_get("confidence").map_err(db_err)?,
        tags: serde_json::from_str(&tags_raw).unwrap_or_default(),
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
            .map(|t| t.with_timezone(&chrono::Utc))
            .map_err(|e| PipelineError::Persistence(e.to_string()))?,
    })
}

fn db_err(e: sqlx::Error) -> PipelineError {
    PipelineError::Persistence(e.to_string())
}
