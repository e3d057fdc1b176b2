// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use aetherframe_domain::entities::{NewPluginRow, PluginRow};
use aetherframe_domain::error::{PipelineError, PipelineResult};
use aetherframe_domain::repositories::PluginCatalogRepository;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use super::SqliteStore;

#[async_trait]
impl PluginCatalogRepository for SqliteStore {
    async fn create(&self, new: NewPluginRow) -> PipelineResult<PluginRow> {
        new.validate().map_err(PipelineError::Validation)?;

        let row = sqlx::query(
            r#"
            INSERT INTO plugins (name, version, description, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&new.name)
        .bind(&new.version)
        .bind(&new.description)
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PipelineError::Persistence(e.to_string()))?;

        row_to_plugin(&row)
    }

    async fn list_all(&self) -> PipelineResult<Vec<PluginRow>> {
        let rows = sqlx::query("SELECT * FROM plugins ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PipelineError::Persistence(e.to_string()))?;

        rows.iter().map(row_to_plugin).collect()
    }
}

fn row_to_plugin(row: &sqlx::sqlite::SqliteRow) -> PipelineResult<PluginRow> {
    let created_at: String = row.try_get("created_at").map_err(db_err)?;

    Ok(PluginRow {
        id: row.try_get("id").map_err(db_err)?,
        name: row.try_get("name").map_err(db_err)?,
        version: row.try_get("version").map_err(db_err)?,
        description: row.try_get("description").map_err(db_err)?,
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
            .map(|t| t.with_timezone(&chrono::Utc))
            .map_err(|e| PipelineError::Persistence(e.to_string()))?,
    })
}

fn db_err(e: sqlx::Error) -> PipelineError {
    PipelineError::Persistence(e.to_string())
}
