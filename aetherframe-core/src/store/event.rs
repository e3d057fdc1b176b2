// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use aetherframe_domain::entities::{Event, NewEvent};
use aetherframe_domain::error::{PipelineError, PipelineResult};
use aetherframe_domain::repositories::EventRepository;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use super::SqliteStore;

#[async_trait]
impl EventRepository for SqliteStore {
    async fn create(&self, new: NewEvent) -> PipelineResult<Event> {
        let row = sqlx::query(
            r#"
            INSERT INTO events (event_type, payload, job_id, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&new.event_type)
        .bind(new.payload.to_string())
        .bind(new.job_id)
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PipelineError::Persistence(e.to_string()))?;

        row_to_event(&row)
    }

    async fn list_all(&self) -> PipelineResult<Vec<Event>> {
        let rows = sqlx::query("SELECT * FROM events ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PipelineError::Persistence(e.to_string()))?;

        rows.iter().map(row_to_event).collect()
    }
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> PipelineResult<Event> {
    let payload_raw: String = row.try_get("payload").map_err(db_err)?;
    let created_at: String = row.try_get("created_at").map_err(db_err)?;

    Ok(Event {
        id: row.try_get("id").map_err(db_err)?,
        event_type: row.try_get("event_type").map_err(db_err)?,
        payload: serde_json::from_str(&payload_raw).unwrap_or(serde_json::Value::Null),
        job_id: row.try_get("job_id").map_err(db_err)?,
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
            .map(|t| t.with_timezone(&chrono::Utc))
            .map_err(|e| PipelineError::Persistence(e.to_string()))?,
    })
}

fn db_err(e: sqlx::Error) -> PipelineError {
    PipelineError::Persistence(e.to_string())
}
