// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use aetherframe_domain::entities::TraceEvent;
use aetherframe_domain::error::{PipelineError, PipelineResult};
use aetherframe_domain::repositories::{TraceEventFilter, TraceEventRepository};
use async_trait::async_trait;
use sqlx::Row;

use super::SqliteStore;

#[async_trait]
impl TraceEventRepository for SqliteStore {
    async fn create(&self, job_id: i64, event: TraceEvent) -> PipelineResult<TraceEvent> {
        let row = sqlx::query(
            r#"
            INSERT INTO trace_events (job_id, ts, source, event_type, symbol, address, thread_id, process_id, sequence, payload)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(event.ts.to_rfc3339())
        .bind(&event.source)
        .bind(&event.event_type)
        .bind(&event.symbol)
        .bind(&event.address)
        .bind(event.thread_id)
        .bind(event.process_id)
        .bind(event.sequence)
        .bind(event.payload.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PipelineError::Persistence(e.to_string()))?;

        row_to_event(&row)
    }

    async fn list_for_job(&self, job_id: i64, filter: &TraceEventFilter) -> PipelineResult<Vec<TraceEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM trace_events
            WHERE job_id = ?
              AND (?1 IS NULL OR source = ?1)
              AND (?2 IS NULL OR event_type = ?2)
            ORDER BY ts ASC, sequence ASC
            "#,
        )
        .bind(job_id)
        .bind(filter.source.clone())
        .bind(filter.event_type.clone())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PipelineError::Persistence(e.to_string()))?;

        rows.iter().map(row_to_event).collect()
    }
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> PipelineResult<TraceEvent> {
    let ts: String = row.try_get("ts").map_err(db_err)?;
    let payload_raw: String = row.try_get("payload").map_err(db_err)?;

    Ok(TraceEvent {
        id: row.try_get("id").map_err(db_err)?,
        job_id: row.try_get("job_id").map_err(db_err)?,
        ts: chrono::DateTime::parse_from_rfc3339(&ts)
            .map(|t| t.with_timezone(&chrono::Utc))
            .map_err(|e| PipelineError::Persistence(e.to_string()))?,
        source: row.try_get("source").map_err(db_err)?,
        event_type: row.try_get("event_type").map_err(db_err)?,
        symbol: row.try_get("symbol").map_err(db_err)?,
        address: row.try_get("address").map_err(db_err)?,
        thread_id: row.try_get("thread_id").map_err(db_err)?,
        process_id: row.try_get("process_id").map_err(db_err)?,
        sequence: row.try_get("sequence").map_err(db_err)?,
        payload: serde_json::from_str(&payload_raw).unwrap_or(serde_json::Value::Null),
    })
}

fn db_err(e: sqlx::Error) -> PipelineError {
    PipelineError::Persistence(e.to_string())
}
