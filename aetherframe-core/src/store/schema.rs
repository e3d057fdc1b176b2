// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite schema helpers shared by every repository implementation in this
//! module. Applies migrations on start-up so the service and integration
//! tests always see a consistent database.

use sqlx::migrate::MigrateDatabase;
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Runs pending migrations against the provided pool.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    debug!("ensuring database schema is up to date");
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("database schema is up to date");
    Ok(())
}

/// Creates the SQLite database file if it doesn't already exist.
/// `SqlitePool::connect` fails outright against a missing file unless the
/// connect options explicitly ask for `create_if_missing`, so callers that
/// want a plain URL string go through this first.
pub async fn create_database_if_missing(database_url: &str) -> Result<(), sqlx::Error> {
    if !sqlx::Sqlite::database_exists(database_url).await? {
        debug!(url = %database_url, "database does not exist, creating");
        sqlx::Sqlite::create_database(database_url).await?;
        info!(url = %database_url, "created new SQLite database");
    } else {
        debug!(url = %database_url, "database already exists");
    }
    Ok(())
}

/// Creates the database if missing, connects, and applies migrations —
/// everything a fresh process needs before it can serve traffic.
pub async fn initialize_database(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    create_database_if_missing(database_url).await?;
    let pool = SqlitePool::connect(database_url).await?;
    ensure_schema(&pool).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn create_database_if_missing_is_idempotent() {
        let temp = NamedTempFile::new().unwrap();
        let db_path = temp.path().to_str().unwrap().to_string();
        drop(temp);
        let db_url = format!("sqlite://{db_path}");

        create_database_if_missing(&db_url).await.unwrap();
        create_database_if_missing(&db_url).await.unwrap();
    }

    #[tokio::test]
    async fn initialize_database_creates_the_jobs_table() {
        let temp = NamedTempFile::new().unwrap();
        let db_path = temp.path().to_str().unwrap().to_string();
        drop(temp);
        let db_url = format!("sqlite://{db_path}");

        let pool = initialize_database(&db_url).await.unwrap();

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'jobs'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1);
    }
}
