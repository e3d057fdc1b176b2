// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed implementations of every repository port in
//! `aetherframe_domain::repositories`, behind one shared connection pool.

mod artifact;
mod event;
mod finding;
mod job;
mod plugin_catalog;
pub mod schema;
mod trace_event;

use sqlx::SqlitePool;

/// The single store type; implements every repository trait over a shared
/// pool. Kept as one struct (rather than one per aggregate) because SQLite
/// gives us exactly one pool to share regardless of how many ports it
/// backs.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> SqliteStore {
        SqliteStore { pool }
    }

    /// Connects to `database_url`, creating the file and applying
    /// migrations if needed.
    pub async fn connect(database_url: &str) -> Result<SqliteStore, sqlx::Error> {
        let pool = schema::initialize_database(database_url).await?;
        Ok(SqliteStore::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
