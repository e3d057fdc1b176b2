// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The `Plugin` catalogue row — purely descriptive, not the same thing as
//! a loaded plugin instance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row in the `plugins` table.
///
/// This is informational only: it shares no identity with the plugin
/// registry's in-process manifests, which are keyed by the manifest's
/// `id` string (e.g. `"umbriel"`). Creating, renaming, or deleting a
/// `PluginRow` has no effect on what the registry can discover or run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginRow {
    pub id: i64,
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPluginRow {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
}

impl NewPluginRow {
    /// Rejects an empty name or version, per the `422` rule on `POST /plugins`.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.version.trim().is_empty() {
            return Err("version must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_name_or_version() {
        let mut row = NewPluginRow {
            name: String::new(),
            version: "1.0".to_string(),
            description: None,
        };
        assert!(row.validate().is_err());

        row.name = "umbriel".to_string();
        row.version = String::new();
        assert!(row.validate().is_err());

        row.version = "1.0".to_string();
        assert!(row.validate().is_ok());
    }
}
