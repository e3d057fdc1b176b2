// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Kinds of analysis target a job may submit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Binary,
    Apk,
    Pid,
    MemoryDump,
    TraceLog,
}

impl Default for TargetType {
    fn default() -> Self {
        TargetType::Binary
    }
}

impl TargetType {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetType::Binary => "binary",
            TargetType::Apk => "apk",
            TargetType::Pid => "pid",
            TargetType::MemoryDump => "memory_dump",
            TargetType::TraceLog => "trace_log",
        }
    }

    /// Targets a [`crate::plugin::LocalPathResolver`] can resolve today.
    /// `pid` and URL-shaped targets need a resolver this engine doesn't
    /// ship yet.
    pub fn is_local_path(self) -> bool {
        !matches!(self, TargetType::Pid)
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid target type: {0:?}")]
pub struct ParseTargetTypeError(String);

impl FromStr for TargetType {
    type Err = ParseTargetTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binary" => Ok(TargetType::Binary),
            "apk" => Ok(TargetType::Apk),
            "pid" => Ok(TargetType::Pid),
            "memory_dump" => Ok(TargetType::MemoryDump),
            "trace_log" => Ok(TargetType::TraceLog),
            other => Err(ParseTargetTypeError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        for t in [
            TargetType::Binary,
            TargetType::Apk,
            TargetType::Pid,
            TargetType::MemoryDump,
            TargetType::TraceLog,
        ] {
            assert_eq!(t.to_string().parse::<TargetType>().unwrap(), t);
        }
    }

    #[test]
    fn pid_is_not_a_local_path() {
        assert!(!TargetType::Pid.is_local_path());
        assert!(TargetType::Binary.is_local_path());
    }
}
