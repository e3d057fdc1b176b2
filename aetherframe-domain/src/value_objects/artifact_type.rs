// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Kinds of file a stage may produce as an artifact.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    Json,
    Html,
    Dump,
    Graph,
    Timeline,
    Heatmap,
    Diff,
    Report,
    Strings,
    Disasm,
    Callgraph,
    StateSnapshot,
    Raw,
}

impl ArtifactType {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactType::Json => "json",
            ArtifactType::Html => "html",
            ArtifactType::Dump => "dump",
            ArtifactType::Graph => "graph",
            ArtifactType::Timeline => "timeline",
            ArtifactType::Heatmap => "heatmap",
            ArtifactType::Diff => "diff",
            ArtifactType::Report => "report",
            ArtifactType::Strings => "strings",
            ArtifactType::Disasm => "disasm",
            ArtifactType::Callgraph => "callgraph",
            ArtifactType::StateSnapshot => "state_snapshot",
            ArtifactType::Raw => "raw",
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid artifact type: {0:?}")]
pub struct ParseArtifactTypeError(String);

impl FromStr for ArtifactType {
    type Err = ParseArtifactTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(ArtifactType::Json),
            "html" => Ok(ArtifactType::Html),
            "dump" => Ok(ArtifactType::Dump),
            "graph" => Ok(ArtifactType::Graph),
            "timeline" => Ok(ArtifactType::Timeline),
            "heatmap" => Ok(ArtifactType::Heatmap),
            "diff" => Ok(ArtifactType::Diff),
            "report" => Ok(ArtifactType::Report),
            "strings" => Ok(ArtifactType::Strings),
            "disasm" => Ok(ArtifactType::Disasm),
            "callgraph" => Ok(ArtifactType::Callgraph),
            "state_snapshot" => Ok(ArtifactType::StateSnapshot),
            "raw" => Ok(ArtifactType::Raw),
            other => Err(ParseArtifactTypeError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_variant() {
        for t in [
            ArtifactType::Json,
            ArtifactType::Html,
            ArtifactType::Dump,
            ArtifactType::Graph,
            ArtifactType::Timeline,
            ArtifactType::Heatmap,
            ArtifactType::Diff,
            ArtifactType::Report,
            ArtifactType::Strings,
            ArtifactType::Disasm,
            ArtifactType::Callgraph,
            ArtifactType::StateSnapshot,
            ArtifactType::Raw,
        ] {
            assert_eq!(t.to_string().parse::<ArtifactType>().unwrap(), t);
        }
    }
}
