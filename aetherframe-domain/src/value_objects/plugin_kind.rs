// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The broad family an analyzer plugin belongs to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginKind {
    Detector,
    Differ,
    Tracer,
    Reconstructor,
    Inferencer,
    Analyzer,
    Reporter,
}

impl PluginKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PluginKind::Detector => "detector",
            PluginKind::Differ => "differ",
            PluginKind::Tracer => "tracer",
            PluginKind::Reconstructor => "reconstructor",
            PluginKind::Inferencer => "inferencer",
            PluginKind::Analyzer => "analyzer",
            PluginKind::Reporter => "reporter",
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid plugin kind: {0:?}")]
pub struct ParsePluginKindError(String);

impl FromStr for PluginKind {
    type Err = ParsePluginKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "detector" => Ok(PluginKind::Detector),
            "differ" => Ok(PluginKind::Differ),
            "tracer" => Ok(PluginKind::Tracer),
            "reconstructor" => Ok(PluginKind::Reconstructor),
            "inferencer" => Ok(PluginKind::Inferencer),
            "analyzer" => Ok(PluginKind::Analyzer),
            "reporter" => Ok(PluginKind::Reporter),
            other => Err(ParsePluginKindError(other.to_string())),
        }
    }
}
