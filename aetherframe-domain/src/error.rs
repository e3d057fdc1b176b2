// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Error taxonomy for the pipeline orchestration engine.
//!
//! [`PipelineError`] is the single error type threaded through the domain
//! and application layers. Its variants map directly onto the five error
//! kinds the engine distinguishes: bad input at the API boundary, a plugin
//! refusing to run, a stage failing at runtime, a store write failing, and
//! a worker-fatal condition that takes a whole job down. The HTTP layer is
//! the only place this type is converted into a response code; everywhere
//! else it propagates with `?`.

use crate::value_objects::TargetType;

/// Errors produced while validating a plugin manifest.
///
/// Validation collects every problem rather than stopping at the first one,
/// so a caller can report a full list instead of a single complaint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManifestError {
    #[error("plugin id {0:?} must match [A-Za-z0-9_-]+ and must not be empty")]
    InvalidId(String),

    #[error("plugin version must not be empty")]
    EmptyVersion,

    #[error("plugin capabilities must not be empty")]
    EmptyCapabilities,
}

/// Errors produced while resolving a job's target into a usable path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("target path does not exist: {0}")]
    NotFound(String),

    #[error("target type {0} is not supported by this resolver")]
    Unsupported(TargetType),

    #[error("io error resolving target: {0}")]
    Io(String),
}

/// The engine's single error type.
///
/// Each variant documents which of the taxonomy's five kinds it belongs to;
/// see the module docs for the mapping.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Kind 1: bad input at the API boundary. Reject at the edge, do not
    /// create a job.
    #[error("validation error: {0}")]
    Validation(String),

    /// Kind 2: a plugin's `validate` refused to run against the context.
    #[error("plugin '{plugin_id}' rejected stage '{stage}': {reason}")]
    PluginValidation {
        plugin_id: String,
        stage: String,
        reason: String,
    },

    /// Kind 3: a stage failed during `run`, timed out, or returned
    /// `success=false`.
    #[error("stage '{stage}' failed: {reason}")]
    StageRuntime { stage: String, reason: String },

    /// Kind 4: a store write failed. Logged per-row; never rolls back a
    /// sibling write in the same batch.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Kind 5: worker-fatal — unresolved target, uncaught exception,
    /// cancellation. Takes the whole job to `failed`.
    #[error("fatal worker error: {0}")]
    FatalWorker(String),

    #[error("pipeline '{0}' not found")]
    PipelineNotFound(String),

    #[error("plugin '{0}' not found in registry")]
    PluginNotFound(String),

    #[error("manifest validation failed: {0:?}")]
    Manifest(Vec<ManifestError>),

    #[error("dependency cycle detected among plugins: {0:?}")]
    DependencyCycle(Vec<String>),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("job '{0}' not found")]
    JobNotFound(i64),
}

impl PipelineError {
    /// True for errors that should be surfaced as an HTTP 404.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PipelineError::PipelineNotFound(_)
                | PipelineError::PluginNotFound(_)
                | PipelineError::JobNotFound(_)
        )
    }

    /// True for errors the caller provoked by sending bad input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::Validation(_) | PipelineError::Manifest(_)
        ) || self.is_not_found()
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
