// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The only boundary that turns a [`PipelineError`] into an HTTP
//! response. Everywhere else in the application it propagates with `?`.

use aetherframe_domain::error::PipelineError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Wraps [`PipelineError`] so it can implement [`IntoResponse`] without
/// that impl living in the domain crate, which knows nothing about HTTP.
pub struct ApiError(pub PipelineError);

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = Json(json!({"error": self.0.to_string()}));
        (status, body).into_response()
    }
}

fn status_for(err: &PipelineError) -> StatusCode {
    if err.is_not_found() {
        return StatusCode::NOT_FOUND;
    }
    if err.is_client_error() {
        return StatusCode::UNPROCESSABLE_ENTITY;
    }
    match err {
        PipelineError::PluginValidation { .. } | PipelineError::StageRuntime { .. } => StatusCode::BAD_GATEWAY,
        PipelineError::DependencyCycle(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_map_to_404() {
        assert_eq!(status_for(&PipelineError::JobNotFound(1)), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&PipelineError::PipelineNotFound("x".to_string())), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_errors_map_to_422() {
        assert_eq!(status_for(&PipelineError::Validation("bad input".to_string())), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn persistence_errors_map_to_500() {
        assert_eq!(status_for(&PipelineError::Persistence("disk full".to_string())), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
