// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The `Job` aggregate root: one submitted analysis run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::value_objects::{JobStatus, TargetType};

/// A submitted analysis run against one target.
///
/// `Job` owns its [`crate::entities::Finding`]s, [`crate::entities::Artifact`]s,
/// and [`crate::entities::TraceEvent`]s: deleting a job cascades to all
/// three. A `Plugin` catalogue row has no relationship to a `Job` at all —
/// see [`crate::entities::Plugin`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub target: String,
    pub target_type: TargetType,
    pub status: JobStatus,
    pub pipeline_id: String,
    pub options: Json,
    pub tags: Vec<String>,
    pub created_by: Option<String>,
    pub progress: u8,
    pub result: Option<Json>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// Default pipeline a job runs when the caller doesn't name one.
pub const DEFAULT_PIPELINE_ID: &str = "quicklook";

#[derive(Debug, Clone)]
pub struct NewJob {
    pub target: String,
    pub target_type: TargetType,
    pub pipeline_id: Option<String>,
    pub options: Json,
    pub tags: Vec<String>,
    pub created_by: Option<String>,
}

impl Job {
    /// Builds a brand-new job in status `pending`, as the API does on
    /// submission. `id` and `created_at` are assigned by the store; callers
    /// pass in placeholders that the repository implementation overwrites
    /// on insert.
    pub fn new_pending(new: NewJob, created_at: DateTime<Utc>) -> Job {
        Job {
            id: 0,
            target: new.target,
            target_type: new.target_type,
            status: JobStatus::Pending,
            pipeline_id: new.pipeline_id.unwrap_or_else(|| DEFAULT_PIPELINE_ID.to_string()),
            options: new.options,
            tags: new.tags,
            created_by: new.created_by,
            progress: 0,
            result: None,
            created_at,
            started_at: None,
            completed_at: None,
            error: None,
        }
    }

    /// Transitions `pending` → `running`. Any other starting status is a
    /// caller bug (e.g. redelivering a terminal task).
    pub fn mark_running(&mut self, at: DateTime<Utc>) {
        self.status = JobStatus::Running;
        self.started_at = Some(at);
    }

    pub fn mark_completed(&mut self, result: Json, at: DateTime<Utc>) {
        self.status = JobStatus::Completed;
        self.result = Some(result);
        self.completed_at = Some(at);
    }

    pub fn mark_failed(&mut self, error: String, result: Option<Json>, at: DateTime<Utc>) {
        self.status = JobStatus::Failed;
        self.error = Some(error);
        self.result = result;
        self.completed_at = Some(at);
    }

    /// Cancellation is allowed from `pending` (never dequeued) or `running`
    /// (the worker notices between stages); any other status is a no-op
    /// that returns `false`.
    pub fn cancel(&mut self, at: DateTime<Utc>) -> bool {
        match self.status {
            JobStatus::Pending | JobStatus::Running => {
                self.status = JobStatus::Cancelled;
                self.completed_at = Some(at);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Job {
        Job::new_pending(
            NewJob {
                target: "/samples/clean.bin".to_string(),
                target_type: TargetType::Binary,
                pipeline_id: None,
                options: Json::Null,
                tags: vec![],
                created_by: None,
            },
            Utc::now(),
        )
    }

    #[test]
    fn new_job_defaults_to_quicklook_pipeline() {
        let job = sample();
        assert_eq!(job.pipeline_id, "quicklook");
        assert_eq!(job.status, JobStatus::Pending);
    }

    #[test]
    fn cancel_succeeds_from_pending_and_running() {
        let mut job = sample();
        assert!(job.cancel(Utc::now()));
        assert_eq!(job.status, JobStatus::Cancelled);

        let mut job = sample();
        job.mark_running(Utc::now());
        assert!(job.cancel(Utc::now()));
    }

    #[test]
    fn cancel_is_a_no_op_once_terminal() {
        let mut job = sample();
        job.mark_completed(Json::Null, Utc::now());
        assert!(!job.cancel(Utc::now()));
        assert_eq!(job.status, JobStatus::Completed);
    }
}
