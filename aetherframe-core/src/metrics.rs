// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Prometheus metrics collection and exposition.
//!
//! `/metrics` always begins with two store-derived gauge families —
//! `aether_jobs_total` and `aether_jobs_status_total{status="…"}`,
//! computed live from a grouped count over the jobs table each time the
//! route is scraped — followed by the richer in-process series this
//! module registers: job-duration histograms and stage-level counters
//! that accumulate as the worker pool runs.

use std::collections::HashMap;
use std::sync::Arc;

use aetherframe_domain::error::{PipelineError, PipelineResult};
use aetherframe_domain::value_objects::JobStatus;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use tracing::debug;

/// Prometheus metrics for the orchestration engine, registered once at
/// startup and shared (behind an `Arc`) by every request handler and
/// worker slot.
#[derive(Clone)]
pub struct MetricsService {
    registry: Arc<Registry>,

    jobs_submitted_total: IntCounter,
    jobs_completed_total: IntCounter,
    jobs_failed_total: IntCounter,
    jobs_cancelled_total: IntCounter,
    job_duration_seconds: Histogram,
    jobs_in_flight: IntGauge,
    stage_executions_total: IntCounterVec,
    stage_failures_total: IntCounterVec,
    findings_total: IntCounterVec,
}

impl MetricsService {
    pub fn new() -> PipelineResult<MetricsService> {
        let registry = Registry::new();

        let jobs_submitted_total = IntCounter::with_opts(
            Opts::new("jobs_submitted_total", "Total jobs accepted through POST /jobs").namespace("aether"),
        )
        .map_err(metrics_err)?;

        let jobs_completed_total =
            IntCounter::with_opts(Opts::new("jobs_completed_total", "Total jobs that reached completed").namespace("aether"))
                .map_err(metrics_err)?;

        let jobs_failed_total =
            IntCounter::with_opts(Opts::new("jobs_failed_total", "Total jobs that reached failed").namespace("aether"))
                .map_err(metrics_err)?;

        let jobs_cancelled_total =
            IntCounter::with_opts(Opts::new("jobs_cancelled_total", "Total jobs that reached cancelled").namespace("aether"))
                .map_err(metrics_err)?;

        let job_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("job_duration_seconds", "Wall-clock time from dequeue to terminal status")
                .namespace("aether")
                .buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0]),
        )
        .map_err(metrics_err)?;

        let jobs_in_flight =
            IntGauge::with_opts(Opts::new("jobs_in_flight", "Jobs currently being executed by a worker slot").namespace("aether"))
                .map_err(metrics_err)?;

        let stage_executions_total = IntCounterVec::new(
            Opts::new("stage_executions_total", "Stage executions by plugin id").namespace("aether"),
            &["plugin_id", "stage"],
        )
        .map_err(metrics_err)?;

        let stage_failures_total = IntCounterVec::new(
            Opts::new("stage_failures_total", "Stage failures by plugin id").namespace("aether"),
            &["plugin_id", "stage"],
        )
        .map_err(metrics_err)?;

        let findings_total = IntCounterVec::new(
            Opts::new("findings_total", "Findings recorded by severity").namespace("aether"),
            &["severity"],
        )
        .map_err(metrics_err)?;

        registry.register(Box::new(jobs_submitted_total.clone())).map_err(metrics_err)?;
        registry.register(Box::new(jobs_completed_total.clone())).map_err(metrics_err)?;
        registry.register(Box::new(jobs_failed_total.clone())).map_err(metrics_err)?;
        registry.register(Box::new(jobs_cancelled_total.clone())).map_err(metrics_err)?;
        registry.register(Box::new(job_duration_seconds.clone())).map_err(metrics_err)?;
        registry.register(Box::new(jobs_in_flight.clone())).map_err(metrics_err)?;
        registry.register(Box::new(stage_executions_total.clone())).map_err(metrics_err)?;
        registry.register(Box::new(stage_failures_total.clone())).map_err(metrics_err)?;
        registry.register(Box::new(findings_total.clone())).map_err(metrics_err)?;

        debug!("metrics service initialized with Prometheus registry");

        Ok(MetricsService {
            registry: Arc::new(registry),
            jobs_submitted_total,
            jobs_completed_total,
            jobs_failed_total,
            jobs_cancelled_total,
            job_duration_seconds,
            jobs_in_flight,
            stage_executions_total,
            stage_failures_total,
            findings_total,
        })
    }

    pub fn record_job_submitted(&self) {
        self.jobs_submitted_total.inc();
    }

    pub fn record_job_started(&self) {
        self.jobs_in_flight.inc();
    }

    pub fn record_job_terminal(&self, status: JobStatus, duration_seconds: f64) {
        self.jobs_in_flight.dec();
        self.job_duration_seconds.observe(duration_seconds);
        match status {
            JobStatus::Completed => self.jobs_completed_total.inc(),
            JobStatus::Failed => self.jobs_failed_total.inc(),
            JobStatus::Cancelled => self.jobs_cancelled_total.inc(),
            JobStatus::Pending | JobStatus::Running => {}
        }
    }

    pub fn record_stage_execution(&self, plugin_id: &str, stage: &str, success: bool) {
        self.stage_executions_total.with_label_values(&[plugin_id, stage]).inc();
        if !success {
            self.stage_failures_total.with_label_values(&[plugin_id, stage]).inc();
        }
    }

    pub fn record_finding(&self, severity: &str) {
        self.findings_total.with_label_values(&[severity]).inc();
    }

    /// Renders the two mandatory store-derived gauge families, followed
    /// by the richer in-process registry in Prometheus text-exposition
    /// format.
    pub fn render(&self, total_jobs: i64, jobs_by_status: &HashMap<String, i64>) -> PipelineResult<String> {
        let mut out = String::new();

        out.push_str("# HELP aether_jobs_total Total number of jobs ever submitted.\n");
        out.push_str("# TYPE aether_jobs_total gauge\n");
        out.push_str(&format!("aether_jobs_total {total_jobs}\n"));

        out.push_str("# HELP aether_jobs_status_total Jobs currently in each status.\n");
        out.push_str("# TYPE aether_jobs_status_total gauge\n");
        let mut statuses: Vec<&String> = jobs_by_status.keys().collect();
        statuses.sort();
        for status in statuses {
            let count = jobs_by_status[status];
            out.push_str(&format!("aether_jobs_status_total{{status=\"{status}\"}} {count}\n"));
        }

        let metric_families = self.registry.gather();
        let encoder = TextEncoder::new();
        out.push_str(&encoder.encode_to_string(&metric_families).map_err(metrics_err)?);

        Ok(out)
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }
}

fn metrics_err(e: impl std::fmt::Display) -> PipelineError {
    PipelineError::FatalWorker(format!("metrics error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_always_emits_the_two_mandatory_gauge_families() {
        let metrics = MetricsService::new().unwrap();
        let mut by_status = HashMap::new();
        by_status.insert("pending".to_string(), 2);
        by_status.insert("completed".to_string(), 5);

        let text = metrics.render(7, &by_status).unwrap();
        assert!(text.contains("aether_jobs_total 7"));
        assert!(text.contains(r#"aether_jobs_status_total{status="pending"} 2"#));
        assert!(text.contains(r#"aether_jobs_status_total{status="completed"} 5"#));
    }

    #[test]
    fn in_process_counters_appear_after_the_mandatory_lines() {
        let metrics = MetricsService::new().unwrap();
        metrics.record_job_submitted();
        metrics.record_stage_execution("umbriel", "gate", true);

        let text = metrics.render(1, &HashMap::new()).unwrap();
        let mandatory_pos = text.find("aether_jobs_total 1").unwrap();
        let registry_pos = text.find("aether_jobs_submitted_total").unwrap();
        assert!(registry_pos > mandatory_pos);
    }
}
