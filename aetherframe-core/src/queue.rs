// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! In-process task queue and worker pool dispatch loop.
//!
//! An in-process rewrite of a broker-backed task queue: a bounded
//! `tokio::sync::mpsc` channel carries `(job_id, target)` tasks from the
//! API (or `worker-only` process) to a dispatch loop that hands each one
//! to a free worker slot. `max_concurrent_jobs` is enforced by a
//! `tokio::sync::Semaphore`, not by the channel's own capacity: the
//! channel can hold more queued tasks than are ever running at once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use aetherframe_bootstrap::shutdown::CancellationToken;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use crate::orchestrator::Worker;

/// One unit of work handed from the API to the worker pool. The target
/// string is carried for observability only; the worker re-reads the
/// authoritative row from the store by id.
#[derive(Debug, Clone)]
pub struct JobTask {
    pub job_id: i64,
    pub target: String,
}

/// The API-facing handle: clone into `AppState` and call [`TaskQueue::enqueue`]
/// on job submission. Cloning is cheap; all clones share the same
/// underlying channel and in-flight counter.
#[derive(Clone)]
pub struct TaskQueue {
    sender: mpsc::Sender<JobTask>,
    in_flight: Arc<AtomicUsize>,
    capacity: usize,
}

/// Error returned when the queue cannot accept a task: either the
/// channel buffer is full (the caller should retry/back off) or the
/// dispatch loop has already shut down.
#[derive(Debug, thiserror::Error)]
pub enum EnqueueError {
    #[error("task queue is at capacity")]
    Full,
    #[error("task queue is no longer accepting tasks (shutting down)")]
    Closed,
}

impl TaskQueue {
    /// Builds a queue and its paired dispatch loop driver. `capacity`
    /// bounds how many tasks may be buffered ahead of the worker pool;
    /// it is independent of `max_concurrent_jobs`, which bounds how many
    /// run at once.
    pub fn new(capacity: usize) -> (TaskQueue, mpsc::Receiver<JobTask>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let queue = TaskQueue {
            sender,
            in_flight: Arc::new(AtomicUsize::new(0)),
            capacity,
        };
        (queue, receiver)
    }

    /// Enqueues a task without blocking. Used by the HTTP API, which must
    /// never wait on worker availability within a request handler.
    pub fn enqueue(&self, task: JobTask) -> Result<(), EnqueueError> {
        self.sender.try_send(task).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EnqueueError::Full,
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }

    /// Bounded liveness probe used by `GET /status`: true if the sender
    /// could still accept a task right now, without actually enqueueing
    /// one. Grounded in the prototype's `celery_app.control.ping` — here
    /// there is no broker to ping, so reachability means "this process's
    /// own dispatch loop is still draining its channel."
    pub fn is_reachable(&self) -> bool {
        !self.sender.is_closed()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// A shared counter the dispatch loop increments/decrements as jobs
    /// start and finish; kept on `TaskQueue` itself so `GET /status` can
    /// read it without a reference to the dispatch loop's task handle.
    pub fn in_flight_handle(&self) -> Arc<AtomicUsize> {
        self.in_flight.clone()
    }
}

/// Drains a `TaskQueue`'s receiver, running up to `max_concurrent_jobs`
/// workers concurrently via a semaphore. Runs until the channel closes
/// (every `TaskQueue` sender dropped) or a shutdown is requested.
pub async fn run_dispatch_loop(
    mut receiver: mpsc::Receiver<JobTask>,
    worker: Arc<Worker>,
    max_concurrent_jobs: usize,
    in_flight: Arc<AtomicUsize>,
    shutdown: CancellationToken,
) {
    let semaphore = Arc::new(Semaphore::new(max_concurrent_jobs));
    info!(max_concurrent_jobs, "worker dispatch loop starting");

    loop {
        let task = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("shutdown requested, no longer accepting new tasks from the queue");
                break;
            }
            task = receiver.recv() => task,
        };

        let Some(task) = task else {
            info!("task queue closed, dispatch loop exiting");
            break;
        };

        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };

        let worker = worker.clone();
        let in_flight = in_flight.clone();
        in_flight.fetch_add(1, Ordering::Relaxed);

        tokio::spawn(async move {
            debug!(job_id = task.job_id, target = %task.target, "dispatching job to worker slot");
            worker.process_job(task.job_id).await;
            in_flight.fetch_sub(1, Ordering::Relaxed);
            drop(permit);
        });
    }

    // Drain whatever is left in the channel without accepting more, then
    // wait (bounded by the caller's grace period) for in-flight jobs to
    // reach a terminal state before returning.
    while in_flight.load(Ordering::Relaxed) > 0 {
        tokio::task::yield_now().await;
        if shutdown.is_cancelled() && in_flight.load(Ordering::Relaxed) == 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    warn!("worker dispatch loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_succeeds_within_capacity_and_fails_when_full() {
        let (queue, _receiver) = TaskQueue::new(1);
        assert!(queue.enqueue(JobTask { job_id: 1, target: "a".to_string() }).is_ok());
        assert!(matches!(
            queue.enqueue(JobTask { job_id: 2, target: "b".to_string() }),
            Err(EnqueueError::Full)
        ));
    }

    #[test]
    fn enqueue_fails_once_every_receiver_is_dropped() {
        let (queue, receiver) = TaskQueue::new(4);
        drop(receiver);
        assert!(matches!(
            queue.enqueue(JobTask { job_id: 1, target: "a".to_string() }),
            Err(EnqueueError::Closed)
        ));
        assert!(!queue.is_reachable());
    }

    #[test]
    fn reports_its_configured_capacity() {
        let (queue, _receiver) = TaskQueue::new(16);
        assert_eq!(queue.capacity(), 16);
        assert_eq!(queue.in_flight(), 0);
    }
}
