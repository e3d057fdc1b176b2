// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Shutdown Coordination
//!
//! Propagates a shutdown signal to the worker pool's dispatch loop and the
//! HTTP server, then waits (bounded by a grace period) for in-flight jobs to
//! reach a terminal state before the process exits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

pub const DEFAULT_GRACE_PERIOD_SECS: u64 = 5;

/// Lightweight clone-able handle passed into worker tasks and the dispatch
/// loop so they can observe a shutdown request without holding a reference
/// to the coordinator itself.
#[derive(Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancellationToken {
    fn new() -> Self {
        Self { cancelled: Arc::new(AtomicBool::new(false)), notify: Arc::new(Notify::new()) }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.notify.notified().await;
    }
}

/// Coordinates graceful shutdown across the HTTP server and worker pool.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    grace_period: Duration,
    shutdown_initiated: Arc<AtomicBool>,
    shutdown_complete: Arc<Notify>,
}

impl ShutdownCoordinator {
    pub fn new(grace_period: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            grace_period,
            shutdown_initiated: Arc::new(AtomicBool::new(false)),
            shutdown_complete: Arc::new(Notify::new()),
        }
    }

    /// Hand a token to a task that needs to observe shutdown (dispatch loop,
    /// a running worker, the HTTP server's accept loop).
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_initiated.load(Ordering::SeqCst)
    }

    /// Cancels all outstanding tokens. Idempotent: a second call is a no-op.
    pub fn initiate_shutdown(&self) {
        if self.shutdown_initiated.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_ok() {
            tracing::info!("initiating graceful shutdown (grace period: {:?})", self.grace_period);
            self.token.cancel();
        }
    }

    /// Waits for [`Self::complete_shutdown`] or the configured grace period,
    /// whichever comes first. Returns `false` on timeout, at which point the
    /// caller should force-exit rather than wait indefinitely for in-flight
    /// jobs.
    pub async fn wait_for_shutdown(&self) -> bool {
        if !self.is_shutting_down() {
            tracing::warn!("wait_for_shutdown called but shutdown was never initiated");
            return true;
        }

        tokio::select! {
            _ = self.shutdown_complete.notified() => {
                tracing::info!("shutdown completed gracefully");
                true
            }
            _ = tokio::time::sleep(self.grace_period) => {
                tracing::warn!("shutdown grace period expired, forcing exit");
                false
            }
        }
    }

    /// Signals that all cleanup (worker pool drained, listeners closed) is
    /// done, waking anyone blocked in `wait_for_shutdown`.
    pub fn complete_shutdown(&self) {
        self.shutdown_complete.notify_waiters();
    }

    pub async fn wait_with_timeout(&self, timeout: Duration) -> bool {
        if !self.is_shutting_down() {
            return true;
        }

        tokio::select! {
            _ = self.shutdown_complete.notified() => true,
            _ = tokio::time::sleep(timeout) => false,
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_GRACE_PERIOD_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_starts_uncancelled() {
        assert!(!CancellationToken::new().is_cancelled());
    }

    #[test]
    fn cancelling_a_token_is_visible_on_its_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_returns_immediately_if_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        token.cancelled().await;
    }

    #[tokio::test]
    async fn cancelled_resolves_once_a_concurrent_task_cancels() {
        let token = CancellationToken::new();
        let clone = token.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            clone.cancel();
        });

        token.cancelled().await;
        assert!(token.is_cancelled());
    }

    #[test]
    fn initiate_shutdown_cancels_the_token() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
        coordinator.initiate_shutdown();
        assert!(coordinator.is_shutting_down());
        assert!(coordinator.token().is_cancelled());
    }

    #[tokio::test]
    async fn wait_for_shutdown_returns_true_once_complete_shutdown_is_called() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
        coordinator.initiate_shutdown();

        let clone = coordinator.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            clone.complete_shutdown();
        });

        let result = tokio::time::timeout(Duration::from_millis(200), coordinator.wait_for_shutdown()).await;
        assert_eq!(result, Ok(true));
    }

    #[tokio::test]
    async fn wait_for_shutdown_times_out_if_nothing_completes() {
        let coordinator = ShutdownCoordinator::new(Duration::from_millis(30));
        coordinator.initiate_shutdown();
        assert!(!coordinator.wait_for_shutdown().await);
    }
}
