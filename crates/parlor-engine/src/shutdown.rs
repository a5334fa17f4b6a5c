// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! Installs handlers for SIGTERM and SIGINT (Ctrl+C), triggering a
//! [`CancellationToken`] that the worker pool monitors. Workers finish the
//! job they hold before exiting; unfinished claims expire and redeliver.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is
/// received. The signal handler task runs in the background until the token
/// is cancelled.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Waits up to `timeout` for the spawned workers to finish.
///
/// Workers stop at their next loop iteration after cancellation, completing
/// the job they currently hold. A worker that exceeds the timeout is simply
/// left behind: its claim expires and the job redelivers on next start.
pub async fn drain_workers(handles: Vec<JoinHandle<()>>, timeout: Duration) {
    if handles.is_empty() {
        info!("no workers to drain");
        return;
    }

    let count = handles.len();
    info!(count, "waiting for workers to finish");

    let drain = futures::future::join_all(handles);
    match tokio::time::timeout(timeout, drain).await {
        Ok(results) => {
            let panicked = results.iter().filter(|r| r.is_err()).count();
            if panicked == 0 {
                info!("all workers drained");
            } else {
                warn!(panicked, "some workers ended abnormally");
            }
        }
        Err(_) => {
            warn!("drain timeout reached, abandoning remaining workers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn install_signal_handler_returns_token() {
        let token = install_signal_handler();
        // Token should not be cancelled yet.
        assert!(!token.is_cancelled());
        // Cancel it manually to clean up the background task.
        token.cancel();
    }

    #[tokio::test]
    async fn drain_with_no_workers_returns_immediately() {
        drain_workers(Vec::new(), Duration::from_millis(10)).await;
    }

    #[tokio::test]
    async fn drain_joins_finished_workers() {
        let handles = vec![
            tokio::spawn(async {}),
            tokio::spawn(async {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }),
        ];
        drain_workers(handles, Duration::from_secs(1)).await;
    }
}
