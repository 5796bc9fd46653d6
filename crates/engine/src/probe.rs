// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Readiness polling for the engine and the daemon.
//!
//! Both poll every 500 ms up to a deadline. The daemon probe additionally
//! races the process-exit channel so a crashed daemon fails the run
//! immediately with its log tail instead of burning the whole deadline.

use crate::error::RuntimeError;
use crate::supervisor::DaemonHandle;
use kvlab_adapters::{probe_engine, DaemonClient};
use kvlab_core::EngineKind;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const ENGINE_DEADLINE: Duration = Duration::from_secs(300);
pub const DAEMON_DEADLINE: Duration = Duration::from_secs(60);

/// Shorter deadline when probing a backend the orchestrator did not start:
/// it is either already up or not coming up at all.
pub const PREEXISTING_ENGINE_DEADLINE: Duration = Duration::from_secs(15);

const LOG_TAIL_LINES: usize = 20;

pub async fn wait_engine_ready(
    kind: EngineKind,
    backend_url: &str,
    deadline: Duration,
) -> Result<(), RuntimeError> {
    let start = Instant::now();
    let mut last_error = String::from("not probed yet");
    loop {
        match probe_engine(kind, backend_url).await {
            Ok(()) => {
                info!(engine = kind.as_str(), backend = backend_url, "engine ready");
                return Ok(());
            }
            Err(e) => {
                last_error = e.to_string();
                debug!(engine = kind.as_str(), error = %last_error, "engine not ready yet");
            }
        }
        if start.elapsed() >= deadline {
            return Err(RuntimeError::EngineNotReady {
                secs: deadline.as_secs(),
                detail: last_error,
            });
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

pub async fn wait_daemon_ready(
    client: &DaemonClient,
    daemon: &mut DaemonHandle,
    deadline: Duration,
) -> Result<(), RuntimeError> {
    let start = Instant::now();
    loop {
        if let Some(status) = daemon.try_exited() {
            return Err(RuntimeError::DaemonExited {
                status,
                tail: daemon.log_tail(LOG_TAIL_LINES),
            });
        }
        if matches!(client.health().await, Ok(true)) {
            info!("daemon ready");
            return Ok(());
        }
        if start.elapsed() >= deadline {
            return Err(RuntimeError::DaemonNotReady {
                secs: deadline.as_secs(),
                tail: daemon.log_tail(LOG_TAIL_LINES),
            });
        }
        let exited = tokio::select! {
            status = daemon.exited() => Some(status),
            _ = tokio::time::sleep(POLL_INTERVAL) => None,
        };
        if let Some(status) = exited {
            return Err(RuntimeError::DaemonExited {
                status,
                tail: daemon.log_tail(LOG_TAIL_LINES),
            });
        }
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
