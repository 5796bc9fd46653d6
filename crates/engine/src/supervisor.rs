// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent daemon supervision.
//!
//! The daemon runs as a child with stdout/stderr appended to a per-run log
//! file. A watcher task waits on the process and reports its exit status
//! through a channel; an exit before the workload finishes is fatal and
//! surfaces the log tail.

use crate::error::RuntimeError;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info};

pub struct DaemonHandle {
    pid: i32,
    log_path: PathBuf,
    exit_rx: mpsc::Receiver<String>,
    exit_status: Option<String>,
}

impl std::fmt::Debug for DaemonHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DaemonHandle")
            .field("pid", &self.pid)
            .field("log_path", &self.log_path)
            .field("exit_status", &self.exit_status)
            .finish()
    }
}

/// Spawn `<bin> --config <config_path>` with output redirected to
/// `log_path`.
pub fn spawn_daemon(
    bin: &str,
    config_path: &Path,
    log_path: &Path,
) -> Result<DaemonHandle, RuntimeError> {
    let log = std::fs::File::create(log_path)
        .map_err(|source| RuntimeError::DaemonSpawn { bin: bin.to_string(), source })?;
    let log_err = log
        .try_clone()
        .map_err(|source| RuntimeError::DaemonSpawn { bin: bin.to_string(), source })?;

    let mut child = Command::new(bin)
        .arg("--config")
        .arg(config_path)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err))
        .spawn()
        .map_err(|source| RuntimeError::DaemonSpawn { bin: bin.to_string(), source })?;

    let pid = child.id().map(|p| p as i32).unwrap_or(0);
    info!(bin, pid, log = %log_path.display(), "daemon spawned");

    let (exit_tx, exit_rx) = mpsc::channel(1);
    tokio::spawn(async move {
        let status = match child.wait().await {
            Ok(status) => status.to_string(),
            Err(e) => format!("wait failed: {e}"),
        };
        debug!(%status, "daemon process exited");
        let _ = exit_tx.send(status).await;
    });

    Ok(DaemonHandle { pid, log_path: log_path.to_path_buf(), exit_rx, exit_status: None })
}

impl DaemonHandle {
    pub fn pid(&self) -> i32 {
        self.pid
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Non-blocking exit check.
    pub fn try_exited(&mut self) -> Option<String> {
        if self.exit_status.is_none() {
            if let Ok(status) = self.exit_rx.try_recv() {
                self.exit_status = Some(status);
            }
        }
        self.exit_status.clone()
    }

    /// Resolve when the daemon process exits.
    pub async fn exited(&mut self) -> String {
        if let Some(status) = &self.exit_status {
            return status.clone();
        }
        let status = self
            .exit_rx
            .recv()
            .await
            .unwrap_or_else(|| "unknown (watcher gone)".to_string());
        self.exit_status = Some(status.clone());
        status
    }

    /// SIGTERM the daemon if still running. Absence is tolerated.
    pub fn terminate(&self) {
        if self.pid <= 0 {
            return;
        }
        match kill(Pid::from_raw(self.pid), Signal::SIGTERM) {
            Ok(()) => info!(pid = self.pid, "daemon terminated"),
            Err(e) => debug!(pid = self.pid, error = %e, "daemon already gone"),
        }
    }

    /// Last lines of the daemon log, for error reports.
    pub fn log_tail(&self, lines: usize) -> String {
        log_tail(&self.log_path, lines)
    }
}

pub fn log_tail(path: &Path, lines: usize) -> String {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let all: Vec<&str> = contents.lines().collect();
            let start = all.len().saturating_sub(lines);
            all[start..].join("\n")
        }
        Err(e) => format!("<daemon log {} unreadable: {e}>", path.display()),
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
