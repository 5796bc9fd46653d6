// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered resource release.
//!
//! Actions are registered as resources are acquired and run in reverse on
//! every exit path, so the noise stream stops before the daemon dies, the
//! daemon before its container, and the config file goes last. Every
//! action tolerates an already-absent target and never raises.

use crate::backend;
use kvlab_core::EngineKind;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum TeardownAction {
    RemoveConfigFile(PathBuf),
    TerminateDaemon { pid: i32 },
    CancelNoise(CancellationToken),
    RemoveContainer { kind: EngineKind, sudo_password: String },
    KillTmuxWindow(String),
}

impl TeardownAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RemoveConfigFile(_) => "remove_config_file",
            Self::TerminateDaemon { .. } => "terminate_daemon",
            Self::CancelNoise(_) => "cancel_noise",
            Self::RemoveContainer { .. } => "remove_container",
            Self::KillTmuxWindow(_) => "kill_tmux_window",
        }
    }
}

#[derive(Debug, Default)]
pub struct Teardown {
    actions: Vec<TeardownAction>,
}

impl Teardown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: TeardownAction) {
        debug!(action = action.name(), "teardown action registered");
        self.actions.push(action);
    }

    /// Run all registered actions, last-registered first. Returns the
    /// executed action names in order, mostly for tests and logging.
    pub async fn run(&mut self) -> Vec<&'static str> {
        let mut executed = Vec::with_capacity(self.actions.len());
        while let Some(action) = self.actions.pop() {
            let name = action.name();
            info!(action = name, "teardown");
            run_action(action).await;
            executed.push(name);
        }
        executed
    }
}

async fn run_action(action: TeardownAction) {
    match action {
        TeardownAction::RemoveConfigFile(path) => match std::fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "workflow config removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "workflow config already gone");
            }
            Err(e) => warn!(path = %path.display(), error = %e, "workflow config removal failed"),
        },
        TeardownAction::TerminateDaemon { pid } => {
            if pid <= 0 {
                return;
            }
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;
            match kill(Pid::from_raw(pid), Signal::SIGTERM) {
                Ok(()) => debug!(pid, "daemon terminated"),
                Err(e) => debug!(pid, error = %e, "daemon already gone"),
            }
        }
        TeardownAction::CancelNoise(token) => token.cancel(),
        TeardownAction::RemoveContainer { kind, sudo_password } => {
            backend::remove_container(kind, &sudo_password).await;
        }
        TeardownAction::KillTmuxWindow(window) => backend::kill_tmux_window(&window).await,
    }
}

#[cfg(test)]
#[path = "teardown_tests.rs"]
mod tests;
