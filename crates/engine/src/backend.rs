// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine container lifecycle.
//!
//! The container runtime is privileged, so every docker invocation goes
//! through `sudo -S` with the credential piped to stdin. Two launch
//! variants: an in-process child whose output lands in a log file
//! (default), and a detached tmux window for interactive inspection.

use crate::error::RuntimeError;
use kvlab_core::{ConfigError, EngineKind, EngineLaunch};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Name of the tmux window holding the engine when launched detached.
pub const TMUX_WINDOW: &str = "kvlab-engine";

/// Env var carrying the sudo credential for the container runtime.
pub const SUDO_PASSWORD_ENV: &str = "KVLAB_SUDO_PASSWORD";

/// Env var overriding the generated engine startup command verbatim.
pub const ENGINE_COMMAND_ENV: &str = "KVLAB_ENGINE_COMMAND";

pub struct EngineLauncher {
    kind: EngineKind,
    launch: EngineLaunch,
    model: String,
    host_port: u16,
    sudo_password: String,
    command_override: Option<String>,
}

/// What teardown needs to release the engine again.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    pub kind: EngineKind,
    pub launch: EngineLaunch,
    pub log_path: Option<PathBuf>,
}

impl EngineLauncher {
    pub fn new(
        kind: EngineKind,
        launch: EngineLaunch,
        model: impl Into<String>,
        host_port: u16,
        sudo_password: impl Into<String>,
        command_override: Option<String>,
    ) -> Self {
        Self {
            kind,
            launch,
            model: model.into(),
            host_port,
            sudo_password: sudo_password.into(),
            command_override,
        }
    }

    /// Bring the engine up: kill any prior container by name, then start a
    /// fresh one. Readiness is the prober's job.
    pub async fn start(&self) -> Result<EngineHandle, RuntimeError> {
        info!(engine = self.kind.as_str(), port = self.host_port, "starting engine container");
        remove_container(self.kind, &self.sudo_password).await;

        match self.launch {
            EngineLaunch::Child => self.start_child().await,
            EngineLaunch::Tmux => self.start_tmux().await,
        }
    }

    async fn start_child(&self) -> Result<EngineHandle, RuntimeError> {
        let log_path = PathBuf::from(format!("{}.log", self.kind.container_name()));
        let log = std::fs::File::create(&log_path)
            .map_err(|e| RuntimeError::EngineStart(format!("log file {}: {e}", log_path.display())))?;
        let log_err = log
            .try_clone()
            .map_err(|e| RuntimeError::EngineStart(format!("log file clone: {e}")))?;

        let mut command = match &self.command_override {
            Some(line) => {
                let mut c = Command::new("sh");
                c.arg("-c").arg(line);
                c
            }
            None => {
                let mut c = Command::new("sudo");
                c.args(["-S", "-p", ""]).arg("docker");
                c.args(docker_run_args(self.kind, self.host_port, &self.model));
                c
            }
        };

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .spawn()
            .map_err(|e| RuntimeError::EngineStart(format!("spawn failed: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            // Best effort: an override command may never read it.
            let _ = stdin.write_all(format!("{}\n", self.sudo_password).as_bytes()).await;
        }
        info!(log = %log_path.display(), "engine container launching (child)");

        // The child stays attached to `docker run`; removing the container
        // on teardown ends it. Dropping the handle does not kill it.
        drop(child);
        Ok(EngineHandle { kind: self.kind, launch: self.launch, log_path: Some(log_path) })
    }

    async fn start_tmux(&self) -> Result<EngineHandle, RuntimeError> {
        if std::env::var("TMUX").is_err() {
            return Err(RuntimeError::Config(ConfigError::NotInTmux));
        }

        // Export the credential into the session so the window's shell can
        // pipe it to sudo.
        let status = Command::new("tmux")
            .args(["set-environment", SUDO_PASSWORD_ENV, &self.sudo_password])
            .status()
            .await
            .map_err(|e| RuntimeError::EngineStart(format!("tmux set-environment: {e}")))?;
        if !status.success() {
            return Err(RuntimeError::EngineStart("tmux set-environment failed".to_string()));
        }

        let docker_line = match &self.command_override {
            Some(line) => line.clone(),
            None => {
                let args = docker_run_args(self.kind, self.host_port, &self.model);
                let quoted: Vec<String> = args.iter().map(|a| shell_quote(a)).collect();
                format!("echo \"${SUDO_PASSWORD_ENV}\" | sudo -S -p '' docker {}", quoted.join(" "))
            }
        };
        // Trailing shell keeps the window alive if the container exits.
        let window_command = format!("{docker_line}; exec $SHELL");

        let output = Command::new("tmux")
            .args(["new-window", "-d", "-n", TMUX_WINDOW, &window_command])
            .output()
            .await
            .map_err(|e| RuntimeError::EngineStart(format!("tmux new-window: {e}")))?;
        if !output.status.success() {
            return Err(RuntimeError::EngineStart(format!(
                "tmux new-window failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        info!(window = TMUX_WINDOW, "engine container launching (tmux window)");
        Ok(EngineHandle { kind: self.kind, launch: self.launch, log_path: None })
    }
}

/// `docker run` arguments for one engine kind. The host port maps onto the
/// engine's fixed in-container port; the HF cache mount avoids re-downloads
/// across runs.
pub(crate) fn docker_run_args(kind: EngineKind, host_port: u16, model: &str) -> Vec<String> {
    let container_port = kind.container_port();
    let cache = hf_cache_mount();
    let mut args: Vec<String> = vec![
        "run".into(),
        "--rm".into(),
        "--name".into(),
        kind.container_name().into(),
        "--gpus".into(),
        "all".into(),
        "-p".into(),
        format!("{host_port}:{container_port}"),
        "-v".into(),
        cache,
    ];
    match kind {
        EngineKind::Sglang => {
            args.extend([
                "--shm-size".into(),
                "32g".into(),
                "lmsysorg/sglang:latest".into(),
                "python3".into(),
                "-m".into(),
                "sglang.launch_server".into(),
                "--model-path".into(),
                model.into(),
                "--host".into(),
                "0.0.0.0".into(),
                "--port".into(),
                container_port.to_string(),
                "--mem-fraction-static".into(),
                "0.85".into(),
            ]);
        }
        EngineKind::Vllm => {
            args.extend([
                "--ipc=host".into(),
                "vllm/vllm-openai:latest".into(),
                "--model".into(),
                model.into(),
                "--host".into(),
                "0.0.0.0".into(),
                "--port".into(),
                container_port.to_string(),
            ]);
        }
    }
    args
}

fn hf_cache_mount() -> String {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/root"));
    format!("{}/.cache/huggingface:/root/.cache/huggingface", home.display())
}

/// Force-remove the engine container by name. Absence is not an error; any
/// failure is logged and swallowed so this is safe on every exit path.
pub async fn remove_container(kind: EngineKind, sudo_password: &str) {
    let name = kind.container_name();
    match run_sudo_docker(&["rm".into(), "-f".into(), name.into()], sudo_password).await {
        Ok(output) if output.status.success() => {
            debug!(container = name, "container removed");
        }
        Ok(output) => {
            debug!(
                container = name,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "container removal reported failure (likely already gone)"
            );
        }
        Err(e) => warn!(container = name, error = %e, "container removal failed"),
    }
}

/// Kill the detached engine window, tolerating its absence.
pub async fn kill_tmux_window(window: &str) {
    match Command::new("tmux").args(["kill-window", "-t", window]).output().await {
        Ok(output) if output.status.success() => debug!(window, "tmux window killed"),
        Ok(_) => debug!(window, "tmux window already gone"),
        Err(e) => warn!(window, error = %e, "tmux kill-window failed"),
    }
}

async fn run_sudo_docker(
    args: &[String],
    sudo_password: &str,
) -> std::io::Result<std::process::Output> {
    let mut child = Command::new("sudo")
        .args(["-S", "-p", ""])
        .arg("docker")
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(format!("{sudo_password}\n").as_bytes()).await;
    }
    child.wait_with_output().await
}

/// Quote one argument for a POSIX shell line.
fn shell_quote(arg: &str) -> String {
    if !arg.is_empty()
        && arg.chars().all(|c| c.is_ascii_alphanumeric() || "-_./:=@,".contains(c))
    {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
