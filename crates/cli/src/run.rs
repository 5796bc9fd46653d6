// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The orchestration sequence: config file -> engine -> daemon -> noise ->
//! workload -> results -> teardown. Teardown runs on every exit path,
//! including SIGINT/SIGTERM mid-workload.

use crate::output;
use kvlab_adapters::DaemonClient;
use kvlab_core::{
    Condition, ConfigError, EngineLaunch, HostInfo, Outcome, RunResult, SystemClock, Workload,
};
use kvlab_engine::{
    run_cascade, run_story, spawn_daemon, wait_daemon_ready, wait_engine_ready, CascadeParams,
    DaemonHandle, EngineLauncher, NoiseGenerator, RuntimeError, StoryParams, Teardown,
    TeardownAction, DAEMON_DEADLINE, ENGINE_COMMAND_ENV, ENGINE_DEADLINE,
    PREEXISTING_ENGINE_DEADLINE, SUDO_PASSWORD_ENV, TMUX_WINDOW,
};
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const LOG_TAIL_LINES: usize = 20;

/// Environment the run needs beyond the condition itself. Resolved before
/// any external action so misconfiguration never leaves debris behind.
struct RunEnv {
    sudo_password: String,
    command_override: Option<String>,
}

impl std::fmt::Debug for RunEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunEnv")
            .field("sudo_password", &"<redacted>")
            .field("command_override", &self.command_override)
            .finish()
    }
}

impl RunEnv {
    fn from_process(condition: &Condition) -> Result<Self, ConfigError> {
        let sudo_password = if condition.start_engine {
            match std::env::var(SUDO_PASSWORD_ENV) {
                Ok(password) if !password.is_empty() => password,
                _ => return Err(ConfigError::MissingSudoPassword),
            }
        } else {
            String::new()
        };
        if condition.start_engine
            && condition.engine_launch == EngineLaunch::Tmux
            && std::env::var("TMUX").is_err()
        {
            return Err(ConfigError::NotInTmux);
        }
        Ok(Self { sudo_password, command_override: std::env::var(ENGINE_COMMAND_ENV).ok() })
    }
}

pub async fn execute(condition: Condition) -> anyhow::Result<()> {
    condition.validate()?;
    let env = RunEnv::from_process(&condition)?;

    let config = kvlab_workflow::synthesize(&condition);
    let config_path = kvlab_workflow::write_scratch(&config).map_err(RuntimeError::Workflow)?;
    info!(path = %config_path.display(), "workflow config written");

    let mut teardown = Teardown::new();
    teardown.push(TeardownAction::RemoveConfigFile(config_path.clone()));

    let result = {
        let run = orchestrate(&condition, &env, &config_path, &mut teardown);
        tokio::pin!(run);
        tokio::select! {
            result = &mut run => result,
            _ = shutdown_signal() => Err(RuntimeError::Interrupted),
        }
    };

    match result {
        Ok(run_result) => {
            output::write_result(condition.output.as_deref(), &run_result)?;
            teardown.run().await;
            info!("run complete");
            Ok(())
        }
        Err(e) => {
            teardown.run().await;
            Err(e.into())
        }
    }
}

async fn orchestrate(
    condition: &Condition,
    env: &RunEnv,
    config_path: &Path,
    teardown: &mut Teardown,
) -> Result<RunResult, RuntimeError> {
    // Engine up (or verify a pre-existing one).
    if condition.start_engine {
        let host_port = kvlab_adapters::host_port(&condition.backend)
            .map_err(|e| RuntimeError::EngineStart(e.to_string()))?;
        let launcher = EngineLauncher::new(
            condition.engine,
            condition.engine_launch,
            condition.model.clone(),
            host_port,
            env.sudo_password.clone(),
            env.command_override.clone(),
        );
        let handle = launcher.start().await?;
        teardown.push(TeardownAction::RemoveContainer {
            kind: condition.engine,
            sudo_password: env.sudo_password.clone(),
        });
        if handle.launch == EngineLaunch::Tmux {
            teardown.push(TeardownAction::KillTmuxWindow(TMUX_WINDOW.to_string()));
        }
        wait_engine_ready(condition.engine, &condition.backend, ENGINE_DEADLINE).await?;
    } else {
        wait_engine_ready(condition.engine, &condition.backend, PREEXISTING_ENGINE_DEADLINE)
            .await?;
    }

    // Daemon up.
    let daemon_log = daemon_log_path(condition);
    let mut daemon = spawn_daemon(&condition.daemon_bin, config_path, &daemon_log)?;
    teardown.push(TeardownAction::TerminateDaemon { pid: daemon.pid() });
    let client = DaemonClient::new();
    wait_daemon_ready(&client, &mut daemon, DAEMON_DEADLINE).await?;

    // Optional background noise.
    let noise_cancel = if condition.noise_rate > 0.0 {
        let generator = NoiseGenerator::new(
            condition.engine,
            &condition.backend,
            condition.model.clone(),
            condition.noise_rate,
            condition.noise_seed,
        )?;
        let cancel = generator.cancel_token();
        teardown.push(TeardownAction::CancelNoise(cancel.clone()));
        tokio::spawn(generator.run());
        Some(cancel)
    } else {
        None
    };

    // The workload itself, racing the daemon exit watcher.
    let outcome = match &condition.workload {
        Workload::Story { turns, k, policy } => {
            let params = StoryParams {
                turns: *turns,
                k: *k,
                policy: *policy,
                engine: condition.engine,
            };
            let story = race_daemon(run_story(&client, &params, &SystemClock), &mut daemon).await?;
            Outcome::Story(story)
        }
        Workload::Cascade { num_tasks, .. } => {
            let params = CascadeParams { num_tasks: *num_tasks };
            let cascade =
                race_daemon(run_cascade(&client, &params, &SystemClock), &mut daemon).await?;
            Outcome::Cascade(cascade)
        }
    };

    // Noise stops at workload end; teardown's cancel is then a no-op.
    if let Some(cancel) = noise_cancel {
        cancel.cancel();
    }
    info!("workload finished");

    Ok(RunResult { condition: condition.clone(), host: HostInfo::detect(), outcome })
}

/// Race a workload future against the daemon dying underneath it.
async fn race_daemon<T>(
    workload: impl Future<Output = Result<T, RuntimeError>>,
    daemon: &mut DaemonHandle,
) -> Result<T, RuntimeError> {
    let raced = {
        tokio::pin!(workload);
        tokio::select! {
            result = &mut workload => Ok(result),
            status = daemon.exited() => Err(status),
        }
    };
    match raced {
        Ok(result) => result,
        Err(status) => {
            Err(RuntimeError::DaemonExited { status, tail: daemon.log_tail(LOG_TAIL_LINES) })
        }
    }
}

fn daemon_log_path(condition: &Condition) -> PathBuf {
    match &condition.output {
        Some(path) => path.with_extension("daemon.log"),
        None => PathBuf::from("agentd.log"),
    }
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let ctrl_c = tokio::signal::ctrl_c();
    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = ctrl_c => {}
                _ = term.recv() => {}
            }
        }
        Err(_) => {
            let _ = ctrl_c.await;
        }
    }
    warn!("shutdown signal received; tearing down");
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
