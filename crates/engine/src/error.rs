// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fatal orchestrator errors, one variant per failing phase so the final
//! error line names where the run died.

use kvlab_adapters::AdapterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("config: {0}")]
    Config(#[from] kvlab_core::ConfigError),

    #[error("workflow config: {0}")]
    Workflow(#[from] kvlab_workflow::WorkflowError),

    #[error("engine startup: {0}")]
    EngineStart(String),

    #[error("engine not ready after {secs}s: {detail}")]
    EngineNotReady { secs: u64, detail: String },

    #[error("daemon spawn ({bin}): {source}")]
    DaemonSpawn { bin: String, source: std::io::Error },

    #[error("daemon exited early ({status}); log tail:\n{tail}")]
    DaemonExited { status: String, tail: String },

    #[error("daemon not ready after {secs}s; log tail:\n{tail}")]
    DaemonNotReady { secs: u64, tail: String },

    #[error("workload rpc ({phase}): {source}")]
    Rpc { phase: &'static str, source: AdapterError },

    #[error("daemon kept reporting workflow complete: {executions} executions produced only {turns} turns")]
    EarlyComplete { executions: u32, turns: u32 },

    #[error("interrupted by signal")]
    Interrupted,
}

impl RuntimeError {
    pub(crate) fn rpc(phase: &'static str) -> impl FnOnce(AdapterError) -> RuntimeError {
        move |source| RuntimeError::Rpc { phase, source }
    }
}
