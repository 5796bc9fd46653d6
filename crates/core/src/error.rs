// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Condition validation errors. All of these are reported at startup,
//! before any external action is taken.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("--turns must be at least 1")]
    InvalidTurns,

    #[error("--k must be at least 1")]
    InvalidK,

    #[error("--num-tasks must be at least 1")]
    InvalidNumTasks,

    #[error("--small-turn-threshold must be at least 1 for preserve_on_small_turns")]
    InvalidThreshold,

    #[error("--small-turn-threshold only applies to --policy preserve_on_small_turns")]
    ThresholdWithoutPolicy,

    #[error("cascade mode requires both --backend-small and --backend-large")]
    MissingSmallBackend,

    #[error("mode '{0}' requires --backend-ollama")]
    MissingOllamaBackend(&'static str),

    #[error("--start-sglang and --start-vllm are mutually exclusive")]
    BothStartFlags,

    #[error("--start-{start} contradicts --backend-type {backend_type}")]
    StartFlagMismatch { start: &'static str, backend_type: &'static str },

    #[error("--noise-rate must be finite and non-negative")]
    InvalidNoiseRate,

    #[error("KVLAB_SUDO_PASSWORD must be set to start an engine container")]
    MissingSudoPassword,

    #[error("--engine-launch tmux requires running inside a tmux session ($TMUX is unset)")]
    NotInTmux,
}
