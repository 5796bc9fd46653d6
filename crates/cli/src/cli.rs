// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI surface and conversion into a validated `Condition`.
//!
//! Flag-level conflicts (both start flags, a start flag contradicting
//! `--backend-type`) are rejected here; cross-field invariants live in
//! `Condition::validate`.

use clap::{Args, Parser, Subcommand, ValueEnum};
use kvlab_core::{
    CachePolicy, CascadeMode, Condition, ConfigError, EngineKind, EngineLaunch, Workload,
};
use std::path::PathBuf;

const OLLAMA_DEFAULT_BACKEND: &str = "http://localhost:11434";

#[derive(Parser)]
#[command(name = "kvlab", version, about = "KV-cache and model-cascade latency experiments")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Two agents alternate finishing a story, k tokens per turn
    Story(StoryArgs),
    /// Three-stage analysis/synthesis/summary pipelines
    Cascade(CascadeArgs),
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendTypeArg {
    Sglang,
    Vllm,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheStrategyArg {
    Flush,
    Preserve,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum PolicyArg {
    AggressiveFlush,
    Preserve,
    PreserveOnSmallTurns,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Baseline,
    Cascade,
    BaselineOllama,
    CascadeOllama,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LaunchArg {
    Child,
    Tmux,
}

#[derive(Args)]
pub struct CommonArgs {
    /// Inference backend URL (default depends on --backend-type)
    #[arg(long)]
    pub backend: Option<String>,

    /// Engine flavor behind the daemon
    #[arg(long, value_enum, default_value = "sglang")]
    pub backend_type: BackendTypeArg,

    /// Model identifier
    #[arg(long)]
    pub model: Option<String>,

    /// Poisson background-noise arrival rate, requests/second (0 disables)
    #[arg(long, default_value_t = 0.0)]
    pub noise_rate: f64,

    /// Seed for the noise arrival process
    #[arg(long, default_value_t = 42)]
    pub noise_seed: u64,

    /// Start an sglang engine container before the run
    #[arg(long)]
    pub start_sglang: bool,

    /// Start a vllm engine container before the run
    #[arg(long)]
    pub start_vllm: bool,

    /// How to launch the engine container
    #[arg(long, value_enum, default_value = "child")]
    pub engine_launch: LaunchArg,

    /// Write the run result here; absent means log it to stderr
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Agent daemon binary
    #[arg(long, default_value = "agentd")]
    pub daemon_bin: String,
}

#[derive(Args)]
pub struct StoryArgs {
    /// Number of turns to run
    #[arg(long, default_value_t = 100)]
    pub turns: u32,

    /// Tokens generated per turn
    #[arg(long, default_value_t = 50)]
    pub k: u32,

    /// Cache strategy shorthand (flush | preserve)
    #[arg(long, value_enum, conflicts_with = "policy")]
    pub cache_strategy: Option<CacheStrategyArg>,

    /// Daemon-native cache policy
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Turn-size threshold for preserve_on_small_turns
    #[arg(long)]
    pub small_turn_threshold: Option<u32>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args)]
pub struct CascadeArgs {
    /// Backend assignment for the three stages
    #[arg(long, value_enum, default_value = "baseline")]
    pub mode: ModeArg,

    /// Number of three-stage pipelines to execute
    #[arg(long, default_value_t = 10)]
    pub num_tasks: u32,

    /// Small-model backend URL (cascade mode)
    #[arg(long)]
    pub backend_small: Option<String>,

    /// Large-model backend URL
    #[arg(long)]
    pub backend_large: Option<String>,

    /// Ollama backend URL (ollama modes)
    #[arg(long)]
    pub backend_ollama: Option<String>,

    /// Small-model identifier
    #[arg(long)]
    pub model_small: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl Cli {
    pub fn into_condition(self) -> Result<Condition, ConfigError> {
        match self.command {
            Command::Story(args) => args.into_condition(),
            Command::Cascade(args) => args.into_condition(),
        }
    }
}

impl StoryArgs {
    pub fn into_condition(self) -> Result<Condition, ConfigError> {
        let policy = resolve_policy(self.cache_strategy, self.policy, self.small_turn_threshold)?;
        let workload = Workload::Story { turns: self.turns, k: self.k, policy };
        base_condition(self.common, workload)
    }
}

impl CascadeArgs {
    pub fn into_condition(self) -> Result<Condition, ConfigError> {
        let mode = match self.mode {
            ModeArg::Baseline => CascadeMode::Baseline,
            ModeArg::Cascade => CascadeMode::Cascade,
            ModeArg::BaselineOllama => CascadeMode::BaselineOllama,
            ModeArg::CascadeOllama => CascadeMode::CascadeOllama,
        };
        let workload = Workload::Cascade { num_tasks: self.num_tasks, mode };

        // --backend-large wins over the generic --backend for the primary.
        let mut common = self.common;
        if let Some(large) = self.backend_large {
            common.backend = Some(large);
        }
        let mut condition = base_condition(common, workload)?;
        condition.backend_small = self.backend_small;
        condition.backend_ollama = self.backend_ollama.or_else(|| {
            mode.uses_ollama().then(|| OLLAMA_DEFAULT_BACKEND.to_string())
        });
        condition.model_small = self.model_small;
        Ok(condition)
    }
}

fn resolve_policy(
    cache_strategy: Option<CacheStrategyArg>,
    policy: Option<PolicyArg>,
    small_turn_threshold: Option<u32>,
) -> Result<CachePolicy, ConfigError> {
    let resolved = if let Some(strategy) = cache_strategy {
        match strategy {
            CacheStrategyArg::Flush => CachePolicy::AggressiveFlush,
            CacheStrategyArg::Preserve => CachePolicy::Preserve,
        }
    } else {
        match policy {
            Some(PolicyArg::AggressiveFlush) => CachePolicy::AggressiveFlush,
            Some(PolicyArg::Preserve) | None => CachePolicy::Preserve,
            Some(PolicyArg::PreserveOnSmallTurns) => {
                let small_turn_threshold =
                    small_turn_threshold.ok_or(ConfigError::InvalidThreshold)?;
                CachePolicy::PreserveOnSmallTurns { small_turn_threshold }
            }
        }
    };
    if small_turn_threshold.is_some() && resolved.small_turn_threshold().is_none() {
        return Err(ConfigError::ThresholdWithoutPolicy);
    }
    Ok(resolved)
}

fn base_condition(common: CommonArgs, workload: Workload) -> Result<Condition, ConfigError> {
    if common.start_sglang && common.start_vllm {
        return Err(ConfigError::BothStartFlags);
    }
    let engine = match common.backend_type {
        BackendTypeArg::Sglang => EngineKind::Sglang,
        BackendTypeArg::Vllm => EngineKind::Vllm,
    };
    if common.start_sglang && engine != EngineKind::Sglang {
        return Err(ConfigError::StartFlagMismatch { start: "sglang", backend_type: engine.as_str() });
    }
    if common.start_vllm && engine != EngineKind::Vllm {
        return Err(ConfigError::StartFlagMismatch { start: "vllm", backend_type: engine.as_str() });
    }

    Ok(Condition {
        workload,
        engine,
        backend: common.backend.unwrap_or_else(|| engine.default_backend().to_string()),
        backend_small: None,
        backend_ollama: None,
        model: common.model.unwrap_or_else(|| engine.default_model().to_string()),
        model_small: None,
        noise_rate: common.noise_rate,
        noise_seed: common.noise_seed,
        start_engine: common.start_sglang || common.start_vllm,
        engine_launch: match common.engine_launch {
            LaunchArg::Child => EngineLaunch::Child,
            LaunchArg::Tmux => EngineLaunch::Tmux,
        },
        output: common.output,
        daemon_bin: common.daemon_bin,
    })
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
