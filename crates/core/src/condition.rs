// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The experimental condition: one immutable, validated description of a
//! single orchestrator run. Built from CLI flags, echoed verbatim into the
//! run result.

use crate::error::ConfigError;
use serde::Serialize;
use std::path::PathBuf;

/// Inference engine flavor. Affects readiness probing, noise request shape,
/// container startup arguments, and cache-flush emulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Sglang,
    Vllm,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sglang => "sglang",
            Self::Vllm => "vllm",
        }
    }

    /// Backend URL assumed when no `--backend` flag is given.
    pub fn default_backend(&self) -> &'static str {
        match self {
            Self::Sglang => "http://localhost:30000",
            Self::Vllm => "http://localhost:8000",
        }
    }

    pub fn default_model(&self) -> &'static str {
        "Qwen/Qwen2.5-7B-Instruct"
    }

    /// Fixed container name, one per engine kind. Concurrent orchestrators
    /// on one host would collide here; that is assumed not to happen.
    pub fn container_name(&self) -> &'static str {
        match self {
            Self::Sglang => "kvlab-sglang",
            Self::Vllm => "kvlab-vllm",
        }
    }

    /// Port the engine listens on inside its container.
    pub fn container_port(&self) -> u16 {
        match self {
            Self::Sglang => 30000,
            Self::Vllm => 8000,
        }
    }
}

/// How the engine container is launched when `start_engine` is set.
///
/// `Child` pipes the container's output to a log file from an in-process
/// child; `Tmux` opens a detached multiplexer window so the output stays
/// interactively inspectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineLaunch {
    Child,
    Tmux,
}

/// KV-cache directive handed to the daemon for the story workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    AggressiveFlush,
    Preserve,
    PreserveOnSmallTurns { small_turn_threshold: u32 },
}

impl CachePolicy {
    /// Name the daemon recognizes in the config file's cache block.
    pub fn policy_name(&self) -> &'static str {
        match self {
            Self::AggressiveFlush => "aggressive_flush",
            Self::Preserve => "preserve",
            Self::PreserveOnSmallTurns { .. } => "preserve_on_small_turns",
        }
    }

    pub fn small_turn_threshold(&self) -> Option<u32> {
        match self {
            Self::PreserveOnSmallTurns { small_turn_threshold } => Some(*small_turn_threshold),
            _ => None,
        }
    }
}

/// Backend assignment for the three cascade stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeMode {
    Baseline,
    Cascade,
    BaselineOllama,
    CascadeOllama,
}

impl CascadeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Cascade => "cascade",
            Self::BaselineOllama => "baseline-ollama",
            Self::CascadeOllama => "cascade-ollama",
        }
    }

    pub fn uses_ollama(&self) -> bool {
        matches!(self, Self::BaselineOllama | Self::CascadeOllama)
    }
}

/// Which workload this run drives, with its knobs.
#[derive(Debug, Clone, PartialEq)]
pub enum Workload {
    /// Two agents alternate for `turns` turns of `k` tokens each.
    Story { turns: u32, k: u32, policy: CachePolicy },
    /// `num_tasks` independent analysis -> synthesis -> summary pipelines.
    Cascade { num_tasks: u32, mode: CascadeMode },
}

// Serialized by hand so the policy fields sit flat next to the workload
// knobs in the condition echo (serde cannot flatten inside enum variants).
impl Serialize for Workload {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        match self {
            Workload::Story { turns, k, policy } => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("kind", "story")?;
                map.serialize_entry("turns", turns)?;
                map.serialize_entry("k", k)?;
                map.serialize_entry("policy", policy.policy_name())?;
                if let Some(threshold) = policy.small_turn_threshold() {
                    map.serialize_entry("small_turn_threshold", &threshold)?;
                }
                map.end()
            }
            Workload::Cascade { num_tasks, mode } => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("kind", "cascade")?;
                map.serialize_entry("num_tasks", num_tasks)?;
                map.serialize_entry("mode", mode.as_str())?;
                map.end()
            }
        }
    }
}

/// One experimental condition, validated before any external action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub workload: Workload,
    pub engine: EngineKind,
    /// Primary backend URL (the only backend for story and cascade
    /// baseline; the large-model backend for cascade mode).
    pub backend: String,
    pub backend_small: Option<String>,
    pub backend_ollama: Option<String>,
    pub model: String,
    pub model_small: Option<String>,
    /// Poisson arrival rate for background noise, requests/second. 0 disables.
    pub noise_rate: f64,
    pub noise_seed: u64,
    pub start_engine: bool,
    pub engine_launch: EngineLaunch,
    pub output: Option<PathBuf>,
    pub daemon_bin: String,
}

impl Condition {
    /// Name of the workflow entry the config synthesizer emits and the
    /// runner starts executions of.
    pub fn workflow_name(&self) -> &'static str {
        match self.workload {
            Workload::Story { .. } => "story",
            Workload::Cascade { .. } => "cascade",
        }
    }

    pub fn cache_policy(&self) -> Option<&CachePolicy> {
        match &self.workload {
            Workload::Story { policy, .. } => Some(policy),
            Workload::Cascade { .. } => None,
        }
    }

    /// Check the cross-field invariants. Flag-level conflicts (both start
    /// flags, strategy/policy collisions) are rejected earlier, at parse
    /// time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.workload {
            Workload::Story { turns, k, policy } => {
                if *turns < 1 {
                    return Err(ConfigError::InvalidTurns);
                }
                if *k < 1 {
                    return Err(ConfigError::InvalidK);
                }
                if let CachePolicy::PreserveOnSmallTurns { small_turn_threshold } = policy {
                    if *small_turn_threshold < 1 {
                        return Err(ConfigError::InvalidThreshold);
                    }
                }
            }
            Workload::Cascade { num_tasks, mode } => {
                if *num_tasks < 1 {
                    return Err(ConfigError::InvalidNumTasks);
                }
                if *mode == CascadeMode::Cascade && self.backend_small.is_none() {
                    return Err(ConfigError::MissingSmallBackend);
                }
                if mode.uses_ollama() && self.backend_ollama.is_none() {
                    return Err(ConfigError::MissingOllamaBackend(mode.as_str()));
                }
            }
        }
        if !self.noise_rate.is_finite() || self.noise_rate < 0.0 {
            return Err(ConfigError::InvalidNoiseRate);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "condition_tests.rs"]
mod tests;
