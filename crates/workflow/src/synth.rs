// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builds the workflow config for one experimental condition.
//!
//! Story: one server, two alternating writer profiles, `turns` task slots.
//! Cascade: one or two servers and the fixed router -> synthesizer ->
//! summarizer pipeline; the cascade modes route the fast stages to the
//! small-model server.

use crate::descriptor::{
    AgentProfile, AgenticServing, Backend, CacheBlock, DaemonSection, LlmServer, TaskSlot,
    WorkflowConfig, WorkflowDef,
};
use kvlab_core::{CachePolicy, CascadeMode, Condition, EngineKind, Workload, DAEMON_ADDR};

pub const PROFILE_WRITER_A: &str = "writer_a";
pub const PROFILE_WRITER_B: &str = "writer_b";
pub const PROFILE_ROUTER: &str = "router";
pub const PROFILE_SYNTHESIZER: &str = "synthesizer";
pub const PROFILE_SUMMARIZER: &str = "summarizer";

/// Small model used when the condition does not name one.
const DEFAULT_SMALL_MODEL: &str = "Qwen/Qwen2.5-1.5B-Instruct";
const DEFAULT_OLLAMA_MODEL: &str = "llama3.2:1b";

pub fn synthesize(condition: &Condition) -> WorkflowConfig {
    let agentic_serving = match &condition.workload {
        Workload::Story { turns, policy, .. } => story_serving(condition, *turns, policy),
        Workload::Cascade { mode, .. } => cascade_serving(condition, *mode),
    };
    WorkflowConfig {
        log_format: "json".to_string(),
        log_level: "info".to_string(),
        agentic_serving,
    }
}

fn story_serving(condition: &Condition, turns: u32, policy: &CachePolicy) -> AgenticServing {
    let server = LlmServer {
        name: "main".to_string(),
        backend: Backend {
            kind: condition.engine.as_str().to_string(),
            endpoint: condition.backend.clone(),
        },
        model: condition.model.clone(),
        cache: CacheBlock {
            policy: policy.policy_name().to_string(),
            small_turn_threshold: policy.small_turn_threshold(),
        },
    };

    // The daemon only concatenates context for sglang; for vllm the
    // orchestrator supplies the full prompt so the input is identical
    // across cache policies.
    let use_context = Some(condition.engine == EngineKind::Sglang);
    let tasks = (0..turns)
        .map(|i| TaskSlot {
            agent_profile: if i % 2 == 0 { PROFILE_WRITER_A } else { PROFILE_WRITER_B }.to_string(),
            use_context,
        })
        .collect();

    AgenticServing {
        mode: "daemon".to_string(),
        daemon: DaemonSection { listen_address: DAEMON_ADDR.to_string() },
        llm_servers: vec![server],
        agent_profiles: vec![
            AgentProfile { name: PROFILE_WRITER_A.to_string(), llm_server: "main".to_string() },
            AgentProfile { name: PROFILE_WRITER_B.to_string(), llm_server: "main".to_string() },
        ],
        workflows: vec![WorkflowDef { name: "story".to_string(), tasks }],
    }
}

fn cascade_serving(condition: &Condition, mode: CascadeMode) -> AgenticServing {
    let engine_kind = condition.engine.as_str().to_string();
    let preserve = CacheBlock { policy: "preserve".to_string(), small_turn_threshold: None };
    let small_model = condition.model_small.clone().unwrap_or_else(|| {
        if mode.uses_ollama() { DEFAULT_OLLAMA_MODEL } else { DEFAULT_SMALL_MODEL }.to_string()
    });

    let main_server = |name: &str| LlmServer {
        name: name.to_string(),
        backend: Backend { kind: engine_kind.clone(), endpoint: condition.backend.clone() },
        model: condition.model.clone(),
        cache: preserve.clone(),
    };

    // Validation guarantees the URLs these modes need are present; fall
    // back to the primary backend rather than panicking if not.
    let small_url = condition.backend_small.clone().unwrap_or_else(|| condition.backend.clone());
    let ollama_url = condition.backend_ollama.clone().unwrap_or_else(|| condition.backend.clone());

    let (llm_servers, fast_server, slow_server) = match mode {
        CascadeMode::Baseline => (vec![main_server("main")], "main", "main"),
        CascadeMode::Cascade => (
            vec![
                LlmServer {
                    name: "small".to_string(),
                    backend: Backend { kind: engine_kind.clone(), endpoint: small_url },
                    model: small_model,
                    cache: preserve.clone(),
                },
                main_server("large"),
            ],
            "small",
            "large",
        ),
        CascadeMode::BaselineOllama => (
            vec![LlmServer {
                name: "ollama".to_string(),
                backend: Backend { kind: "ollama".to_string(), endpoint: ollama_url },
                model: small_model,
                cache: preserve.clone(),
            }],
            "ollama",
            "ollama",
        ),
        CascadeMode::CascadeOllama => (
            vec![
                LlmServer {
                    name: "ollama".to_string(),
                    backend: Backend { kind: "ollama".to_string(), endpoint: ollama_url },
                    model: small_model,
                    cache: preserve.clone(),
                },
                main_server("large"),
            ],
            "ollama",
            "large",
        ),
    };

    AgenticServing {
        mode: "daemon".to_string(),
        daemon: DaemonSection { listen_address: DAEMON_ADDR.to_string() },
        llm_servers,
        agent_profiles: vec![
            AgentProfile { name: PROFILE_ROUTER.to_string(), llm_server: fast_server.to_string() },
            AgentProfile {
                name: PROFILE_SYNTHESIZER.to_string(),
                llm_server: slow_server.to_string(),
            },
            AgentProfile {
                name: PROFILE_SUMMARIZER.to_string(),
                llm_server: fast_server.to_string(),
            },
        ],
        workflows: vec![WorkflowDef {
            name: "cascade".to_string(),
            tasks: vec![
                TaskSlot { agent_profile: PROFILE_ROUTER.to_string(), use_context: None },
                TaskSlot { agent_profile: PROFILE_SYNTHESIZER.to_string(), use_context: None },
                TaskSlot { agent_profile: PROFILE_SUMMARIZER.to_string(), use_context: None },
            ],
        }],
    }
}

#[cfg(test)]
#[path = "synth_tests.rs"]
mod tests;
