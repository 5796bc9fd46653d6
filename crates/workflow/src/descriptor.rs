// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed model of the daemon's workflow configuration document.
//!
//! Field names and nesting follow the daemon's schema exactly:
//! `agentic_serving.llm_servers[].cache.small_turn_threshold` appears only
//! when the small-turns policy is selected.

use crate::error::WorkflowError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub log_format: String,
    pub log_level: String,
    pub agentic_serving: AgenticServing,
}

impl WorkflowConfig {
    pub fn to_yaml(&self) -> Result<String, WorkflowError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgenticServing {
    pub mode: String,
    pub daemon: DaemonSection,
    pub llm_servers: Vec<LlmServer>,
    pub agent_profiles: Vec<AgentProfile>,
    pub workflows: Vec<WorkflowDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonSection {
    pub listen_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmServer {
    pub name: String,
    pub backend: Backend,
    pub model: String,
    pub cache: CacheBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backend {
    #[serde(rename = "type")]
    pub kind: String,
    pub endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheBlock {
    pub policy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub small_turn_threshold: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub name: String,
    pub llm_server: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
    pub name: String,
    pub tasks: Vec<TaskSlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSlot {
    pub agent_profile: String,
    /// When set, the daemon concatenates prior task outputs ahead of the
    /// submitted prompt. Absent means daemon default (off).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_context: Option<bool>,
}
