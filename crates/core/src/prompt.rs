// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt construction for both workloads.
//!
//! The story prompt is always built from the orchestrator's own growing
//! context rather than the daemon's context concatenation, so the semantic
//! input is identical across cache policies and only the KV-cache behavior
//! varies.

use crate::condition::{CachePolicy, EngineKind};
use std::time::Duration;

/// Story turn prompt: a fixed preamble naming the token budget plus the
/// story so far.
pub fn story_prompt(k: u32, context: &str) -> String {
    if context.is_empty() {
        format!(
            "You are co-writing a story with another author. \
             Generate the next {k} tokens of the story. Begin the story now."
        )
    } else {
        format!(
            "You are co-writing a story with another author. \
             Generate the next {k} tokens of the story.\n\n\
             The story so far:\n{context}"
        )
    }
}

/// Cache-flush emulation for engines without an explicit flush knob.
///
/// vLLM caches by prefix hash, so under the aggressive-flush policy each
/// turn gets a unique prefix that defeats any cache match. Other engines
/// and policies pass the prompt through untouched.
pub fn decorate_prompt(engine: EngineKind, policy: &CachePolicy, turn: u32, prompt: &str) -> String {
    match (engine, policy) {
        (EngineKind::Vllm, CachePolicy::AggressiveFlush) => {
            format!("Request {turn}.\n\n{prompt}")
        }
        _ => prompt.to_string(),
    }
}

/// The three cascade pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeStage {
    Analysis,
    Synthesis,
    Summary,
}

impl CascadeStage {
    pub const ALL: [CascadeStage; 3] = [Self::Analysis, Self::Synthesis, Self::Summary];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Analysis => "analysis",
            Self::Synthesis => "synthesis",
            Self::Summary => "summary",
        }
    }

    /// Per-stage generation budget.
    pub fn max_tokens(&self) -> u32 {
        match self {
            Self::Analysis => 50,
            Self::Synthesis => 150,
            Self::Summary => 30,
        }
    }

    /// Per-stage RPC timeout.
    pub fn timeout(&self) -> Duration {
        match self {
            Self::Analysis | Self::Summary => Duration::from_secs(120),
            Self::Synthesis => Duration::from_secs(180),
        }
    }
}

/// Stage prompt for one cascade task. The summary stage sees only the
/// issue; analysis and synthesis see the starting code as well.
pub fn cascade_stage_prompt(stage: CascadeStage, issue: &str, code: &str) -> String {
    match stage {
        CascadeStage::Analysis => {
            format!("Analyze this issue and identify the root cause.\n\nIssue: {issue}\n\nCode:\n{code}")
        }
        CascadeStage::Synthesis => {
            format!("Generate fixed code for this issue.\n\nIssue: {issue}\n\nCode:\n{code}")
        }
        CascadeStage::Summary => {
            format!("Summarize the fix for this issue in 2-3 sentences.\n\nIssue: {issue}")
        }
    }
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
