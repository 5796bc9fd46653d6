// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-turn latency records and the serialized run result.
//!
//! Records accumulate strictly in execution order; summaries are computed
//! once at the end of the workload and written alongside the raw arrays so
//! downstream plotting needs no recomputation.

use crate::condition::Condition;
use serde::Serialize;

/// One executed story task slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnRecord {
    /// 1-based, strictly consecutive.
    pub turn: u32,
    /// Wall-clock time for the execute RPC, as observed by the orchestrator.
    pub elapsed_secs: f64,
    /// Time to first token, reported by the daemon.
    pub ttft_ms: f64,
    /// Time per output token, reported by the daemon.
    pub tpot_ms: f64,
    pub content_chars: usize,
    /// Generated text, kept because it feeds the next turn's prompt.
    pub content: String,
    /// Size of the story context at submission time.
    pub context_chars: usize,
}

/// One executed cascade stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageRecord {
    /// 1-based task index.
    pub task: u32,
    pub stage: &'static str,
    pub elapsed_secs: f64,
    pub ttft_ms: f64,
    pub tpot_ms: f64,
    pub content_chars: usize,
}

/// Wall-clock total for one three-stage cascade task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskTotal {
    pub task: u32,
    pub total_secs: f64,
}

/// Host descriptor embedded in every run result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostInfo {
    pub os: &'static str,
    pub cpus: usize,
}

impl HostInfo {
    pub fn detect() -> Self {
        Self { os: std::env::consts::OS, cpus: num_cpus::get() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorySummary {
    pub avg_ttft_ms: f64,
    pub avg_tpot_ms: f64,
    pub total_wall_secs: f64,
    pub ttft_ms: Vec<f64>,
    pub tpot_ms: Vec<f64>,
    pub latency_secs: Vec<f64>,
    pub final_story: String,
    pub final_story_chars: usize,
}

impl StorySummary {
    pub fn from_turns(turns: &[TurnRecord], total_wall_secs: f64, final_story: &str) -> Self {
        let ttft_ms: Vec<f64> = turns.iter().map(|t| t.ttft_ms).collect();
        let tpot_ms: Vec<f64> = turns.iter().map(|t| t.tpot_ms).collect();
        let latency_secs: Vec<f64> = turns.iter().map(|t| t.elapsed_secs).collect();
        Self {
            avg_ttft_ms: mean(&ttft_ms),
            avg_tpot_ms: mean(&tpot_ms),
            total_wall_secs,
            ttft_ms,
            tpot_ms,
            latency_secs,
            final_story: final_story.to_string(),
            final_story_chars: final_story.chars().count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeSummary {
    pub avg_ttft_ms: f64,
    pub avg_tpot_ms: f64,
    pub avg_analysis_secs: f64,
    pub avg_synthesis_secs: f64,
    pub avg_summary_secs: f64,
    pub avg_task_total_secs: f64,
    pub total_wall_secs: f64,
    pub analysis_secs: Vec<f64>,
    pub synthesis_secs: Vec<f64>,
    pub summary_secs: Vec<f64>,
}

impl CascadeSummary {
    pub fn from_records(stages: &[StageRecord], tasks: &[TaskTotal], total_wall_secs: f64) -> Self {
        let per_stage = |name: &str| -> Vec<f64> {
            stages.iter().filter(|s| s.stage == name).map(|s| s.elapsed_secs).collect()
        };
        let analysis_secs = per_stage("analysis");
        let synthesis_secs = per_stage("synthesis");
        let summary_secs = per_stage("summary");
        let ttft: Vec<f64> = stages.iter().map(|s| s.ttft_ms).collect();
        let tpot: Vec<f64> = stages.iter().map(|s| s.tpot_ms).collect();
        let totals: Vec<f64> = tasks.iter().map(|t| t.total_secs).collect();
        Self {
            avg_ttft_ms: mean(&ttft),
            avg_tpot_ms: mean(&tpot),
            avg_analysis_secs: mean(&analysis_secs),
            avg_synthesis_secs: mean(&synthesis_secs),
            avg_summary_secs: mean(&summary_secs),
            avg_task_total_secs: mean(&totals),
            total_wall_secs,
            analysis_secs,
            synthesis_secs,
            summary_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryOutcome {
    pub turns: Vec<TurnRecord>,
    pub summary: StorySummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeOutcome {
    pub stages: Vec<StageRecord>,
    pub tasks: Vec<TaskTotal>,
    pub summary: CascadeSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Story(StoryOutcome),
    Cascade(CascadeOutcome),
}

/// Top-level object serialized at the end of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub condition: Condition,
    pub host: HostInfo,
    #[serde(flatten)]
    pub outcome: Outcome,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
