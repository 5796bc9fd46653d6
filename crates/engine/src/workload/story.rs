// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Story-finishing workload.
//!
//! The outer loop starts a fresh workflow execution per iteration; that
//! boundary is where the daemon applies its cache policy. The inner loop
//! runs the (up to two) task slots of that execution. The prompt is always
//! built from the orchestrator's own `story_context`, so the semantic
//! input is identical across cache policies.

use crate::error::RuntimeError;
use kvlab_adapters::{DaemonClient, TaskSlot};
use kvlab_core::{
    decorate_prompt, story_prompt, CachePolicy, Clock, EngineKind, StoryOutcome, StorySummary,
    TurnRecord,
};
use tracing::{debug, info};

/// Task slots per workflow execution: the two-agent alternation.
const SLOTS_PER_EXECUTION: u32 = 2;

const PREVIEW_EVERY: u32 = 10;
const PREVIEW_CHARS: usize = 120;

pub struct StoryParams {
    pub turns: u32,
    pub k: u32,
    pub policy: CachePolicy,
    pub engine: EngineKind,
}

pub async fn run_story(
    client: &DaemonClient,
    params: &StoryParams,
    clock: &impl Clock,
) -> Result<StoryOutcome, RuntimeError> {
    let run_start = clock.now();
    let mut story_context = String::new();
    let mut records: Vec<TurnRecord> = Vec::with_capacity(params.turns as usize);
    let mut turn: u32 = 0;
    let mut executions: u32 = 0;

    while turn < params.turns {
        // A daemon that keeps reporting complete would spin here forever;
        // cap outer iterations at the turn count.
        if executions >= params.turns {
            return Err(RuntimeError::EarlyComplete { executions, turns: turn });
        }
        executions += 1;

        let execution_id = client
            .start_workflow("story")
            .await
            .map_err(RuntimeError::rpc("start_workflow"))?;
        debug!(%execution_id, execution = executions, "workflow execution started");

        for _ in 0..SLOTS_PER_EXECUTION {
            if turn >= params.turns {
                break;
            }
            let slot = client
                .next_task(&execution_id)
                .await
                .map_err(RuntimeError::rpc("next_task"))?;
            let TaskSlot::Task { task_index } = slot else {
                debug!(%execution_id, "execution complete");
                break;
            };

            let turn_no = turn + 1;
            let context_chars = story_context.chars().count();
            let base = story_prompt(params.k, &story_context);
            let prompt = decorate_prompt(params.engine, &params.policy, turn_no, &base);

            let turn_start = clock.now();
            let executed = client
                .execute_task(&execution_id, task_index, &prompt, params.k, None)
                .await
                .map_err(RuntimeError::rpc("execute_task"))?;
            let elapsed_secs = clock.now().duration_since(turn_start).as_secs_f64();

            let content = executed.content.trim().to_string();
            if !content.is_empty() {
                if story_context.is_empty() {
                    story_context = content.clone();
                } else {
                    story_context.push(' ');
                    story_context.push_str(&content);
                }
            }

            records.push(TurnRecord {
                turn: turn_no,
                elapsed_secs,
                ttft_ms: executed.ttft_ms,
                tpot_ms: executed.tpot_ms,
                content_chars: content.chars().count(),
                content,
                context_chars,
            });
            turn = turn_no;

            info!(
                turn,
                ttft_ms = executed.ttft_ms,
                tpot_ms = executed.tpot_ms,
                elapsed_secs,
                context_chars,
                "turn complete"
            );
            if turn % PREVIEW_EVERY == 0 {
                info!(turn, preview = %preview(&story_context), "story so far");
            }
        }
    }

    let total_wall_secs = clock.now().duration_since(run_start).as_secs_f64();
    let summary = StorySummary::from_turns(&records, total_wall_secs, &story_context);
    Ok(StoryOutcome { turns: records, summary })
}

fn preview(story: &str) -> String {
    if story.chars().count() <= PREVIEW_CHARS {
        return story.to_string();
    }
    let truncated: String = story.chars().take(PREVIEW_CHARS).collect();
    format!("{truncated}…")
}

#[cfg(test)]
#[path = "story_tests.rs"]
mod tests;
