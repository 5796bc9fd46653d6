// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Model-cascade workload: for each task one workflow execution running the
//! fixed analysis -> synthesis -> summary pipeline, with per-stage token
//! budgets and timeouts.

use crate::error::RuntimeError;
use crate::workload::issues::ISSUES;
use kvlab_adapters::{DaemonClient, TaskSlot};
use kvlab_core::{
    cascade_stage_prompt, CascadeOutcome, CascadeStage, CascadeSummary, Clock, StageRecord,
    TaskTotal,
};
use tracing::{info, warn};

pub struct CascadeParams {
    pub num_tasks: u32,
}

pub async fn run_cascade(
    client: &DaemonClient,
    params: &CascadeParams,
    clock: &impl Clock,
) -> Result<CascadeOutcome, RuntimeError> {
    let run_start = clock.now();
    let mut stages: Vec<StageRecord> = Vec::with_capacity(3 * params.num_tasks as usize);
    let mut tasks: Vec<TaskTotal> = Vec::with_capacity(params.num_tasks as usize);

    for i in 0..params.num_tasks {
        let task_no = i + 1;
        let issue = &ISSUES[i as usize % ISSUES.len()];
        let execution_id = client
            .start_workflow("cascade")
            .await
            .map_err(RuntimeError::rpc("start_workflow"))?;
        info!(task = task_no, issue = issue.title, "task started");

        let task_start = clock.now();
        for stage in CascadeStage::ALL {
            let slot = client
                .next_task(&execution_id)
                .await
                .map_err(RuntimeError::rpc("next_task"))?;
            let TaskSlot::Task { task_index } = slot else {
                warn!(task = task_no, stage = stage.name(), "workflow completed early");
                break;
            };

            let prompt = cascade_stage_prompt(stage, issue.title, issue.code);
            let stage_start = clock.now();
            let executed = client
                .execute_task(
                    &execution_id,
                    task_index,
                    &prompt,
                    stage.max_tokens(),
                    Some(stage.timeout()),
                )
                .await
                .map_err(RuntimeError::rpc("execute_task"))?;
            let elapsed_secs = clock.now().duration_since(stage_start).as_secs_f64();

            stages.push(StageRecord {
                task: task_no,
                stage: stage.name(),
                elapsed_secs,
                ttft_ms: executed.ttft_ms,
                tpot_ms: executed.tpot_ms,
                content_chars: executed.content.trim().chars().count(),
            });
            info!(task = task_no, stage = stage.name(), elapsed_secs, "stage complete");
        }

        let total_secs = clock.now().duration_since(task_start).as_secs_f64();
        tasks.push(TaskTotal { task: task_no, total_secs });
        info!(task = task_no, total_secs, "task complete");
    }

    let total_wall_secs = clock.now().duration_since(run_start).as_secs_f64();
    let summary = CascadeSummary::from_records(&stages, &tasks, total_wall_secs);
    Ok(CascadeOutcome { stages, tasks, summary })
}

#[cfg(test)]
#[path = "cascade_tests.rs"]
mod tests;
