// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed client for the agent daemon's control API.
//!
//! Response shapes are validated here, once, so the workload runners never
//! re-check structure per turn; any mismatch is fatal and carries the full
//! body for diagnosis.

use crate::error::AdapterError;
use crate::http;
use kvlab_core::DAEMON_ADDR;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const HEALTH_PATH: &str = "/api/v1/health";
const START_PATH: &str = "/api/v1/workflow/start";
const NEXT_PATH: &str = "/api/v1/workflow/task/next";
const EXECUTE_PATH: &str = "/api/v1/workflow/task/execute";

/// Timeout for the short control RPCs; task execution gets its own.
const CONTROL_TIMEOUT: Duration = Duration::from_secs(10);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

pub struct DaemonClient {
    addr: String,
}

impl Default for DaemonClient {
    fn default() -> Self {
        Self::new()
    }
}

/// What the daemon hands back from `next_task`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskSlot {
    /// The current workflow execution has no slots left.
    Complete,
    Task { task_index: u32 },
}

/// A validated task-execution result.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedTask {
    pub content: String,
    pub ttft_ms: f64,
    pub tpot_ms: f64,
}

#[derive(Serialize)]
struct StartWorkflowRequest<'a> {
    workflow_name: &'a str,
}

#[derive(Deserialize)]
struct StartWorkflowResponse {
    execution_id: String,
}

#[derive(Deserialize)]
struct NextTaskResponse {
    #[serde(default)]
    complete: bool,
    task_index: Option<u32>,
}

#[derive(Serialize)]
struct ExecuteTaskRequest<'a> {
    execution_id: &'a str,
    task_index: u32,
    prompt: &'a str,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct ExecuteTaskResponse {
    #[serde(default)]
    success: bool,
    response: Option<ResponseBody>,
    metrics: Option<MetricsBody>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct ResponseBody {
    content: String,
}

#[derive(Deserialize)]
struct MetricsBody {
    ttft_ms: f64,
    tpot_ms: f64,
}

impl DaemonClient {
    pub fn new() -> Self {
        Self { addr: DAEMON_ADDR.to_string() }
    }

    /// Client against a non-default address. Tests point this at a local
    /// fake daemon.
    pub fn with_addr(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    pub async fn health(&self) -> Result<bool, AdapterError> {
        let resp = http::get(&self.addr, HEALTH_PATH, Some(HEALTH_TIMEOUT)).await?;
        Ok(resp.status == 200)
    }

    pub async fn start_workflow(&self, workflow_name: &str) -> Result<String, AdapterError> {
        let body = serde_json::to_string(&StartWorkflowRequest { workflow_name })
            .map_err(|e| AdapterError::MalformedResponse(e.to_string()))?;
        let resp = http::post_json(&self.addr, START_PATH, &body, Some(CONTROL_TIMEOUT)).await?;
        let parsed: StartWorkflowResponse = parse_response(resp)?;
        Ok(parsed.execution_id)
    }

    pub async fn next_task(&self, execution_id: &str) -> Result<TaskSlot, AdapterError> {
        let path = format!("{NEXT_PATH}?execution_id={execution_id}");
        let resp = http::get(&self.addr, &path, Some(CONTROL_TIMEOUT)).await?;
        let body = resp.body.clone();
        let parsed: NextTaskResponse = parse_response(resp)?;
        if parsed.complete {
            return Ok(TaskSlot::Complete);
        }
        match parsed.task_index {
            Some(task_index) => Ok(TaskSlot::Task { task_index }),
            None => Err(AdapterError::UnexpectedBody {
                detail: "next_task carried neither complete nor task_index".to_string(),
                body,
            }),
        }
    }

    /// Execute one task slot. `timeout` of `None` leaves the call
    /// unbounded (story turns); cascade stages pass their per-stage limit.
    pub async fn execute_task(
        &self,
        execution_id: &str,
        task_index: u32,
        prompt: &str,
        max_tokens: u32,
        timeout: Option<Duration>,
    ) -> Result<ExecutedTask, AdapterError> {
        let request = ExecuteTaskRequest { execution_id, task_index, prompt, max_tokens, stream: true };
        let body = serde_json::to_string(&request)
            .map_err(|e| AdapterError::MalformedResponse(e.to_string()))?;
        let resp = http::post_json(&self.addr, EXECUTE_PATH, &body, timeout).await?;
        let raw = resp.body.clone();
        let parsed: ExecuteTaskResponse = parse_response(resp)?;

        if !parsed.success {
            return Err(AdapterError::DaemonFailure(
                parsed.error.unwrap_or_else(|| raw.clone()),
            ));
        }
        match (parsed.response, parsed.metrics) {
            (Some(response), Some(metrics)) => Ok(ExecutedTask {
                content: response.content,
                ttft_ms: metrics.ttft_ms,
                tpot_ms: metrics.tpot_ms,
            }),
            _ => Err(AdapterError::UnexpectedBody {
                detail: "execute_task response missing content or metrics".to_string(),
                body: raw,
            }),
        }
    }
}

fn parse_response<T: DeserializeOwned>(resp: http::HttpResponse) -> Result<T, AdapterError> {
    if !resp.is_ok() {
        return Err(AdapterError::Status { status: resp.status, body: resp.body });
    }
    serde_json::from_str(&resp.body).map_err(|e| AdapterError::UnexpectedBody {
        detail: e.to_string(),
        body: resp.body,
    })
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
