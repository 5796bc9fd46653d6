// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A scripted in-process daemon speaking just enough of the control API
//! for workload tests: per-execution slot counting, canned generation
//! content, and optional failure injection.

use kvlab_core::FakeClock;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub struct DaemonState {
    /// Workflow executions started so far.
    pub started: u32,
    /// `next_task` calls per execution id.
    pub next_calls: HashMap<String, u32>,
    /// Prompts received by `execute_task`, in order.
    pub prompts: Vec<String>,
    /// Task slots each execution hands out before reporting complete.
    pub slots_per_execution: u32,
    /// Answer every `next_task` with complete.
    pub always_complete: bool,
    /// Answer every `execute_task` with success=false.
    pub fail_execute: bool,
    /// Generated content is `<content_word><n>`, whitespace-padded.
    pub content_word: String,
    /// Advance this clock by the step on every `execute_task`, so a runner
    /// driven by the same `FakeClock` observes deterministic elapsed times.
    pub advance_on_execute: Option<(FakeClock, Duration)>,
}

impl Default for DaemonState {
    fn default() -> Self {
        Self {
            started: 0,
            next_calls: HashMap::new(),
            prompts: Vec::new(),
            slots_per_execution: 2,
            always_complete: false,
            fail_execute: false,
            content_word: "word".to_string(),
            advance_on_execute: None,
        }
    }
}

pub struct FakeDaemon {
    pub addr: String,
    pub state: Arc<Mutex<DaemonState>>,
}

impl FakeDaemon {
    pub async fn start(state: DaemonState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let shared = Arc::new(Mutex::new(state));
        let state_for_server = shared.clone();
        tokio::spawn(async move {
            loop {
                let Ok((sock, _)) = listener.accept().await else { return };
                let state = state_for_server.clone();
                tokio::spawn(handle_connection(sock, state));
            }
        });
        Self { addr, state: shared }
    }

    pub fn executions_started(&self) -> u32 {
        self.state.lock().started
    }

    pub fn prompts(&self) -> Vec<String> {
        self.state.lock().prompts.clone()
    }
}

async fn handle_connection(mut sock: TcpStream, state: Arc<Mutex<DaemonState>>) {
    let Some((request_line, body)) = read_request(&mut sock).await else { return };
    let response = route(&request_line, &body, &state);
    let _ = sock.write_all(response.as_bytes()).await;
}

async fn read_request(sock: &mut TcpStream) -> Option<(String, String)> {
    let mut data = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = sock.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&chunk[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        if data.len() > 1 << 20 {
            return None;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).into_owned();
    let content_length = head
        .lines()
        .find_map(|line| {
            line.to_ascii_lowercase()
                .strip_prefix("content-length:")
                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
        })
        .unwrap_or(0);

    while data.len() < header_end + content_length {
        let n = sock.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..n]);
    }

    let request_line = head.lines().next().unwrap_or_default().to_string();
    let body = String::from_utf8_lossy(&data[header_end..]).into_owned();
    Some((request_line, body))
}

fn route(request_line: &str, body: &str, state: &Arc<Mutex<DaemonState>>) -> String {
    let mut st = state.lock();

    if request_line.starts_with("GET /api/v1/health") {
        return json_response(200, "{}");
    }

    if request_line.starts_with("POST /api/v1/workflow/start") {
        st.started += 1;
        let id = format!("exec-{}", st.started);
        st.next_calls.insert(id.clone(), 0);
        return json_response(200, &format!(r#"{{"execution_id":"{id}"}}"#));
    }

    if request_line.starts_with("GET /api/v1/workflow/task/next") {
        if st.always_complete {
            return json_response(200, r#"{"complete":true}"#);
        }
        let execution_id = request_line
            .split("execution_id=")
            .nth(1)
            .and_then(|s| s.split_whitespace().next())
            .unwrap_or("")
            .to_string();
        let limit = st.slots_per_execution;
        let count = st.next_calls.entry(execution_id).or_insert(0);
        if *count >= limit {
            return json_response(200, r#"{"complete":true}"#);
        }
        let index = *count;
        *count += 1;
        return json_response(200, &format!(r#"{{"task_index":{index},"complete":false}}"#));
    }

    if request_line.starts_with("POST /api/v1/workflow/task/execute") {
        if st.fail_execute {
            return json_response(200, r#"{"success":false,"error":"backend unavailable"}"#);
        }
        // The advance happens before the response is written, so the
        // runner's post-response clock read always sees it.
        if let Some((clock, step)) = &st.advance_on_execute {
            clock.advance(*step);
        }
        let parsed: serde_json::Value = serde_json::from_str(body).unwrap_or_default();
        let prompt = parsed["prompt"].as_str().unwrap_or_default().to_string();
        st.prompts.push(prompt);
        let n = st.prompts.len();
        let content = format!(" {}{} ", st.content_word, n);
        let reply = serde_json::json!({
            "success": true,
            "response": { "content": content },
            "metrics": { "ttft_ms": 10.0 + n as f64, "tpot_ms": 2.0 },
        });
        return json_response(200, &reply.to_string());
    }

    json_response(404, "{}")
}

fn json_response(status: u16, body: &str) -> String {
    format!(
        "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    )
}
