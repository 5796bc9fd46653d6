// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::supervisor::spawn_daemon;
use std::os::unix::fs::PermissionsExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

async fn healthy_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        loop {
            let Ok((mut sock, _)) = listener.accept().await else { return };
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let _ = sock.read(&mut buf).await;
                let _ = sock
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\n{}")
                    .await;
            });
        }
    });
    addr
}

fn spawn_script_daemon(dir: &tempfile::TempDir, body: &str) -> DaemonHandle {
    let script = dir.path().join("fakedaemon.sh");
    std::fs::write(&script, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&script).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&script, perms).unwrap();
    let config = dir.path().join("config.yaml");
    std::fs::write(&config, "").unwrap();
    spawn_daemon(script.to_str().unwrap(), &config, &dir.path().join("daemon.log")).unwrap()
}

#[tokio::test]
async fn engine_ready_when_port_answers() {
    let addr = healthy_server().await;
    let url = format!("http://{addr}");
    wait_engine_ready(EngineKind::Vllm, &url, Duration::from_secs(5)).await.unwrap();
}

#[tokio::test]
async fn engine_deadline_expires_with_probe_detail() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
    drop(listener);

    let err = wait_engine_ready(EngineKind::Sglang, &url, Duration::from_millis(100))
        .await
        .unwrap_err();
    match err {
        RuntimeError::EngineNotReady { detail, .. } => assert!(!detail.is_empty()),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn daemon_ready_when_health_is_200() {
    let dir = tempfile::tempdir().unwrap();
    let mut daemon = spawn_script_daemon(&dir, "sleep 30");
    let addr = healthy_server().await;
    let client = DaemonClient::with_addr(addr);

    wait_daemon_ready(&client, &mut daemon, Duration::from_secs(5)).await.unwrap();
    daemon.terminate();
}

#[tokio::test]
async fn daemon_crash_while_waiting_reports_log_tail() {
    let dir = tempfile::tempdir().unwrap();
    let mut daemon = spawn_script_daemon(&dir, "echo fatal: bad config\nexit 2");
    // Health endpoint that never answers healthy: nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);
    let client = DaemonClient::with_addr(addr);

    let err = wait_daemon_ready(&client, &mut daemon, Duration::from_secs(10))
        .await
        .unwrap_err();
    match err {
        RuntimeError::DaemonExited { status, tail } => {
            assert!(status.contains('2'), "status: {status}");
            assert!(tail.contains("fatal: bad config"), "tail: {tail}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn daemon_deadline_expires_when_never_healthy() {
    let dir = tempfile::tempdir().unwrap();
    let mut daemon = spawn_script_daemon(&dir, "sleep 30");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);
    let client = DaemonClient::with_addr(addr);

    let err = wait_daemon_ready(&client, &mut daemon, Duration::from_millis(100))
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::DaemonNotReady { .. }));
    daemon.terminate();
}
