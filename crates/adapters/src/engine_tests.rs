// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[test]
fn authority_strips_path_suffix() {
    assert_eq!(engine_authority("http://localhost:8000").unwrap(), "localhost:8000");
    assert_eq!(engine_authority("http://10.0.0.5:30000/").unwrap(), "10.0.0.5:30000");
    assert_eq!(engine_authority("http://host:8000/v1").unwrap(), "host:8000");
}

#[test]
fn authority_defaults_port_80() {
    assert_eq!(engine_authority("http://backend").unwrap(), "backend:80");
}

#[test]
fn non_http_schemes_rejected() {
    assert!(matches!(
        engine_authority("https://host:8000"),
        Err(AdapterError::InvalidUrl { .. })
    ));
    assert!(matches!(engine_authority("not a url"), Err(AdapterError::InvalidUrl { .. })));
}

#[test]
fn host_port_extracts_mapped_port() {
    assert_eq!(host_port("http://localhost:30000").unwrap(), 30000);
    assert_eq!(host_port("http://host:8000/v1").unwrap(), 8000);
}

async fn one_shot_server(response: String) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 16384];
        let n = sock.read(&mut buf).await.unwrap();
        sock.write_all(response.as_bytes()).await.unwrap();
        String::from_utf8_lossy(&buf[..n]).into_owned()
    });
    (format!("http://127.0.0.1:{port}"), handle)
}

fn ok_response(body: &str) -> String {
    format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{body}", body.len())
}

#[tokio::test]
async fn probe_accepts_any_http_response() {
    let (url, _req) = one_shot_server("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n".into()).await;
    assert!(probe_engine(EngineKind::Sglang, &url).await.is_ok());
}

#[tokio::test]
async fn probe_fails_when_nothing_listens() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
    drop(listener);
    assert!(probe_engine(EngineKind::Vllm, &url).await.is_err());
}

#[tokio::test]
async fn vllm_probe_hits_models_path() {
    let (url, request) = one_shot_server(ok_response("{}")).await;
    probe_engine(EngineKind::Vllm, &url).await.unwrap();
    let raw = request.await.unwrap();
    assert!(raw.starts_with("GET /v1/models HTTP/1.1"));
}

#[tokio::test]
async fn noise_request_shape_per_engine() {
    let (url, request) = one_shot_server(ok_response("{}")).await;
    let addr = engine_authority(&url).unwrap();
    send_noise_request(EngineKind::Vllm, &addr, "m", "What is Rust?").await.unwrap();
    let raw = request.await.unwrap();
    assert!(raw.starts_with("POST /v1/chat/completions HTTP/1.1"));
    assert!(raw.contains(r#""max_tokens":20"#));
    assert!(raw.contains("What is Rust?"));

    let (url, request) = one_shot_server(ok_response("{}")).await;
    let addr = engine_authority(&url).unwrap();
    send_noise_request(EngineKind::Sglang, &addr, "m", "Why is the sky blue?").await.unwrap();
    let raw = request.await.unwrap();
    assert!(raw.starts_with("POST /api/chat HTTP/1.1"));
}

#[tokio::test]
async fn noise_failure_surfaces_status() {
    let (url, _req) = one_shot_server(
        "HTTP/1.1 429 Too Many\r\nContent-Length: 4\r\n\r\nbusy".to_string(),
    )
    .await;
    let addr = engine_authority(&url).unwrap();
    let err = send_noise_request(EngineKind::Vllm, &addr, "m", "q").await.unwrap_err();
    assert!(matches!(err, AdapterError::Status { status: 429, .. }));
}
