// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal HTTP/1.1 client over TCP.
//!
//! Sends one request per connection and reads the response using
//! Content-Length framing (does not depend on connection close for EOF).
//! Non-2xx statuses are returned, not raised: readiness probes treat any
//! parseable response as a sign of life, so the status policy belongs to
//! the caller.

use crate::error::AdapterError;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub async fn get(
    addr: &str,
    path: &str,
    timeout: Option<Duration>,
) -> Result<HttpResponse, AdapterError> {
    let request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n", path);
    timed_request(addr, &request, timeout).await
}

pub async fn post_json(
    addr: &str,
    path: &str,
    body: &str,
    timeout: Option<Duration>,
) -> Result<HttpResponse, AdapterError> {
    let request = format!(
        "POST {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        path,
        body.len(),
        body
    );
    timed_request(addr, &request, timeout).await
}

/// Connect, send, and read, with an optional timeout covering the entire
/// operation. `None` leaves the call unbounded; story turns rely on that
/// because a turn's latency is the measurement.
async fn timed_request(
    addr: &str,
    request: &str,
    timeout: Option<Duration>,
) -> Result<HttpResponse, AdapterError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, send_request(addr, request))
            .await
            .map_err(|_| AdapterError::Timeout { addr: addr.to_string(), timeout: limit })?,
        None => send_request(addr, request).await,
    }
}

async fn send_request(addr: &str, request: &str) -> Result<HttpResponse, AdapterError> {
    let mut stream = TcpStream::connect(addr)
        .await
        .map_err(|source| AdapterError::Connect { addr: addr.to_string(), source })?;
    stream.write_all(request.as_bytes()).await?;

    let mut reader = BufReader::new(&mut stream);
    read_http_response(&mut reader).await
}

/// Read and parse an HTTP/1.1 response from a buffered stream.
pub(crate) async fn read_http_response<R: tokio::io::AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
) -> Result<HttpResponse, AdapterError> {
    let mut status_line = String::new();
    reader.read_line(&mut status_line).await?;
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or_else(|| {
            AdapterError::MalformedResponse(format!("bad status line: {:?}", status_line.trim()))
        })?;

    // Headers: only Content-Length matters (case-insensitive).
    let mut content_length: usize = 0;
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 || line == "\r\n" || line == "\n" {
            break;
        }
        let line_lower = line.to_ascii_lowercase();
        if let Some(val) = line_lower.strip_prefix("content-length:") {
            content_length = val.trim().parse().unwrap_or(0);
        }
    }

    let body = if content_length > 0 {
        let mut buf = vec![0u8; content_length];
        reader.read_exact(&mut buf).await?;
        String::from_utf8_lossy(&buf).into_owned()
    } else {
        String::new()
    };

    Ok(HttpResponse { status, body })
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
