// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-facing HTTP: readiness probes and noise chat requests.
//!
//! Probes and noise always target the engine root (`host:port` from the
//! configured backend URL), so a `/v1`-suffixed URL behaves the same as a
//! bare one. Per engine kind:
//!
//! - sglang: probe `/model_info` (falling back to `/`), noise posts to
//!   `/api/chat`.
//! - vllm: probe `/v1/models`, noise posts to `/v1/chat/completions`.

use crate::error::AdapterError;
use crate::http;
use kvlab_core::EngineKind;
use std::time::Duration;
use url::Url;

/// Output budget for a single noise request.
pub const NOISE_MAX_TOKENS: u32 = 20;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const NOISE_TIMEOUT: Duration = Duration::from_secs(60);

/// `host:port` dial target for a backend URL.
pub fn engine_authority(backend_url: &str) -> Result<String, AdapterError> {
    let parsed = Url::parse(backend_url).map_err(|e| AdapterError::InvalidUrl {
        url: backend_url.to_string(),
        reason: e.to_string(),
    })?;
    if parsed.scheme() != "http" {
        return Err(AdapterError::InvalidUrl {
            url: backend_url.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    let host = parsed.host_str().ok_or_else(|| AdapterError::InvalidUrl {
        url: backend_url.to_string(),
        reason: "missing host".to_string(),
    })?;
    let port = parsed.port_or_known_default().unwrap_or(80);
    Ok(format!("{host}:{port}"))
}

/// Host port of a backend URL, for container port mapping.
pub fn host_port(backend_url: &str) -> Result<u16, AdapterError> {
    let parsed = Url::parse(backend_url).map_err(|e| AdapterError::InvalidUrl {
        url: backend_url.to_string(),
        reason: e.to_string(),
    })?;
    parsed.port_or_known_default().ok_or_else(|| AdapterError::InvalidUrl {
        url: backend_url.to_string(),
        reason: "missing port".to_string(),
    })
}

/// One readiness probe. Any parseable HTTP response counts as alive; the
/// goal is "accepts connections", not "returns 200".
pub async fn probe_engine(kind: EngineKind, backend_url: &str) -> Result<(), AdapterError> {
    let addr = engine_authority(backend_url)?;
    match kind {
        EngineKind::Sglang => {
            match http::get(&addr, "/model_info", Some(PROBE_TIMEOUT)).await {
                Ok(_) => Ok(()),
                Err(_) => http::get(&addr, "/", Some(PROBE_TIMEOUT)).await.map(|_| ()),
            }
        }
        EngineKind::Vllm => http::get(&addr, "/v1/models", Some(PROBE_TIMEOUT)).await.map(|_| ()),
    }
}

/// Fire one noise chat request and discard the response body.
pub async fn send_noise_request(
    kind: EngineKind,
    addr: &str,
    model: &str,
    prompt: &str,
) -> Result<(), AdapterError> {
    let path = match kind {
        EngineKind::Sglang => "/api/chat",
        EngineKind::Vllm => "/v1/chat/completions",
    };
    let body = serde_json::json!({
        "model": model,
        "messages": [{ "role": "user", "content": prompt }],
        "max_tokens": NOISE_MAX_TOKENS,
        "stream": false,
    })
    .to_string();

    let resp = http::post_json(addr, path, &body, Some(NOISE_TIMEOUT)).await?;
    if !resp.is_ok() {
        return Err(AdapterError::Status { status: resp.status, body: resp.body });
    }
    Ok(())
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
