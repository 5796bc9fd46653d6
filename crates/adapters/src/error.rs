// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("connect to {addr} failed: {source}")]
    Connect { addr: String, source: std::io::Error },

    #[error("request to {addr} timed out after {timeout:?}")]
    Timeout { addr: String, timeout: Duration },

    #[error("i/o during http exchange: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed http response: {0}")]
    MalformedResponse(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid backend url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unexpected response shape: {detail}; body: {body}")]
    UnexpectedBody { detail: String, body: String },

    #[error("daemon reported failure: {0}")]
    DaemonFailure(String),
}
