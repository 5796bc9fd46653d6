// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! kvlab-adapters: HTTP transports for the agent daemon's control API and
//! the inference engines (readiness probes, noise requests).
//!
//! Everything here speaks plain HTTP/1.1 over TCP with Content-Length
//! framing; both the daemon and the engines are local services, so no
//! connection pooling or TLS is needed.

pub mod daemon;
pub mod engine;
pub mod error;
pub mod http;

pub use daemon::{DaemonClient, ExecutedTask, TaskSlot};
pub use engine::{engine_authority, host_port, probe_engine, send_noise_request, NOISE_MAX_TOKENS};
pub use error::AdapterError;
