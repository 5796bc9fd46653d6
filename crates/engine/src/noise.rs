// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Poisson background noise against the inference backend.
//!
//! Arrivals are Exp(1)/λ inter-delays from a seeded RNG, so two runs of the
//! same condition see the same arrival sequence. Each arrival fires one
//! detached request; a slow backend therefore never slows the arrival
//! process. Responses are discarded and failures swallowed: noise is
//! best-effort load, never part of the measurement.

use kvlab_adapters::{engine_authority, send_noise_request};
use kvlab_core::EngineKind;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::RuntimeError;

/// Short unrelated questions, drawn uniformly per request.
pub const NOISE_PROMPTS: [&str; 8] = [
    "What is the capital of France?",
    "Explain photosynthesis in one sentence.",
    "What year was the first moon landing?",
    "Name three prime numbers.",
    "What does HTTP stand for?",
    "Give a synonym for 'quick'.",
    "How many continents are there?",
    "What is the boiling point of water in Celsius?",
];

pub struct NoiseGenerator {
    kind: EngineKind,
    addr: String,
    model: String,
    rate: f64,
    rng: Arc<Mutex<StdRng>>,
    cancel: CancellationToken,
}

impl NoiseGenerator {
    pub fn new(
        kind: EngineKind,
        backend_url: &str,
        model: impl Into<String>,
        rate: f64,
        seed: u64,
    ) -> Result<Self, RuntimeError> {
        let addr = engine_authority(backend_url).map_err(RuntimeError::rpc("noise"))?;
        Ok(Self {
            kind,
            addr,
            model: model.into(),
            rate,
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
            cancel: CancellationToken::new(),
        })
    }

    /// Token the orchestrator raises to stop the arrival process. In-flight
    /// requests are left to finish naturally.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Arrival loop. Returns when cancelled; a rate of 0 returns at once
    /// without sending anything.
    pub async fn run(self) {
        if self.rate <= 0.0 {
            debug!("noise disabled (rate 0)");
            return;
        }
        info!(rate = self.rate, "noise generator started");

        let mut sent: u64 = 0;
        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            // RNG access is serialized; detached request tasks never touch it.
            let (delay, prompt) = {
                let mut rng = self.rng.lock();
                let delay = next_delay(&mut rng, self.rate);
                let prompt = NOISE_PROMPTS[rng.gen_range(0..NOISE_PROMPTS.len())];
                (delay, prompt)
            };

            let kind = self.kind;
            let addr = self.addr.clone();
            let model = self.model.clone();
            tokio::spawn(async move {
                if let Err(e) = send_noise_request(kind, &addr, &model, prompt).await {
                    debug!(error = %e, "noise request failed");
                }
            });
            sent += 1;

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        info!(sent, "noise generator stopped");
    }
}

/// Sample one Exp(1)/rate inter-arrival delay by inverse transform.
pub fn next_delay(rng: &mut StdRng, rate: f64) -> Duration {
    let u: f64 = rng.gen::<f64>().max(f64::MIN_POSITIVE);
    Duration::from_secs_f64(-u.ln() / rate)
}

#[cfg(test)]
#[path = "noise_tests.rs"]
mod tests;
