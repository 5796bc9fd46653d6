// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! kvlab: drives one KV-cache / cascade latency experiment end-to-end.

mod cli;
mod output;
mod run;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();

    let parsed = cli::Cli::parse();
    let condition = match parsed.into_condition() {
        Ok(condition) => condition,
        Err(e) => {
            error!("config: {e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = run::execute(condition).await {
        error!("run failed: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
