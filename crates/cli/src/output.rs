// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run result serialization: pretty JSON, written atomically (temp file +
//! rename) so a crash mid-write never leaves a half-result at the
//! configured path. Without an output path the document goes to stderr.

use anyhow::Context;
use kvlab_core::RunResult;
use std::path::Path;
use tracing::info;

pub fn write_result(path: Option<&Path>, result: &RunResult) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(result).context("serializing run result")?;
    match path {
        Some(path) => {
            let tmp = path.with_extension("json.tmp");
            std::fs::write(&tmp, &json)
                .with_context(|| format!("writing {}", tmp.display()))?;
            std::fs::rename(&tmp, path)
                .with_context(|| format!("renaming into {}", path.display()))?;
            info!(path = %path.display(), "run result written");
        }
        None => {
            info!("no --output path; emitting run result to stderr");
            eprintln!("{json}");
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
