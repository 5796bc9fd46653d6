// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scratch-file lifecycle for the synthesized config.
//!
//! The file is written once before the daemon starts and deleted by the
//! teardown coordinator; the path is unique per orchestrator process so a
//! crashed run cannot confuse a later one.

use crate::descriptor::WorkflowConfig;
use crate::error::WorkflowError;
use std::path::PathBuf;

/// Scratch path for this orchestrator process.
pub fn scratch_path() -> PathBuf {
    std::env::temp_dir().join(format!("kvlab-workflow-{}.yaml", std::process::id()))
}

/// Serialize the config and write it to the scratch path.
pub fn write_scratch(config: &WorkflowConfig) -> Result<PathBuf, WorkflowError> {
    let path = scratch_path();
    let yaml = config.to_yaml()?;
    std::fs::write(&path, yaml)
        .map_err(|source| WorkflowError::Write { path: path.clone(), source })?;
    Ok(path)
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
