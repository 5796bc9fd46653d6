// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("workflow config serialization failed: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("failed to write workflow config {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
}
