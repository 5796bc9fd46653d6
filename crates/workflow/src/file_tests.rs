// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::descriptor::{AgenticServing, DaemonSection, WorkflowConfig};

fn minimal_config() -> WorkflowConfig {
    WorkflowConfig {
        log_format: "json".to_string(),
        log_level: "info".to_string(),
        agentic_serving: AgenticServing {
            mode: "daemon".to_string(),
            daemon: DaemonSection { listen_address: "127.0.0.1:8081".to_string() },
            llm_servers: vec![],
            agent_profiles: vec![],
            workflows: vec![],
        },
    }
}

#[test]
fn scratch_path_is_per_process() {
    let path = scratch_path();
    assert!(path.to_string_lossy().contains(&std::process::id().to_string()));
    assert!(path.extension().is_some_and(|e| e == "yaml"));
}

#[test]
fn write_scratch_round_trips_through_yaml() {
    let config = minimal_config();
    let path = write_scratch(&config).unwrap();
    let yaml = std::fs::read_to_string(&path).unwrap();
    let parsed: WorkflowConfig = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed, config);
    std::fs::remove_file(&path).unwrap();
}
