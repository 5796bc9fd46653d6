// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config errors must abort before any external action: nonzero exit, a
//! single diagnostic line, and nothing written anywhere.

use assert_cmd::Command;

fn kvlab() -> Command {
    let mut cmd = Command::cargo_bin("kvlab").expect("kvlab binary");
    cmd.env_remove("KVLAB_SUDO_PASSWORD");
    cmd
}

fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn help_lists_both_workloads() {
    let output = kvlab().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("story"));
    assert!(stdout.contains("cascade"));
}

#[test]
fn unknown_cache_strategy_is_rejected_by_the_parser() {
    let output = kvlab().args(["story", "--cache-strategy", "sometimes"]).output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn both_start_flags_fail_fast() {
    let output = kvlab().args(["story", "--start-sglang", "--start-vllm"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_of(&output).contains("mutually exclusive"));
}

#[test]
fn start_flag_contradicting_backend_type_fails_fast() {
    let output = kvlab()
        .args(["story", "--start-vllm", "--backend-type", "sglang"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_of(&output).contains("--backend-type"));
}

#[test]
fn small_turns_policy_without_threshold_fails_fast() {
    let output =
        kvlab().args(["story", "--policy", "preserve_on_small_turns"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_of(&output).contains("small-turn-threshold"));
}

#[test]
fn cascade_mode_with_one_backend_fails_fast() {
    let output = kvlab()
        .args(["cascade", "--mode", "cascade", "--backend-large", "http://large:8000"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("--backend-small"));
}

#[test]
fn zero_turns_fail_fast() {
    let output = kvlab().args(["story", "--turns", "0"]).output().unwrap();
    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("at least 1"));
}

#[test]
fn starting_an_engine_requires_the_sudo_credential() {
    let output = kvlab().args(["story", "--start-sglang"]).output().unwrap();
    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("KVLAB_SUDO_PASSWORD"));
}
