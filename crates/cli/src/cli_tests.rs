// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn condition_from(argv: &[&str]) -> Result<Condition, ConfigError> {
    Cli::try_parse_from(argv.iter().copied()).unwrap().into_condition()
}

#[test]
fn story_defaults() {
    let cond = condition_from(&["kvlab", "story"]).unwrap();
    assert_eq!(
        cond.workload,
        Workload::Story { turns: 100, k: 50, policy: CachePolicy::Preserve }
    );
    assert_eq!(cond.engine, EngineKind::Sglang);
    assert_eq!(cond.backend, "http://localhost:30000");
    assert_eq!(cond.noise_rate, 0.0);
    assert_eq!(cond.noise_seed, 42);
    assert!(!cond.start_engine);
    assert_eq!(cond.engine_launch, EngineLaunch::Child);
    assert_eq!(cond.daemon_bin, "agentd");
    assert!(cond.validate().is_ok());
}

#[test]
fn cache_strategy_flush_maps_to_aggressive_flush() {
    let cond = condition_from(&["kvlab", "story", "--cache-strategy", "flush"]).unwrap();
    assert_eq!(cond.cache_policy(), Some(&CachePolicy::AggressiveFlush));
}

#[test]
fn unknown_cache_strategy_fails_at_parse_time() {
    assert!(Cli::try_parse_from(["kvlab", "story", "--cache-strategy", "sometimes"]).is_err());
}

#[test]
fn cache_strategy_conflicts_with_policy() {
    assert!(Cli::try_parse_from([
        "kvlab", "story", "--cache-strategy", "flush", "--policy", "preserve"
    ])
    .is_err());
}

#[test]
fn small_turns_policy_requires_threshold() {
    let err =
        condition_from(&["kvlab", "story", "--policy", "preserve_on_small_turns"]).unwrap_err();
    assert_eq!(err, ConfigError::InvalidThreshold);

    let cond = condition_from(&[
        "kvlab", "story", "--policy", "preserve_on_small_turns", "--small-turn-threshold", "32",
    ])
    .unwrap();
    assert_eq!(
        cond.cache_policy(),
        Some(&CachePolicy::PreserveOnSmallTurns { small_turn_threshold: 32 })
    );
}

#[test]
fn threshold_without_small_turns_policy_is_rejected() {
    let err = condition_from(&["kvlab", "story", "--small-turn-threshold", "8"]).unwrap_err();
    assert_eq!(err, ConfigError::ThresholdWithoutPolicy);
}

#[test]
fn both_start_flags_are_rejected() {
    let err =
        condition_from(&["kvlab", "story", "--start-sglang", "--start-vllm"]).unwrap_err();
    assert_eq!(err, ConfigError::BothStartFlags);
}

#[test]
fn start_flag_must_match_backend_type() {
    let err = condition_from(&[
        "kvlab", "story", "--start-vllm", "--backend-type", "sglang",
    ])
    .unwrap_err();
    assert!(matches!(err, ConfigError::StartFlagMismatch { start: "vllm", .. }));

    let cond =
        condition_from(&["kvlab", "story", "--start-vllm", "--backend-type", "vllm"]).unwrap();
    assert!(cond.start_engine);
    assert_eq!(cond.engine, EngineKind::Vllm);
    assert_eq!(cond.backend, "http://localhost:8000");
}

#[test]
fn cascade_defaults() {
    let cond = condition_from(&["kvlab", "cascade"]).unwrap();
    assert_eq!(
        cond.workload,
        Workload::Cascade { num_tasks: 10, mode: CascadeMode::Baseline }
    );
    assert!(cond.validate().is_ok());
}

#[test]
fn backend_large_becomes_the_primary_backend() {
    let cond = condition_from(&[
        "kvlab", "cascade", "--mode", "baseline", "--num-tasks", "1", "--backend-large",
        "http://X",
    ])
    .unwrap();
    assert_eq!(cond.backend, "http://X");
    assert!(cond.validate().is_ok());
}

#[test]
fn cascade_mode_without_small_backend_fails_validation() {
    let cond = condition_from(&[
        "kvlab", "cascade", "--mode", "cascade", "--backend-large", "http://large:8000",
    ])
    .unwrap();
    assert_eq!(cond.validate().unwrap_err(), ConfigError::MissingSmallBackend);

    let cond = condition_from(&[
        "kvlab", "cascade", "--mode", "cascade", "--backend-large", "http://large:8000",
        "--backend-small", "http://small:8001",
    ])
    .unwrap();
    assert!(cond.validate().is_ok());
    assert_eq!(cond.backend_small.as_deref(), Some("http://small:8001"));
}

#[test]
fn ollama_modes_default_the_ollama_backend() {
    let cond = condition_from(&["kvlab", "cascade", "--mode", "baseline-ollama"]).unwrap();
    assert_eq!(cond.backend_ollama.as_deref(), Some("http://localhost:11434"));
    assert!(cond.validate().is_ok());

    let cond = condition_from(&["kvlab", "cascade", "--mode", "baseline"]).unwrap();
    assert_eq!(cond.backend_ollama, None);
}

#[test]
fn noise_flags_flow_through() {
    let cond = condition_from(&[
        "kvlab", "story", "--noise-rate", "2.5", "--noise-seed", "7",
    ])
    .unwrap();
    assert_eq!(cond.noise_rate, 2.5);
    assert_eq!(cond.noise_seed, 7);
}

#[test]
fn negative_noise_rate_fails_validation() {
    let cond = condition_from(&["kvlab", "story", "--noise-rate=-1"]).unwrap();
    assert_eq!(cond.validate().unwrap_err(), ConfigError::InvalidNoiseRate);
}
