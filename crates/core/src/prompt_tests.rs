// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn story_prompt_names_token_budget() {
    let prompt = story_prompt(8, "");
    assert!(prompt.contains("next 8 tokens"));
    assert!(prompt.contains("Begin the story now"));
}

#[test]
fn story_prompt_embeds_context() {
    let prompt = story_prompt(16, "Once upon a time.");
    assert!(prompt.contains("next 16 tokens"));
    assert!(prompt.ends_with("The story so far:\nOnce upon a time."));
}

#[parameterized(
    vllm_flush_turn_1 = { EngineKind::Vllm, CachePolicy::AggressiveFlush, 1, true },
    vllm_flush_turn_7 = { EngineKind::Vllm, CachePolicy::AggressiveFlush, 7, true },
    vllm_preserve = { EngineKind::Vllm, CachePolicy::Preserve, 1, false },
    sglang_flush = { EngineKind::Sglang, CachePolicy::AggressiveFlush, 1, false },
    sglang_preserve = { EngineKind::Sglang, CachePolicy::Preserve, 3, false },
)]
fn decorate_prompt_prefixes_only_vllm_flush(
    engine: EngineKind,
    policy: CachePolicy,
    turn: u32,
    expect_prefix: bool,
) {
    let decorated = decorate_prompt(engine, &policy, turn, "tell me a story");
    if expect_prefix {
        assert!(decorated.starts_with(&format!("Request {turn}.\n\n")));
        assert!(decorated.ends_with("tell me a story"));
    } else {
        assert_eq!(decorated, "tell me a story");
    }
}

#[test]
fn decorate_prompt_small_turns_policy_is_untouched() {
    let policy = CachePolicy::PreserveOnSmallTurns { small_turn_threshold: 32 };
    assert_eq!(decorate_prompt(EngineKind::Vllm, &policy, 2, "p"), "p");
}

#[test]
fn stage_budgets_and_timeouts() {
    assert_eq!(CascadeStage::Analysis.max_tokens(), 50);
    assert_eq!(CascadeStage::Synthesis.max_tokens(), 150);
    assert_eq!(CascadeStage::Summary.max_tokens(), 30);
    assert_eq!(CascadeStage::Synthesis.timeout(), Duration::from_secs(180));
}

#[test]
fn summary_prompt_omits_code() {
    let prompt = cascade_stage_prompt(CascadeStage::Summary, "off-by-one", "let i = 0;");
    assert!(prompt.contains("off-by-one"));
    assert!(!prompt.contains("let i = 0;"));
}
