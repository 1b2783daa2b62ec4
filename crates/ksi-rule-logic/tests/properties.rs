// crates/ksi-rule-logic/tests/properties.rs
// ============================================================================
// Module: Rule Algebra Property Tests
// Description: Property-based checks over arbitrary rule trees.
// Purpose: Hold the algebra laws for every tree shape, not just fixtures.
// ============================================================================
//! ## Overview
//! Uses proptest to generate rule trees and outcome sequences and checks the
//! combinator laws against a direct model.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod support;

use ksi_rule_logic::ResultCode;
use ksi_rule_logic::Rule;
use proptest::prelude::*;
use support::MockCode;
use support::MockLeaf;
use support::fail;
use support::na;
use support::ok;

// ========================================================================
// Strategies
// ========================================================================

/// Leaf names available to generated trees.
const NAMES: [&str; 4] = ["A", "B", "C", "D"];

/// Generates a single leaf with an arbitrary outcome.
fn leaf_strategy() -> impl Strategy<Value = Rule<MockLeaf>> {
    (0_usize .. NAMES.len(), 0_u8 .. 3).prop_map(|(index, kind)| match kind {
        0 => ok(NAMES[index]),
        1 => na(NAMES[index]),
        _ => fail(NAMES[index], MockCode::Broken),
    })
}

/// Generates arbitrary trees up to a bounded depth.
fn tree_strategy() -> impl Strategy<Value = Rule<MockLeaf>> {
    leaf_strategy().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1 .. 4).prop_map(Rule::all),
            prop::collection::vec(inner.clone(), 1 .. 4).prop_map(Rule::any),
            inner.prop_map(Rule::negate),
        ]
    })
}

/// Reference conjunction over child result codes.
fn model_all(codes: &[ResultCode]) -> ResultCode {
    if codes.contains(&ResultCode::Fail) {
        ResultCode::Fail
    } else if codes.contains(&ResultCode::Na) {
        ResultCode::Na
    } else {
        ResultCode::Ok
    }
}

/// Reference disjunction over child result codes.
fn model_any(codes: &[ResultCode]) -> ResultCode {
    if codes.contains(&ResultCode::Ok) {
        ResultCode::Ok
    } else if codes.contains(&ResultCode::Fail) {
        ResultCode::Fail
    } else {
        ResultCode::Na
    }
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    #[test]
    fn double_negation_preserves_ok_and_fail(tree in tree_strategy()) {
        let inner = tree.verify(&()).unwrap();
        let twice = Rule::negate(Rule::negate(tree)).verify(&()).unwrap();
        prop_assert_eq!(twice.result_code(), inner.result_code());
    }

    #[test]
    fn single_negation_swaps_ok_and_na(tree in tree_strategy()) {
        let inner = tree.verify(&()).unwrap();
        let once = Rule::negate(tree).verify(&()).unwrap();
        prop_assert_eq!(once.result_code(), inner.result_code().negate());
    }

    #[test]
    fn composites_match_model(children in prop::collection::vec(tree_strategy(), 1 .. 5)) {
        let codes: Vec<ResultCode> = children
            .iter()
            .map(|child| child.verify(&()).unwrap().result_code())
            .collect();
        let all = Rule::all(children.clone()).verify(&()).unwrap();
        let any = Rule::any(children).verify(&()).unwrap();
        prop_assert_eq!(all.result_code(), model_all(&codes));
        prop_assert_eq!(any.result_code(), model_any(&codes));
    }

    #[test]
    fn error_code_present_iff_not_ok(tree in tree_strategy()) {
        let result = tree.verify(&()).unwrap();
        prop_assert_eq!(result.error_code().is_some(), !result.is_ok());
    }

    #[test]
    fn evaluation_is_deterministic(tree in tree_strategy()) {
        prop_assert_eq!(tree.verify(&()).unwrap(), tree.verify(&()).unwrap());
    }
}
