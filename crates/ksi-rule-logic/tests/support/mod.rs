// crates/ksi-rule-logic/tests/support/mod.rs
// ============================================================================
// Module: Test Support
// Description: Shared result helpers and mock leaves for rule algebra tests.
// ============================================================================
//! ## Overview
//! Shared test helpers for consistent Result-based assertions, plus a mock
//! leaf whose outcome is fixed at construction.

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
    dead_code,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::convert::Infallible;
use std::error::Error;
use std::fmt;

use ksi_rule_logic::ErrorCode;
use ksi_rule_logic::LeafRule;
use ksi_rule_logic::Outcome;
use ksi_rule_logic::Rule;

// ========================================================================
// Test Result Helpers
// ========================================================================

/// Standard result type used across rule algebra integration tests.
pub type TestResult<T = ()> = Result<T, Box<dyn Error>>;

/// Lightweight error type for test assertions.
#[derive(Debug)]
struct TestError {
    /// Human-readable failure message.
    message: String,
}

impl TestError {
    /// Creates a new test error with the provided message.
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TestError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.message)
    }
}

impl Error for TestError {}

/// Returns an error when a test condition fails.
///
/// # Errors
/// Returns a `TestError` when the condition is false.
pub fn ensure(condition: bool, message: impl Into<String>) -> TestResult {
    if condition { Ok(()) } else { Err(Box::new(TestError::new(message))) }
}

// ========================================================================
// Mock Codes and Leaves
// ========================================================================

/// Error code taxonomy for mock leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockCode {
    /// Code reported for inconclusive results.
    Inconclusive,
    /// First failure code.
    Broken,
    /// Second failure code.
    Mismatch,
}

impl ErrorCode for MockCode {
    fn inconclusive() -> Self {
        Self::Inconclusive
    }
}

/// Leaf with a fixed outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockLeaf {
    /// Reported rule name.
    pub name: &'static str,
    /// Fixed outcome.
    pub outcome: Outcome<MockCode>,
}

impl LeafRule for MockLeaf {
    type Context = ();
    type Code = MockCode;
    type Error = Infallible;

    fn name(&self) -> &str {
        self.name
    }

    fn evaluate(&self, _ctx: &()) -> Result<Outcome<MockCode>, Infallible> {
        Ok(self.outcome.clone())
    }
}

/// Builds a passing leaf.
pub fn ok(name: &'static str) -> Rule<MockLeaf> {
    Rule::leaf(MockLeaf {
        name,
        outcome: Outcome::Ok,
    })
}

/// Builds a not-applicable leaf.
pub fn na(name: &'static str) -> Rule<MockLeaf> {
    Rule::leaf(MockLeaf {
        name,
        outcome: Outcome::Na(MockCode::Inconclusive),
    })
}

/// Builds a failing leaf with the given code.
pub fn fail(name: &'static str, code: MockCode) -> Rule<MockLeaf> {
    Rule::leaf(MockLeaf {
        name,
        outcome: Outcome::Fail(code),
    })
}
