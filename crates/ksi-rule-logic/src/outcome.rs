// crates/ksi-rule-logic/src/outcome.rs
// ============================================================================
// Module: Ternary Outcomes
// Description: Three-valued rule outcomes, rule results, and trace hooks.
// Purpose: Give every check a stable OK / NA / FAIL answer with an error code.
// Dependencies: serde::{Deserialize, Serialize}
// ============================================================================

//! ## Overview
//! A check either passes (`Ok`), does not apply to the shape of the input
//! (`Na`), or finds a definite violation (`Fail`). `Na` is its own signal and is
//! never folded into success or failure by the algebra. Every non-OK result
//! carries an error code; OK results never do.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Result Code
// ============================================================================

/// Ternary verification outcome.
///
/// # Invariants
/// - Closed set: a check passed, did not apply, or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResultCode {
    /// The check passed.
    Ok,
    /// The precondition for the check did not hold.
    Na,
    /// The check found a definite violation.
    Fail,
}

impl ResultCode {
    /// Returns true if the value is `Ok`
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Returns true if the value is `Na`
    #[must_use]
    pub const fn is_na(self) -> bool {
        matches!(self, Self::Na)
    }

    /// Returns true if the value is `Fail`
    #[must_use]
    pub const fn is_fail(self) -> bool {
        matches!(self, Self::Fail)
    }

    /// Returns the negated code: `Ok` and `Na` swap, `Fail` stays `Fail`.
    #[must_use]
    pub const fn negate(self) -> Self {
        match self {
            Self::Ok => Self::Na,
            Self::Na => Self::Ok,
            Self::Fail => Self::Fail,
        }
    }
}

// ============================================================================
// SECTION: Error Codes
// ============================================================================

/// Contract for error code taxonomies carried by non-OK results.
pub trait ErrorCode: Clone {
    /// Code used when an outcome becomes `Na` without a leaf supplying one
    /// (negated OK, empty disjunction).
    fn inconclusive() -> Self;
}

// ============================================================================
// SECTION: Leaf Outcome
// ============================================================================

/// Decision produced by a leaf rule before it is named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<C> {
    /// The check passed.
    Ok,
    /// The check did not apply; carries the reported code.
    Na(C),
    /// The check failed; carries the reported code.
    Fail(C),
}

impl<C> Outcome<C> {
    /// Returns `Ok` when `condition` holds, otherwise `Fail(code)`.
    pub fn ok_or_fail(condition: bool, code: C) -> Self {
        if condition { Self::Ok } else { Self::Fail(code) }
    }

    /// Returns `Ok` when `condition` holds, otherwise `Na(code)`.
    pub fn ok_or_na(condition: bool, code: C) -> Self {
        if condition { Self::Ok } else { Self::Na(code) }
    }

    /// Returns the result code of this outcome.
    #[must_use]
    pub const fn code(&self) -> ResultCode {
        match self {
            Self::Ok => ResultCode::Ok,
            Self::Na(_) => ResultCode::Na,
            Self::Fail(_) => ResultCode::Fail,
        }
    }
}

// ============================================================================
// SECTION: Rule Result
// ============================================================================

/// Named result of evaluating a rule.
///
/// # Invariants
/// - `error_code` is `Some` iff `result_code` is not `Ok`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleResult<C> {
    /// Identifying name of the rule (or joined child names for composites).
    pub(crate) rule_name: String,
    /// Ternary outcome.
    pub(crate) result_code: ResultCode,
    /// Error code for non-OK outcomes.
    pub(crate) error_code: Option<C>,
}

impl<C> RuleResult<C> {
    /// Creates a passing result.
    pub fn ok(rule_name: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            result_code: ResultCode::Ok,
            error_code: None,
        }
    }

    /// Creates a not-applicable result.
    pub fn na(rule_name: impl Into<String>, code: C) -> Self {
        Self {
            rule_name: rule_name.into(),
            result_code: ResultCode::Na,
            error_code: Some(code),
        }
    }

    /// Creates a failing result.
    pub fn fail(rule_name: impl Into<String>, code: C) -> Self {
        Self {
            rule_name: rule_name.into(),
            result_code: ResultCode::Fail,
            error_code: Some(code),
        }
    }

    /// Returns the rule name.
    #[must_use]
    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    /// Returns the result code.
    #[must_use]
    pub const fn result_code(&self) -> ResultCode {
        self.result_code
    }

    /// Returns the error code for non-OK results.
    #[must_use]
    pub const fn error_code(&self) -> Option<&C> {
        self.error_code.as_ref()
    }

    /// Returns true if the result is `Ok`.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.result_code.is_ok()
    }
}

/// Wraps a leaf outcome into a named rule result.
///
/// This is the template every leaf goes through: the leaf decides, the
/// algebra names.
pub fn base_result<C>(rule_name: &str, outcome: Outcome<C>) -> RuleResult<C> {
    match outcome {
        Outcome::Ok => RuleResult::ok(rule_name),
        Outcome::Na(code) => RuleResult::na(rule_name, code),
        Outcome::Fail(code) => RuleResult::fail(rule_name, code),
    }
}

// ============================================================================
// SECTION: Trace Hooks
// ============================================================================

/// Trace hook for leaf evaluation
pub trait RuleTrace<C> {
    /// Called whenever a leaf rule is evaluated
    fn on_leaf_evaluated(&mut self, result: &RuleResult<C>);
}

/// No-op trace hook for fast paths
///
/// # Invariants
/// - Zero-sized marker type; carries no state.
#[derive(Debug, Default)]
pub struct NoopTrace;

impl<C> RuleTrace<C> for NoopTrace {
    fn on_leaf_evaluated(&mut self, _result: &RuleResult<C>) {}
}

/// Trace hook that keeps every visited leaf result in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingTrace<C> {
    /// Leaf results in evaluation order.
    entries: Vec<RuleResult<C>>,
}

impl<C> Default for RecordingTrace<C> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<C> RecordingTrace<C> {
    /// Returns the recorded leaf results.
    #[must_use]
    pub fn entries(&self) -> &[RuleResult<C>] {
        &self.entries
    }

    /// Consumes the trace and returns the recorded leaf results.
    #[must_use]
    pub fn into_entries(self) -> Vec<RuleResult<C>> {
        self.entries
    }
}

impl<C: Clone> RuleTrace<C> for RecordingTrace<C> {
    fn on_leaf_evaluated(&mut self, result: &RuleResult<C>) {
        self.entries.push(result.clone());
    }
}
