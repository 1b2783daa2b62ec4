// crates/ksi-rule-logic/src/rule.rs
// ============================================================================
// Module: Rule Tree
// Description: Closed rule algebra over domain-specific leaf checks.
// Purpose: Define `LeafRule`, `Rule`, and the AND / OR / NOT combinators with
//          deterministic left-to-right short-circuit evaluation.
// Dependencies: crate::{error, outcome}, smallvec::SmallVec
// ============================================================================

//! ## Overview
//! A rule tree has exactly three node kinds: leaves supplied by the domain,
//! composites that combine children under conjunction or disjunction, and
//! negation. Leaves decide an [`Outcome`]; the tree names it, combines it, and
//! reports every visited leaf to a trace hook.
//!
//! Composite truth tables:
//! - conjunction: first `Fail` wins; otherwise first `Na`; otherwise `Ok`.
//! - disjunction: first `Ok` wins; otherwise first `Fail`; otherwise `Na`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::marker::PhantomData;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::error::RuleTreeError;
use crate::outcome::ErrorCode;
use crate::outcome::NoopTrace;
use crate::outcome::Outcome;
use crate::outcome::ResultCode;
use crate::outcome::RuleResult;
use crate::outcome::RuleTrace;
use crate::outcome::base_result;

// ============================================================================
// SECTION: Leaf Contract
// ============================================================================

/// Domain-specific leaf check.
///
/// Leaves are free-standing types; the tree never inspects them beyond
/// `name` and `evaluate`.
pub trait LeafRule {
    /// Evaluation context the leaf reads from.
    type Context: ?Sized;
    /// Error code taxonomy used for non-OK outcomes.
    type Code: ErrorCode;
    /// Operational error that aborts evaluation.
    type Error;

    /// Returns the identifying name reported in results.
    fn name(&self) -> &str;

    /// Decides the outcome of this check.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` when the check cannot be completed at all.
    fn evaluate(&self, ctx: &Self::Context) -> Result<Outcome<Self::Code>, Self::Error>;
}

impl<T: LeafRule + ?Sized> LeafRule for Box<T> {
    type Context = T::Context;
    type Code = T::Code;
    type Error = T::Error;

    fn name(&self) -> &str {
        (**self).name()
    }

    fn evaluate(&self, ctx: &Self::Context) -> Result<Outcome<Self::Code>, Self::Error> {
        (**self).evaluate(ctx)
    }
}

impl<T: LeafRule + ?Sized> LeafRule for Arc<T> {
    type Context = T::Context;
    type Code = T::Code;
    type Error = T::Error;

    fn name(&self) -> &str {
        (**self).name()
    }

    fn evaluate(&self, ctx: &Self::Context) -> Result<Outcome<Self::Code>, Self::Error> {
        (**self).evaluate(ctx)
    }
}

/// Leaf built from a name and a closure.
pub struct FnRule<X: ?Sized, C, E, F> {
    /// Reported rule name.
    name: String,
    /// Decision function.
    check: F,
    /// Binds the context, code, and error types.
    marker: PhantomData<fn(&X) -> Result<Outcome<C>, E>>,
}

impl<X: ?Sized, C, E, F> FnRule<X, C, E, F>
where
    F: Fn(&X) -> Result<Outcome<C>, E>,
{
    /// Creates a closure-backed leaf.
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            check,
            marker: PhantomData,
        }
    }
}

impl<X: ?Sized, C: ErrorCode, E, F> LeafRule for FnRule<X, C, E, F>
where
    F: Fn(&X) -> Result<Outcome<C>, E>,
{
    type Context = X;
    type Code = C;
    type Error = E;

    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, ctx: &X) -> Result<Outcome<C>, E> {
        (self.check)(ctx)
    }
}

// ============================================================================
// SECTION: Rule Definition
// ============================================================================

/// Rule tree with domain-specific leaves.
///
/// # Invariants
/// - Children of a composite are evaluated strictly in order.
/// - Trees are immutable once built and may be shared across evaluations.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule<L> {
    /// Domain leaf check.
    Leaf(L),

    /// Ordered combination of child rules.
    ///
    /// `require_all = true` is conjunction, `false` is disjunction.
    Composite {
        /// Selects conjunction (`true`) or disjunction (`false`).
        require_all: bool,
        /// Child rules in evaluation order.
        rules: SmallVec<[Box<Self>; 4]>,
    },

    /// Negation: `Ok` and `Na` swap, `Fail` is preserved.
    Not(Box<Self>),
}

// ============================================================================
// SECTION: Constructors
// ============================================================================

impl<L> Rule<L> {
    /// Creates a leaf node.
    pub fn leaf<T: Into<L>>(leaf: T) -> Self {
        Self::Leaf(leaf.into())
    }

    /// Creates a conjunction of the given rules.
    pub fn all(rules: Vec<Self>) -> Self {
        Self::composite(true, rules)
    }

    /// Creates a disjunction of the given rules.
    pub fn any(rules: Vec<Self>) -> Self {
        Self::composite(false, rules)
    }

    /// Creates a composite with explicit semantics.
    pub fn composite(require_all: bool, rules: Vec<Self>) -> Self {
        Self::Composite {
            require_all,
            rules: rules.into_iter().map(Box::new).collect(),
        }
    }

    /// Creates a negation of the given rule.
    pub fn negate(rule: Self) -> Self {
        Self::Not(Box::new(rule))
    }

    /// Returns the depth of the tree (a single leaf has depth 1).
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Not(inner) => 1 + inner.depth(),
            Self::Composite {
                rules, ..
            } => 1 + rules.iter().map(|rule| rule.depth()).max().unwrap_or(0),
        }
    }

    /// Returns the number of leaves in the tree.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Not(inner) => inner.leaf_count(),
            Self::Composite {
                rules, ..
            } => rules.iter().map(|rule| rule.leaf_count()).sum(),
        }
    }

    /// Checks structural limits: no empty composites and bounded depth.
    ///
    /// # Errors
    ///
    /// Returns [`RuleTreeError`] when the tree is empty somewhere or too deep.
    pub fn validate(&self, max_depth: usize) -> Result<(), RuleTreeError> {
        let actual_depth = self.depth();
        if actual_depth > max_depth {
            return Err(RuleTreeError::TooDeep {
                max_depth,
                actual_depth,
            });
        }
        self.check_non_empty(1)
    }

    /// Rejects empty composites anywhere in the tree.
    fn check_non_empty(&self, depth: usize) -> Result<(), RuleTreeError> {
        match self {
            Self::Leaf(_) => Ok(()),
            Self::Not(inner) => inner.check_non_empty(depth + 1),
            Self::Composite {
                rules, ..
            } => {
                if rules.is_empty() {
                    return Err(RuleTreeError::EmptyComposite {
                        depth,
                    });
                }
                rules.iter().try_for_each(|rule| rule.check_non_empty(depth + 1))
            }
        }
    }
}

impl<L> std::ops::Not for Rule<L> {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::Not(Box::new(self))
    }
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

impl<L: LeafRule> Rule<L> {
    /// Evaluates the tree once.
    ///
    /// # Errors
    ///
    /// Returns the leaf error type when any visited leaf reports an
    /// operational error; evaluation stops at that leaf.
    pub fn verify(&self, ctx: &L::Context) -> Result<RuleResult<L::Code>, L::Error> {
        let mut trace = NoopTrace;
        self.verify_with_trace(ctx, &mut trace)
    }

    /// Evaluates the tree once, reporting every visited leaf to `trace`.
    ///
    /// # Errors
    ///
    /// Returns the leaf error type when any visited leaf reports an
    /// operational error; evaluation stops at that leaf.
    pub fn verify_with_trace<T>(
        &self,
        ctx: &L::Context,
        trace: &mut T,
    ) -> Result<RuleResult<L::Code>, L::Error>
    where
        T: RuleTrace<L::Code>,
    {
        match self {
            Self::Leaf(leaf) => {
                let outcome = leaf.evaluate(ctx)?;
                let result = base_result(leaf.name(), outcome);
                trace.on_leaf_evaluated(&result);
                Ok(result)
            }
            Self::Not(inner) => inner.verify_with_trace(ctx, trace).map(negate),
            Self::Composite {
                require_all: true,
                rules,
            } => conjunction(rules, ctx, trace),
            Self::Composite {
                require_all: false,
                rules,
            } => disjunction(rules, ctx, trace),
        }
    }
}

/// Applies negation to an evaluated result.
fn negate<C: ErrorCode>(result: RuleResult<C>) -> RuleResult<C> {
    let name = format!("Not {}", result.rule_name);
    match result.result_code {
        ResultCode::Ok => RuleResult::na(name, C::inconclusive()),
        ResultCode::Na => RuleResult::ok(name),
        ResultCode::Fail => RuleResult {
            rule_name: name,
            result_code: ResultCode::Fail,
            error_code: result.error_code,
        },
    }
}

/// Conjunction: short-circuits on the first failure.
fn conjunction<L, T>(
    rules: &[Box<Rule<L>>],
    ctx: &L::Context,
    trace: &mut T,
) -> Result<RuleResult<L::Code>, L::Error>
where
    L: LeafRule,
    T: RuleTrace<L::Code>,
{
    let mut names = Vec::with_capacity(rules.len());
    let mut first_na = None;
    for rule in rules {
        let result = rule.verify_with_trace(ctx, trace)?;
        match result.result_code {
            ResultCode::Fail => return Ok(result),
            ResultCode::Na => {
                if first_na.is_none() {
                    first_na = Some(result);
                }
            }
            ResultCode::Ok => names.push(result.rule_name),
        }
    }
    Ok(first_na.unwrap_or_else(|| RuleResult::ok(names.join(", "))))
}

/// Disjunction: short-circuits on the first success.
fn disjunction<L, T>(
    rules: &[Box<Rule<L>>],
    ctx: &L::Context,
    trace: &mut T,
) -> Result<RuleResult<L::Code>, L::Error>
where
    L: LeafRule,
    T: RuleTrace<L::Code>,
{
    let mut names = Vec::with_capacity(rules.len());
    let mut first_fail = None;
    let mut first_na = None;
    for rule in rules {
        let result = rule.verify_with_trace(ctx, trace)?;
        names.push(result.rule_name.clone());
        match result.result_code {
            ResultCode::Ok => return Ok(RuleResult::ok(names.join(", "))),
            ResultCode::Fail => {
                if first_fail.is_none() {
                    first_fail = Some(result);
                }
            }
            ResultCode::Na => {
                if first_na.is_none() {
                    first_na = Some(result);
                }
            }
        }
    }
    Ok(first_fail
        .or(first_na)
        .unwrap_or_else(|| RuleResult::na(String::new(), L::Code::inconclusive())))
}
