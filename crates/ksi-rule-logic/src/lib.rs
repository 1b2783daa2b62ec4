// crates/ksi-rule-logic/src/lib.rs
// ============================================================================
// Module: Rule Logic Root
// Description: Public API surface for the ternary rule algebra.
// Purpose: Wire together outcomes, rule trees, errors, and the tree macro.
// Dependencies: crate::{error, outcome, rule}
// ============================================================================

//! ## Overview
//! This crate is the domain-agnostic half of signature verification: a closed
//! algebra of leaf checks, conjunction/disjunction composites, and negation,
//! evaluated with three-valued results (`OK`, `NA`, `FAIL`). Domain crates
//! supply leaves and an error code taxonomy.

// ============================================================================
// SECTION: Core Modules
// ============================================================================

pub mod error;
pub mod outcome;
pub mod rule;


// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use error::RuleTreeError;
pub use outcome::ErrorCode;
pub use outcome::NoopTrace;
pub use outcome::Outcome;
pub use outcome::RecordingTrace;
pub use outcome::ResultCode;
pub use outcome::RuleResult;
pub use outcome::RuleTrace;
pub use outcome::base_result;
pub use rule::FnRule;
pub use rule::LeafRule;
pub use rule::Rule;

// ============================================================================
// SECTION: Rule Macro
// ============================================================================

/// Macro for ergonomic rule tree construction
///
/// Each node is a keyword followed by one delimited group:
///
/// ```ignore
/// let tree: Rule<MyLeaf> = rule! {
///     all [
///         leaf(MyLeaf::InputPresent),
///         any [
///             leaf(MyLeaf::NoCalendar),
///             not(leaf(MyLeaf::Extended))
///         ]
///     ]
/// };
/// ```
#[macro_export]
macro_rules! rule {
    // Leaf: any expression convertible into the leaf type
    (leaf ($leaf:expr)) => {
        $crate::rule::Rule::leaf($leaf)
    };

    // Negation of a single node
    (not ($kind:ident $args:tt)) => {
        $crate::rule::Rule::negate($crate::rule!($kind $args))
    };

    // Conjunction
    (all [$($kind:ident $args:tt),* $(,)?]) => {
        $crate::rule::Rule::all(vec![$($crate::rule!($kind $args)),*])
    };

    // Disjunction
    (any [$($kind:ident $args:tt),* $(,)?]) => {
        $crate::rule::Rule::any(vec![$($crate::rule!($kind $args)),*])
    };
}
