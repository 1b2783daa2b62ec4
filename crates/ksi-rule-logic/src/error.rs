// crates/ksi-rule-logic/src/error.rs
// ============================================================================
// Module: Rule Tree Errors
// Description: Structural diagnostics for rule trees.
// Purpose: Reject malformed trees before they are used for evaluation.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Rule trees are validated once when a policy is assembled. Evaluation itself
//! never produces these errors; it reports NA/FAIL as data.

use thiserror::Error;

/// Structural problems detected by [`crate::Rule::validate`].
///
/// # Invariants
/// - Variants describe the tree, never an evaluation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleTreeError {
    /// A composite node has no children.
    #[error("empty composite rule at depth {depth}")]
    EmptyComposite {
        /// Depth of the offending node (root is 1).
        depth: usize,
    },

    /// Rule tree exceeds the configured depth limit.
    #[error("rule tree too deep: {actual_depth} levels (max {max_depth})")]
    TooDeep {
        /// Maximum allowed depth.
        max_depth: usize,
        /// Depth of the tree.
        actual_depth: usize,
    },
}
