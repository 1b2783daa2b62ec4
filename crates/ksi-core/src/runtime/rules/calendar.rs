// crates/ksi-core/src/runtime/rules/calendar.rs
// ============================================================================
// Module: Calendar Chain Rules
// Description: Checks binding the calendar chain to the aggregation chains.
// Purpose: Validate calendar input, time, shape, and algorithms.
// Dependencies: crate::{core, runtime}
// ============================================================================

//! ## Overview
//! The calendar chain input must be the aggregation root, and its aggregation
//! time must be the signing time. The time encoded by the link shape must
//! equal that aggregation time. Without a calendar chain every check here is
//! inconclusive except the absence check.

use ksi_rule_logic::Outcome;

use crate::core::CalendarHashChain;
use crate::core::VerificationErrorCode;
use crate::runtime::context::VerificationContext;
use crate::runtime::rules::INCONCLUSIVE;
use crate::runtime::rules::RuleOutcome;
use crate::runtime::rules::aggregation::aggregation_root;

/// Runs `check` when a calendar chain is present, else `NA`.
fn with_calendar(
    ctx: &VerificationContext,
    check: impl FnOnce(&CalendarHashChain) -> RuleOutcome,
) -> RuleOutcome {
    ctx.calendar_hash_chain().map_or(Ok(INCONCLUSIVE), check)
}

/// OK when the signature has no calendar chain.
pub(crate) fn does_not_exist(ctx: &VerificationContext) -> RuleOutcome {
    Ok(if ctx.calendar_hash_chain().is_none() { Outcome::Ok } else { INCONCLUSIVE })
}

/// OK when the signature has a calendar chain.
pub(crate) fn existence(ctx: &VerificationContext) -> RuleOutcome {
    Ok(if ctx.calendar_hash_chain().is_some() { Outcome::Ok } else { INCONCLUSIVE })
}

/// Calendar input must be the aggregation root.
pub(crate) fn input_hash(ctx: &VerificationContext) -> RuleOutcome {
    with_calendar(ctx, |calendar| {
        let root = aggregation_root(ctx)?;
        Ok(Outcome::ok_or_fail(
            root.as_ref() == Some(calendar.input_hash()),
            VerificationErrorCode::CalendarInputHashMismatch,
        ))
    })
}

/// Calendar aggregation time must be the signing time.
pub(crate) fn aggregation_time(ctx: &VerificationContext) -> RuleOutcome {
    with_calendar(ctx, |calendar| {
        Ok(Outcome::ok_or_fail(
            calendar.aggregation_time() == ctx.aggregation_time(),
            VerificationErrorCode::CalendarAggregationTimeMismatch,
        ))
    })
}

/// Link shape and publication time must yield the calendar aggregation time.
pub(crate) fn registration_time(ctx: &VerificationContext) -> RuleOutcome {
    with_calendar(ctx, |calendar| {
        Ok(Outcome::ok_or_fail(
            calendar.registration_time() == Some(calendar.aggregation_time()),
            VerificationErrorCode::CalendarShapeMismatch,
        ))
    })
}

/// No calendar link algorithm may be deprecated at publication time.
pub(crate) fn algorithm_deprecated(ctx: &VerificationContext) -> RuleOutcome {
    with_calendar(ctx, |calendar| {
        let time = calendar.publication_time();
        let deprecated = calendar.algorithms().iter().any(|alg| alg.is_deprecated_at(time));
        Ok(Outcome::ok_or_fail(!deprecated, VerificationErrorCode::CalendarAlgorithmDeprecated))
    })
}
