// crates/ksi-core/src/runtime/rules/extension.rs
// ============================================================================
// Module: Extension Rules
// Description: Checks comparing the signature with an extended calendar chain.
// Purpose: Verify a signature against a publication it is not yet bound to.
// Dependencies: crate::{core, runtime}
// ============================================================================

//! ## Overview
//! Extension rules ask the context for a calendar chain extended to a target
//! publication. The context caches the extender response per target time, so
//! the input, time, root, and right-link rules of one branch share a single
//! extender call.
//!
//! Every rule here returns `NA` without touching a collaborator when
//! extending is not allowed or the target does not exist.

// ============================================================================
// SECTION: Imports
// ============================================================================

use ksi_rule_logic::Outcome;

use crate::core::CalendarHashChain;
use crate::core::DataHash;
use crate::core::VerificationErrorCode;
use crate::runtime::context::VerificationContext;
use crate::runtime::context::VerificationError;
use crate::runtime::rules::ExtensionTarget;
use crate::runtime::rules::INCONCLUSIVE;
use crate::runtime::rules::RuleOutcome;
use crate::runtime::rules::aggregation::aggregation_root;

// ============================================================================
// SECTION: Targets
// ============================================================================

/// Resolved extension target.
struct ExtensionPoint {
    /// Publication time to extend to; `None` extends to the calendar head.
    publication_time: Option<u64>,
    /// Root the extended chain must produce, when the target defines one.
    expected_root: Option<DataHash>,
}

/// Error codes reported for a target as (input hash, aggregation time, root).
const fn target_codes(
    target: ExtensionTarget,
) -> (VerificationErrorCode, VerificationErrorCode, VerificationErrorCode) {
    match target {
        ExtensionTarget::PublicationsFile | ExtensionTarget::UserPublication => (
            VerificationErrorCode::ExtendedInputHashMismatch,
            VerificationErrorCode::ExtendedAggregationTimeMismatch,
            VerificationErrorCode::ExtendedRootMismatch,
        ),
        ExtensionTarget::CalendarChain => (
            VerificationErrorCode::CalendarExtendedInputMismatch,
            VerificationErrorCode::CalendarExtendedTimeMismatch,
            VerificationErrorCode::CalendarRootMismatch,
        ),
    }
}

/// Resolves `target`, or `None` when extension does not apply.
fn resolve(
    ctx: &VerificationContext,
    target: ExtensionTarget,
) -> Result<Option<ExtensionPoint>, VerificationError> {
    if !ctx.is_extending_allowed() {
        return Ok(None);
    }
    let point = match target {
        ExtensionTarget::PublicationsFile => {
            let file = ctx.get_publications_file()?;
            file.publication_at_or_after(ctx.aggregation_time()).map(|record| ExtensionPoint {
                publication_time: Some(record.publication_time()),
                expected_root: Some(record.publication_data().publication_hash().clone()),
            })
        }
        ExtensionTarget::UserPublication => ctx.user_publication().map(|user| ExtensionPoint {
            publication_time: Some(user.publication_time()),
            expected_root: Some(user.publication_hash().clone()),
        }),
        ExtensionTarget::CalendarChain => match ctx.calendar_hash_chain() {
            Some(calendar) => Some(ExtensionPoint {
                publication_time: Some(calendar.publication_time()),
                expected_root: Some(calendar.output_hash()?),
            }),
            None => Some(ExtensionPoint {
                publication_time: None,
                expected_root: None,
            }),
        },
    };
    Ok(point)
}

/// Resolves `target` and fetches its extended chain.
fn extended_chain(
    ctx: &VerificationContext,
    target: ExtensionTarget,
) -> Result<Option<(ExtensionPoint, CalendarHashChain)>, VerificationError> {
    let Some(point) = resolve(ctx, target)? else {
        return Ok(None);
    };
    let chain = ctx.get_extended_calendar_hash_chain(point.publication_time)?;
    Ok(Some((point, chain)))
}

// ============================================================================
// SECTION: Rules
// ============================================================================

/// OK when the context allows extending.
pub(crate) fn extending_permitted(ctx: &VerificationContext) -> RuleOutcome {
    Ok(if ctx.is_extending_allowed() { Outcome::Ok } else { INCONCLUSIVE })
}

/// Extended chain input must be the aggregation root.
pub(crate) fn input_hash(ctx: &VerificationContext, target: ExtensionTarget) -> RuleOutcome {
    let Some((_, extended)) = extended_chain(ctx, target)? else {
        return Ok(INCONCLUSIVE);
    };
    let root = aggregation_root(ctx)?;
    let (code, _, _) = target_codes(target);
    Ok(Outcome::ok_or_fail(root.as_ref() == Some(extended.input_hash()), code))
}

/// Extended chain must start at the signing time.
pub(crate) fn aggregation_time(ctx: &VerificationContext, target: ExtensionTarget) -> RuleOutcome {
    let Some((_, extended)) = extended_chain(ctx, target)? else {
        return Ok(INCONCLUSIVE);
    };
    let (_, code, _) = target_codes(target);
    Ok(Outcome::ok_or_fail(extended.aggregation_time() == ctx.aggregation_time(), code))
}

/// Extended chain root must be the target's hash.
pub(crate) fn root_hash(ctx: &VerificationContext, target: ExtensionTarget) -> RuleOutcome {
    let Some((point, extended)) = extended_chain(ctx, target)? else {
        return Ok(INCONCLUSIVE);
    };
    let Some(expected) = point.expected_root else {
        return Ok(INCONCLUSIVE);
    };
    let (_, _, code) = target_codes(target);
    Ok(Outcome::ok_or_fail(extended.output_hash()? == expected, code))
}

/// Extended chain must keep every right sibling of the signature's chain.
pub(crate) fn right_links_match(ctx: &VerificationContext, target: ExtensionTarget) -> RuleOutcome {
    let Some(calendar) = ctx.calendar_hash_chain() else {
        return Ok(INCONCLUSIVE);
    };
    let Some((_, extended)) = extended_chain(ctx, target)? else {
        return Ok(INCONCLUSIVE);
    };
    Ok(Outcome::ok_or_fail(
        calendar.right_links().eq(extended.right_links()),
        VerificationErrorCode::RightLinksMismatch,
    ))
}
