// crates/ksi-core/src/runtime/rules/document.rs
// ============================================================================
// Module: Document Rules
// Description: Checks binding the caller's document hash to the signature.
// Purpose: Compare document hash, algorithm, and level with the signature input.
// Dependencies: crate::{core, runtime}
// ============================================================================

//! ## Overview
//! Document checks apply only when the caller supplied a document hash. The
//! hash must use the signature input algorithm and equal the signature input.
//! The caller level may not exceed the first link's level correction.

use ksi_rule_logic::Outcome;

use crate::core::VerificationErrorCode;
use crate::runtime::context::VerificationContext;
use crate::runtime::rules::INCONCLUSIVE;
use crate::runtime::rules::RuleOutcome;

/// OK when the caller did not supply a document hash.
pub(crate) fn hash_does_not_exist(ctx: &VerificationContext) -> RuleOutcome {
    Ok(if ctx.document_hash().is_none() { Outcome::Ok } else { INCONCLUSIVE })
}

/// Document hash algorithm must match the signature input algorithm.
pub(crate) fn hash_algorithm(ctx: &VerificationContext) -> RuleOutcome {
    let Some(document_hash) = ctx.document_hash() else {
        return Ok(INCONCLUSIVE);
    };
    let expected = ctx.signature().input_hash().algorithm();
    Ok(Outcome::ok_or_fail(
        document_hash.algorithm() == expected,
        VerificationErrorCode::WrongInputHashAlgorithm,
    ))
}

/// Document hash must equal the signature input hash.
pub(crate) fn hash_verification(ctx: &VerificationContext) -> RuleOutcome {
    let Some(document_hash) = ctx.document_hash() else {
        return Ok(INCONCLUSIVE);
    };
    Ok(Outcome::ok_or_fail(
        document_hash == ctx.signature().input_hash(),
        VerificationErrorCode::WrongDocument,
    ))
}

/// Caller level must not exceed the level correction of the first link.
///
/// Signatures with a legacy record enter the tree at level 0.
pub(crate) fn hash_level(ctx: &VerificationContext) -> RuleOutcome {
    let allowed = if ctx.legacy_record().is_some() {
        0
    } else {
        ctx.first_aggregation_chain().links().first().map_or(0, |link| link.level_correction)
    };
    Ok(Outcome::ok_or_fail(
        ctx.input_level() <= allowed,
        VerificationErrorCode::InputLevelTooLarge,
    ))
}

/// Signature input algorithm must not be deprecated at signing time.
pub(crate) fn input_algorithm_deprecated(ctx: &VerificationContext) -> RuleOutcome {
    let algorithm = ctx.signature().input_hash().algorithm();
    Ok(Outcome::ok_or_fail(
        !algorithm.is_deprecated_at(ctx.aggregation_time()),
        VerificationErrorCode::InputAlgorithmDeprecated,
    ))
}
