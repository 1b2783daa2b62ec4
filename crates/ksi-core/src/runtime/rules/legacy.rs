// crates/ksi-core/src/runtime/rules/legacy.rs
// ============================================================================
// Module: Legacy Record Rules
// Description: Checks binding a legacy time-stamp record to the first chain.
// Purpose: Validate hash, time, index, and algorithms of legacy records.
// Dependencies: crate::{core, runtime}
// ============================================================================

//! ## Overview
//! Signatures converted from legacy time-stamp tokens keep the original
//! record. Its output hash must be the first chain input, and its time and
//! chain index must agree with the first chain.

use ksi_rule_logic::Outcome;

use crate::core::LegacyTimestampRecord;
use crate::core::VerificationErrorCode;
use crate::runtime::context::VerificationContext;
use crate::runtime::rules::INCONCLUSIVE;
use crate::runtime::rules::RuleOutcome;

/// Runs `check` when a legacy record is present, else `NA`.
fn with_record(
    ctx: &VerificationContext,
    check: impl FnOnce(&LegacyTimestampRecord) -> RuleOutcome,
) -> RuleOutcome {
    ctx.legacy_record().map_or(Ok(INCONCLUSIVE), check)
}

/// OK when the signature has no legacy record.
pub(crate) fn does_not_exist(ctx: &VerificationContext) -> RuleOutcome {
    Ok(if ctx.legacy_record().is_none() { Outcome::Ok } else { INCONCLUSIVE })
}

/// Record output must be the first chain input.
pub(crate) fn output_hash(ctx: &VerificationContext) -> RuleOutcome {
    with_record(ctx, |record| {
        let output = record.output_hash()?;
        Ok(Outcome::ok_or_fail(
            &output == ctx.first_aggregation_chain().input_hash(),
            VerificationErrorCode::InconsistentAggregationChains,
        ))
    })
}

/// Record time must be the first chain time.
pub(crate) fn aggregation_time(ctx: &VerificationContext) -> RuleOutcome {
    with_record(ctx, |record| {
        Ok(Outcome::ok_or_fail(
            record.aggregation_time == ctx.first_aggregation_chain().aggregation_time(),
            VerificationErrorCode::InconsistentAggregationTimes,
        ))
    })
}

/// Record index must be the first chain index.
pub(crate) fn chain_index(ctx: &VerificationContext) -> RuleOutcome {
    with_record(ctx, |record| {
        Ok(Outcome::ok_or_fail(
            record.chain_index.as_slice() == ctx.first_aggregation_chain().chain_index(),
            VerificationErrorCode::InconsistentChainIndexes,
        ))
    })
}

/// Input and time-stamp info algorithms must be current at signing time.
pub(crate) fn algorithms_deprecated(ctx: &VerificationContext) -> RuleOutcome {
    with_record(ctx, |record| {
        let time = ctx.aggregation_time();
        let deprecated = record.input_algorithms().iter().any(|alg| alg.is_deprecated_at(time));
        Ok(Outcome::ok_or_fail(!deprecated, VerificationErrorCode::LegacyAlgorithmDeprecated))
    })
}

/// Signed attributes algorithm must be current at signing time.
pub(crate) fn output_algorithm_deprecated(ctx: &VerificationContext) -> RuleOutcome {
    with_record(ctx, |record| {
        Ok(Outcome::ok_or_fail(
            !record.signed_attributes_algorithm.is_deprecated_at(ctx.aggregation_time()),
            VerificationErrorCode::LegacyOutputAlgorithmDeprecated,
        ))
    })
}
