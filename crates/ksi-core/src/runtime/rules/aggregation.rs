// crates/ksi-core/src/runtime/rules/aggregation.rs
// ============================================================================
// Module: Aggregation Chain Rules
// Description: Internal consistency checks over the aggregation chain list.
// Purpose: Recompute chain outputs and check times, indices, and metadata.
// Dependencies: crate::{core, runtime}
// ============================================================================

//! ## Overview
//! Chains are ordered from the document towards the calendar. Each chain
//! starts hashing at the level the previous one stopped at, and its output
//! must be the next chain's input. Indices shrink by one element per chain
//! until the last chain carries a single element.
//!
//! Metadata siblings are hashed as raw bytes, so a metadata value that parses
//! as a hash imprint could be confused with one. Padding exists to rule that
//! out and is checked strictly here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use ksi_rule_logic::Outcome;

use crate::core::ChainError;
use crate::core::DataHash;
use crate::core::LinkMetadata;
use crate::core::LinkSibling;
use crate::core::TlvElement;
use crate::core::VerificationErrorCode;
use crate::core::aggregation::METADATA_PADDING_BYTE;
use crate::core::aggregation::METADATA_PADDING_MAX_LENGTH;
use crate::core::aggregation::METADATA_PADDING_MIN_LENGTH;
use crate::core::aggregation::METADATA_PADDING_TAG;
use crate::runtime::context::VerificationContext;
use crate::runtime::context::VerificationError;
use crate::runtime::rules::RuleOutcome;

// ============================================================================
// SECTION: Chain Rules
// ============================================================================

/// Recomputes every chain and checks the links between them.
pub(crate) fn consistency(ctx: &VerificationContext) -> RuleOutcome {
    let chains = ctx.aggregation_chains();
    let mut level = 0_u8;
    for (position, chain) in chains.iter().enumerate() {
        let result = match chain.calculate_output_hash(level) {
            Ok(result) => result,
            Err(ChainError::LevelOverflow {
                ..
            }) => return Ok(Outcome::Fail(VerificationErrorCode::InconsistentAggregationChains)),
            Err(err) => return Err(err.into()),
        };
        if let Some(next) = chains.get(position + 1)
            && next.input_hash() != &result.output_hash
        {
            return Ok(Outcome::Fail(VerificationErrorCode::InconsistentAggregationChains));
        }
        level = result.level;
    }
    Ok(Outcome::Ok)
}

/// All chains must carry the same aggregation time.
pub(crate) fn time_consistency(ctx: &VerificationContext) -> RuleOutcome {
    let time = ctx.first_aggregation_chain().aggregation_time();
    let consistent = ctx.aggregation_chains().iter().all(|chain| chain.aggregation_time() == time);
    Ok(Outcome::ok_or_fail(consistent, VerificationErrorCode::InconsistentAggregationTimes))
}

/// Each index must be the previous one without its last element.
pub(crate) fn index_successor(ctx: &VerificationContext) -> RuleOutcome {
    let chains = ctx.aggregation_chains();
    let non_zero = chains.iter().all(|chain| chain.chain_index().iter().all(|value| *value != 0));
    let successive = chains.windows(2).all(|pair| match pair {
        [current, next] => {
            let index = current.chain_index();
            index.split_last().is_some_and(|(_, parent)| parent == next.chain_index())
        }
        _ => false,
    });
    let rooted = ctx.last_aggregation_chain().chain_index().len() == 1;
    Ok(Outcome::ok_or_fail(
        non_zero && successive && rooted,
        VerificationErrorCode::InconsistentChainIndexes,
    ))
}

/// Each chain's link directions must encode its own index element.
pub(crate) fn index_consistency(ctx: &VerificationContext) -> RuleOutcome {
    let consistent = ctx
        .aggregation_chains()
        .iter()
        .all(|chain| chain.chain_index().last() == Some(&chain.index_from_shape()));
    Ok(Outcome::ok_or_fail(consistent, VerificationErrorCode::ChainIndexMismatch))
}

/// No metadata sibling may be mistakable for a hash imprint.
pub(crate) fn metadata(ctx: &VerificationContext) -> RuleOutcome {
    let trusted = ctx
        .aggregation_chains()
        .iter()
        .flat_map(|chain| chain.links())
        .filter_map(|link| match &link.sibling {
            LinkSibling::Metadata(metadata) => Some(metadata),
            LinkSibling::Imprint(_) | LinkSibling::LegacyClientId(_) => None,
        })
        .all(metadata_is_trusted);
    Ok(Outcome::ok_or_fail(trusted, VerificationErrorCode::UntrustedMetadata))
}

/// No chain algorithm may be deprecated at signing time.
pub(crate) fn algorithm_deprecated(ctx: &VerificationContext) -> RuleOutcome {
    let time = ctx.aggregation_time();
    let deprecated = ctx
        .aggregation_chains()
        .iter()
        .flat_map(|chain| chain.algorithms())
        .any(|algorithm| algorithm.is_deprecated_at(time));
    Ok(Outcome::ok_or_fail(!deprecated, VerificationErrorCode::AggregationAlgorithmDeprecated))
}

// ============================================================================
// SECTION: Chain Root
// ============================================================================

/// Recomputes the output of the last chain, each chain starting at the level
/// the previous one reached.
///
/// Returns `None` when a level leaves the single-byte range.
///
/// # Errors
///
/// Returns [`VerificationError`] when a chain cannot be hashed.
pub(crate) fn aggregation_root(ctx: &VerificationContext) -> Result<Option<DataHash>, VerificationError> {
    let mut level = 0_u8;
    let mut output = None;
    for chain in ctx.aggregation_chains() {
        match chain.calculate_output_hash(level) {
            Ok(result) => {
                level = result.level;
                output = Some(result.output_hash);
            }
            Err(ChainError::LevelOverflow {
                ..
            }) => return Ok(None),
            Err(err) => return Err(err.into()),
        }
    }
    Ok(output)
}

// ============================================================================
// SECTION: Metadata Layout
// ============================================================================

/// Checks one metadata value.
///
/// With padding: exactly one padding element, first, TLV8, non-critical and
/// forward, 1-2 bytes of `0x01`, and an even total length. Without padding:
/// the raw value must not parse as an imprint.
fn metadata_is_trusted(metadata: &LinkMetadata) -> bool {
    let Ok(elements) = metadata.elements() else {
        return false;
    };
    let padding_count = elements.iter().filter(|element| element.tag() == METADATA_PADDING_TAG).count();
    match (padding_count, elements.first()) {
        (0, _) => !DataHash::looks_like_imprint(metadata.raw()),
        (1, Some(first)) if first.tag() == METADATA_PADDING_TAG => {
            padding_is_valid(first) && metadata.raw().len() % 2 == 0
        }
        _ => false,
    }
}

/// Checks the padding element's encoding and content.
fn padding_is_valid(padding: &TlvElement) -> bool {
    let value = padding.value();
    !padding.is_tlv16()
        && padding.is_non_critical()
        && padding.is_forward()
        && (METADATA_PADDING_MIN_LENGTH..=METADATA_PADDING_MAX_LENGTH).contains(&value.len())
        && value.iter().all(|byte| *byte == METADATA_PADDING_BYTE)
}
