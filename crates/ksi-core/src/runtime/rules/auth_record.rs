// crates/ksi-core/src/runtime/rules/auth_record.rs
// ============================================================================
// Module: Calendar Authentication Record Rules
// Description: Consistency and key-based checks for authentication records.
// Purpose: Tie the record to the calendar chain and verify its PKI signature.
// Dependencies: crate::{core, runtime}
// ============================================================================

//! ## Overview
//! The consistency rules compare the record with the calendar chain and need
//! no collaborators. The key-based rules resolve the signing certificate
//! through the publications handler and treat a missing certificate as `NA`
//! for everything downstream of [`certificate_existence`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use ksi_rule_logic::Outcome;

use crate::core::CalendarAuthenticationRecord;
use crate::core::CalendarHashChain;
use crate::core::CertificateRecord;
use crate::core::VerificationErrorCode;
use crate::runtime::context::VerificationContext;
use crate::runtime::context::VerificationError;
use crate::runtime::rules::INCONCLUSIVE;
use crate::runtime::rules::RuleOutcome;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Runs `check` when both the record and the calendar chain are present.
fn with_record_and_calendar(
    ctx: &VerificationContext,
    check: impl FnOnce(&CalendarAuthenticationRecord, &CalendarHashChain) -> RuleOutcome,
) -> RuleOutcome {
    match (ctx.calendar_authentication_record(), ctx.calendar_hash_chain()) {
        (Some(record), Some(calendar)) => check(record, calendar),
        _ => Ok(INCONCLUSIVE),
    }
}

/// Resolves the record's signing certificate.
fn signing_certificate(
    ctx: &VerificationContext,
) -> Result<Option<(&CalendarAuthenticationRecord, CertificateRecord)>, VerificationError> {
    let Some(record) = ctx.calendar_authentication_record() else {
        return Ok(None);
    };
    let certificate = ctx.find_certificate(&record.signature_data.certificate_id)?;
    Ok(certificate.map(|certificate| (record, certificate)))
}

// ============================================================================
// SECTION: Consistency Rules
// ============================================================================

/// OK when the signature has no calendar authentication record.
pub(crate) fn does_not_exist(ctx: &VerificationContext) -> RuleOutcome {
    Ok(if ctx.calendar_authentication_record().is_none() { Outcome::Ok } else { INCONCLUSIVE })
}

/// OK when the signature has a calendar authentication record.
pub(crate) fn existence(ctx: &VerificationContext) -> RuleOutcome {
    Ok(if ctx.calendar_authentication_record().is_some() { Outcome::Ok } else { INCONCLUSIVE })
}

/// Record time must be the calendar publication time.
pub(crate) fn publication_time(ctx: &VerificationContext) -> RuleOutcome {
    with_record_and_calendar(ctx, |record, calendar| {
        Ok(Outcome::ok_or_fail(
            record.publication_data.publication_time() == calendar.publication_time(),
            VerificationErrorCode::AuthRecordTimeMismatch,
        ))
    })
}

/// Record hash must be the calendar root.
pub(crate) fn aggregation_hash(ctx: &VerificationContext) -> RuleOutcome {
    with_record_and_calendar(ctx, |record, calendar| {
        let root = calendar.output_hash()?;
        Ok(Outcome::ok_or_fail(
            record.publication_data.publication_hash() == &root,
            VerificationErrorCode::AuthRecordHashMismatch,
        ))
    })
}

// ============================================================================
// SECTION: Key-Based Rules
// ============================================================================

/// The signing certificate must be known to the publications handler.
pub(crate) fn certificate_existence(ctx: &VerificationContext) -> RuleOutcome {
    if ctx.calendar_authentication_record().is_none() {
        return Ok(INCONCLUSIVE);
    }
    let found = signing_certificate(ctx)?.is_some();
    Ok(Outcome::ok_or_fail(found, VerificationErrorCode::CertificateNotFound))
}

/// The signing certificate must be valid at signing time.
pub(crate) fn certificate_validity(ctx: &VerificationContext) -> RuleOutcome {
    let Some((_, certificate)) = signing_certificate(ctx)? else {
        return Ok(INCONCLUSIVE);
    };
    Ok(Outcome::ok_or_fail(
        certificate.certificate().is_valid_at(ctx.aggregation_time()),
        VerificationErrorCode::CertificateNotValid,
    ))
}

/// The record signature must verify over the signed publication data.
///
/// Unsupported key or signature types fail rather than abort.
pub(crate) fn signature(ctx: &VerificationContext) -> RuleOutcome {
    let Some((record, certificate)) = signing_certificate(ctx)? else {
        return Ok(INCONCLUSIVE);
    };
    let message = record.publication_data.signed_bytes()?;
    let data = &record.signature_data;
    let verified = certificate
        .certificate()
        .verify(&data.signature_type, &message, &data.signature_value)
        .is_ok();
    Ok(Outcome::ok_or_fail(verified, VerificationErrorCode::SignatureNotVerified))
}
