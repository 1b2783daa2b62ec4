// crates/ksi-core/src/runtime/rules/publication.rs
// ============================================================================
// Module: Publication Rules
// Description: Checks over publication records, the publications file, and
//              caller-supplied publications.
// Purpose: Decide whether the signature is anchored to a trusted publication.
// Dependencies: crate::{core, runtime}
// ============================================================================

//! ## Overview
//! Publication-record rules compare the signature's own record with its
//! calendar chain. Publications-file rules read the file through the
//! publications handler. User-publication rules compare against the
//! publication supplied with the verification input; a time mismatch is `NA`
//! rather than `FAIL` because it routes evaluation to the extension branch.

// ============================================================================
// SECTION: Imports
// ============================================================================

use ksi_rule_logic::Outcome;

use crate::core::VerificationErrorCode;
use crate::runtime::context::VerificationContext;
use crate::runtime::rules::INCONCLUSIVE;
use crate::runtime::rules::RuleOutcome;

// ============================================================================
// SECTION: Publication Record
// ============================================================================

/// OK when the signature has no publication record.
pub(crate) fn record_does_not_exist(ctx: &VerificationContext) -> RuleOutcome {
    Ok(if ctx.publication_record().is_none() { Outcome::Ok } else { INCONCLUSIVE })
}

/// OK when the signature has a publication record.
pub(crate) fn record_existence(ctx: &VerificationContext) -> RuleOutcome {
    Ok(if ctx.publication_record().is_some() { Outcome::Ok } else { INCONCLUSIVE })
}

/// Record time must be the calendar publication time.
pub(crate) fn record_publication_time(ctx: &VerificationContext) -> RuleOutcome {
    let (Some(record), Some(calendar)) = (ctx.publication_record(), ctx.calendar_hash_chain()) else {
        return Ok(INCONCLUSIVE);
    };
    Ok(Outcome::ok_or_fail(
        record.publication_time() == calendar.publication_time(),
        VerificationErrorCode::PublicationTimeMismatch,
    ))
}

/// Record hash must be the calendar root.
pub(crate) fn record_publication_hash(ctx: &VerificationContext) -> RuleOutcome {
    let (Some(record), Some(calendar)) = (ctx.publication_record(), ctx.calendar_hash_chain()) else {
        return Ok(INCONCLUSIVE);
    };
    let root = calendar.output_hash()?;
    Ok(Outcome::ok_or_fail(
        record.publication_data().publication_hash() == &root,
        VerificationErrorCode::PublicationHashMismatch,
    ))
}

// ============================================================================
// SECTION: Publications File
// ============================================================================

/// The file's publication at the record's time must carry the record's hash.
pub(crate) fn file_contains_signature_publication(ctx: &VerificationContext) -> RuleOutcome {
    let Some(record) = ctx.publication_record() else {
        return Ok(INCONCLUSIVE);
    };
    let file = ctx.get_publications_file()?;
    let Some(published) = file.publication_at(record.publication_time()) else {
        return Ok(INCONCLUSIVE);
    };
    Ok(Outcome::ok_or_fail(
        published.publication_data().publication_hash()
            == record.publication_data().publication_hash(),
        VerificationErrorCode::PublicationsFileMismatch,
    ))
}

/// OK when the file has a publication at or after the signing time.
pub(crate) fn file_has_suitable_publication(ctx: &VerificationContext) -> RuleOutcome {
    let file = ctx.get_publications_file()?;
    Ok(if file.publication_at_or_after(ctx.aggregation_time()).is_some() {
        Outcome::Ok
    } else {
        INCONCLUSIVE
    })
}

// ============================================================================
// SECTION: User Publication
// ============================================================================

/// OK when the caller supplied a publication.
pub(crate) fn user_publication_existence(ctx: &VerificationContext) -> RuleOutcome {
    Ok(if ctx.user_publication().is_some() { Outcome::Ok } else { INCONCLUSIVE })
}

/// OK when the caller's publication has the record's time.
pub(crate) fn user_publication_time_matches(ctx: &VerificationContext) -> RuleOutcome {
    let (Some(user), Some(record)) = (ctx.user_publication(), ctx.publication_record()) else {
        return Ok(INCONCLUSIVE);
    };
    Ok(if user.publication_time() == record.publication_time() { Outcome::Ok } else { INCONCLUSIVE })
}

/// The caller's publication must carry the record's hash when times match.
pub(crate) fn user_publication_hash_matches(ctx: &VerificationContext) -> RuleOutcome {
    let (Some(user), Some(record)) = (ctx.user_publication(), ctx.publication_record()) else {
        return Ok(INCONCLUSIVE);
    };
    if user.publication_time() != record.publication_time() {
        return Ok(INCONCLUSIVE);
    }
    Ok(Outcome::ok_or_fail(
        user.publication_hash() == record.publication_data().publication_hash(),
        VerificationErrorCode::UserPublicationMismatch,
    ))
}

/// OK when the caller's publication was made after signing.
pub(crate) fn user_publication_creation_time(ctx: &VerificationContext) -> RuleOutcome {
    let Some(user) = ctx.user_publication() else {
        return Ok(INCONCLUSIVE);
    };
    Ok(if user.publication_time() > ctx.aggregation_time() { Outcome::Ok } else { INCONCLUSIVE })
}
