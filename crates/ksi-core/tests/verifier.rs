// crates/ksi-core/tests/verifier.rs
// ============================================================================
// Module: Verifier Tests
// Description: Fallback chaining, result reporting, and audit emission.
// Purpose: Validate verifier behavior across policy chains and audit sinks.
// ============================================================================
//! ## Overview
//! Exercises the verifier with the default policy chain, memory and file
//! audit sinks, and result serialization.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod support;

use std::sync::Arc;

use ksi_core::ContextAwarePolicy;
use ksi_core::FileAuditSink;
use ksi_core::InMemoryPublicationsHandler;
use ksi_core::MemoryAuditSink;
use ksi_core::Policy;
use ksi_core::PolicyContext;
use ksi_core::PublicationData;
use ksi_core::PublicationRecord;
use ksi_core::PublicationsFile;
use ksi_core::ResultCode;
use ksi_core::VerificationErrorCode;
use ksi_core::VerificationInput;
use ksi_core::Verifier;
use support::AGGREGATION_TIME;
use support::Fixture;
use support::LATER_PUBLICATION_TIME;
use support::PUBLICATION_TIME;
use support::TestResult;
use support::ensure;
use support::sha256;

// ========================================================================
// Helpers
// ========================================================================

/// Default policy bound to a file that only lists a later publication.
fn default_policy(fixture: &Fixture) -> TestResult<ContextAwarePolicy> {
    Ok(ContextAwarePolicy::new(
        Policy::default_policy(),
        PolicyContext::default().with_publications(fixture.handler(&[LATER_PUBLICATION_TIME])),
    )?)
}

// ========================================================================
// Fallback
// ========================================================================

#[test]
fn default_policy_falls_back_to_key_based_on_na() -> TestResult {
    let fixture = Fixture::new();
    let policy = default_policy(&fixture)?;
    let result = Verifier::default().verify_signature(&policy, fixture.key_based(), VerificationInput::default())?;
    ensure(result.is_ok(), format!("expected OK, got {:?}", result.error_code()))?;
    ensure(result.fallback_used(), "fallback must decide")?;
    let names = result.policy_results().map(|attempt| attempt.policy_name.clone()).collect::<Vec<_>>();
    ensure(
        names == ["DefaultVerificationPolicy", "KeyBasedVerificationPolicy"],
        format!("unexpected attempts {names:?}"),
    )?;
    let first = result.policy_results().next().map(|attempt| attempt.result.result_code());
    ensure(first == Some(ResultCode::Na), "primary ended in NA")?;
    ensure(result.final_policy().policy_name == "KeyBasedVerificationPolicy", "final policy")
}

#[test]
fn fail_is_final_and_skips_fallback() -> TestResult {
    let fixture = Fixture::new();
    let forged = PublicationRecord::new(PublicationData::new(PUBLICATION_TIME, sha256(b"forged")));
    let handler = Arc::new(InMemoryPublicationsHandler::new(PublicationsFile::new(
        vec![forged],
        vec![fixture.certificate()],
    )));
    let policy =
        ContextAwarePolicy::new(Policy::default_policy(), PolicyContext::default().with_publications(handler))?;
    let result =
        Verifier::default().verify_signature(&policy, fixture.published(PUBLICATION_TIME), VerificationInput::default())?;
    ensure(result.error_code() == Some(VerificationErrorCode::PublicationsFileMismatch), "PUB-05")?;
    ensure(!result.fallback_used(), "FAIL never falls back")?;
    ensure(result.policy_results().count() == 1, "one attempt")
}

#[test]
fn na_without_fallback_is_final() -> TestResult {
    let fixture = Fixture::new();
    let policy = ContextAwarePolicy::new(
        Policy::publications_file(),
        PolicyContext::default().with_publications(fixture.handler(&[LATER_PUBLICATION_TIME])),
    )?;
    let result = Verifier::default().verify_signature(&policy, fixture.key_based(), VerificationInput::default())?;
    ensure(result.result_code() == ResultCode::Na, "NA is reported as is")?;
    ensure(!result.fallback_used(), "no fallback configured")
}

#[test]
fn custom_fallback_chain_runs_in_order() -> TestResult {
    let fixture = Fixture::new();
    let chain = Policy::user_provided_publication().with_fallback(Policy::key_based())?;
    let policy = ContextAwarePolicy::new(chain, PolicyContext::default().with_publications(fixture.handler(&[])))?;
    let result = Verifier::default().verify_signature(&policy, fixture.key_based(), VerificationInput::default())?;
    ensure(result.is_ok(), format!("expected OK, got {:?}", result.error_code()))?;
    let names = result.policy_results().map(|attempt| attempt.policy_name.as_str()).collect::<Vec<_>>();
    ensure(
        names == ["UserProvidedPublicationBasedVerificationPolicy", "KeyBasedVerificationPolicy"],
        format!("unexpected attempts {names:?}"),
    )
}

// ========================================================================
// Audit
// ========================================================================

#[test]
fn completed_verification_emits_one_audit_event() -> TestResult {
    let fixture = Fixture::new();
    let policy = default_policy(&fixture)?;
    let audit = Arc::new(MemoryAuditSink::default());
    let verifier = Verifier::new(audit.clone());
    let result = verifier.verify_signature(&policy, fixture.key_based(), VerificationInput::default())?;
    let events = audit.events();
    ensure(events.len() == 1, format!("expected one event, got {}", events.len()))?;
    let event = &events[0];
    ensure(event.event == "signature_verification", "event name")?;
    ensure(event.policy == "KeyBasedVerificationPolicy", "event policy")?;
    ensure(event.result_code == ResultCode::Ok, "event result")?;
    ensure(event.error_code.is_none(), "OK has no error code")?;
    ensure(event.fallback_used, "fallback flag")?;
    ensure(event.aggregation_time == AGGREGATION_TIME, "aggregation time")?;
    ensure(event.input_hash == fixture.document.to_hex(), "input hash")?;
    let evaluated: usize = result.policy_results().map(|attempt| attempt.trace.len()).sum();
    ensure(event.leaf_count == evaluated, format!("leaf count {} vs {evaluated}", event.leaf_count))
}

#[test]
fn failing_verification_audits_error_code() -> TestResult {
    let fixture = Fixture::new();
    let audit = Arc::new(MemoryAuditSink::default());
    let verifier = Verifier::new(audit.clone());
    let ctx = support::context(
        fixture.bare(),
        VerificationInput::for_document(sha256(b"other")),
        PolicyContext::default(),
    );
    verifier.verify(&ctx, &Policy::internal())?;
    let events = audit.events();
    let code = events.first().and_then(|event| event.error_code.clone());
    ensure(code.as_deref() == Some("GEN-01"), format!("got {code:?}"))?;
    ensure(events.first().map(|event| event.result_code) == Some(ResultCode::Fail), "FAIL recorded")
}

#[test]
fn file_audit_sink_appends_json_lines() -> TestResult {
    let fixture = Fixture::new();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("audit.jsonl");
    let verifier = Verifier::new(Arc::new(FileAuditSink::new(&path)?));
    let policy = default_policy(&fixture)?;
    verifier.verify_signature(&policy, fixture.key_based(), VerificationInput::default())?;
    verifier.verify_signature(&policy, fixture.bare(), VerificationInput::default())?;
    let contents = std::fs::read_to_string(&path)?;
    let lines = contents.lines().collect::<Vec<_>>();
    ensure(lines.len() == 2, format!("expected two lines, got {}", lines.len()))?;
    for line in lines {
        let value: serde_json::Value = serde_json::from_str(line)?;
        ensure(value["event"] == "signature_verification", "event field")?;
        ensure(value["aggregation_time"] == AGGREGATION_TIME, "aggregation time field")?;
    }
    Ok(())
}

// ========================================================================
// Serialization
// ========================================================================

#[test]
fn result_serializes_with_stable_codes() -> TestResult {
    let fixture = Fixture::new();
    let ctx = support::context(
        fixture.bare(),
        VerificationInput::for_document(sha256(b"other")),
        PolicyContext::default(),
    );
    let result = Verifier::default().verify(&ctx, &Policy::internal())?;
    let value = serde_json::to_value(&result)?;
    ensure(value["last"]["policy_name"] == "InternalVerificationPolicy", "policy name")?;
    ensure(value["last"]["result"]["result_code"] == "FAIL", "result code")?;
    ensure(value["last"]["result"]["error_code"] == "GEN-01", "error code")?;
    ensure(value["last"]["result"]["rule_name"] == "DocumentHashVerificationRule", "rule name")
}
