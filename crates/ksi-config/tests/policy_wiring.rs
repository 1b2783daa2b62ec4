//! Policy wiring tests for ksi-config.
// crates/ksi-config/tests/policy_wiring.rs
// =============================================================================
// Module: Policy Wiring Tests
// Description: Validate policy chain rules and collaborator binding.
// Purpose: Ensure configured policies are rejected before verification when
//          they cannot run.
// =============================================================================

#![allow(clippy::use_debug, reason = "Test failure messages format values with Debug.")]

use std::sync::Arc;

use ksi_config::ConfigError;
use ksi_config::KsiConfig;
use ksi_core::CalendarHashChain;
use ksi_core::Extender;
use ksi_core::InMemoryPublicationsHandler;
use ksi_core::ProtocolError;
use ksi_core::PublicationsFile;
use ksi_core::PublicationsHandler;

/// Test outcome.
type TestResult = Result<(), String>;

/// Extender that is never reachable.
struct UnreachableExtender;

impl Extender for UnreachableExtender {
    fn extend(&self, _: u64, _: Option<u64>) -> Result<CalendarHashChain, ProtocolError> {
        Err(ProtocolError::Unavailable("offline".to_string()))
    }
}

/// Extender collaborator.
fn extender() -> Option<Arc<dyn Extender>> {
    Some(Arc::new(UnreachableExtender))
}

/// Publications handler over an empty file.
fn publications() -> Option<Arc<dyn PublicationsHandler>> {
    Some(Arc::new(InMemoryPublicationsHandler::new(PublicationsFile::new(Vec::new(), Vec::new()))))
}

/// Parses config text, stringifying errors.
fn parse(content: &str) -> Result<KsiConfig, String> {
    KsiConfig::from_toml(content).map_err(|err| err.to_string())
}

/// Expects an error whose message contains `needle`.
fn expect_error<T>(result: Result<T, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) if error.to_string().contains(needle) => Ok(()),
        Err(error) => Err(format!("error {error} did not contain {needle}")),
        Ok(_) => Err(format!("expected error containing {needle}")),
    }
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn fallback_equal_to_primary_is_rejected() -> TestResult {
    expect_error(
        KsiConfig::from_toml("[verification]\npolicy = \"key_based\"\nfallback_policy = \"key_based\"\n"),
        "must differ",
    )
}

#[test]
fn user_publication_fallback_is_rejected() -> TestResult {
    expect_error(
        KsiConfig::from_toml("[verification]\npolicy = \"internal\"\nfallback_policy = \"user_publication\"\n"),
        "cannot be user_publication",
    )
}

#[test]
fn duplicate_policy_in_chain_is_rejected() -> TestResult {
    expect_error(
        KsiConfig::from_toml("[verification]\npolicy = \"default\"\nfallback_policy = \"key_based\"\n"),
        "more than once",
    )
}

#[test]
fn depth_limit_below_built_in_tree_is_rejected() -> TestResult {
    expect_error(
        KsiConfig::from_toml("[verification]\npolicy = \"internal\"\nmax_rule_depth = 2\n"),
        "invalid rule tree",
    )
}

#[test]
fn depth_limit_out_of_range_is_rejected() -> TestResult {
    expect_error(KsiConfig::from_toml("[verification]\nmax_rule_depth = 65\n"), "max_rule_depth")?;
    expect_error(KsiConfig::from_toml("[verification]\nmax_rule_depth = 0\n"), "max_rule_depth")
}

#[test]
fn empty_audit_path_is_rejected() -> TestResult {
    expect_error(KsiConfig::from_toml("[audit]\npath = \"  \"\n"), "audit.path must be non-empty")
}

// =============================================================================
// Binding
// =============================================================================

#[test]
fn fallback_is_attached_after_primary() -> TestResult {
    let config = parse("[verification]\npolicy = \"publications_file\"\nfallback_policy = \"internal\"\n")?;
    let policy = config.build_policy().map_err(|err| err.to_string())?;
    let names = policy.chain().map(|policy| policy.name().to_string()).collect::<Vec<_>>();
    if names != ["PublicationsFileBasedVerificationPolicy", "InternalVerificationPolicy"] {
        return Err(format!("unexpected chain {names:?}"));
    }
    Ok(())
}

#[test]
fn default_policy_needs_a_publications_handler() -> TestResult {
    let config = KsiConfig::default();
    expect_error(config.bind_policy(None, None), "requires a publications handler")?;
    config.bind_policy(None, publications()).map(|_| ()).map_err(|err| err.to_string())
}

#[test]
fn calendar_policy_needs_extending_allowed() -> TestResult {
    let config = parse("[verification]\npolicy = \"calendar\"\n")?;
    expect_error(config.bind_policy(extender(), None), "requires extending to be allowed")
}

#[test]
fn calendar_policy_needs_an_extender_when_allowed() -> TestResult {
    let config = parse("[verification]\npolicy = \"calendar\"\nextending_allowed = true\n")?;
    expect_error(config.bind_policy(None, None), "requires an extender")?;
    config.bind_policy(extender(), None).map(|_| ()).map_err(|err| err.to_string())
}

#[test]
fn policy_context_carries_extending_permission() -> TestResult {
    let config = parse("[verification]\npolicy = \"internal\"\nextending_allowed = true\n")?;
    let bound = config.bind_policy(extender(), publications()).map_err(|err| err.to_string())?;
    if !bound.context().extending_allowed {
        return Err("extending permission not applied".to_string());
    }
    Ok(())
}

// =============================================================================
// Audit
// =============================================================================

#[test]
fn file_audit_path_is_created() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("audit.jsonl");
    let content = format!("[audit]\npath = {:?}\n", path.to_string_lossy());
    let config = parse(&content)?;
    config.build_verifier().map_err(|err| err.to_string())?;
    if !path.exists() {
        return Err("audit log not created".to_string());
    }
    Ok(())
}

#[test]
fn unopenable_audit_path_is_an_io_error() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("missing").join("audit.jsonl");
    let content = format!("[audit]\npath = {:?}\n", path.to_string_lossy());
    let config = parse(&content)?;
    expect_error(config.build_audit_sink(), "config io error")
}
