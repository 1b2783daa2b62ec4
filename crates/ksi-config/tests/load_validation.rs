//! Config load validation tests for ksi-config.
// crates/ksi-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding, fields).
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;

use ksi_config::ConfigError;
use ksi_config::KsiConfig;
use ksi_core::PolicyKind;
use tempfile::NamedTempFile;

/// Test outcome.
type TestResult = Result<(), String>;

/// Expects a load error whose message contains `needle`.
fn assert_invalid(result: Result<KsiConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

/// Writes `content` to a temporary config file.
fn write_config(content: &[u8]) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content).map_err(|err| err.to_string())?;
    Ok(file)
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    let path = Path::new(&long_path);
    assert_invalid(KsiConfig::load(Some(path)), "config path exceeds max length")
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    let path = Path::new(&long_component);
    assert_invalid(KsiConfig::load(Some(path)), "config path component too long")
}

#[test]
fn load_rejects_missing_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    assert_invalid(KsiConfig::load(Some(&dir.path().join("absent.toml"))), "config io error")
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let file = write_config(&vec![b'#'; 1_048_577])?;
    assert_invalid(KsiConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let file = write_config(&[0xFF, 0xFE, 0xFF])?;
    assert_invalid(KsiConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_rejects_unknown_fields() -> TestResult {
    let file = write_config(b"[verification]\npolicy = \"internal\"\nstrict = true\n")?;
    assert_invalid(KsiConfig::load(Some(file.path())), "config parse error")
}

#[test]
fn load_rejects_unknown_policy() -> TestResult {
    let file = write_config(b"[verification]\npolicy = \"trust_me\"\n")?;
    assert_invalid(KsiConfig::load(Some(file.path())), "config parse error")
}

#[test]
fn load_accepts_empty_file_with_defaults() -> TestResult {
    let file = write_config(b"")?;
    let config = KsiConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config.verification.policy != PolicyKind::Default {
        return Err("empty config must select the default policy".to_string());
    }
    if config.verification.fallback_policy.is_some() || config.verification.extending_allowed {
        return Err("empty config must not add a fallback or allow extending".to_string());
    }
    Ok(())
}

#[test]
fn load_accepts_full_config() -> TestResult {
    let file = write_config(
        b"[verification]\n\
          policy = \"publications_file\"\n\
          fallback_policy = \"key_based\"\n\
          extending_allowed = true\n\
          max_rule_depth = 12\n\
          \n\
          [audit]\n\
          enabled = false\n",
    )?;
    let config = KsiConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config.verification.fallback_policy != Some(PolicyKind::KeyBased) {
        return Err("fallback policy not parsed".to_string());
    }
    if !config.verification.extending_allowed || config.verification.max_rule_depth != 12 {
        return Err("verification settings not parsed".to_string());
    }
    if config.audit.enabled {
        return Err("audit flag not parsed".to_string());
    }
    Ok(())
}
