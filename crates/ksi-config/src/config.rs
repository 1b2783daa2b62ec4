// crates/ksi-config/src/config.rs
// ============================================================================
// Module: KSI Verifier Configuration
// Description: Configuration loading, validation, and runtime wiring.
// Purpose: Provide strict, fail-closed verifier config parsing with hard limits.
// Dependencies: ksi-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! It selects the verification policy, an optional fallback policy, the
//! extending permission, the rule-tree depth limit, and the audit sink.
//! Invalid configuration fails closed: every policy named here is built and
//! validated before the config is returned.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use ksi_core::AuditSink;
use ksi_core::ContextAwarePolicy;
use ksi_core::Extender;
use ksi_core::FileAuditSink;
use ksi_core::NoopAuditSink;
use ksi_core::Policy;
use ksi_core::PolicyContext;
use ksi_core::PolicyKind;
use ksi_core::PublicationsHandler;
use ksi_core::StderrAuditSink;
use ksi_core::Verifier;
use ksi_core::runtime::DEFAULT_MAX_RULE_DEPTH;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits and Defaults
// ============================================================================

/// Default config file name.
pub(crate) const DEFAULT_CONFIG_NAME: &str = "ksi-verifier.toml";
/// Environment variable for config path.
pub(crate) const CONFIG_ENV_VAR: &str = "KSI_VERIFIER_CONFIG";
/// Maximum config file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Smallest accepted rule-tree depth limit.
pub const MIN_RULE_DEPTH: usize = 1;
/// Largest accepted rule-tree depth limit.
pub const MAX_RULE_DEPTH: usize = 64;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error while reading config or opening an audit log.
    #[error("config io error: {0}")]
    Io(String),
    /// Parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Validation error.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Verifier configuration loaded from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KsiConfig {
    /// Policy selection and limits.
    #[serde(default)]
    pub verification: VerificationConfig,
    /// Audit sink selection.
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Policy selection and limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerificationConfig {
    /// Primary policy.
    #[serde(default = "default_policy_kind")]
    pub policy: PolicyKind,
    /// Policy tried when the primary policy is inconclusive.
    #[serde(default)]
    pub fallback_policy: Option<PolicyKind>,
    /// Whether extender calls are permitted.
    #[serde(default)]
    pub extending_allowed: bool,
    /// Maximum rule-tree depth accepted for every policy in the chain.
    #[serde(default = "default_max_rule_depth")]
    pub max_rule_depth: usize,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            policy: default_policy_kind(),
            fallback_policy: None,
            extending_allowed: false,
            max_rule_depth: default_max_rule_depth(),
        }
    }
}

impl VerificationConfig {
    /// Validates the policy selection and limits.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_RULE_DEPTH ..= MAX_RULE_DEPTH).contains(&self.max_rule_depth) {
            return Err(ConfigError::Invalid(format!(
                "verification.max_rule_depth must be between {MIN_RULE_DEPTH} and {MAX_RULE_DEPTH}"
            )));
        }
        if let Some(fallback) = self.fallback_policy {
            if fallback == self.policy {
                return Err(ConfigError::Invalid(
                    "verification.fallback_policy must differ from verification.policy".to_string(),
                ));
            }
            if fallback == PolicyKind::UserPublication {
                return Err(ConfigError::Invalid(
                    "verification.fallback_policy cannot be user_publication".to_string(),
                ));
            }
        }
        self.build_policy().map(|_| ())
    }

    /// Builds the configured policy chain and validates it against the depth
    /// limit.
    fn build_policy(&self) -> Result<Policy, ConfigError> {
        let mut policy = self.policy.build();
        if let Some(fallback) = self.fallback_policy {
            policy = policy.with_fallback(fallback.build()).map_err(invalid_policy)?;
        }
        policy.validate(self.max_rule_depth).map_err(invalid_policy)?;
        Ok(policy)
    }
}

/// Audit sink selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Whether verification events are recorded.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// JSON-lines log file; stderr when absent.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl AuditConfig {
    /// Validates the audit log path.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("audit.path", path)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl KsiConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: the explicit path, then `KSI_VERIFIER_CONFIG`, then
    /// `ksi-verifier.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let config: Self = toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.verification.validate()?;
        self.audit.validate()
    }
}

// ============================================================================
// SECTION: Wiring
// ============================================================================

impl KsiConfig {
    /// Builds the configured policy with its fallback attached.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the chain is rejected.
    pub fn build_policy(&self) -> Result<Policy, ConfigError> {
        self.verification.build_policy()
    }

    /// Builds a policy context from the given collaborators and the
    /// configured extending permission.
    #[must_use]
    pub fn policy_context(
        &self,
        extender: Option<Arc<dyn Extender>>,
        publications: Option<Arc<dyn PublicationsHandler>>,
    ) -> PolicyContext {
        let mut context = PolicyContext::default().allow_extending(self.verification.extending_allowed);
        if let Some(extender) = extender {
            context = context.with_extender(extender);
        }
        if let Some(publications) = publications {
            context = context.with_publications(publications);
        }
        context
    }

    /// Binds the configured policy to a context built from the collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the policy cannot run with the
    /// supplied collaborators.
    pub fn bind_policy(
        &self,
        extender: Option<Arc<dyn Extender>>,
        publications: Option<Arc<dyn PublicationsHandler>>,
    ) -> Result<ContextAwarePolicy, ConfigError> {
        let policy = self.build_policy()?;
        ContextAwarePolicy::new(policy, self.policy_context(extender, publications)).map_err(invalid_policy)
    }

    /// Builds the configured audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the audit log cannot be opened.
    pub fn build_audit_sink(&self) -> Result<Arc<dyn AuditSink>, ConfigError> {
        if !self.audit.enabled {
            return Ok(Arc::new(NoopAuditSink));
        }
        match &self.audit.path {
            Some(path) => {
                let sink = FileAuditSink::new(Path::new(path.trim()))
                    .map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(Arc::new(sink))
            }
            None => Ok(Arc::new(StderrAuditSink)),
        }
    }

    /// Builds a verifier recording to the configured audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the audit log cannot be opened.
    pub fn build_verifier(&self) -> Result<Verifier, ConfigError> {
        Ok(Verifier::new(self.build_audit_sink()?))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Default primary policy.
const fn default_policy_kind() -> PolicyKind {
    PolicyKind::Default
}

/// Default rule-tree depth limit.
const fn default_max_rule_depth() -> usize {
    DEFAULT_MAX_RULE_DEPTH
}

/// Audit is on unless disabled.
const fn default_audit_enabled() -> bool {
    true
}

/// Maps a policy construction error to a validation error.
fn invalid_policy(error: ksi_core::PolicyError) -> ConfigError {
    ConfigError::Invalid(error.to_string())
}

/// Resolves the config path from CLI or environment.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string from the config body.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = KsiConfig::default();
        assert!(config.validate().is_ok(), "defaults must validate");
        assert_eq!(config.verification.policy, PolicyKind::Default);
        assert_eq!(config.verification.max_rule_depth, DEFAULT_MAX_RULE_DEPTH);
        assert!(!config.verification.extending_allowed);
        assert!(config.audit.enabled);
    }

    #[test]
    fn resolve_path_prefers_explicit_path() {
        let resolved = resolve_path(Some(Path::new("custom.toml"))).unwrap();
        assert_eq!(resolved, PathBuf::from("custom.toml"));
    }

    #[test]
    fn validate_path_accepts_default_name() {
        assert!(validate_path(Path::new(DEFAULT_CONFIG_NAME)).is_ok());
    }

    #[test]
    fn validate_path_string_rejects_whitespace_only() {
        let result = validate_path_string("audit.path", "   ");
        assert!(result.unwrap_err().to_string().contains("non-empty"));
    }

    #[test]
    fn validate_path_string_rejects_long_component() {
        let value = format!("logs/{}", "a".repeat(MAX_PATH_COMPONENT_LENGTH + 1));
        let result = validate_path_string("audit.path", &value);
        assert!(result.unwrap_err().to_string().contains("component too long"));
    }

    #[test]
    fn depth_bounds_are_inclusive() {
        let mut verification = VerificationConfig {
            policy: PolicyKind::Internal,
            max_rule_depth: MAX_RULE_DEPTH,
            ..VerificationConfig::default()
        };
        assert!(verification.validate().is_ok());
        verification.max_rule_depth = MAX_RULE_DEPTH + 1;
        assert!(verification.validate().is_err());
        verification.max_rule_depth = 0;
        assert!(verification.validate().is_err());
    }

    #[test]
    fn disabled_audit_builds_noop_sink() {
        let config = KsiConfig {
            audit: AuditConfig {
                enabled: false,
                path: Some("unused.jsonl".to_string()),
            },
            ..KsiConfig::default()
        };
        assert!(config.build_audit_sink().is_ok());
    }
}
