// crates/ksi-core/src/runtime/mod.rs
// ============================================================================
// Module: KSI Verification Runtime
// Description: Verification context, rules, policies, verifier, and audit.
// Purpose: Decide whether a parsed signature is sound and anchored to a
//          trusted root.
// Dependencies: crate::{core, interfaces}, ksi-rule-logic
// ============================================================================

//! ## Overview
//! Runtime modules turn the signature data model into verification results.
//! Rules read a [`VerificationContext`], policies combine rules into trees,
//! and the [`Verifier`] evaluates policies, follows fallbacks on `NA`, and
//! records audit events. All callers go through the verifier.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod context;
pub mod policy;
pub mod publications;
pub mod rules;
pub mod verifier;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::MemoryAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use audit::VerificationAuditEvent;
pub use context::VerificationContext;
pub use context::VerificationError;
pub use context::VerificationInput;
pub use policy::ContextAwarePolicy;
pub use policy::DEFAULT_MAX_RULE_DEPTH;
pub use policy::Policy;
pub use policy::PolicyContext;
pub use policy::PolicyError;
pub use policy::PolicyKind;
pub use policy::PolicyRequirements;
pub use publications::InMemoryPublicationsHandler;
pub use rules::ExtensionTarget;
pub use rules::VerificationRule;
pub use verifier::PolicyVerificationResult;
pub use verifier::VerificationResult;
pub use verifier::Verifier;
