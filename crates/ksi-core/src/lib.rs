// crates/ksi-core/src/lib.rs
// ============================================================================
// Module: KSI Core Library
// Description: Public API surface for keyless signature verification.
// Purpose: Expose the signature data model, collaborator interfaces, and the
//          verification runtime.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! KSI core verifies already-parsed keyless signatures: hash chains from a
//! document up to a calendar round, optionally anchored to a signed calendar
//! root or a published one. Verification is policy driven and reports
//! three-valued results with stable error codes. Wire formats and network
//! clients stay outside this crate behind the [`Extender`] and
//! [`PublicationsHandler`] interfaces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::Extender;
pub use interfaces::ProtocolError;
pub use interfaces::PublicationsHandler;
pub use ksi_rule_logic::ResultCode;
pub use ksi_rule_logic::RuleResult;
pub use runtime::AuditSink;
pub use runtime::ContextAwarePolicy;
pub use runtime::ExtensionTarget;
pub use runtime::FileAuditSink;
pub use runtime::InMemoryPublicationsHandler;
pub use runtime::MemoryAuditSink;
pub use runtime::NoopAuditSink;
pub use runtime::Policy;
pub use runtime::PolicyContext;
pub use runtime::PolicyError;
pub use runtime::PolicyKind;
pub use runtime::PolicyVerificationResult;
pub use runtime::StderrAuditSink;
pub use runtime::VerificationAuditEvent;
pub use runtime::VerificationContext;
pub use runtime::VerificationError;
pub use runtime::VerificationInput;
pub use runtime::VerificationResult;
pub use runtime::VerificationRule;
pub use runtime::Verifier;
