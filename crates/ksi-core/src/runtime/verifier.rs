// crates/ksi-core/src/runtime/verifier.rs
// ============================================================================
// Module: Signature Verifier
// Description: Policy evaluation with fallbacks, traces, and audit events.
// Purpose: Execute a policy over one verification context and report the
//          decisive result of every attempted policy.
// Dependencies: crate::{core, runtime}, ksi-rule-logic, serde
// ============================================================================

//! ## Overview
//! The verifier is the single evaluation path for policies. It evaluates the
//! primary policy tree once; an `NA` result moves on to the fallback policy,
//! while `OK` and `FAIL` are final. Every attempted policy keeps its decisive
//! result and the ordered results of the leaves it visited.
//!
//! One audit event is recorded per completed verification. Operational
//! errors abort the run, are returned to the caller, and are not audited.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use ksi_rule_logic::RecordingTrace;
use ksi_rule_logic::ResultCode;
use ksi_rule_logic::RuleResult;
use serde::Serialize;

use crate::core::KsiSignature;
use crate::core::VerificationErrorCode;
use crate::runtime::audit::AuditSink;
use crate::runtime::audit::NoopAuditSink;
use crate::runtime::audit::VerificationAuditEvent;
use crate::runtime::audit::VerificationAuditEventParams;
use crate::runtime::context::VerificationContext;
use crate::runtime::context::VerificationError;
use crate::runtime::context::VerificationInput;
use crate::runtime::policy::ContextAwarePolicy;
use crate::runtime::policy::Policy;

// ============================================================================
// SECTION: Results
// ============================================================================

/// Result of evaluating one policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyVerificationResult {
    /// Evaluated policy name.
    pub policy_name: String,
    /// Decisive result of the policy tree.
    pub result: RuleResult<VerificationErrorCode>,
    /// Leaf results in evaluation order.
    pub trace: Vec<RuleResult<VerificationErrorCode>>,
}

/// Outcome of a verification, including every attempted policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    /// Policies that ended in `NA` before the final one, in order.
    attempts: Vec<PolicyVerificationResult>,
    /// Policy whose result is final.
    last: PolicyVerificationResult,
}

impl VerificationResult {
    /// Returns true if the final result is `OK`.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.last.result.is_ok()
    }

    /// Returns the final result code.
    #[must_use]
    pub const fn result_code(&self) -> ResultCode {
        self.last.result.result_code()
    }

    /// Returns the final error code.
    #[must_use]
    pub fn error_code(&self) -> Option<VerificationErrorCode> {
        self.last.result.error_code().copied()
    }

    /// Returns the name of the rule that decided the final result.
    #[must_use]
    pub fn rule_name(&self) -> &str {
        self.last.result.rule_name()
    }

    /// Iterates over every attempted policy result in evaluation order.
    pub fn policy_results(&self) -> impl Iterator<Item = &PolicyVerificationResult> {
        self.attempts.iter().chain(std::iter::once(&self.last))
    }

    /// Returns the result of the policy that decided the outcome.
    #[must_use]
    pub const fn final_policy(&self) -> &PolicyVerificationResult {
        &self.last
    }

    /// Returns true if a fallback policy decided the outcome.
    #[must_use]
    pub fn fallback_used(&self) -> bool {
        !self.attempts.is_empty()
    }

    /// Returns the final policy's leaf trace.
    #[must_use]
    pub fn trace(&self) -> &[RuleResult<VerificationErrorCode>] {
        &self.last.trace
    }
}

// ============================================================================
// SECTION: Verifier
// ============================================================================

/// Evaluates policies and records audit events.
pub struct Verifier {
    /// Audit sink for completed verifications.
    audit: Arc<dyn AuditSink>,
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new(Arc::new(NoopAuditSink))
    }
}

impl Verifier {
    /// Creates a verifier with the given audit sink.
    #[must_use]
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self {
            audit,
        }
    }

    /// Verifies the context's signature against `policy` and its fallbacks.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError`] when a rule cannot be evaluated.
    pub fn verify(
        &self,
        ctx: &VerificationContext,
        policy: &Policy,
    ) -> Result<VerificationResult, VerificationError> {
        let mut attempts = Vec::new();
        let mut current = policy;
        loop {
            let mut trace = RecordingTrace::default();
            let result = current.rule().verify_with_trace(ctx, &mut trace)?;
            let attempt = PolicyVerificationResult {
                policy_name: current.name().to_string(),
                result,
                trace: trace.into_entries(),
            };
            match (attempt.result.result_code(), current.fallback()) {
                (ResultCode::Na, Some(fallback)) => {
                    attempts.push(attempt);
                    current = fallback;
                }
                _ => {
                    let outcome = VerificationResult {
                        attempts,
                        last: attempt,
                    };
                    self.record(ctx, &outcome);
                    return Ok(outcome);
                }
            }
        }
    }

    /// Builds a context from a bound policy and verifies it.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError`] when a rule cannot be evaluated.
    pub fn verify_signature(
        &self,
        policy: &ContextAwarePolicy,
        signature: KsiSignature,
        input: VerificationInput,
    ) -> Result<VerificationResult, VerificationError> {
        let ctx = policy.context_for(signature, input);
        self.verify(&ctx, policy.policy())
    }

    /// Emits the audit event for a completed verification.
    fn record(&self, ctx: &VerificationContext, outcome: &VerificationResult) {
        let last = outcome.final_policy();
        let event = VerificationAuditEvent::new(VerificationAuditEventParams {
            policy: last.policy_name.clone(),
            result_code: outcome.result_code(),
            error_code: outcome.error_code().map(|code| code.code().to_string()),
            rule_name: outcome.rule_name().to_string(),
            aggregation_time: ctx.aggregation_time(),
            input_hash: ctx.signature().input_hash().to_hex(),
            fallback_used: outcome.fallback_used(),
            leaf_count: outcome.policy_results().map(|attempt| attempt.trace.len()).sum(),
        });
        self.audit.record(&event);
    }
}
