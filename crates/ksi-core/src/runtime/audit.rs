// crates/ksi-core/src/runtime/audit.rs
// ============================================================================
// Module: Verification Audit Logging
// Description: Structured audit events for completed verifications.
// Purpose: Emit one JSON line per verification without a logging framework.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The verifier hands every completed verification to an [`AuditSink`].
//! Events carry identifiers and outcomes only: the signature's input hash is
//! logged as a hex imprint and document hashes are never recorded.
//!
//! Sinks swallow their own I/O failures; an unwritable audit log never
//! changes a verification outcome.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use ksi_rule_logic::ResultCode;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Verification audit event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Name of the policy that produced the final result.
    pub policy: String,
    /// Final result code.
    pub result_code: ResultCode,
    /// Stable error code for non-OK results.
    pub error_code: Option<String>,
    /// Rule (or joined rule names) that decided the result.
    pub rule_name: String,
    /// Signature aggregation time (unix seconds).
    pub aggregation_time: u64,
    /// Signature input hash as a hex imprint.
    pub input_hash: String,
    /// Whether a fallback policy produced the final result.
    pub fallback_used: bool,
    /// Number of leaf rules evaluated across all attempted policies.
    pub leaf_count: usize,
}

/// Inputs required to construct a verification audit event.
pub struct VerificationAuditEventParams {
    /// Name of the policy that produced the final result.
    pub policy: String,
    /// Final result code.
    pub result_code: ResultCode,
    /// Stable error code for non-OK results.
    pub error_code: Option<String>,
    /// Rule (or joined rule names) that decided the result.
    pub rule_name: String,
    /// Signature aggregation time (unix seconds).
    pub aggregation_time: u64,
    /// Signature input hash as a hex imprint.
    pub input_hash: String,
    /// Whether a fallback policy produced the final result.
    pub fallback_used: bool,
    /// Number of leaf rules evaluated across all attempted policies.
    pub leaf_count: usize,
}

impl VerificationAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: VerificationAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "signature_verification",
            timestamp_ms,
            policy: params.policy,
            result_code: params.result_code,
            error_code: params.error_code,
            rule_name: params.rule_name,
            aggregation_time: params.aggregation_time,
            input_hash: params.input_hash,
            fallback_used: params.fallback_used,
            leaf_count: params.leaf_count,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for verification events.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &VerificationAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &VerificationAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &VerificationAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &VerificationAuditEvent) {}
}

/// Audit sink that keeps events in memory.
#[derive(Default)]
pub struct MemoryAuditSink {
    /// Recorded events in order.
    events: Mutex<Vec<VerificationAuditEvent>>,
}

impl MemoryAuditSink {
    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<VerificationAuditEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &VerificationAuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
