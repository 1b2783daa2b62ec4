// crates/ksi-core/src/interfaces/mod.rs
// ============================================================================
// Module: KSI Collaborator Interfaces
// Description: Contracts for the extender and publications collaborators.
// Purpose: Keep network clients and trust-file handling outside the verifier.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Verification consumes two collaborators: an extender that returns calendar
//! chains reaching a later publication, and a publications handler that
//! supplies the trusted publications file. Both are synchronous and either
//! return already-validated data or a [`ProtocolError`]; they never report
//! verification outcomes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::CalendarHashChain;
use crate::core::CertificateRecord;
use crate::core::PublicationsFile;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Collaborator failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Extender reported an error.
    #[error("extender error: {0}")]
    Extender(String),
    /// Publications handler reported an error.
    #[error("publications file error: {0}")]
    Publications(String),
    /// Collaborator could not be reached.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// SECTION: Extender
// ============================================================================

/// Source of extended calendar hash chains.
pub trait Extender: Send + Sync {
    /// Returns a calendar chain from round `aggregation_time` to the
    /// publication at `publication_time`, or to the calendar head when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] when the chain cannot be obtained.
    fn extend(
        &self,
        aggregation_time: u64,
        publication_time: Option<u64>,
    ) -> Result<CalendarHashChain, ProtocolError>;
}

// ============================================================================
// SECTION: Publications Handler
// ============================================================================

/// Source of the trusted publications file.
pub trait PublicationsHandler: Send + Sync {
    /// Returns the publications file.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] when the file cannot be obtained.
    fn publications_file(&self) -> Result<PublicationsFile, ProtocolError>;

    /// Finds a certificate record by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] when the publications file cannot be
    /// obtained.
    fn find_certificate(&self, id: &[u8]) -> Result<Option<CertificateRecord>, ProtocolError> {
        Ok(self.publications_file()?.find_certificate(id).cloned())
    }
}
