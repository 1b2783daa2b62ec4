// crates/ksi-core/src/runtime/context.rs
// ============================================================================
// Module: Verification Context
// Description: Per-run view over a signature, caller inputs, and collaborators.
// Purpose: Give rules read-only access plus memoized collaborator fetches.
// Dependencies: crate::{core, interfaces, runtime::policy}, thiserror
// ============================================================================

//! ## Overview
//! A context is built for one verification run and dropped afterwards. It owns
//! the signature and caller inputs, borrows nothing, and caches extended
//! calendar chains by target publication time so each distinct target reaches
//! the extender at most once.
//!
//! The cache uses interior mutability without locking; a context is `!Sync`
//! and must not be shared between concurrent runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cell::RefCell;
use std::collections::HashMap;

use thiserror::Error;

use crate::core::AggregationHashChain;
use crate::core::CalendarAuthenticationRecord;
use crate::core::CalendarHashChain;
use crate::core::CertificateRecord;
use crate::core::ChainError;
use crate::core::DataHash;
use crate::core::HashError;
use crate::core::KsiSignature;
use crate::core::LegacyTimestampRecord;
use crate::core::PublicationData;
use crate::core::PublicationRecord;
use crate::core::PublicationsFile;
use crate::core::TlvError;
use crate::interfaces::ProtocolError;
use crate::runtime::policy::PolicyContext;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Operational errors that abort a verification run.
///
/// These never describe the signature's validity; `NA` and `FAIL` are
/// reported as results instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// A collaborator call failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// A hash could not be computed.
    #[error(transparent)]
    Hash(#[from] HashError),
    /// An aggregation chain could not be computed.
    #[error(transparent)]
    Chain(#[from] ChainError),
    /// A structure could not be encoded.
    #[error(transparent)]
    Encoding(#[from] TlvError),
    /// A rule needed a collaborator that was not supplied.
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),
    /// An extended chain was requested while extending is not allowed.
    #[error("extending is not allowed in this context")]
    ExtendingNotAllowed,
}

// ============================================================================
// SECTION: Inputs
// ============================================================================

/// Caller-supplied inputs for one verification run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationInput {
    /// Hash of the document being verified.
    pub document_hash: Option<DataHash>,
    /// Local aggregation level the document hash was computed at.
    pub input_level: u8,
    /// Trusted publication supplied by the caller.
    pub user_publication: Option<PublicationData>,
}

impl VerificationInput {
    /// Creates inputs for verifying a document hash.
    #[must_use]
    pub fn for_document(document_hash: DataHash) -> Self {
        Self {
            document_hash: Some(document_hash),
            ..Self::default()
        }
    }
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Per-run verification context.
pub struct VerificationContext {
    /// Signature under verification.
    signature: KsiSignature,
    /// Caller inputs.
    input: VerificationInput,
    /// Bound collaborators and permissions.
    collaborators: PolicyContext,
    /// Extended chains keyed by target publication time (`None` is the head).
    extended_chains: RefCell<HashMap<Option<u64>, CalendarHashChain>>,
}

impl VerificationContext {
    /// Creates a context.
    #[must_use]
    pub fn new(signature: KsiSignature, input: VerificationInput, collaborators: PolicyContext) -> Self {
        Self {
            signature,
            input,
            collaborators,
            extended_chains: RefCell::new(HashMap::new()),
        }
    }

    /// Returns the signature.
    #[must_use]
    pub const fn signature(&self) -> &KsiSignature {
        &self.signature
    }

    /// Returns the caller inputs.
    #[must_use]
    pub const fn input(&self) -> &VerificationInput {
        &self.input
    }

    /// Returns the document hash.
    #[must_use]
    pub const fn document_hash(&self) -> Option<&DataHash> {
        self.input.document_hash.as_ref()
    }

    /// Returns the caller's local aggregation level.
    #[must_use]
    pub const fn input_level(&self) -> u8 {
        self.input.input_level
    }

    /// Returns the user-supplied publication.
    #[must_use]
    pub const fn user_publication(&self) -> Option<&PublicationData> {
        self.input.user_publication.as_ref()
    }

    /// Returns true if rules may call the extender.
    #[must_use]
    pub const fn is_extending_allowed(&self) -> bool {
        self.collaborators.extending_allowed
    }

    /// Returns the aggregation chains.
    #[must_use]
    pub fn aggregation_chains(&self) -> &[AggregationHashChain] {
        self.signature.aggregation_chains()
    }

    /// Returns the chain nearest the document.
    #[must_use]
    pub fn first_aggregation_chain(&self) -> &AggregationHashChain {
        self.signature.first_aggregation_chain()
    }

    /// Returns the chain bound to the calendar.
    #[must_use]
    pub fn last_aggregation_chain(&self) -> &AggregationHashChain {
        self.signature.last_aggregation_chain()
    }

    /// Returns the signing time.
    #[must_use]
    pub fn aggregation_time(&self) -> u64 {
        self.signature.aggregation_time()
    }

    /// Returns the calendar chain, if any.
    #[must_use]
    pub const fn calendar_hash_chain(&self) -> Option<&CalendarHashChain> {
        self.signature.calendar_hash_chain()
    }

    /// Returns the calendar authentication record, if any.
    #[must_use]
    pub const fn calendar_authentication_record(&self) -> Option<&CalendarAuthenticationRecord> {
        self.signature.calendar_authentication_record()
    }

    /// Returns the publication record, if any.
    #[must_use]
    pub const fn publication_record(&self) -> Option<&PublicationRecord> {
        self.signature.publication_record()
    }

    /// Returns the legacy record, if any.
    #[must_use]
    pub const fn legacy_record(&self) -> Option<&LegacyTimestampRecord> {
        self.signature.legacy_record()
    }

    /// Returns the calendar chain extended to `publication_time` (or to the
    /// calendar head for `None`), asking the extender only on the first
    /// request for each target.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError`] when extending is not allowed, no
    /// extender is bound, or the extender fails.
    pub fn get_extended_calendar_hash_chain(
        &self,
        publication_time: Option<u64>,
    ) -> Result<CalendarHashChain, VerificationError> {
        if !self.collaborators.extending_allowed {
            return Err(VerificationError::ExtendingNotAllowed);
        }
        let cached = self.extended_chains.borrow().get(&publication_time).cloned();
        if let Some(chain) = cached {
            return Ok(chain);
        }
        let extender =
            self.collaborators.extender.as_ref().ok_or(VerificationError::MissingCollaborator("extender"))?;
        let chain = extender.extend(self.aggregation_time(), publication_time)?;
        self.extended_chains.borrow_mut().insert(publication_time, chain.clone());
        Ok(chain)
    }

    /// Returns the publications file.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError`] when no handler is bound or it fails.
    pub fn get_publications_file(&self) -> Result<PublicationsFile, VerificationError> {
        let handler = self
            .collaborators
            .publications
            .as_ref()
            .ok_or(VerificationError::MissingCollaborator("publications handler"))?;
        Ok(handler.publications_file()?)
    }

    /// Finds a certificate record through the publications handler.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError`] when no handler is bound or it fails.
    pub fn find_certificate(&self, id: &[u8]) -> Result<Option<CertificateRecord>, VerificationError> {
        let handler = self
            .collaborators
            .publications
            .as_ref()
            .ok_or(VerificationError::MissingCollaborator("publications handler"))?;
        Ok(handler.find_certificate(id)?)
    }
}
