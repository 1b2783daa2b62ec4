// crates/ksi-core/src/core/signature.rs
// ============================================================================
// Module: KSI Signatures
// Description: Parsed signature value and its calendar authentication record.
// Purpose: Hold everything verification reads about one signature.
// Dependencies: crate::core::{aggregation, calendar, legacy, publication}, thiserror
// ============================================================================

//! ## Overview
//! A signature is immutable once built. It holds aggregation chains (index 0
//! nearest the document), an optional calendar chain, an optional trust anchor
//! and an optional legacy record. The anchor is either a calendar
//! authentication record or a publication record, never both, and requires a
//! calendar chain.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::aggregation::AggregationHashChain;
use crate::core::calendar::CalendarHashChain;
use crate::core::hashing::DataHash;
use crate::core::legacy::LegacyTimestampRecord;
use crate::core::publication::PublicationData;
use crate::core::publication::PublicationRecord;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Structural errors rejected when a signature is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// No aggregation chain was supplied.
    #[error("signature has no aggregation hash chains")]
    NoAggregationChains,
    /// A trust anchor was supplied without a calendar chain.
    #[error("signature trust anchor requires a calendar hash chain")]
    AnchorWithoutCalendarChain,
}

// ============================================================================
// SECTION: Calendar Authentication
// ============================================================================

/// PKI signature over publication data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureData {
    /// Signature algorithm name.
    pub signature_type: String,
    /// Signature bytes.
    pub signature_value: Vec<u8>,
    /// Identifier of the signing certificate.
    pub certificate_id: Vec<u8>,
}

/// Calendar root signed by the calendar operator's key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarAuthenticationRecord {
    /// Signed publication data.
    pub publication_data: PublicationData,
    /// Signature over the publication data.
    pub signature_data: SignatureData,
}

/// Trust anchor binding the calendar chain to a trusted root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustAnchor {
    /// PKI-signed calendar root.
    CalendarAuthentication(CalendarAuthenticationRecord),
    /// Published calendar root.
    Publication(PublicationRecord),
}

// ============================================================================
// SECTION: Signature
// ============================================================================

/// Parsed KSI signature.
///
/// # Invariants
/// - At least one aggregation chain.
/// - A trust anchor implies a calendar chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KsiSignature {
    /// Aggregation chains, nearest the document first.
    aggregation_chains: Vec<AggregationHashChain>,
    /// Calendar chain.
    calendar_chain: Option<CalendarHashChain>,
    /// Trust anchor.
    anchor: Option<TrustAnchor>,
    /// Legacy time-stamp record.
    legacy_record: Option<LegacyTimestampRecord>,
}

impl KsiSignature {
    /// Creates a signature.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] when the structural invariants do not hold.
    pub fn new(
        aggregation_chains: Vec<AggregationHashChain>,
        calendar_chain: Option<CalendarHashChain>,
        anchor: Option<TrustAnchor>,
        legacy_record: Option<LegacyTimestampRecord>,
    ) -> Result<Self, SignatureError> {
        if aggregation_chains.is_empty() {
            return Err(SignatureError::NoAggregationChains);
        }
        if anchor.is_some() && calendar_chain.is_none() {
            return Err(SignatureError::AnchorWithoutCalendarChain);
        }
        Ok(Self {
            aggregation_chains,
            calendar_chain,
            anchor,
            legacy_record,
        })
    }

    /// Returns the aggregation chains.
    #[must_use]
    pub fn aggregation_chains(&self) -> &[AggregationHashChain] {
        &self.aggregation_chains
    }

    /// Returns the chain nearest the document.
    ///
    /// [`KsiSignature::new`] rejects an empty chain list, so this never
    /// indexes out of bounds.
    #[must_use]
    pub fn first_aggregation_chain(&self) -> &AggregationHashChain {
        &self.aggregation_chains[0]
    }

    /// Returns the chain bound to the calendar.
    ///
    /// Non-empty for the same reason as [`Self::first_aggregation_chain`].
    #[must_use]
    pub fn last_aggregation_chain(&self) -> &AggregationHashChain {
        &self.aggregation_chains[self.aggregation_chains.len() - 1]
    }

    /// Returns the signing time (the last chain's aggregation time).
    #[must_use]
    pub fn aggregation_time(&self) -> u64 {
        self.last_aggregation_chain().aggregation_time()
    }

    /// Returns the hash the signature was made for: the legacy record input
    /// when present, otherwise the first chain input.
    #[must_use]
    pub fn input_hash(&self) -> &DataHash {
        self.legacy_record.as_ref().map_or_else(
            || self.first_aggregation_chain().input_hash(),
            |record| &record.input_hash,
        )
    }

    /// Returns the calendar chain.
    #[must_use]
    pub const fn calendar_hash_chain(&self) -> Option<&CalendarHashChain> {
        self.calendar_chain.as_ref()
    }

    /// Returns the trust anchor.
    #[must_use]
    pub const fn anchor(&self) -> Option<&TrustAnchor> {
        self.anchor.as_ref()
    }

    /// Returns the calendar authentication record.
    #[must_use]
    pub const fn calendar_authentication_record(&self) -> Option<&CalendarAuthenticationRecord> {
        match &self.anchor {
            Some(TrustAnchor::CalendarAuthentication(record)) => Some(record),
            Some(TrustAnchor::Publication(_)) | None => None,
        }
    }

    /// Returns the publication record.
    #[must_use]
    pub const fn publication_record(&self) -> Option<&PublicationRecord> {
        match &self.anchor {
            Some(TrustAnchor::Publication(record)) => Some(record),
            Some(TrustAnchor::CalendarAuthentication(_)) | None => None,
        }
    }

    /// Returns the legacy time-stamp record.
    #[must_use]
    pub const fn legacy_record(&self) -> Option<&LegacyTimestampRecord> {
        self.legacy_record.as_ref()
    }

    /// Returns true when the signature is anchored to a publication.
    #[must_use]
    pub const fn is_extended(&self) -> bool {
        self.publication_record().is_some()
    }

    /// Returns a new signature with the calendar chain replaced and anchored
    /// to `publication_record`; the old chain and anchor are discarded.
    #[must_use]
    pub fn extended(
        &self,
        calendar_chain: CalendarHashChain,
        publication_record: PublicationRecord,
    ) -> Self {
        Self {
            aggregation_chains: self.aggregation_chains.clone(),
            calendar_chain: Some(calendar_chain),
            anchor: Some(TrustAnchor::Publication(publication_record)),
            legacy_record: self.legacy_record.clone(),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
