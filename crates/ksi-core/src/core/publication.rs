// crates/ksi-core/src/core/publication.rs
// ============================================================================
// Module: Publications
// Description: Publication data, publication records, and publications files.
// Purpose: Model trust anchors published through an independent channel.
// Dependencies: crate::core::{certificate, hashing, time, tlv}
// ============================================================================

//! ## Overview
//! A publication is a calendar root hash at a publication time. Signatures may
//! embed one as a publication record; a publications file is the trusted,
//! time-ordered list of all of them plus the certificates used to check
//! calendar authentication records.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use crate::core::certificate::CertificateRecord;
use crate::core::hashing::DataHash;
use crate::core::time::format_unix_seconds;
use crate::core::tlv::TlvElement;
use crate::core::tlv::TlvError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Publication data element tag.
pub const PUBLICATION_DATA_TAG: u16 = 0x10;
/// Publication time element tag.
pub const PUBLICATION_TIME_TAG: u16 = 0x02;
/// Publication hash element tag.
pub const PUBLICATION_HASH_TAG: u16 = 0x04;

// ============================================================================
// SECTION: Publication Data
// ============================================================================

/// Calendar root hash at a publication time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PublicationData {
    /// Publication time (unix seconds).
    publication_time: u64,
    /// Calendar root hash at that time.
    publication_hash: DataHash,
}

impl PublicationData {
    /// Creates publication data.
    #[must_use]
    pub const fn new(publication_time: u64, publication_hash: DataHash) -> Self {
        Self {
            publication_time,
            publication_hash,
        }
    }

    /// Returns the publication time.
    #[must_use]
    pub const fn publication_time(&self) -> u64 {
        self.publication_time
    }

    /// Returns the publication hash.
    #[must_use]
    pub const fn publication_hash(&self) -> &DataHash {
        &self.publication_hash
    }

    /// Returns the bytes covered by calendar authentication signatures.
    ///
    /// # Errors
    ///
    /// Returns [`TlvError`] when the encoding does not fit its header.
    pub fn signed_bytes(&self) -> Result<Vec<u8>, TlvError> {
        TlvElement::composite(PUBLICATION_DATA_TAG, &[
            TlvElement::unsigned(PUBLICATION_TIME_TAG, self.publication_time),
            TlvElement::new(PUBLICATION_HASH_TAG, self.publication_hash.imprint()),
        ])?
        .encode()
    }
}

impl fmt::Display for PublicationData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", format_unix_seconds(self.publication_time), self.publication_hash)
    }
}

// ============================================================================
// SECTION: Publication Record
// ============================================================================

/// Publication data with its printed references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicationRecord {
    /// Published data.
    publication_data: PublicationData,
    /// Printed media references.
    references: Vec<String>,
    /// Repository URIs.
    repository_uris: Vec<String>,
}

impl PublicationRecord {
    /// Creates a record with no references.
    #[must_use]
    pub const fn new(publication_data: PublicationData) -> Self {
        Self {
            publication_data,
            references: Vec::new(),
            repository_uris: Vec::new(),
        }
    }

    /// Attaches printed references and repository URIs.
    #[must_use]
    pub fn with_references(mut self, references: Vec<String>, repository_uris: Vec<String>) -> Self {
        self.references = references;
        self.repository_uris = repository_uris;
        self
    }

    /// Returns the publication data.
    #[must_use]
    pub const fn publication_data(&self) -> &PublicationData {
        &self.publication_data
    }

    /// Returns the publication time.
    #[must_use]
    pub const fn publication_time(&self) -> u64 {
        self.publication_data.publication_time
    }

    /// Returns the printed references.
    #[must_use]
    pub fn references(&self) -> &[String] {
        &self.references
    }

    /// Returns the repository URIs.
    #[must_use]
    pub fn repository_uris(&self) -> &[String] {
        &self.repository_uris
    }
}

// ============================================================================
// SECTION: Publications File
// ============================================================================

/// Trusted set of publications and certificates.
///
/// # Invariants
/// - Publications are sorted by time; at most one publication per time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicationsFile {
    /// Publications ordered by time.
    publications: Vec<PublicationRecord>,
    /// Certificates for calendar authentication records.
    certificates: Vec<CertificateRecord>,
}

impl PublicationsFile {
    /// Creates a publications file, sorting publications by time and keeping
    /// the first record seen for each time.
    #[must_use]
    pub fn new(mut publications: Vec<PublicationRecord>, certificates: Vec<CertificateRecord>) -> Self {
        publications.sort_by_key(PublicationRecord::publication_time);
        publications.dedup_by_key(|record| record.publication_time());
        Self {
            publications,
            certificates,
        }
    }

    /// Returns all publications in time order.
    #[must_use]
    pub fn publications(&self) -> &[PublicationRecord] {
        &self.publications
    }

    /// Returns all certificate records.
    #[must_use]
    pub fn certificates(&self) -> &[CertificateRecord] {
        &self.certificates
    }

    /// Returns the earliest publication at or after `time`.
    #[must_use]
    pub fn publication_at_or_after(&self, time: u64) -> Option<&PublicationRecord> {
        let position = self.publications.partition_point(|record| record.publication_time() < time);
        self.publications.get(position)
    }

    /// Returns the publication made exactly at `time`.
    #[must_use]
    pub fn publication_at(&self, time: u64) -> Option<&PublicationRecord> {
        self.publication_at_or_after(time).filter(|record| record.publication_time() == time)
    }

    /// Returns the latest publication.
    #[must_use]
    pub fn latest_publication(&self) -> Option<&PublicationRecord> {
        self.publications.last()
    }

    /// Finds a certificate record by identifier.
    #[must_use]
    pub fn find_certificate(&self, id: &[u8]) -> Option<&CertificateRecord> {
        self.certificates.iter().find(|record| record.id() == id)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
