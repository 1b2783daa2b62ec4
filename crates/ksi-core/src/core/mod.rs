// crates/ksi-core/src/core/mod.rs
// ============================================================================
// Module: KSI Core Types
// Description: Signature data model, hashing, and the error code taxonomy.
// Purpose: Provide the parsed, in-memory structures verification consumes.
// Dependencies: ksi-rule-logic, ed25519-dalek, serde, sha2, time
// ============================================================================

//! ## Overview
//! Core types describe an already-parsed signature and its supporting
//! material: hash imprints, aggregation and calendar chains, publications,
//! certificates and legacy records. Wire decoding of signatures happens
//! elsewhere; the TLV reader here exists for metadata layout checks and the
//! bytes covered by calendar authentication signatures.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod aggregation;
pub mod calendar;
pub mod certificate;
pub mod codes;
pub mod hashing;
pub mod legacy;
pub mod publication;
pub mod signature;
pub mod time;
pub mod tlv;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use aggregation::AggregationHashChain;
pub use aggregation::ChainError;
pub use aggregation::ChainLink;
pub use aggregation::ChainResult;
pub use aggregation::LinkDirection;
pub use aggregation::LinkMetadata;
pub use aggregation::LinkSibling;
pub use aggregation::MetadataFields;
pub use calendar::CalendarHashChain;
pub use calendar::CalendarLink;
pub use certificate::Certificate;
pub use certificate::CertificateError;
pub use certificate::CertificateRecord;
pub use certificate::PublicKey;
pub use codes::VerificationErrorCode;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::DataHash;
pub use hashing::DataHasher;
pub use hashing::HashAlgorithm;
pub use hashing::HashError;
pub use legacy::LegacyTimestampRecord;
pub use publication::PublicationData;
pub use publication::PublicationRecord;
pub use publication::PublicationsFile;
pub use signature::CalendarAuthenticationRecord;
pub use signature::KsiSignature;
pub use signature::SignatureData;
pub use signature::SignatureError;
pub use signature::TrustAnchor;
pub use tlv::TlvElement;
pub use tlv::TlvError;
