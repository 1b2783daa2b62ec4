// crates/ksi-core/src/core/certificate.rs
// ============================================================================
// Module: Certificates
// Description: Certificate records used to check calendar authentication.
// Purpose: Resolve signing keys by identifier and verify PKI signatures.
// Dependencies: ed25519-dalek, thiserror
// ============================================================================

//! ## Overview
//! Certificates are resolved from the publications file by identifier. Only
//! the fields verification needs are modelled: a subject, a public key, and a
//! validity window. Ed25519 keys verify signatures of type `"ed25519"`; every
//! other combination is unsupported.

// ============================================================================
// SECTION: Imports
// ============================================================================

use ed25519_dalek::Signature;
use ed25519_dalek::VerifyingKey;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Signature type string for Ed25519 signatures.
pub const ED25519_SIGNATURE_TYPE: &str = "ed25519";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Reasons a PKI signature does not verify.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CertificateError {
    /// Signature type and key kind do not form a supported pair.
    #[error("unsupported signature algorithm {0}")]
    UnsupportedAlgorithm(String),
    /// Public key bytes are not a valid key.
    #[error("invalid public key")]
    InvalidKey,
    /// Signature bytes are malformed.
    #[error("invalid signature bytes")]
    InvalidSignature,
    /// Signature does not match the message.
    #[error("signature verification failed")]
    VerificationFailed,
}

// ============================================================================
// SECTION: Keys and Certificates
// ============================================================================

/// Public key carried by a certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    /// Ed25519 public key.
    Ed25519([u8; 32]),
    /// Key of an algorithm this verifier cannot use.
    Unsupported {
        /// Algorithm name.
        algorithm: String,
    },
}

/// Signing certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// Subject name.
    pub subject: String,
    /// Public key.
    pub key: PublicKey,
    /// Start of validity (unix seconds, inclusive).
    pub not_before: u64,
    /// End of validity (unix seconds, inclusive).
    pub not_after: u64,
}

impl Certificate {
    /// Returns true if `time` lies within the validity window.
    #[must_use]
    pub const fn is_valid_at(&self, time: u64) -> bool {
        self.not_before <= time && time <= self.not_after
    }

    /// Verifies `signature` over `message`.
    ///
    /// # Errors
    ///
    /// Returns [`CertificateError`] when the algorithm is unsupported, the key
    /// or signature is malformed, or the signature does not match.
    pub fn verify(
        &self,
        signature_type: &str,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), CertificateError> {
        match &self.key {
            PublicKey::Ed25519(key) if signature_type == ED25519_SIGNATURE_TYPE => {
                let key = VerifyingKey::from_bytes(key).map_err(|_| CertificateError::InvalidKey)?;
                let signature =
                    Signature::try_from(signature).map_err(|_| CertificateError::InvalidSignature)?;
                key.verify_strict(message, &signature)
                    .map_err(|_| CertificateError::VerificationFailed)
            }
            PublicKey::Ed25519(_) | PublicKey::Unsupported { .. } => {
                Err(CertificateError::UnsupportedAlgorithm(signature_type.to_string()))
            }
        }
    }
}

/// Certificate with the identifier records refer to it by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRecord {
    /// Certificate identifier.
    id: Vec<u8>,
    /// Certificate.
    certificate: Certificate,
}

impl CertificateRecord {
    /// Creates a record.
    #[must_use]
    pub const fn new(id: Vec<u8>, certificate: Certificate) -> Self {
        Self {
            id,
            certificate,
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub fn id(&self) -> &[u8] {
        &self.id
    }

    /// Returns the certificate.
    #[must_use]
    pub const fn certificate(&self) -> &Certificate {
        &self.certificate
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
