// crates/ksi-core/src/core/codes.rs
// ============================================================================
// Module: Verification Error Codes
// Description: Stable error code taxonomy for non-OK verification results.
// Purpose: Give audit logs and user diagnostics a fixed vocabulary.
// Dependencies: ksi-rule-logic, serde
// ============================================================================

//! ## Overview
//! Codes are a category plus a two-digit number and never change meaning:
//! - `GEN`: generic and structural
//! - `INT`: internal hash chain consistency
//! - `PUB`: publication matching
//! - `KEY`: certificate and PKI checks
//! - `CAL`: calendar chain checks against the extender
//!
//! Codes are only attached to `NA` and `FAIL` results.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use ksi_rule_logic::ErrorCode;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Codes
// ============================================================================

/// Stable verification error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationErrorCode {
    /// Document hash differs from the signature input hash.
    #[serde(rename = "GEN-01")]
    WrongDocument,
    /// Verification inconclusive.
    #[serde(rename = "GEN-02")]
    Inconclusive,
    /// Input hash level too large.
    #[serde(rename = "GEN-03")]
    InputLevelTooLarge,
    /// Wrong input hash algorithm.
    #[serde(rename = "GEN-04")]
    WrongInputHashAlgorithm,
    /// Inconsistent aggregation hash chains.
    #[serde(rename = "INT-01")]
    InconsistentAggregationChains,
    /// Inconsistent aggregation hash chain aggregation times.
    #[serde(rename = "INT-02")]
    InconsistentAggregationTimes,
    /// Calendar hash chain input hash mismatch.
    #[serde(rename = "INT-03")]
    CalendarInputHashMismatch,
    /// Calendar hash chain aggregation time mismatch.
    #[serde(rename = "INT-04")]
    CalendarAggregationTimeMismatch,
    /// Calendar hash chain shape inconsistent with aggregation time.
    #[serde(rename = "INT-05")]
    CalendarShapeMismatch,
    /// Calendar hash chain time inconsistent with calendar authentication
    /// record time.
    #[serde(rename = "INT-06")]
    AuthRecordTimeMismatch,
    /// Calendar hash chain time inconsistent with publication time.
    #[serde(rename = "INT-07")]
    PublicationTimeMismatch,
    /// Calendar hash chain root inconsistent with calendar authentication
    /// record hash.
    #[serde(rename = "INT-08")]
    AuthRecordHashMismatch,
    /// Calendar hash chain root inconsistent with publication hash.
    #[serde(rename = "INT-09")]
    PublicationHashMismatch,
    /// Aggregation hash chain index mismatch.
    #[serde(rename = "INT-10")]
    ChainIndexMismatch,
    /// Aggregation hash chain metadata record may not be trusted.
    #[serde(rename = "INT-11")]
    UntrustedMetadata,
    /// Inconsistent chain indexes.
    #[serde(rename = "INT-12")]
    InconsistentChainIndexes,
    /// Document hash algorithm deprecated at the time of signing.
    #[serde(rename = "INT-13")]
    InputAlgorithmDeprecated,
    /// Legacy record uses hash algorithms deprecated at the time of signing.
    #[serde(rename = "INT-14")]
    LegacyAlgorithmDeprecated,
    /// Aggregation hash chain uses a hash algorithm deprecated at the time of
    /// signing.
    #[serde(rename = "INT-15")]
    AggregationAlgorithmDeprecated,
    /// Calendar hash chain uses a hash algorithm deprecated at publication
    /// time.
    #[serde(rename = "INT-16")]
    CalendarAlgorithmDeprecated,
    /// Legacy record output hash algorithm deprecated at the time of signing.
    #[serde(rename = "INT-17")]
    LegacyOutputAlgorithmDeprecated,
    /// Extender response calendar root hash mismatch.
    #[serde(rename = "PUB-01")]
    ExtendedRootMismatch,
    /// Extender response inconsistent with signature aggregation time.
    #[serde(rename = "PUB-02")]
    ExtendedAggregationTimeMismatch,
    /// Extender response input hash mismatch.
    #[serde(rename = "PUB-03")]
    ExtendedInputHashMismatch,
    /// Publication record hash and user provided publication hash mismatch.
    #[serde(rename = "PUB-04")]
    UserPublicationMismatch,
    /// Publication record hash and publications file publication hash
    /// mismatch.
    #[serde(rename = "PUB-05")]
    PublicationsFileMismatch,
    /// Certificate not found.
    #[serde(rename = "KEY-01")]
    CertificateNotFound,
    /// PKI signature not verified with certificate.
    #[serde(rename = "KEY-02")]
    SignatureNotVerified,
    /// Signing certificate not valid at aggregation time.
    #[serde(rename = "KEY-03")]
    CertificateNotValid,
    /// Calendar hash chain root hash mismatch with extender response.
    #[serde(rename = "CAL-01")]
    CalendarRootMismatch,
    /// Calendar hash chain input hash mismatch with extender response.
    #[serde(rename = "CAL-02")]
    CalendarExtendedInputMismatch,
    /// Calendar hash chain aggregation time mismatch with extender response.
    #[serde(rename = "CAL-03")]
    CalendarExtendedTimeMismatch,
    /// Extender response calendar hash chain right links do not match.
    #[serde(rename = "CAL-04")]
    RightLinksMismatch,
}

impl VerificationErrorCode {
    /// Every code in taxonomy order.
    pub const ALL: [Self; 33] = [
        Self::WrongDocument,
        Self::Inconclusive,
        Self::InputLevelTooLarge,
        Self::WrongInputHashAlgorithm,
        Self::InconsistentAggregationChains,
        Self::InconsistentAggregationTimes,
        Self::CalendarInputHashMismatch,
        Self::CalendarAggregationTimeMismatch,
        Self::CalendarShapeMismatch,
        Self::AuthRecordTimeMismatch,
        Self::PublicationTimeMismatch,
        Self::AuthRecordHashMismatch,
        Self::PublicationHashMismatch,
        Self::ChainIndexMismatch,
        Self::UntrustedMetadata,
        Self::InconsistentChainIndexes,
        Self::InputAlgorithmDeprecated,
        Self::LegacyAlgorithmDeprecated,
        Self::AggregationAlgorithmDeprecated,
        Self::CalendarAlgorithmDeprecated,
        Self::LegacyOutputAlgorithmDeprecated,
        Self::ExtendedRootMismatch,
        Self::ExtendedAggregationTimeMismatch,
        Self::ExtendedInputHashMismatch,
        Self::UserPublicationMismatch,
        Self::PublicationsFileMismatch,
        Self::CertificateNotFound,
        Self::SignatureNotVerified,
        Self::CertificateNotValid,
        Self::CalendarRootMismatch,
        Self::CalendarExtendedInputMismatch,
        Self::CalendarExtendedTimeMismatch,
        Self::RightLinksMismatch,
    ];

    /// Returns the stable code string.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::WrongDocument => "GEN-01",
            Self::Inconclusive => "GEN-02",
            Self::InputLevelTooLarge => "GEN-03",
            Self::WrongInputHashAlgorithm => "GEN-04",
            Self::InconsistentAggregationChains => "INT-01",
            Self::InconsistentAggregationTimes => "INT-02",
            Self::CalendarInputHashMismatch => "INT-03",
            Self::CalendarAggregationTimeMismatch => "INT-04",
            Self::CalendarShapeMismatch => "INT-05",
            Self::AuthRecordTimeMismatch => "INT-06",
            Self::PublicationTimeMismatch => "INT-07",
            Self::AuthRecordHashMismatch => "INT-08",
            Self::PublicationHashMismatch => "INT-09",
            Self::ChainIndexMismatch => "INT-10",
            Self::UntrustedMetadata => "INT-11",
            Self::InconsistentChainIndexes => "INT-12",
            Self::InputAlgorithmDeprecated => "INT-13",
            Self::LegacyAlgorithmDeprecated => "INT-14",
            Self::AggregationAlgorithmDeprecated => "INT-15",
            Self::CalendarAlgorithmDeprecated => "INT-16",
            Self::LegacyOutputAlgorithmDeprecated => "INT-17",
            Self::ExtendedRootMismatch => "PUB-01",
            Self::ExtendedAggregationTimeMismatch => "PUB-02",
            Self::ExtendedInputHashMismatch => "PUB-03",
            Self::UserPublicationMismatch => "PUB-04",
            Self::PublicationsFileMismatch => "PUB-05",
            Self::CertificateNotFound => "KEY-01",
            Self::SignatureNotVerified => "KEY-02",
            Self::CertificateNotValid => "KEY-03",
            Self::CalendarRootMismatch => "CAL-01",
            Self::CalendarExtendedInputMismatch => "CAL-02",
            Self::CalendarExtendedTimeMismatch => "CAL-03",
            Self::RightLinksMismatch => "CAL-04",
        }
    }

    /// Returns the human-readable message.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::WrongDocument => "Wrong document",
            Self::Inconclusive => "Verification inconclusive",
            Self::InputLevelTooLarge => "Input hash level too large",
            Self::WrongInputHashAlgorithm => "Wrong input hash algorithm",
            Self::InconsistentAggregationChains => "Inconsistent aggregation hash chains",
            Self::InconsistentAggregationTimes => {
                "Inconsistent aggregation hash chain aggregation times"
            }
            Self::CalendarInputHashMismatch => "Calendar hash chain input hash mismatch",
            Self::CalendarAggregationTimeMismatch => {
                "Calendar hash chain aggregation time mismatch"
            }
            Self::CalendarShapeMismatch => {
                "Calendar hash chain shape inconsistent with aggregation time"
            }
            Self::AuthRecordTimeMismatch => {
                "Calendar hash chain time inconsistent with calendar authentication record time"
            }
            Self::PublicationTimeMismatch => {
                "Calendar hash chain time inconsistent with publication time"
            }
            Self::AuthRecordHashMismatch => {
                "Calendar hash chain root hash inconsistent with calendar authentication record \
                 input hash"
            }
            Self::PublicationHashMismatch => {
                "Calendar hash chain root hash is inconsistent with published hash value"
            }
            Self::ChainIndexMismatch => "Aggregation hash chain index mismatch",
            Self::UntrustedMetadata => "The metadata record in the aggregation hash chain may not be trusted",
            Self::InconsistentChainIndexes => "Inconsistent chain indexes",
            Self::InputAlgorithmDeprecated => {
                "Document hash algorithm deprecated at the time of signing"
            }
            Self::LegacyAlgorithmDeprecated => {
                "Legacy record uses hash algorithms deprecated at the time of signing"
            }
            Self::AggregationAlgorithmDeprecated => {
                "Aggregation hash chain uses a hash algorithm deprecated at the time of signing"
            }
            Self::CalendarAlgorithmDeprecated => {
                "Calendar hash chain uses a hash algorithm deprecated at the publication time"
            }
            Self::LegacyOutputAlgorithmDeprecated => {
                "Legacy record output hash algorithm deprecated at the time of signing"
            }
            Self::ExtendedRootMismatch => "Extender response calendar root hash mismatch",
            Self::ExtendedAggregationTimeMismatch => {
                "Extender response inconsistent with signature aggregation time"
            }
            Self::ExtendedInputHashMismatch => "Extender response input hash mismatch",
            Self::UserPublicationMismatch => {
                "Publication record hash and user provided publication hash mismatch"
            }
            Self::PublicationsFileMismatch => {
                "Publication record hash and publications file publication hash mismatch"
            }
            Self::CertificateNotFound => "Certificate not found",
            Self::SignatureNotVerified => "PKI signature not verified with certificate",
            Self::CertificateNotValid => "Signing certificate not valid at aggregation time",
            Self::CalendarRootMismatch => "Calendar hash chain root hash mismatch with extender response",
            Self::CalendarExtendedInputMismatch => {
                "Calendar hash chain input hash mismatch with extender response"
            }
            Self::CalendarExtendedTimeMismatch => {
                "Calendar hash chain aggregation time mismatch with extender response"
            }
            Self::RightLinksMismatch => {
                "Extender response calendar hash chain right links do not match with signature \
                 calendar hash chain right links"
            }
        }
    }

    /// Resolves a code string such as `"INT-11"`.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|candidate| candidate.code() == code)
    }
}

impl ErrorCode for VerificationErrorCode {
    fn inconclusive() -> Self {
        Self::Inconclusive
    }
}

impl fmt::Display for VerificationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use std::collections::HashSet;

    use super::*;

    #[test]
    fn codes_are_unique_and_well_formed() {
        let mut seen = HashSet::new();
        for code in VerificationErrorCode::ALL {
            let text = code.code();
            assert!(seen.insert(text), "duplicate code {text}");
            let (category, number) = text.split_once('-').unwrap();
            assert!(["GEN", "INT", "PUB", "KEY", "CAL"].contains(&category));
            assert_eq!(number.len(), 2);
            assert_eq!(VerificationErrorCode::from_code(text), Some(code));
        }
    }

    #[test]
    fn serializes_as_code_string() {
        for code in VerificationErrorCode::ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.code()));
            let back: VerificationErrorCode = serde_json::from_str(&json).unwrap();
            assert_eq!(back, code);
        }
    }
}
