// crates/ksi-core/src/core/legacy.rs
// ============================================================================
// Module: Legacy Time-Stamp Records
// Description: Records carried by signatures converted from legacy tokens.
// Purpose: Recompute the hash a legacy token fed into the aggregation chain.
// Dependencies: crate::core::hashing
// ============================================================================

//! ## Overview
//! A legacy record wraps the input hash twice: first into the time-stamp info
//! structure, then into the signed attributes structure.
//! - `tst = H_tst(tst_prefix || input.digest || tst_suffix)`
//! - `output = H_sa(sa_prefix || tst.digest || sa_suffix)`

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::hashing::DataHash;
use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::HashError;
use crate::core::hashing::hash_parts;

// ============================================================================
// SECTION: Record
// ============================================================================

/// Legacy time-stamp record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTimestampRecord {
    /// Aggregation time the token claims.
    pub aggregation_time: u64,
    /// Chain index the token claims.
    pub chain_index: Vec<u64>,
    /// Hash of the time-stamped data.
    pub input_hash: DataHash,
    /// Bytes before the input digest in the time-stamp info.
    pub tst_info_prefix: Vec<u8>,
    /// Bytes after the input digest in the time-stamp info.
    pub tst_info_suffix: Vec<u8>,
    /// Algorithm hashing the time-stamp info.
    pub tst_info_algorithm: HashAlgorithm,
    /// Bytes before the time-stamp info digest in the signed attributes.
    pub signed_attributes_prefix: Vec<u8>,
    /// Bytes after the time-stamp info digest in the signed attributes.
    pub signed_attributes_suffix: Vec<u8>,
    /// Algorithm hashing the signed attributes.
    pub signed_attributes_algorithm: HashAlgorithm,
}

impl LegacyTimestampRecord {
    /// Recomputes the hash that enters the first aggregation chain.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::NotImplemented`] when either algorithm cannot be
    /// computed.
    pub fn output_hash(&self) -> Result<DataHash, HashError> {
        let tst_info = hash_parts(self.tst_info_algorithm, &[
            self.tst_info_prefix.as_slice(),
            self.input_hash.digest(),
            self.tst_info_suffix.as_slice(),
        ])?;
        hash_parts(self.signed_attributes_algorithm, &[
            self.signed_attributes_prefix.as_slice(),
            tst_info.digest(),
            self.signed_attributes_suffix.as_slice(),
        ])
    }

    /// Returns the algorithms used to build the record, excluding the output
    /// algorithm.
    #[must_use]
    pub fn input_algorithms(&self) -> [HashAlgorithm; 2] {
        [self.input_hash.algorithm(), self.tst_info_algorithm]
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

    use super::*;

    #[test]
    fn output_wraps_input_twice() {
        let input = DataHash::new(HashAlgorithm::Sha256, vec![9; 32]).unwrap();
        let record = LegacyTimestampRecord {
            aggregation_time: 1,
            chain_index: vec![1],
            input_hash: input.clone(),
            tst_info_prefix: vec![1, 2],
            tst_info_suffix: vec![3],
            tst_info_algorithm: HashAlgorithm::Sha256,
            signed_attributes_prefix: vec![4],
            signed_attributes_suffix: vec![5, 6],
            signed_attributes_algorithm: HashAlgorithm::Sha512,
        };
        let tst = hash_parts(HashAlgorithm::Sha256, &[&[1_u8, 2][..], input.digest(), &[3_u8][..]])
            .unwrap();
        let expected =
            hash_parts(HashAlgorithm::Sha512, &[&[4_u8][..], tst.digest(), &[5_u8, 6][..]]).unwrap();
        assert_eq!(record.output_hash().unwrap(), expected);
        assert_eq!(record.output_hash().unwrap().algorithm(), HashAlgorithm::Sha512);
    }
}
