// crates/ksi-core/src/core/hashing.rs
// ============================================================================
// Module: Hash Algorithms and Imprints
// Description: Hash algorithm registry, data hash imprints, and hashing.
// Purpose: Recompute chain outputs and compare imprints byte-for-byte.
// Dependencies: sha2, thiserror
// ============================================================================

//! ## Overview
//! A data hash is carried as an imprint: one algorithm id byte followed by the
//! digest. Every algorithm that may appear in a signature is known here so that
//! imprints parse and deprecation can be judged, but only the SHA-2 family is
//! computable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use sha2::Digest;
use sha2::Sha256;
use sha2::Sha384;
use sha2::Sha512;
use thiserror::Error;

// ============================================================================
// SECTION: Hash Algorithm
// ============================================================================

/// Hash algorithms that may appear in signature imprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// SHA-1 (deprecated).
    Sha1,
    /// SHA-256.
    Sha256,
    /// RIPEMD-160.
    Ripemd160,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

/// Default hash algorithm for aggregation and calendar hashing.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

/// SHA-1 deprecation instant, 2016-07-01T00:00:00Z.
pub const SHA1_DEPRECATED_SINCE: u64 = 1_467_331_200;

impl HashAlgorithm {
    /// Returns the imprint id byte.
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Sha1 => 0x00,
            Self::Sha256 => 0x01,
            Self::Ripemd160 => 0x02,
            Self::Sha384 => 0x04,
            Self::Sha512 => 0x05,
        }
    }

    /// Resolves an imprint id byte.
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0x00 => Some(Self::Sha1),
            0x01 => Some(Self::Sha256),
            0x02 => Some(Self::Ripemd160),
            0x04 => Some(Self::Sha384),
            0x05 => Some(Self::Sha512),
            _ => None,
        }
    }

    /// Returns the digest length in bytes.
    #[must_use]
    pub const fn digest_length(self) -> usize {
        match self {
            Self::Sha1 | Self::Ripemd160 => 20,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Returns the display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "SHA-1",
            Self::Sha256 => "SHA-256",
            Self::Ripemd160 => "RIPEMD-160",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
        }
    }

    /// Returns the unix time from which the algorithm is deprecated.
    #[must_use]
    pub const fn deprecated_since(self) -> Option<u64> {
        match self {
            Self::Sha1 => Some(SHA1_DEPRECATED_SINCE),
            Self::Sha256 | Self::Ripemd160 | Self::Sha384 | Self::Sha512 => None,
        }
    }

    /// Returns true if the algorithm is deprecated at `time`.
    #[must_use]
    pub const fn is_deprecated_at(self, time: u64) -> bool {
        match self.deprecated_since() {
            Some(since) => time >= since,
            None => false,
        }
    }

    /// Returns true if digests can be computed for this algorithm.
    #[must_use]
    pub const fn is_implemented(self) -> bool {
        matches!(self, Self::Sha256 | Self::Sha384 | Self::Sha512)
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when building imprints or hashing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashError {
    /// Imprint id byte does not name a known algorithm.
    #[error("unknown hash algorithm id 0x{0:02x}")]
    UnknownAlgorithm(u8),
    /// Algorithm is known but cannot be computed.
    #[error("hash algorithm {0} is not implemented")]
    NotImplemented(HashAlgorithm),
    /// Digest length does not match the algorithm.
    #[error("invalid {algorithm} digest length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Declared algorithm.
        algorithm: HashAlgorithm,
        /// Expected digest length.
        expected: usize,
        /// Supplied digest length.
        actual: usize,
    },
    /// Imprint has no bytes at all.
    #[error("empty hash imprint")]
    EmptyImprint,
}

// ============================================================================
// SECTION: Data Hash
// ============================================================================

/// Hash value tagged with its algorithm.
///
/// # Invariants
/// - `digest.len() == algorithm.digest_length()`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataHash {
    /// Algorithm that produced the digest.
    algorithm: HashAlgorithm,
    /// Raw digest bytes.
    digest: Vec<u8>,
}

impl DataHash {
    /// Creates a hash from an algorithm and digest.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::InvalidLength`] when the digest length is wrong.
    pub fn new(algorithm: HashAlgorithm, digest: Vec<u8>) -> Result<Self, HashError> {
        if digest.len() != algorithm.digest_length() {
            return Err(HashError::InvalidLength {
                algorithm,
                expected: algorithm.digest_length(),
                actual: digest.len(),
            });
        }
        Ok(Self {
            algorithm,
            digest,
        })
    }

    /// Parses an imprint (algorithm id byte followed by the digest).
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] for empty input, unknown ids, or wrong lengths.
    pub fn from_imprint(imprint: &[u8]) -> Result<Self, HashError> {
        let (&id, digest) = imprint.split_first().ok_or(HashError::EmptyImprint)?;
        let algorithm = HashAlgorithm::from_id(id).ok_or(HashError::UnknownAlgorithm(id))?;
        Self::new(algorithm, digest.to_vec())
    }

    /// Returns true if `bytes` would parse as an imprint of a known algorithm.
    #[must_use]
    pub fn looks_like_imprint(bytes: &[u8]) -> bool {
        bytes
            .split_first()
            .and_then(|(&id, digest)| HashAlgorithm::from_id(id).map(|alg| (alg, digest)))
            .is_some_and(|(algorithm, digest)| digest.len() == algorithm.digest_length())
    }

    /// Returns the hash algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Returns the raw digest.
    #[must_use]
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    /// Returns the imprint bytes.
    #[must_use]
    pub fn imprint(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.digest.len());
        out.push(self.algorithm.id());
        out.extend_from_slice(&self.digest);
        out
    }

    /// Returns the imprint as lowercase hex.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex_encode(&self.imprint())
    }
}

impl fmt::Display for DataHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, hex_encode(&self.digest))
    }
}

// ============================================================================
// SECTION: Hasher
// ============================================================================

/// Running digest state per implemented algorithm.
#[derive(Clone)]
enum HasherState {
    /// SHA-256 state.
    Sha256(Sha256),
    /// SHA-384 state.
    Sha384(Sha384),
    /// SHA-512 state.
    Sha512(Sha512),
}

/// Incremental hasher producing a [`DataHash`].
#[derive(Clone)]
pub struct DataHasher {
    /// Algorithm being computed.
    algorithm: HashAlgorithm,
    /// Digest state.
    state: HasherState,
}

impl DataHasher {
    /// Creates a hasher for the algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::NotImplemented`] for algorithms without an
    /// implementation.
    pub fn new(algorithm: HashAlgorithm) -> Result<Self, HashError> {
        let state = match algorithm {
            HashAlgorithm::Sha256 => HasherState::Sha256(Sha256::new()),
            HashAlgorithm::Sha384 => HasherState::Sha384(Sha384::new()),
            HashAlgorithm::Sha512 => HasherState::Sha512(Sha512::new()),
            HashAlgorithm::Sha1 | HashAlgorithm::Ripemd160 => {
                return Err(HashError::NotImplemented(algorithm));
            }
        };
        Ok(Self {
            algorithm,
            state,
        })
    }

    /// Feeds bytes into the digest.
    pub fn update(&mut self, bytes: &[u8]) -> &mut Self {
        match &mut self.state {
            HasherState::Sha256(hasher) => hasher.update(bytes),
            HasherState::Sha384(hasher) => hasher.update(bytes),
            HasherState::Sha512(hasher) => hasher.update(bytes),
        }
        self
    }

    /// Finishes the digest.
    #[must_use]
    pub fn finish(self) -> DataHash {
        let digest = match self.state {
            HasherState::Sha256(hasher) => hasher.finalize().to_vec(),
            HasherState::Sha384(hasher) => hasher.finalize().to_vec(),
            HasherState::Sha512(hasher) => hasher.finalize().to_vec(),
        };
        DataHash {
            algorithm: self.algorithm,
            digest,
        }
    }
}

/// Hashes the concatenation of `parts` with the algorithm.
///
/// # Errors
///
/// Returns [`HashError::NotImplemented`] for algorithms without an
/// implementation.
pub fn hash_parts(algorithm: HashAlgorithm, parts: &[&[u8]]) -> Result<DataHash, HashError> {
    let mut hasher = DataHasher::new(algorithm)?;
    for part in parts {
        hasher.update(part);
    }
    Ok(hasher.finish())
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(char::from(HEX[usize::from(byte >> 4)]));
        out.push(char::from(HEX[usize::from(byte & 0x0f)]));
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================
