// crates/ksi-core/src/core/aggregation.rs
// ============================================================================
// Module: Aggregation Hash Chains
// Description: Aggregation chain links, sibling data, metadata, and hashing.
// Purpose: Recompute per-round roots from an input hash and check chain shape.
// Dependencies: crate::core::{hashing, tlv}, thiserror
// ============================================================================

//! ## Overview
//! An aggregation chain lifts an input hash to a per-round root. Each link
//! combines the running hash with a sibling and a tree level:
//! - left link: `H(current || sibling || level)`
//! - right link: `H(sibling || current || level)`
//!
//! where `level` grows by `1 + level_correction` per link and must stay within
//! one byte. Siblings are hash imprints, legacy client identifiers, or client
//! metadata records.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::hashing::DataHash;
use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::HashError;
use crate::core::hashing::hash_parts;
use crate::core::tlv::TlvElement;
use crate::core::tlv::TlvError;
use crate::core::tlv::parse_all;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Encoded length of a legacy client identifier sibling.
pub const LEGACY_ID_LENGTH: usize = 29;
/// Longest client identifier a legacy sibling can carry.
pub const LEGACY_ID_MAX_CLIENT_LENGTH: usize = 25;
/// Most links a chain index can describe.
pub const MAX_CHAIN_LINKS: usize = 63;

/// Metadata element tag inside a chain link.
pub const METADATA_TAG: u16 = 0x04;
/// Client identifier tag inside metadata.
pub const METADATA_CLIENT_ID_TAG: u16 = 0x01;
/// Machine identifier tag inside metadata.
pub const METADATA_MACHINE_ID_TAG: u16 = 0x02;
/// Sequence number tag inside metadata.
pub const METADATA_SEQUENCE_NUMBER_TAG: u16 = 0x03;
/// Request time tag inside metadata.
pub const METADATA_REQUEST_TIME_TAG: u16 = 0x04;
/// Padding tag inside metadata.
pub const METADATA_PADDING_TAG: u16 = 0x1e;
/// Shortest valid padding value.
pub const METADATA_PADDING_MIN_LENGTH: usize = 1;
/// Longest valid padding value.
pub const METADATA_PADDING_MAX_LENGTH: usize = 2;
/// Byte every padding value consists of.
pub const METADATA_PADDING_BYTE: u8 = 0x01;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while building or computing aggregation chains.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// Tree level left the single-byte range.
    #[error("aggregation chain level overflow at link {link}")]
    LevelOverflow {
        /// Zero-based link position.
        link: usize,
    },
    /// Legacy client identifier is too long.
    #[error("legacy client id is {0} bytes (max 25)")]
    ClientIdTooLong(usize),
    /// Chain has no links.
    #[error("aggregation chain has no links")]
    EmptyChain,
    /// Chain index is empty.
    #[error("aggregation chain index is empty")]
    EmptyIndex,
    /// Chain has more links than an index can describe.
    #[error("aggregation chain has {0} links (max 63)")]
    TooManyLinks(usize),
    /// Hashing failed.
    #[error(transparent)]
    Hash(#[from] HashError),
    /// Metadata encoding failed.
    #[error(transparent)]
    Tlv(#[from] TlvError),
}

// ============================================================================
// SECTION: Link Metadata
// ============================================================================

/// Client metadata carried as a link sibling.
///
/// Holds the raw value of the metadata element (its child elements) exactly
/// as encoded; layout checks and hashing both work on these bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMetadata {
    /// Encoded child elements.
    raw: Vec<u8>,
}

/// Fields used to encode a metadata record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFields {
    /// Human-readable client identity.
    pub client_id: String,
    /// Optional machine identity.
    pub machine_id: Option<String>,
    /// Optional request sequence number.
    pub sequence_number: Option<u64>,
    /// Optional request time (unix seconds).
    pub request_time: Option<u64>,
}

impl LinkMetadata {
    /// Wraps raw metadata bytes without checking them.
    #[must_use]
    pub const fn from_raw(raw: Vec<u8>) -> Self {
        Self {
            raw,
        }
    }

    /// Encodes metadata fields, with a leading padding element sized so the
    /// total length is even.
    ///
    /// # Errors
    ///
    /// Returns [`TlvError`] when a field does not fit its element.
    pub fn padded(fields: &MetadataFields) -> Result<Self, TlvError> {
        let body = encode_fields(fields)?;
        let padding_len = if body.len() % 2 == 0 { 2 } else { 1 };
        let padding = TlvElement::new(METADATA_PADDING_TAG, vec![METADATA_PADDING_BYTE; padding_len])
            .with_flags(true, true)
            .encode()?;
        let mut raw = padding;
        raw.extend_from_slice(&body);
        Ok(Self {
            raw,
        })
    }

    /// Encodes metadata fields without padding.
    ///
    /// # Errors
    ///
    /// Returns [`TlvError`] when a field does not fit its element.
    pub fn unpadded(fields: &MetadataFields) -> Result<Self, TlvError> {
        Ok(Self {
            raw: encode_fields(fields)?,
        })
    }

    /// Returns the raw metadata value bytes.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Parses the child elements.
    ///
    /// # Errors
    ///
    /// Returns [`TlvError`] when the bytes are not a sequence of elements.
    pub fn elements(&self) -> Result<Vec<TlvElement>, TlvError> {
        parse_all(&self.raw)
    }

    /// Returns the client identifier when present and valid UTF-8.
    #[must_use]
    pub fn client_id(&self) -> Option<String> {
        self.elements()
            .ok()?
            .into_iter()
            .find(|element| element.tag() == METADATA_CLIENT_ID_TAG)
            .and_then(|element| String::from_utf8(element.value().to_vec()).ok())
    }
}

/// Encodes metadata fields as consecutive elements.
fn encode_fields(fields: &MetadataFields) -> Result<Vec<u8>, TlvError> {
    let mut elements =
        vec![TlvElement::new(METADATA_CLIENT_ID_TAG, fields.client_id.as_bytes().to_vec())];
    if let Some(machine_id) = &fields.machine_id {
        elements.push(TlvElement::new(METADATA_MACHINE_ID_TAG, machine_id.as_bytes().to_vec()));
    }
    if let Some(sequence_number) = fields.sequence_number {
        elements.push(TlvElement::unsigned(METADATA_SEQUENCE_NUMBER_TAG, sequence_number));
    }
    if let Some(request_time) = fields.request_time {
        elements.push(TlvElement::unsigned(METADATA_REQUEST_TIME_TAG, request_time));
    }
    let mut out = Vec::new();
    for element in &elements {
        out.extend_from_slice(&element.encode()?);
    }
    Ok(out)
}

// ============================================================================
// SECTION: Links
// ============================================================================

/// Side the running hash takes in a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDirection {
    /// Running hash on the left: `H(current || sibling || level)`.
    Left,
    /// Running hash on the right: `H(sibling || current || level)`.
    Right,
}

/// Sibling data of a chain link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkSibling {
    /// Sibling subtree hash.
    Imprint(DataHash),
    /// Legacy client identifier.
    LegacyClientId(String),
    /// Client metadata record.
    Metadata(LinkMetadata),
}

impl LinkSibling {
    /// Returns the bytes hashed for this sibling.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::ClientIdTooLong`] for oversized legacy ids.
    pub fn hash_input(&self) -> Result<Vec<u8>, ChainError> {
        match self {
            Self::Imprint(hash) => Ok(hash.imprint()),
            Self::LegacyClientId(id) => encode_legacy_id(id),
            Self::Metadata(metadata) => Ok(metadata.raw().to_vec()),
        }
    }
}

/// Encodes a legacy client id: `0x03 0x00 len utf8`, zero-padded.
fn encode_legacy_id(id: &str) -> Result<Vec<u8>, ChainError> {
    let bytes = id.as_bytes();
    let length = u8::try_from(bytes.len())
        .ok()
        .filter(|length| usize::from(*length) <= LEGACY_ID_MAX_CLIENT_LENGTH)
        .ok_or(ChainError::ClientIdTooLong(bytes.len()))?;
    let mut out = Vec::with_capacity(LEGACY_ID_LENGTH);
    out.extend_from_slice(&[0x03, 0x00, length]);
    out.extend_from_slice(bytes);
    out.resize(LEGACY_ID_LENGTH, 0);
    Ok(out)
}

/// One step of an aggregation chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLink {
    /// Side of the running hash.
    pub direction: LinkDirection,
    /// Extra levels skipped before this link.
    pub level_correction: u8,
    /// Sibling data.
    pub sibling: LinkSibling,
}

impl ChainLink {
    /// Creates a left link.
    #[must_use]
    pub const fn left(sibling: LinkSibling) -> Self {
        Self {
            direction: LinkDirection::Left,
            level_correction: 0,
            sibling,
        }
    }

    /// Creates a right link.
    #[must_use]
    pub const fn right(sibling: LinkSibling) -> Self {
        Self {
            direction: LinkDirection::Right,
            level_correction: 0,
            sibling,
        }
    }

    /// Sets the level correction.
    #[must_use]
    pub const fn with_level_correction(mut self, level_correction: u8) -> Self {
        self.level_correction = level_correction;
        self
    }
}

// ============================================================================
// SECTION: Chain
// ============================================================================

/// Output of recomputing a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainResult {
    /// Tree level reached at the chain root.
    pub level: u8,
    /// Root hash.
    pub output_hash: DataHash,
}

/// Aggregation hash chain.
///
/// # Invariants
/// - At least one link and one chain index element.
/// - At most [`MAX_CHAIN_LINKS`] links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationHashChain {
    /// Aggregation round time (unix seconds).
    aggregation_time: u64,
    /// Position of the chain in the global tree, root first.
    chain_index: Vec<u64>,
    /// Declared input hash.
    input_hash: DataHash,
    /// Algorithm used for every link step.
    aggregation_algorithm: HashAlgorithm,
    /// Links from the input towards the root.
    links: Vec<ChainLink>,
}

impl AggregationHashChain {
    /// Creates a chain.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError`] when links or index are empty, or when there are
    /// too many links.
    pub fn new(
        aggregation_time: u64,
        chain_index: Vec<u64>,
        input_hash: DataHash,
        aggregation_algorithm: HashAlgorithm,
        links: Vec<ChainLink>,
    ) -> Result<Self, ChainError> {
        if links.is_empty() {
            return Err(ChainError::EmptyChain);
        }
        if links.len() > MAX_CHAIN_LINKS {
            return Err(ChainError::TooManyLinks(links.len()));
        }
        if chain_index.is_empty() {
            return Err(ChainError::EmptyIndex);
        }
        Ok(Self {
            aggregation_time,
            chain_index,
            input_hash,
            aggregation_algorithm,
            links,
        })
    }

    /// Returns the aggregation time.
    #[must_use]
    pub const fn aggregation_time(&self) -> u64 {
        self.aggregation_time
    }

    /// Returns the chain index.
    #[must_use]
    pub fn chain_index(&self) -> &[u64] {
        &self.chain_index
    }

    /// Returns the declared input hash.
    #[must_use]
    pub const fn input_hash(&self) -> &DataHash {
        &self.input_hash
    }

    /// Returns the aggregation algorithm.
    #[must_use]
    pub const fn aggregation_algorithm(&self) -> HashAlgorithm {
        self.aggregation_algorithm
    }

    /// Returns the links.
    #[must_use]
    pub fn links(&self) -> &[ChainLink] {
        &self.links
    }

    /// Recomputes the root hash starting at `start_level`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::LevelOverflow`] when the level leaves one byte,
    /// and [`ChainError::Hash`] when the algorithm cannot be computed.
    pub fn calculate_output_hash(&self, start_level: u8) -> Result<ChainResult, ChainError> {
        let mut level = start_level;
        let mut current = self.input_hash.clone();
        for (position, link) in self.links.iter().enumerate() {
            level = level
                .checked_add(link.level_correction)
                .and_then(|value| value.checked_add(1))
                .ok_or(ChainError::LevelOverflow {
                    link: position,
                })?;
            let sibling = link.sibling.hash_input()?;
            let running = current.imprint();
            let level_byte = [level];
            let parts: [&[u8]; 3] = match link.direction {
                LinkDirection::Left => [running.as_slice(), sibling.as_slice(), &level_byte[..]],
                LinkDirection::Right => [sibling.as_slice(), running.as_slice(), &level_byte[..]],
            };
            current = hash_parts(self.aggregation_algorithm, &parts)?;
        }
        Ok(ChainResult {
            level,
            output_hash: current,
        })
    }

    /// Derives the chain index value implied by the link directions.
    ///
    /// Walking from the root end, each link shifts the value left and left
    /// links set the low bit; the walk starts from 1.
    #[must_use]
    pub fn index_from_shape(&self) -> u64 {
        self.links.iter().rev().fold(1_u64, |acc, link| {
            let bit = u64::from(link.direction == LinkDirection::Left);
            (acc << 1) | bit
        })
    }

    /// Returns every hash algorithm this chain relies on.
    #[must_use]
    pub fn algorithms(&self) -> Vec<HashAlgorithm> {
        let mut out = vec![self.aggregation_algorithm];
        out.extend(self.links.iter().filter_map(|link| match &link.sibling {
            LinkSibling::Imprint(hash) => Some(hash.algorithm()),
            LinkSibling::LegacyClientId(_) | LinkSibling::Metadata(_) => None,
        }));
        out
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

    /// SHA-256 imprint filled with `byte`.
    fn imprint(byte: u8) -> DataHash {
        DataHash::new(HashAlgorithm::Sha256, vec![byte; 32]).unwrap()
    }

    #[test]
    fn left_and_right_links_order_operands() {
        let input = imprint(1);
        let sibling = imprint(2);
        let left = AggregationHashChain::new(
            10,
            vec![3],
            input.clone(),
            HashAlgorithm::Sha256,
            vec![ChainLink::left(LinkSibling::Imprint(sibling.clone()))],
        )
        .unwrap();
        let expected = hash_parts(
            HashAlgorithm::Sha256,
            &[input.imprint().as_slice(), sibling.imprint().as_slice(), &[1_u8][..]],
        )
        .unwrap();
        let result = left.calculate_output_hash(0).unwrap();
        assert_eq!(result.output_hash, expected);
        assert_eq!(result.level, 1);

        let right = AggregationHashChain::new(
            10,
            vec![2],
            input.clone(),
            HashAlgorithm::Sha256,
            vec![ChainLink::right(LinkSibling::Imprint(sibling.clone())).with_level_correction(2)],
        )
        .unwrap();
        let expected = hash_parts(
            HashAlgorithm::Sha256,
            &[sibling.imprint().as_slice(), input.imprint().as_slice(), &[3_u8][..]],
        )
        .unwrap();
        assert_eq!(right.calculate_output_hash(0).unwrap().output_hash, expected);
    }

    #[test]
    fn level_overflow_is_reported() {
        let chain = AggregationHashChain::new(
            10,
            vec![3],
            imprint(1),
            HashAlgorithm::Sha256,
            vec![ChainLink::left(LinkSibling::Imprint(imprint(2))).with_level_correction(255)],
        )
        .unwrap();
        assert_eq!(
            chain.calculate_output_hash(0),
            Err(ChainError::LevelOverflow {
                link: 0
            })
        );
    }

    #[test]
    fn index_from_shape_reads_root_first() {
        let links = vec![
            ChainLink::left(LinkSibling::Imprint(imprint(2))),
            ChainLink::right(LinkSibling::Imprint(imprint(3))),
            ChainLink::right(LinkSibling::Imprint(imprint(4))),
        ];
        let chain =
            AggregationHashChain::new(10, vec![9], imprint(1), HashAlgorithm::Sha256, links)
                .unwrap();
        assert_eq!(chain.index_from_shape(), 0b1001);
    }

    #[test]
    fn legacy_id_is_padded_to_fixed_length() {
        let bytes = LinkSibling::LegacyClientId("ab".to_string()).hash_input().unwrap();
        assert_eq!(bytes.len(), LEGACY_ID_LENGTH);
        assert_eq!(&bytes[.. 5], &[0x03, 0x00, 0x02, b'a', b'b']);
        assert!(bytes[5 ..].iter().all(|byte| *byte == 0));
        let too_long = "x".repeat(26);
        assert_eq!(
            LinkSibling::LegacyClientId(too_long).hash_input(),
            Err(ChainError::ClientIdTooLong(26))
        );
    }

    #[test]
    fn padded_metadata_has_even_length_and_leading_padding() {
        for client_id in ["a", "ab", "client-7"] {
            let metadata = LinkMetadata::padded(&MetadataFields {
                client_id: client_id.to_string(),
                ..MetadataFields::default()
            })
            .unwrap();
            assert_eq!(metadata.raw().len() % 2, 0);
            let elements = metadata.elements().unwrap();
            assert_eq!(elements[0].tag(), METADATA_PADDING_TAG);
            assert_eq!(metadata.client_id().as_deref(), Some(client_id));
        }
    }
}
