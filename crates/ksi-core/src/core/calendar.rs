// crates/ksi-core/src/core/calendar.rs
// ============================================================================
// Module: Calendar Hash Chains
// Description: Calendar chain links, root computation, and registration time.
// Purpose: Connect a per-round root to a published calendar root.
// Dependencies: crate::core::{hashing, publication}
// ============================================================================

//! ## Overview
//! The calendar is a growing binary tree with one leaf per second. A calendar
//! chain walks from the leaf of the aggregation round to the root at the
//! publication time:
//! - `Left(h)`: `H(current || h || 0xFF)`
//! - `Right(h)`: `H(h || current || 0xFF)`
//!
//! Each step uses the sibling's algorithm. Right links point at complete
//! subtrees of earlier rounds and therefore stay the same when a chain is
//! extended to a later publication.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::hashing::DataHash;
use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::HashError;
use crate::core::hashing::hash_parts;
use crate::core::publication::PublicationData;

// ============================================================================
// SECTION: Links
// ============================================================================

/// Level byte appended to every calendar step.
const CALENDAR_LEVEL_BYTE: u8 = 0xff;

/// Calendar chain link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarLink {
    /// Sibling is a later subtree: `H(current || sibling || 0xFF)`.
    Left(DataHash),
    /// Sibling is an earlier complete subtree: `H(sibling || current || 0xFF)`.
    Right(DataHash),
}

impl CalendarLink {
    /// Returns the sibling hash.
    #[must_use]
    pub const fn sibling(&self) -> &DataHash {
        match self {
            Self::Left(hash) | Self::Right(hash) => hash,
        }
    }

    /// Returns true for right links.
    #[must_use]
    pub const fn is_right(&self) -> bool {
        matches!(self, Self::Right(_))
    }
}

// ============================================================================
// SECTION: Chain
// ============================================================================

/// Calendar hash chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarHashChain {
    /// Publication (root) time.
    publication_time: u64,
    /// Aggregation round time of the leaf.
    aggregation_time: u64,
    /// Leaf input hash (the aggregation root).
    input_hash: DataHash,
    /// Links from the leaf towards the root.
    links: Vec<CalendarLink>,
}

impl CalendarHashChain {
    /// Creates a calendar chain.
    #[must_use]
    pub const fn new(
        publication_time: u64,
        aggregation_time: u64,
        input_hash: DataHash,
        links: Vec<CalendarLink>,
    ) -> Self {
        Self {
            publication_time,
            aggregation_time,
            input_hash,
            links,
        }
    }

    /// Returns the publication time.
    #[must_use]
    pub const fn publication_time(&self) -> u64 {
        self.publication_time
    }

    /// Returns the aggregation time.
    #[must_use]
    pub const fn aggregation_time(&self) -> u64 {
        self.aggregation_time
    }

    /// Returns the input hash.
    #[must_use]
    pub const fn input_hash(&self) -> &DataHash {
        &self.input_hash
    }

    /// Returns the links.
    #[must_use]
    pub fn links(&self) -> &[CalendarLink] {
        &self.links
    }

    /// Returns the right-link siblings in chain order.
    pub fn right_links(&self) -> impl Iterator<Item = &DataHash> {
        self.links.iter().filter(|link| link.is_right()).map(CalendarLink::sibling)
    }

    /// Returns every algorithm used by link siblings.
    #[must_use]
    pub fn algorithms(&self) -> Vec<HashAlgorithm> {
        self.links.iter().map(|link| link.sibling().algorithm()).collect()
    }

    /// Recomputes the calendar root.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::NotImplemented`] when a sibling algorithm cannot be
    /// computed.
    pub fn output_hash(&self) -> Result<DataHash, HashError> {
        let level = [CALENDAR_LEVEL_BYTE];
        self.links.iter().try_fold(self.input_hash.clone(), |current, link| {
            let running = current.imprint();
            let sibling = link.sibling().imprint();
            let parts: [&[u8]; 3] = match link {
                CalendarLink::Left(_) => [running.as_slice(), sibling.as_slice(), &level[..]],
                CalendarLink::Right(_) => [sibling.as_slice(), running.as_slice(), &level[..]],
            };
            hash_parts(link.sibling().algorithm(), &parts)
        })
    }

    /// Returns the publication data this chain commits to.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when the root cannot be computed.
    pub fn publication_data(&self) -> Result<PublicationData, HashError> {
        Ok(PublicationData::new(self.publication_time, self.output_hash()?))
    }

    /// Recomputes the registration time from the link shape.
    ///
    /// Returns `None` when the shape cannot belong to any round under this
    /// publication time.
    #[must_use]
    pub fn registration_time(&self) -> Option<u64> {
        let mut remaining = self.publication_time;
        let mut time = 0_u64;
        for link in self.links.iter().rev() {
            if remaining == 0 {
                return None;
            }
            let high = high_bit(remaining);
            match link {
                CalendarLink::Left(_) => remaining = high - 1,
                CalendarLink::Right(_) => {
                    time = time.checked_add(high)?;
                    remaining -= high;
                }
            }
        }
        (remaining == 0).then_some(time)
    }
}

/// Largest power of two not above `value` (`value` must be non-zero).
const fn high_bit(value: u64) -> u64 {
    1 << (63 - value.leading_zeros())
}

/// Link directions, leaf first, for a calendar chain from round
/// `aggregation_time` up to `publication_time`; `true` marks a right link.
///
/// Returns `None` when the round lies after the publication.
#[must_use]
pub fn link_shape(aggregation_time: u64, publication_time: u64) -> Option<Vec<bool>> {
    if aggregation_time > publication_time {
        return None;
    }
    let mut shape = Vec::new();
    let mut remaining = publication_time;
    let mut time = 0_u64;
    while remaining > 0 {
        let high = high_bit(remaining);
        if aggregation_time >= time + high {
            shape.push(true);
            time += high;
            remaining -= high;
        } else {
            shape.push(false);
            remaining = high - 1;
        }
    }
    shape.reverse();
    Some(shape)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
