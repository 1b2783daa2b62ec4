// crates/ksi-core/src/core/tlv.rs
// ============================================================================
// Module: TLV Elements
// Description: Type-length-value element reader and writer.
// Purpose: Inspect metadata layout and produce signed publication bytes.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Elements use either an 8-bit header (`[flags|type:5][len:8]`) or a 16-bit
//! header (`[0x80|flags|type_hi:5][type_lo][len_hi][len_lo]`). Flags are
//! `0x80` for the 16-bit form, `0x40` for non-critical and `0x20` for forward.
//! The reader keeps the header form so layout checks can see exactly what was
//! encoded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header flag selecting the 16-bit form.
pub const FLAG_TLV16: u8 = 0x80;
/// Header flag marking the element as non-critical.
pub const FLAG_NON_CRITICAL: u8 = 0x40;
/// Header flag asking unknown elements to be forwarded.
pub const FLAG_FORWARD: u8 = 0x20;
/// Largest tag that fits an 8-bit header.
pub const MAX_TLV8_TAG: u16 = 0x1f;
/// Largest tag that fits a 16-bit header.
pub const MAX_TLV16_TAG: u16 = 0x1fff;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while reading or writing TLV elements.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TlvError {
    /// Input ended before the element did.
    #[error("truncated tlv element: needed {needed} bytes, {available} available")]
    Truncated {
        /// Bytes required to finish the element.
        needed: usize,
        /// Bytes remaining in the input.
        available: usize,
    },
    /// Tag does not fit the header form.
    #[error("tlv tag 0x{0:x} out of range")]
    TagOutOfRange(u16),
    /// Value does not fit the header form.
    #[error("tlv value too long for tag 0x{tag:x}: {length} bytes")]
    ValueTooLong {
        /// Element tag.
        tag: u16,
        /// Value length.
        length: usize,
    },
    /// Integer value has more than eight bytes.
    #[error("tlv integer too long: {0} bytes")]
    IntegerTooLong(usize),
}

// ============================================================================
// SECTION: Element
// ============================================================================

/// A single TLV element with its header form preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvElement {
    /// Element type.
    tag: u16,
    /// Non-critical flag.
    non_critical: bool,
    /// Forward flag.
    forward: bool,
    /// True when the element uses the 16-bit header.
    tlv16: bool,
    /// Raw value bytes.
    value: Vec<u8>,
}

impl TlvElement {
    /// Creates an element, choosing the 8-bit header when tag and length allow.
    #[must_use]
    pub fn new(tag: u16, value: Vec<u8>) -> Self {
        let tlv16 = tag > MAX_TLV8_TAG || value.len() > usize::from(u8::MAX);
        Self {
            tag,
            non_critical: false,
            forward: false,
            tlv16,
            value,
        }
    }

    /// Creates an element holding the minimal big-endian encoding of `value`.
    #[must_use]
    pub fn unsigned(tag: u16, value: u64) -> Self {
        Self::new(tag, encode_unsigned(value))
    }

    /// Creates an element whose value is the concatenated encoding of
    /// `children`.
    ///
    /// # Errors
    ///
    /// Returns [`TlvError`] when a child cannot be encoded.
    pub fn composite(tag: u16, children: &[Self]) -> Result<Self, TlvError> {
        let mut value = Vec::new();
        for child in children {
            child.encode_into(&mut value)?;
        }
        Ok(Self::new(tag, value))
    }

    /// Sets the non-critical and forward flags.
    #[must_use]
    pub const fn with_flags(mut self, non_critical: bool, forward: bool) -> Self {
        self.non_critical = non_critical;
        self.forward = forward;
        self
    }

    /// Forces the 16-bit header form.
    #[must_use]
    pub const fn into_tlv16(mut self) -> Self {
        self.tlv16 = true;
        self
    }

    /// Returns the element type.
    #[must_use]
    pub const fn tag(&self) -> u16 {
        self.tag
    }

    /// Returns true when the non-critical flag is set.
    #[must_use]
    pub const fn is_non_critical(&self) -> bool {
        self.non_critical
    }

    /// Returns true when the forward flag is set.
    #[must_use]
    pub const fn is_forward(&self) -> bool {
        self.forward
    }

    /// Returns true when the element uses the 16-bit header.
    #[must_use]
    pub const fn is_tlv16(&self) -> bool {
        self.tlv16
    }

    /// Returns the raw value bytes.
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Returns the encoded length (header plus value).
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        let header = if self.tlv16 { 4 } else { 2 };
        header + self.value.len()
    }

    /// Parses the value as nested elements.
    ///
    /// # Errors
    ///
    /// Returns [`TlvError`] when the value is not a sequence of elements.
    pub fn children(&self) -> Result<Vec<Self>, TlvError> {
        parse_all(&self.value)
    }

    /// Decodes the value as a big-endian unsigned integer.
    ///
    /// # Errors
    ///
    /// Returns [`TlvError::IntegerTooLong`] for values over eight bytes.
    pub fn as_unsigned(&self) -> Result<u64, TlvError> {
        if self.value.len() > 8 {
            return Err(TlvError::IntegerTooLong(self.value.len()));
        }
        Ok(self.value.iter().fold(0_u64, |acc, byte| (acc << 8) | u64::from(*byte)))
    }

    /// Encodes the element.
    ///
    /// # Errors
    ///
    /// Returns [`TlvError`] when the tag or length does not fit the header.
    pub fn encode(&self) -> Result<Vec<u8>, TlvError> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out)?;
        Ok(out)
    }

    /// Appends the encoding to `out`.
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), TlvError> {
        let mut flags = 0;
        if self.non_critical {
            flags |= FLAG_NON_CRITICAL;
        }
        if self.forward {
            flags |= FLAG_FORWARD;
        }
        if self.tlv16 {
            if self.tag > MAX_TLV16_TAG {
                return Err(TlvError::TagOutOfRange(self.tag));
            }
            let length = u16::try_from(self.value.len()).map_err(|_| TlvError::ValueTooLong {
                tag: self.tag,
                length: self.value.len(),
            })?;
            let [tag_hi, tag_lo] = self.tag.to_be_bytes();
            out.push(FLAG_TLV16 | flags | tag_hi);
            out.push(tag_lo);
            out.extend_from_slice(&length.to_be_bytes());
        } else {
            let tag = u8::try_from(self.tag)
                .ok()
                .filter(|tag| u16::from(*tag) <= MAX_TLV8_TAG)
                .ok_or(TlvError::TagOutOfRange(self.tag))?;
            let length = u8::try_from(self.value.len()).map_err(|_| TlvError::ValueTooLong {
                tag: self.tag,
                length: self.value.len(),
            })?;
            out.push(flags | tag);
            out.push(length);
        }
        out.extend_from_slice(&self.value);
        Ok(())
    }
}

// ============================================================================
// SECTION: Reader
// ============================================================================

/// Parses one element from the front of `bytes`.
///
/// Returns the element and the number of bytes consumed.
///
/// # Errors
///
/// Returns [`TlvError::Truncated`] when the input ends early.
pub fn parse_one(bytes: &[u8]) -> Result<(TlvElement, usize), TlvError> {
    let first = *bytes.first().ok_or(TlvError::Truncated {
        needed: 2,
        available: 0,
    })?;
    let tlv16 = first & FLAG_TLV16 != 0;
    let header_len = if tlv16 { 4 } else { 2 };
    let header = bytes.get(.. header_len).ok_or(TlvError::Truncated {
        needed: header_len,
        available: bytes.len(),
    })?;
    let (tag, length) = if tlv16 {
        let tag = u16::from_be_bytes([first & 0x1f, header[1]]);
        (tag, usize::from(u16::from_be_bytes([header[2], header[3]])))
    } else {
        (u16::from(first & 0x1f), usize::from(header[1]))
    };
    let end = header_len + length;
    let value = bytes.get(header_len .. end).ok_or(TlvError::Truncated {
        needed: end,
        available: bytes.len(),
    })?;
    let element = TlvElement {
        tag,
        non_critical: first & FLAG_NON_CRITICAL != 0,
        forward: first & FLAG_FORWARD != 0,
        tlv16,
        value: value.to_vec(),
    };
    Ok((element, end))
}

/// Parses a complete sequence of elements.
///
/// # Errors
///
/// Returns [`TlvError::Truncated`] when any element runs past the input.
pub fn parse_all(mut bytes: &[u8]) -> Result<Vec<TlvElement>, TlvError> {
    let mut out = Vec::new();
    while !bytes.is_empty() {
        let (element, consumed) = parse_one(bytes)?;
        out.push(element);
        bytes = bytes.get(consumed ..).unwrap_or_default();
    }
    Ok(out)
}

/// Minimal big-endian encoding of an unsigned integer; zero encodes as no bytes.
#[must_use]
pub fn encode_unsigned(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take_while(|byte| **byte == 0).count();
    bytes[skip ..].to_vec()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
