// crates/ksi-core/src/core/time.rs
// ============================================================================
// Module: Signature Time Values
// Description: Rendering of unix-second timestamps.
// Purpose: Show aggregation and publication times as RFC 3339 in diagnostics.
// Dependencies: time
// ============================================================================

//! ## Overview
//! Signature times are plain unix seconds (`u64`). The verifier never reads
//! the wall clock for a decision; this module only formats values for humans.

// ============================================================================
// SECTION: Imports
// ============================================================================

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Formatting
// ============================================================================

/// Formats unix seconds as RFC 3339, falling back to the raw number when the
/// value is outside the supported calendar range.
#[must_use]
pub fn format_unix_seconds(seconds: u64) -> String {
    i64::try_from(seconds)
        .ok()
        .and_then(|value| OffsetDateTime::from_unix_timestamp(value).ok())
        .and_then(|instant| instant.format(&Rfc3339).ok())
        .unwrap_or_else(|| seconds.to_string())
}

#[cfg(test)]
mod tests {
    use super::format_unix_seconds;

    #[test]
    fn formats_known_instant() {
        assert_eq!(format_unix_seconds(1_467_331_200), "2016-07-01T00:00:00Z");
    }

    #[test]
    fn out_of_range_falls_back_to_number() {
        assert_eq!(format_unix_seconds(u64::MAX), u64::MAX.to_string());
    }
}
