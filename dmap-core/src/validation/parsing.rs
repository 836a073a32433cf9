//! Parsing utilities for batch unit ranges
//!
//! Pure string parsing with no I/O dependencies.

use crate::DmapError;
use core::ops::Range;

/// Parse a unit range in the format "start:end", "start-end" or "unit"
///
/// The end is exclusive. A single number selects just that unit. An empty
/// range (`start == end`) is accepted and selects nothing.
pub fn parse_range(range_str: &str) -> Result<Range<usize>, DmapError> {
    if range_str.is_empty() {
        return Err(DmapError::InvalidRange);
    }

    let Some(sep) = range_str.find([':', '-']) else {
        let unit = parse_usize(range_str)?;
        let end = unit.checked_add(1).ok_or(DmapError::SizeOverflow)?;
        return Ok(unit..end);
    };

    let start = parse_usize(&range_str[..sep])?;
    let end = parse_usize(&range_str[sep + 1..])?;

    if start > end {
        return Err(DmapError::InvalidRange);
    }

    Ok(start..end)
}

/// Decimal digits only; no sign, no whitespace
fn parse_usize(s: &str) -> Result<usize, DmapError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DmapError::InvalidRange);
    }
    s.parse().map_err(|_| DmapError::SizeOverflow)
}
