//! Coordinate validation for `N×N` matrices
//!
//! Pure checks with no I/O. Rejects instead of clamping or wrapping.

use crate::DmapError;

/// Validate that `(row, col)` lies inside an `n×n` matrix
pub const fn validate_coordinates(row: usize, col: usize, n: usize) -> Result<(), DmapError> {
    if row >= n || col >= n {
        return Err(DmapError::IndexOutOfBounds);
    }
    Ok(())
}

/// Convert signed coordinates into matrix coordinates
///
/// Both signs are checked jointly before either bound, so a negative row
/// paired with a valid column (or the reverse) can never slip through.
pub const fn coordinates_from_signed(
    row: i64,
    col: i64,
    n: usize,
) -> Result<(usize, usize), DmapError> {
    if (row | col) < 0 {
        return Err(DmapError::IndexOutOfBounds);
    }
    if row as u64 >= n as u64 || col as u64 >= n as u64 {
        return Err(DmapError::IndexOutOfBounds);
    }
    Ok((row as usize, col as usize))
}

/// Flat cell index `row * n + col` of a validated coordinate
pub const fn flat_index(row: usize, col: usize, n: usize) -> Result<usize, DmapError> {
    if let Err(e) = validate_coordinates(row, col, n) {
        return Err(e);
    }
    match row.checked_mul(n) {
        Some(base) => Ok(base + col),
        None => Err(DmapError::SizeOverflow),
    }
}
