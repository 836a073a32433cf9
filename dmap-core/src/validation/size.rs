//! File size validation and dimension derivation
//!
//! A matrix file holds exactly `N * N * 4` bytes with no header. `N` is
//! either supplied by the caller and checked against the file length, or
//! derived from the length when that length is an exact square.

use crate::format::ELEMENT_SIZE;
use crate::DmapError;

/// Expected file length in bytes for dimension `n`
pub const fn matrix_byte_len(n: usize) -> Result<u64, DmapError> {
    if n == 0 {
        return Err(DmapError::EmptyMatrix);
    }
    let cells = match (n as u64).checked_mul(n as u64) {
        Some(cells) => cells,
        None => return Err(DmapError::SizeOverflow),
    };
    match cells.checked_mul(ELEMENT_SIZE as u64) {
        Some(len) => Ok(len),
        None => Err(DmapError::SizeOverflow),
    }
}

/// Check that a file of `file_len` bytes holds an `n×n` matrix
pub const fn validate_file_len(n: usize, file_len: u64) -> Result<(), DmapError> {
    let expected = match matrix_byte_len(n) {
        Ok(len) => len,
        Err(e) => return Err(e),
    };
    if expected != file_len {
        return Err(DmapError::SizeMismatch);
    }
    Ok(())
}

/// Derive `N` from a file length, assuming a square matrix
///
/// Exact: fails with [`DmapError::NotSquare`] unless the length is a whole
/// number of cells and that count is a perfect square. Non-square or padded
/// files must have their dimension supplied explicitly.
pub fn derive_dimension(file_len: u64) -> Result<usize, DmapError> {
    if file_len == 0 {
        return Err(DmapError::EmptyMatrix);
    }
    if file_len % ELEMENT_SIZE as u64 != 0 {
        return Err(DmapError::NotSquare);
    }

    let cells = file_len / ELEMENT_SIZE as u64;
    let n = isqrt(cells);
    if n * n != cells {
        return Err(DmapError::NotSquare);
    }

    usize::try_from(n).map_err(|_| DmapError::SizeOverflow)
}

/// Floor of the square root, by Newton's method on integers
const fn isqrt(value: u64) -> u64 {
    if value < 2 {
        return value;
    }
    let mut x = value;
    let mut y = value / 2 + (value & 1);
    while y < x {
        x = y;
        y = (x + value / x) / 2;
    }
    x
}

/// Resolve the matrix dimension from an optional explicit value
pub fn resolve_dimension(explicit: Option<usize>, file_len: u64) -> Result<usize, DmapError> {
    match explicit {
        Some(n) => {
            validate_file_len(n, file_len)?;
            Ok(n)
        }
        None => derive_dimension(file_len),
    }
}
