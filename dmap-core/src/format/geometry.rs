//! Row-aligned stripe geometry
//!
//! A matrix of `N` rows is split into `stripe_count` stripes of
//! `rows_per_stripe` rows each (the last stripe may be shorter). Stripe
//! boundaries always fall between rows, so a row is never split across two
//! mappings.

use super::constants::ELEMENT_SIZE;
use crate::{DmapError, Result};

/// A contiguous, row-aligned slice of the matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stripe {
    /// Position of this stripe in the partition
    pub index: usize,
    /// First row covered (inclusive)
    pub start_row: usize,
    /// Number of rows covered
    pub row_count: usize,
    /// Offset of the first byte in the file
    pub byte_offset: u64,
    /// Length of the byte range in the file
    pub byte_len: u64,
}

impl Stripe {
    /// One past the last row covered
    pub const fn end_row(&self) -> usize {
        self.start_row + self.row_count
    }

    /// Whether `row` falls inside this stripe
    pub const fn contains(&self, row: usize) -> bool {
        row >= self.start_row && row < self.end_row()
    }
}

/// Stripe partition of an `N×N` matrix under a mapping ceiling
///
/// Computed once per matrix. `rows_per_stripe` is as large as the ceiling
/// allows and never less than one, so a single row wider than the ceiling
/// still gets a stripe of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StripeLayout {
    n: usize,
    rows_per_stripe: usize,
    stripe_count: usize,
    max_map_bytes: u64,
}

impl StripeLayout {
    /// Compute the partition for dimension `n` and a mapping ceiling in bytes
    pub fn new(n: usize, max_map_bytes: u64) -> Result<Self> {
        if n == 0 {
            return Err(DmapError::EmptyMatrix);
        }

        let bytes_per_row = (n as u64)
            .checked_mul(ELEMENT_SIZE as u64)
            .ok_or(DmapError::SizeOverflow)?;
        // Total size must be representable even if it is never mapped at once
        bytes_per_row
            .checked_mul(n as u64)
            .ok_or(DmapError::SizeOverflow)?;

        let fit = max_map_bytes / bytes_per_row;
        let rows_per_stripe = usize::try_from(fit).unwrap_or(usize::MAX).clamp(1, n);
        let stripe_count = n.div_ceil(rows_per_stripe);

        Ok(Self {
            n,
            rows_per_stripe,
            stripe_count,
            max_map_bytes,
        })
    }

    /// Matrix dimension `N`
    pub const fn n(&self) -> usize {
        self.n
    }

    pub const fn rows_per_stripe(&self) -> usize {
        self.rows_per_stripe
    }

    pub const fn stripe_count(&self) -> usize {
        self.stripe_count
    }

    pub const fn max_map_bytes(&self) -> u64 {
        self.max_map_bytes
    }

    /// Bytes occupied by one row (`N * 4`)
    pub const fn bytes_per_row(&self) -> u64 {
        self.n as u64 * ELEMENT_SIZE as u64
    }

    /// Bytes occupied by the whole matrix (`N * N * 4`)
    pub const fn total_bytes(&self) -> u64 {
        self.bytes_per_row() * self.n as u64
    }

    /// Whether the whole file fits under the ceiling in one mapping
    pub const fn fits_single_mapping(&self) -> bool {
        self.total_bytes() <= self.max_map_bytes
    }

    /// Whether a single row is wider than the ceiling
    ///
    /// Each stripe then holds exactly one row and its mapping exceeds the
    /// ceiling, since a row cannot be split.
    pub const fn is_degenerate(&self) -> bool {
        self.bytes_per_row() > self.max_map_bytes
    }

    /// Index of the stripe holding `row`
    pub const fn stripe_of(&self, row: usize) -> Result<usize> {
        if row >= self.n {
            return Err(DmapError::IndexOutOfBounds);
        }
        Ok(row / self.rows_per_stripe)
    }

    /// Geometry of stripe `index`, or `None` past the last stripe
    pub const fn stripe(&self, index: usize) -> Option<Stripe> {
        if index >= self.stripe_count {
            return None;
        }

        let start_row = index * self.rows_per_stripe;
        let remaining = self.n - start_row;
        let row_count = if remaining < self.rows_per_stripe {
            remaining
        } else {
            self.rows_per_stripe
        };

        Some(Stripe {
            index,
            start_row,
            row_count,
            byte_offset: start_row as u64 * self.bytes_per_row(),
            byte_len: row_count as u64 * self.bytes_per_row(),
        })
    }

    /// Geometry of the stripe holding `row`
    pub fn stripe_for_row(&self, row: usize) -> Result<Stripe> {
        let index = self.stripe_of(row)?;
        self.stripe(index).ok_or(DmapError::IndexOutOfBounds)
    }

    /// Offset, in cells, of `(row, col)` from the start of its stripe
    ///
    /// The caller guarantees `stripe.contains(row)` and `col < N`.
    pub const fn local_index(&self, stripe: &Stripe, row: usize, col: usize) -> usize {
        (row - stripe.start_row) * self.n + col
    }

    /// Iterate over every stripe in row order
    pub fn stripes(&self) -> Stripes {
        Stripes {
            layout: *self,
            next: 0,
        }
    }
}

/// Iterator over the stripes of a [`StripeLayout`]
#[derive(Debug, Clone)]
pub struct Stripes {
    layout: StripeLayout,
    next: usize,
}

impl Iterator for Stripes {
    type Item = Stripe;

    fn next(&mut self) -> Option<Stripe> {
        let stripe = self.layout.stripe(self.next)?;
        self.next += 1;
        Some(stripe)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.layout.stripe_count.saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Stripes {}
