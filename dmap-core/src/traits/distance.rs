//! Distance capability consumed by clustering algorithms
//!
//! Objects are addressed by dense identifiers `0..N`. Implementations hand
//! out precomputed values; nothing here computes a distance.

use core::ops::Range;

/// Two-index distance lookup over a dense identifier space
///
/// No symmetry is assumed: `distance(i, j)` and `distance(j, i)` are read
/// from different cells and may differ.
pub trait DistanceSource {
    /// Number of identifiers `N`
    fn len(&self) -> usize;

    /// Whether the identifier space is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distance from `i` to `j`
    ///
    /// Both indices must be in `0..N`. Implementations panic on an
    /// out-of-range pair or a failed read: either means the caller asked for
    /// an identifier it was never given.
    fn distance(&self, i: usize, j: usize) -> f32;

    /// Range check hook called before clustering
    ///
    /// Identifiers are assigned densely over `0..N` and never reordered, so
    /// the default accepts every range.
    fn check_range(&self, _ids: Range<usize>) {}

    /// Whether `distance(i, j) == distance(j, i)` is guaranteed
    fn is_symmetric(&self) -> bool {
        false
    }
}

impl<D: DistanceSource + ?Sized> DistanceSource for &D {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn distance(&self, i: usize, j: usize) -> f32 {
        (**self).distance(i, j)
    }

    fn check_range(&self, ids: Range<usize>) {
        (**self).check_range(ids)
    }

    fn is_symmetric(&self) -> bool {
        (**self).is_symmetric()
    }
}
