//! Distance adapter over a mapped matrix file
//!
//! Exposes either backend through [`DistanceSource`] so a clustering
//! algorithm can address objects by dense identifiers `0..N`.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use dmap_core::{DistanceSource, StripeLayout};
use tracing::{debug, warn};

use crate::mmap_backend::{MappedMatrix, MatrixFile, StripeMapper};
use crate::{Error, MapConfig, Result};

/// Backing store chosen once when a matrix is opened
pub enum Backing {
    /// Whole file in one mapping
    Mapped(MappedMatrix),
    /// Sliding stripe window; `RefCell` because lookups move the window
    Windowed(RefCell<StripeMapper>),
}

/// Summary of an opened matrix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixInfo {
    pub path: PathBuf,
    /// Matrix dimension `N`
    pub n: usize,
    pub file_len: u64,
    /// Whether the stripe window is in use
    pub windowed: bool,
    /// Stripe partition under the configured ceiling
    pub layout: StripeLayout,
}

/// Dense `N×N` distance matrix read from disk
///
/// Distances are read as stored: `distance(i, j)` and `distance(j, i)` come
/// from different cells and are not assumed equal. The windowed variant is
/// `!Sync`; use one matrix per thread.
pub struct DistanceMatrix {
    backing: Backing,
    info: MatrixInfo,
    /// First failed lookup made through [`DistanceSource::distance`]
    failure: RefCell<Option<Error>>,
}

impl DistanceMatrix {
    /// Open `path`, resolving `N` from `dimension` or the file size
    ///
    /// Picks a single full mapping when the file fits under
    /// `config.max_map_bytes` (unless `force_windowed`), otherwise the stripe
    /// window.
    pub fn open<P: AsRef<Path>>(path: P, dimension: Option<usize>, config: &MapConfig) -> Result<Self> {
        let matrix = MatrixFile::open(path, dimension)?;
        let layout = StripeLayout::new(matrix.n(), config.max_map_bytes)
            .map_err(|e| Error::matrix(matrix.path(), e))?;
        let windowed = config.force_windowed || !layout.fits_single_mapping();

        let info = MatrixInfo {
            path: matrix.path().to_path_buf(),
            n: matrix.n(),
            file_len: matrix.file_len(),
            windowed,
            layout,
        };

        let backing = if windowed {
            Backing::Windowed(RefCell::new(StripeMapper::from_matrix_file(matrix, config)?))
        } else {
            Backing::Mapped(MappedMatrix::from_matrix_file(matrix)?)
        };

        debug!(
            path = %info.path.display(),
            n = info.n,
            windowed,
            stripes = layout.stripe_count(),
            "opened distance matrix"
        );

        Ok(Self {
            backing,
            info,
            failure: RefCell::new(None),
        })
    }

    /// Distance from `i` to `j`, with read failures returned
    pub fn try_distance(&self, i: usize, j: usize) -> Result<f32> {
        match &self.backing {
            Backing::Mapped(matrix) => matrix.get(i, j),
            Backing::Windowed(mapper) => mapper.borrow_mut().get(i, j),
        }
    }

    /// Take the first lookup failure recorded by `distance`, if any
    ///
    /// Values returned by `distance` after a failure are placeholders, so a
    /// caller must check this before trusting anything computed from them.
    pub fn take_failure(&self) -> Option<Error> {
        self.failure.borrow_mut().take()
    }

    pub fn has_failed(&self) -> bool {
        self.failure.borrow().is_some()
    }

    pub fn info(&self) -> &MatrixInfo {
        &self.info
    }

    pub fn backing(&self) -> &Backing {
        &self.backing
    }

    pub fn is_windowed(&self) -> bool {
        matches!(self.backing, Backing::Windowed(_))
    }

    /// Stripe mappings made so far; `None` for a full mapping
    pub fn remap_count(&self) -> Option<u64> {
        match &self.backing {
            Backing::Mapped(_) => None,
            Backing::Windowed(mapper) => Some(mapper.borrow().remap_count()),
        }
    }
}

impl DistanceSource for DistanceMatrix {
    fn len(&self) -> usize {
        self.info.n
    }

    /// Stored distance, or `f32::INFINITY` once a lookup has failed
    ///
    /// The first failure (out-of-range pair, failed mapping) is kept for
    /// [`DistanceMatrix::take_failure`]; later calls do no I/O.
    fn distance(&self, i: usize, j: usize) -> f32 {
        if self.has_failed() {
            return f32::INFINITY;
        }
        match self.try_distance(i, j) {
            Ok(d) => d,
            Err(e) => {
                warn!(i, j, error = %e, "distance lookup failed");
                *self.failure.borrow_mut() = Some(e);
                f32::INFINITY
            }
        }
    }
}

impl std::fmt::Debug for DistanceMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistanceMatrix")
            .field("info", &self.info)
            .field("remaps", &self.remap_count())
            .field("failed", &self.has_failed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mmap_backend::write_matrix_with;
    use dmap_core::DmapError;

    fn fixture(n: usize) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.bin");
        write_matrix_with(&path, n, |i, j| (i * n + j) as f32).unwrap();
        (dir, path)
    }

    #[test]
    fn test_small_matrix_uses_full_mapping() {
        let (_dir, path) = fixture(8);
        let matrix = DistanceMatrix::open(&path, None, &MapConfig::default()).unwrap();
        assert!(!matrix.is_windowed());
        assert_eq!(matrix.remap_count(), None);
        assert_eq!(matrix.len(), 8);
        assert_eq!(matrix.info().file_len, 8 * 8 * 4);
    }

    #[test]
    fn test_large_matrix_uses_window() {
        let (_dir, path) = fixture(8);
        // Room for 3 rows of 32 bytes
        let config = MapConfig::with_max_map_bytes(96);
        let matrix = DistanceMatrix::open(&path, Some(8), &config).unwrap();
        assert!(matrix.is_windowed());
        assert_eq!(matrix.info().layout.stripe_count(), 3);
        assert_eq!(matrix.remap_count(), Some(0));
    }

    #[test]
    fn test_variants_agree() {
        let n = 11;
        let (_dir, path) = fixture(n);
        let mapped = DistanceMatrix::open(&path, None, &MapConfig::default()).unwrap();
        let windowed = DistanceMatrix::open(
            &path,
            None,
            &MapConfig::with_max_map_bytes(2 * 11 * 4).with_force_windowed(true),
        )
        .unwrap();

        for i in 0..n {
            for j in 0..n {
                let a = mapped.distance(i, j);
                let b = windowed.distance(i, j);
                assert_eq!(a.to_bits(), b.to_bits());
                assert_eq!(a, (i * n + j) as f32);
            }
        }
        // Row-major sweep crosses each of the 6 stripes once
        assert_eq!(windowed.remap_count(), Some(6));
    }

    #[test]
    fn test_not_symmetric() {
        let (_dir, path) = fixture(3);
        let matrix = DistanceMatrix::open(&path, None, &MapConfig::default()).unwrap();
        assert!(!matrix.is_symmetric());
        assert_ne!(matrix.distance(0, 2), matrix.distance(2, 0));
        // Range hook accepts the dense identifier space
        matrix.check_range(0..3);
    }

    #[test]
    fn test_try_distance_out_of_range() {
        let (_dir, path) = fixture(3);
        for config in [MapConfig::default(), MapConfig::default().with_force_windowed(true)] {
            let matrix = DistanceMatrix::open(&path, None, &config).unwrap();
            let err = matrix.try_distance(3, 0).unwrap_err();
            assert_eq!(err.kind(), Some(DmapError::IndexOutOfBounds));
        }
    }

    #[test]
    fn test_failed_lookup_is_recorded() {
        let (_dir, path) = fixture(3);
        for config in [MapConfig::default(), MapConfig::default().with_force_windowed(true)] {
            let matrix = DistanceMatrix::open(&path, None, &config).unwrap();
            assert_eq!(matrix.distance(1, 2), 5.0);
            assert!(matrix.take_failure().is_none());

            assert_eq!(matrix.distance(0, 9), f32::INFINITY);
            assert!(matrix.has_failed());
            // Valid pairs are not read once poisoned
            assert_eq!(matrix.distance(1, 2), f32::INFINITY);

            let err = matrix.take_failure().unwrap();
            assert_eq!(err.kind(), Some(DmapError::IndexOutOfBounds));
            assert!(matrix.take_failure().is_none());
        }
    }

    #[test]
    fn test_open_rejects_bad_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.bin");
        std::fs::write(&path, vec![0u8; 4 * 4 * 4 + 1]).unwrap();

        let err = DistanceMatrix::open(&path, None, &MapConfig::default()).unwrap_err();
        assert_eq!(err.kind(), Some(DmapError::NotSquare));
        let err = DistanceMatrix::open(&path, Some(4), &MapConfig::default()).unwrap_err();
        assert_eq!(err.kind(), Some(DmapError::SizeMismatch));
    }
}
