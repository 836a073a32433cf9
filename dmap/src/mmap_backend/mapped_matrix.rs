//! Single full mapping for matrices under the mapping ceiling

use std::path::{Path, PathBuf};

use dmap_core::flat_index;
use memmap2::Mmap;

use super::file_io::MatrixFile;
use super::mmap_core::{map_range, read_f32_le};
use crate::Result;

/// Whole-file mapping of an `N×N` row-major `f32` matrix
///
/// Read-only and immutable once built, so lookups take `&self`.
pub struct MappedMatrix {
    mmap: Mmap,
    path: PathBuf,
    n: usize,
}

impl MappedMatrix {
    /// Open and map `path` as an `n×n` matrix
    pub fn open<P: AsRef<Path>>(path: P, n: usize) -> Result<Self> {
        Self::from_matrix_file(MatrixFile::open(path, Some(n))?)
    }

    /// Map an already validated file in one operation
    ///
    /// The file handle is closed on return; the mapping stays valid.
    pub fn from_matrix_file(matrix: MatrixFile) -> Result<Self> {
        let mmap = map_range(&matrix.file, &matrix.path, 0, matrix.file_len)?;
        Ok(Self {
            mmap,
            path: matrix.path,
            n: matrix.n,
        })
    }

    /// Value stored at `(row, col)`, read from cell `row * N + col`
    pub fn get(&self, row: usize, col: usize) -> Result<f32> {
        let index = flat_index(row, col, self.n)?;
        read_f32_le(&self.mmap, index)
    }

    /// All `N` values of `row`
    #[cfg(target_endian = "little")]
    pub fn row(&self, row: usize) -> Result<&[f32]> {
        let first = flat_index(row, 0, self.n)?;
        super::mmap_core::cast_cells(&self.mmap, first, self.n)
    }

    /// Matrix dimension `N`
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for MappedMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedMatrix")
            .field("path", &self.path)
            .field("n", &self.n)
            .finish()
    }
}
