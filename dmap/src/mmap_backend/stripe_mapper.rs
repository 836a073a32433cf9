//! Sliding stripe window over a matrix too large to map at once
//!
//! The matrix is cut into row-aligned stripes no larger than the mapping
//! ceiling. At most one stripe is mapped at a time; touching a row outside
//! it releases the current mapping and maps the stripe holding that row.

use std::fs::File;
use std::path::{Path, PathBuf};

use dmap_core::{validate_coordinates, DmapError, Stripe, StripeLayout};
use memmap2::Mmap;
use tracing::debug;

use super::file_io::MatrixFile;
use super::mmap_core::{map_range, read_f32_le};
use crate::{MapConfig, Result};

/// The currently mapped stripe
struct Window {
    stripe: Stripe,
    mmap: Mmap,
}

/// Windowed reader for an `N×N` row-major `f32` matrix file
///
/// Owns the file handle and the single live mapping; both are released on
/// drop. `get` moves the window and therefore needs `&mut self`; share one
/// mapper between threads only behind external locking.
pub struct StripeMapper {
    file: File,
    path: PathBuf,
    layout: StripeLayout,
    window: Option<Window>,
    remaps: u64,
}

impl StripeMapper {
    /// Open `path` as an `n×n` matrix with the default mapping ceiling
    pub fn open<P: AsRef<Path>>(path: P, n: usize) -> Result<Self> {
        Self::with_config(path, n, &MapConfig::default())
    }

    /// Open `path` as an `n×n` matrix under `config`
    pub fn with_config<P: AsRef<Path>>(path: P, n: usize, config: &MapConfig) -> Result<Self> {
        let matrix = MatrixFile::open(path, Some(n))?;
        Self::from_matrix_file(matrix, config)
    }

    /// Build a mapper over an already validated file
    ///
    /// No mapping is made until the first `get`.
    pub fn from_matrix_file(matrix: MatrixFile, config: &MapConfig) -> Result<Self> {
        let MatrixFile { file, path, n, .. } = matrix;
        let layout = StripeLayout::new(n, config.max_map_bytes)
            .map_err(|e| crate::Error::matrix(&path, e))?;

        debug!(
            path = %path.display(),
            n,
            rows_per_stripe = layout.rows_per_stripe(),
            stripe_count = layout.stripe_count(),
            "stripe layout"
        );

        Ok(Self {
            file,
            path,
            layout,
            window: None,
            remaps: 0,
        })
    }

    /// Value stored at `(row, col)`
    ///
    /// Remaps when `row` lies outside the current stripe; otherwise no I/O.
    pub fn get(&mut self, row: usize, col: usize) -> Result<f32> {
        validate_coordinates(row, col, self.layout.n())?;
        let layout = self.layout;
        let window = self.window_for(row)?;
        read_f32_le(&window.mmap, layout.local_index(&window.stripe, row, col))
    }

    /// All `N` values of `row`, borrowed from the current mapping
    #[cfg(target_endian = "little")]
    pub fn row(&mut self, row: usize) -> Result<&[f32]> {
        validate_coordinates(row, 0, self.layout.n())?;
        let layout = self.layout;
        let window = self.window_for(row)?;
        super::mmap_core::cast_cells(
            &window.mmap,
            layout.local_index(&window.stripe, row, 0),
            layout.n(),
        )
    }

    /// Matrix dimension `N`
    pub fn n(&self) -> usize {
        self.layout.n()
    }

    pub fn layout(&self) -> &StripeLayout {
        &self.layout
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stripe currently mapped, if any
    pub fn current_stripe(&self) -> Option<Stripe> {
        self.window.as_ref().map(|w| w.stripe)
    }

    /// Number of mappings established so far
    pub fn remap_count(&self) -> u64 {
        self.remaps
    }

    fn window_for(&mut self, row: usize) -> Result<&Window> {
        let index = self.layout.stripe_of(row)?;
        let window = match self.window.take() {
            Some(current) if current.stripe.index == index => current,
            previous => {
                // Unmap before reserving the next range
                drop(previous);
                self.map_stripe(index)?
            }
        };
        let window: &Window = self.window.insert(window);
        Ok(window)
    }

    fn map_stripe(&mut self, index: usize) -> Result<Window> {
        let stripe = self
            .layout
            .stripe(index)
            .ok_or(DmapError::IndexOutOfBounds)?;
        let mmap = map_range(&self.file, &self.path, stripe.byte_offset, stripe.byte_len)?;
        self.remaps += 1;

        debug!(
            stripe = stripe.index,
            start_row = stripe.start_row,
            rows = stripe.row_count,
            bytes = stripe.byte_len,
            remaps = self.remaps,
            "mapped stripe"
        );

        Ok(Window { stripe, mmap })
    }
}

impl std::fmt::Debug for StripeMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeMapper")
            .field("path", &self.path)
            .field("layout", &self.layout)
            .field("current_stripe", &self.current_stripe())
            .field("remaps", &self.remaps)
            .finish()
    }
}
