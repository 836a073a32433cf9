//! Shared helpers for reading `f32` cells out of mapped bytes

use std::fs::File;
use std::path::Path;

use dmap_core::{DmapError, ELEMENT_SIZE};
use memmap2::{Mmap, MmapOptions};

use crate::{Error, Result};

/// Map `len` bytes of `file` starting at `offset`, read-only
///
/// `offset` need not be page aligned; memmap2 rounds down internally and
/// hands back a view that starts exactly at `offset`.
pub(crate) fn map_range(file: &File, path: &Path, offset: u64, len: u64) -> Result<Mmap> {
    let map_len = usize::try_from(len).map_err(|_| Error::matrix(path, DmapError::SizeOverflow))?;

    // SAFETY: The file is opened read-only and its length was validated
    // against the matrix dimension, so the range lies inside the file. The
    // mapping is never written through. Truncating the file externally
    // while mapped is outside this crate's contract.
    unsafe {
        MmapOptions::new()
            .offset(offset)
            .len(map_len)
            .map(file)
    }
    .map_err(|source| Error::Map {
        path: path.to_path_buf(),
        offset,
        len,
        source,
    })
}

/// Read the little-endian `f32` at cell `index` of `bytes`
#[inline]
pub(crate) fn read_f32_le(bytes: &[u8], index: usize) -> Result<f32> {
    let start = index
        .checked_mul(ELEMENT_SIZE)
        .ok_or(DmapError::SizeOverflow)?;
    let cell = bytes
        .get(start..start + ELEMENT_SIZE)
        .ok_or(DmapError::IndexOutOfBounds)?;
    let mut buf = [0u8; ELEMENT_SIZE];
    buf.copy_from_slice(cell);
    Ok(f32::from_le_bytes(buf))
}

/// View `cells` consecutive cells starting at cell `first` as `&[f32]`
///
/// Zero-copy; only available where native byte order is little-endian.
#[cfg(target_endian = "little")]
pub(crate) fn cast_cells(bytes: &[u8], first: usize, cells: usize) -> Result<&[f32]> {
    let start = first
        .checked_mul(ELEMENT_SIZE)
        .ok_or(DmapError::SizeOverflow)?;
    let len = cells
        .checked_mul(ELEMENT_SIZE)
        .ok_or(DmapError::SizeOverflow)?;
    let raw = bytes
        .get(start..start + len)
        .ok_or(DmapError::IndexOutOfBounds)?;
    bytemuck::try_cast_slice(raw).map_err(|_| Error::Format(DmapError::Misaligned))
}
