//! File I/O for matrix and label files
//!
//! Both formats are headerless little-endian arrays: `N*N` `f32` cells for a
//! matrix, `N` `i32` entries for labels.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use dmap_core::{resolve_dimension, DmapError, LABEL_SIZE};
use tracing::debug;

use crate::{Error, Result};

/// An opened matrix file with a validated dimension
///
/// Holds the only file handle; it is closed when this value, or the mapper
/// built from it, is dropped.
#[derive(Debug)]
pub struct MatrixFile {
    pub(crate) file: File,
    pub(crate) path: PathBuf,
    pub(crate) n: usize,
    pub(crate) file_len: u64,
}

impl MatrixFile {
    /// Open `path` and resolve its dimension
    ///
    /// With `Some(n)` the file must be exactly `n*n*4` bytes. With `None`,
    /// `n` is derived from the length, which must be an exact square.
    pub fn open<P: AsRef<Path>>(path: P, dimension: Option<usize>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| Error::Open {
            path: path.clone(),
            source,
        })?;
        let file_len = file.metadata().map_err(|e| Error::io(&path, e))?.len();
        let n = resolve_dimension(dimension, file_len).map_err(|e| Error::matrix(&path, e))?;

        debug!(path = %path.display(), n, file_len, "opened matrix file");

        Ok(Self {
            file,
            path,
            n,
            file_len,
        })
    }

    /// Matrix dimension `N`
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File length in bytes (`N*N*4`)
    pub fn file_len(&self) -> u64 {
        self.file_len
    }
}

/// Write an `n×n` matrix of row-major `values`
pub fn write_matrix<P: AsRef<Path>>(path: P, n: usize, values: &[f32]) -> Result<()> {
    let path = path.as_ref();
    let cells = n.checked_mul(n).ok_or(DmapError::SizeOverflow)?;
    if values.len() != cells {
        return Err(Error::matrix(path, DmapError::SizeMismatch));
    }
    write_matrix_with(path, n, |row, col| values[row * n + col])
}

/// Write an `n×n` matrix whose cell `(row, col)` is `value(row, col)`
///
/// Streams row by row, so matrices larger than memory can be produced.
pub fn write_matrix_with<P, F>(path: P, n: usize, mut value: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnMut(usize, usize) -> f32,
{
    let path = path.as_ref();
    if n == 0 {
        return Err(Error::matrix(path, DmapError::EmptyMatrix));
    }

    write_atomically(path, |writer| {
        for row in 0..n {
            for col in 0..n {
                writer.write_all(&value(row, col).to_le_bytes())?;
            }
        }
        Ok(())
    })?;

    debug!(path = %path.display(), n, "wrote matrix");
    Ok(())
}

/// Write a label array as little-endian `i32`
///
/// The file appears under its final name only once fully written; a failed
/// write leaves no file behind.
pub fn write_labels<P: AsRef<Path>>(path: P, labels: &[i32]) -> Result<()> {
    let path = path.as_ref();
    write_atomically(path, |writer| {
        for &label in labels {
            writer.write_all(&label.to_le_bytes())?;
        }
        Ok(())
    })?;

    debug!(path = %path.display(), entries = labels.len(), "wrote labels");
    Ok(())
}

/// Read a label file written by [`write_labels`]
pub fn read_labels<P: AsRef<Path>>(path: P) -> Result<Vec<i32>> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    if bytes.len() % LABEL_SIZE != 0 {
        return Err(Error::matrix(path, DmapError::SizeMismatch));
    }

    Ok(bytes
        .chunks_exact(LABEL_SIZE)
        .map(|chunk| {
            let mut buf = [0u8; LABEL_SIZE];
            buf.copy_from_slice(chunk);
            i32::from_le_bytes(buf)
        })
        .collect())
}

/// Write through a sibling temp file, then rename over `path`
fn write_atomically<F>(path: &Path, body: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let tmp = temp_path(path);
    let result = File::create(&tmp).and_then(|file| {
        let mut writer = BufWriter::new(file);
        body(&mut writer)?;
        writer.flush()?;
        writer.get_ref().sync_all()
    });

    if let Err(e) = result.and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(Error::io(path, e));
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
