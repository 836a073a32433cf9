//! Error types for matrix I/O, mapping and batch runs

use std::io;
use std::path::PathBuf;

use dmap_core::{DmapError, ErrorCategory};
use thiserror::Error;

/// Errors raised by the `dmap` backends
#[derive(Debug, Error)]
pub enum Error {
    /// The matrix file could not be opened
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The OS refused to map a byte range
    #[error("failed to map bytes {offset}..{} of {}: {source}", .offset + .len, .path.display())]
    Map {
        path: PathBuf,
        offset: u64,
        len: u64,
        #[source]
        source: io::Error,
    },

    /// Reading metadata or writing output failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A file failed layout validation
    #[error("{}: {source}", .path.display())]
    Matrix {
        path: PathBuf,
        #[source]
        source: DmapError,
    },

    /// Layout, bounds or partition violation without file context
    #[error(transparent)]
    Format(#[from] DmapError),

    /// Invalid or missing configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The clustering algorithm failed
    #[error("clustering failed: {0}")]
    Clustering(String),

    /// A batch unit failed
    #[error("unit {unit} failed: {source}")]
    Unit {
        unit: usize,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Classify this error for reporting
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Open { .. } | Error::Config(_) => ErrorCategory::Configuration,
            Error::Map { .. } | Error::Io { .. } => ErrorCategory::Io,
            Error::Matrix { source, .. } => source.category(),
            Error::Format(source) => source.category(),
            Error::Clustering(_) => ErrorCategory::Clustering,
            Error::Unit { source, .. } => source.category(),
        }
    }

    /// Core error kind, if this is a layout or bounds failure
    pub fn kind(&self) -> Option<DmapError> {
        match self {
            Error::Matrix { source, .. } | Error::Format(source) => Some(*source),
            Error::Unit { source, .. } => source.kind(),
            _ => None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn matrix(path: impl Into<PathBuf>, source: DmapError) -> Self {
        Error::Matrix {
            path: path.into(),
            source,
        }
    }
}

/// Result type for `dmap` operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let open = Error::Open {
            path: PathBuf::from("missing.bin"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(open.category(), ErrorCategory::Configuration);
        assert!(open.to_string().contains("missing.bin"));

        let size = Error::matrix("m.bin", DmapError::SizeMismatch);
        assert_eq!(size.category(), ErrorCategory::SizeMismatch);
        assert_eq!(size.kind(), Some(DmapError::SizeMismatch));

        let bounds = Error::from(DmapError::IndexOutOfBounds);
        assert_eq!(bounds.category(), ErrorCategory::OutOfRange);

        let unit = Error::Unit {
            unit: 7,
            source: Box::new(size),
        };
        assert_eq!(unit.category(), ErrorCategory::SizeMismatch);
        assert_eq!(unit.kind(), Some(DmapError::SizeMismatch));
        assert!(unit.to_string().starts_with("unit 7 failed"));
    }
}
