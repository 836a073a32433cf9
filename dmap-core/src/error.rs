//! Error types for distance-matrix access

/// Errors that can occur while validating or addressing a distance matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmapError {
    /// Row or column outside `[0, N)`
    IndexOutOfBounds,
    /// File length does not equal `N * N * 4`
    SizeMismatch,
    /// File length is not a perfect square number of `f32` cells
    NotSquare,
    /// Matrix dimension of zero
    EmptyMatrix,
    /// Size arithmetic overflowed the platform integer width
    SizeOverflow,
    /// Cluster count outside `[1, N]`
    InvalidClusterCount,
    /// Malformed or inverted range
    InvalidRange,
    /// Clusters do not partition `[0, N)`
    InvalidPartition,
    /// Mapped bytes are not aligned for `f32` access
    Misaligned,
}

/// Broad error classes used for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad arguments or unreadable input, reported before work begins
    Configuration,
    /// File length disagrees with the matrix dimension
    SizeMismatch,
    /// Index outside the dense identifier space; an integration bug upstream
    OutOfRange,
    /// OS-level failure to open, map or write
    Io,
    /// The external clustering algorithm failed
    Clustering,
}

impl DmapError {
    /// Classify this error
    pub const fn category(&self) -> ErrorCategory {
        match self {
            DmapError::IndexOutOfBounds => ErrorCategory::OutOfRange,
            DmapError::SizeMismatch | DmapError::NotSquare => ErrorCategory::SizeMismatch,
            DmapError::EmptyMatrix
            | DmapError::SizeOverflow
            | DmapError::InvalidClusterCount
            | DmapError::InvalidRange
            | DmapError::InvalidPartition => ErrorCategory::Configuration,
            DmapError::Misaligned => ErrorCategory::Io,
        }
    }
}

impl core::fmt::Display for DmapError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            DmapError::IndexOutOfBounds => "Index out of bounds",
            DmapError::SizeMismatch => "File size does not match matrix dimension",
            DmapError::NotSquare => "File size is not a square matrix of f32",
            DmapError::EmptyMatrix => "Matrix dimension must be positive",
            DmapError::SizeOverflow => "Matrix size overflows addressable range",
            DmapError::InvalidClusterCount => "Cluster count must be in 1..=N",
            DmapError::InvalidRange => "Invalid range",
            DmapError::InvalidPartition => "Clusters do not partition the identifier space",
            DmapError::Misaligned => "Mapped data is not aligned for f32 access",
        };
        write!(f, "{msg}")
    }
}

impl core::error::Error for DmapError {}

impl core::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::SizeMismatch => "size mismatch",
            ErrorCategory::OutOfRange => "out of range",
            ErrorCategory::Io => "I/O",
            ErrorCategory::Clustering => "clustering",
        };
        write!(f, "{msg}")
    }
}

/// Result type for dmap-core operations
pub type Result<T> = core::result::Result<T, DmapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(DmapError::IndexOutOfBounds.category(), ErrorCategory::OutOfRange);
        assert_eq!(DmapError::SizeMismatch.category(), ErrorCategory::SizeMismatch);
        assert_eq!(DmapError::NotSquare.category(), ErrorCategory::SizeMismatch);
        assert_eq!(DmapError::InvalidClusterCount.category(), ErrorCategory::Configuration);
        assert_eq!(DmapError::Misaligned.category(), ErrorCategory::Io);
    }
}
