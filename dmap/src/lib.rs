//! DMAP - Windowed memory-mapped access to dense distance matrices
//!
//! Reads square `N×N` matrices of little-endian `f32` distances that may be
//! far larger than a single memory mapping allows, and feeds them to
//! k-medoids clustering without loading them into memory.
//!
//! ## Architecture
//!
//! DMAP keeps layout rules apart from I/O:
//!
//! - **dmap-core**: Stripe geometry, size and bounds validation, clustering
//!   traits and label construction (no I/O)
//! - **dmap**: Memory-mapped backends, the distance adapter, FasterPAM and
//!   batch orchestration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dmap::{DistanceMatrix, DistanceSource, MapConfig};
//!
//! fn example() -> dmap::Result<()> {
//!     // N is derived from the file size when not given
//!     let matrix = DistanceMatrix::open("emd_matrix_r2_f0_c8.bin", None, &MapConfig::default())?;
//!
//!     println!("N = {}, windowed = {}", matrix.len(), matrix.is_windowed());
//!     println!("d(3, 7) = {}", matrix.try_distance(3, 7)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **mmap**: Full and stripe-windowed mappings over matrix files
//! - **pam**: FasterPAM clustering via the `kmedoids` crate
//! - **serde**: JSON batch configuration
//! - **cli**: The `dmap` command-line tool

pub use dmap_core::{
    // Core traits
    Cluster, ClusterRequest, Clusterer, Clustering, DistanceSource, InitStrategy,
    // Layout
    Stripe, StripeLayout, ELEMENT_SIZE, LABEL_SIZE, MAX_MAP_BYTES,
    // Error handling
    DmapError, ErrorCategory,
    // Validation utilities
    cluster_sizes, coordinates_from_signed, derive_dimension, labels_from_clusters,
    matrix_byte_len, parse_range, resolve_dimension,
};

pub mod config;
pub mod error;

#[cfg(feature = "mmap")]
pub mod batch;
#[cfg(feature = "mmap")]
pub mod distance;
#[cfg(feature = "mmap")]
pub mod mmap_backend;
#[cfg(feature = "pam")]
pub mod pam;

pub use config::{BatchConfig, MapConfig, OnError};
pub use error::{Error, Result};

#[cfg(feature = "mmap")]
pub use batch::{cluster_file, BatchRunner, BatchSummary, UnitReport};
#[cfg(feature = "mmap")]
pub use distance::{Backing, DistanceMatrix, MatrixInfo};
#[cfg(feature = "mmap")]
pub use mmap_backend::{
    read_labels, write_labels, write_matrix, write_matrix_with, MappedMatrix, MatrixFile,
    StripeMapper,
};

#[cfg(feature = "pam")]
pub use pam::FasterPam;
