#![no_std]

//! dmap core - dense distance-matrix layout definitions
//!
//! This crate provides stripe geometry, size and coordinate validation, and
//! the distance/clustering capabilities shared by `dmap` backends. It does no
//! I/O.

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod error;
pub mod format;
#[cfg(feature = "alloc")]
pub mod labels;
pub mod traits;
pub mod validation;

pub use error::*;
pub use format::*;
#[cfg(feature = "alloc")]
pub use labels::{cluster_sizes, labels_from_clusters};
pub use traits::*;
pub use validation::*;
