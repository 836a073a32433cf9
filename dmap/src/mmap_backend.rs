//! Memory-mapped backends for dense distance-matrix files
//!
//! Two ways to read the same file format:
//!
//! - [`MappedMatrix`] maps the whole file once; usable when the file fits
//!   under the mapping ceiling.
//! - [`StripeMapper`] keeps a window of one row-aligned stripe mapped and
//!   slides it on demand, for files larger than any single mapping.

mod file_io;
mod mapped_matrix;
mod mmap_core;
mod stripe_mapper;

pub use file_io::{read_labels, write_labels, write_matrix, write_matrix_with, MatrixFile};
pub use mapped_matrix::MappedMatrix;
pub use stripe_mapper::StripeMapper;
