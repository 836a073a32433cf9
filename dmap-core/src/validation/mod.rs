//! Validation utilities for matrix files and coordinates
//!
//! Pure functions with no I/O dependencies.

pub mod bounds;
pub mod parsing;
pub mod size;

pub use bounds::{coordinates_from_signed, flat_index, validate_coordinates};
pub use parsing::parse_range;
pub use size::{derive_dimension, matrix_byte_len, resolve_dimension, validate_file_len};
