//! Layout definitions for dense distance-matrix files
//!
//! Pure geometry only: no I/O. The file is a headerless row-major `N×N`
//! array of little-endian `f32`, split into row-aligned stripes for mapping.

pub mod constants;
pub mod geometry;

pub use constants::{ELEMENT_SIZE, LABEL_SIZE, MAX_MAP_BYTES};
pub use geometry::{Stripe, StripeLayout, Stripes};
