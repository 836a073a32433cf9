//! Format constants for dense distance-matrix files

/// Size in bytes of one matrix cell (`f32`, little-endian)
pub const ELEMENT_SIZE: usize = core::mem::size_of::<f32>();

/// Size in bytes of one label entry (`i32`, little-endian)
pub const LABEL_SIZE: usize = core::mem::size_of::<i32>();

/// Largest byte range mapped in a single operation (`i32::MAX`, ~2.147 GB)
///
/// Many runtimes cap a single mapping at the signed 32-bit range; stripes are
/// sized so that no mapping exceeds it.
pub const MAX_MAP_BYTES: u64 = i32::MAX as u64;

/// File name template for input matrices in a batch directory
pub const DEFAULT_MATRIX_TEMPLATE: &str = "emd_matrix_r2_f{unit}_c{k}.bin";

/// File name template for label output in a batch directory
pub const DEFAULT_LABELS_TEMPLATE: &str = "clusters_r2_f{unit}_c{k}.bin";

/// Default FasterPAM iteration budget
pub const DEFAULT_MAX_ITER: usize = 1000;
