//! Abstract interfaces for distance-matrix consumers
//!
//! Traits are pure interfaces; concrete implementations live in `dmap`.

pub mod distance;
#[cfg(feature = "alloc")]
pub mod cluster;

pub use distance::DistanceSource;
#[cfg(feature = "alloc")]
pub use cluster::{Cluster, ClusterRequest, Clusterer, Clustering, InitStrategy};
