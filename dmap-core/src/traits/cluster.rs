//! Clustering capability and its request/response types
//!
//! The clustering algorithm is an external collaborator. This module only
//! fixes the contract: a distance source plus parameters in, an ordered list
//! of medoid clusters out.

use alloc::vec::Vec;

use super::distance::DistanceSource;
use crate::format::constants::DEFAULT_MAX_ITER;
use crate::DmapError;

/// How initial medoids are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum InitStrategy {
    /// Greedy BUILD seeding
    #[default]
    Build,
    /// Seeded uniform sample of `K` distinct identifiers
    Random,
    /// Identifiers `0..K`
    First,
}

/// Parameters for one clustering run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusterRequest {
    /// Target cluster count `K`
    pub k: usize,
    /// Iteration budget for the swap phase
    pub max_iter: usize,
    /// Medoid initialization
    pub init: InitStrategy,
    /// Seed for randomized initialization
    pub seed: u64,
}

impl ClusterRequest {
    /// Request `k` clusters with default budget and seeding
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: DEFAULT_MAX_ITER,
            init: InitStrategy::default(),
            seed: 0,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_init(mut self, init: InitStrategy) -> Self {
        self.init = init;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check `1 <= k <= n`
    pub fn validate(&self, n: usize) -> Result<(), DmapError> {
        if self.k == 0 || self.k > n || self.k > i32::MAX as usize {
            return Err(DmapError::InvalidClusterCount);
        }
        Ok(())
    }
}

/// One group of a partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// Representative identifier, itself a member
    pub medoid: usize,
    /// Member identifiers
    pub members: Vec<usize>,
}

/// Result of a clustering run
///
/// Clusters are kept in the order the algorithm produced them; that order
/// defines the label ids written downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    pub clusters: Vec<Cluster>,
    /// Total distance of every identifier to its medoid
    pub loss: f64,
    pub iterations: usize,
    pub swaps: usize,
}

impl Clustering {
    /// Wrap clusters with no run statistics
    pub fn from_clusters(clusters: Vec<Cluster>) -> Self {
        Self {
            clusters,
            loss: 0.0,
            iterations: 0,
            swaps: 0,
        }
    }

    /// Medoid of every cluster, in cluster order
    pub fn medoids(&self) -> Vec<usize> {
        self.clusters.iter().map(|c| c.medoid).collect()
    }
}

/// An algorithm that partitions `0..N` into `K` medoid clusters
pub trait Clusterer {
    /// Error type for clustering failures
    type Error;

    /// Partition the identifiers of `distances` according to `request`
    fn cluster<D: DistanceSource + ?Sized>(
        &self,
        distances: &D,
        request: &ClusterRequest,
    ) -> Result<Clustering, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_validation() {
        assert_eq!(ClusterRequest::new(2).validate(4), Ok(()));
        assert_eq!(ClusterRequest::new(4).validate(4), Ok(()));
        assert_eq!(
            ClusterRequest::new(0).validate(4),
            Err(DmapError::InvalidClusterCount)
        );
        assert_eq!(
            ClusterRequest::new(5).validate(4),
            Err(DmapError::InvalidClusterCount)
        );
    }

    #[test]
    fn test_request_builder() {
        let request = ClusterRequest::new(3)
            .with_max_iter(10)
            .with_init(InitStrategy::Random)
            .with_seed(42);
        assert_eq!(request.k, 3);
        assert_eq!(request.max_iter, 10);
        assert_eq!(request.init, InitStrategy::Random);
        assert_eq!(request.seed, 42);
        assert_eq!(ClusterRequest::new(3).max_iter, DEFAULT_MAX_ITER);
    }
}
