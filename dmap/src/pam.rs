//! FasterPAM clustering through the `kmedoids` crate
//!
//! The algorithm itself lives in `kmedoids`; this module only adapts a
//! [`DistanceSource`] to its matrix interface and reshapes the result.

use dmap_core::{Cluster, ClusterRequest, Clusterer, Clustering, DistanceSource, InitStrategy};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::Error;

/// k-medoids clustering with the FasterPAM swap heuristic
#[derive(Debug, Clone, Copy, Default)]
pub struct FasterPam;

/// Presents a distance source as the square matrix `kmedoids` expects
struct PamAdapter<'a, D: ?Sized>(&'a D);

impl<D: DistanceSource + ?Sized> kmedoids::ArrayAdapter<f32> for PamAdapter<'_, D> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn is_square(&self) -> bool {
        true
    }

    fn get(&self, x: usize, y: usize) -> f32 {
        self.0.distance(x, y)
    }
}

impl Clusterer for FasterPam {
    type Error = Error;

    fn cluster<D: DistanceSource + ?Sized>(
        &self,
        distances: &D,
        request: &ClusterRequest,
    ) -> Result<Clustering, Error> {
        let n = distances.len();
        request.validate(n)?;
        distances.check_range(0..n);

        let adapter = PamAdapter(distances);
        let mut medoids = initial_medoids(&adapter, n, request);
        debug!(k = request.k, init = ?request.init, ?medoids, "initial medoids");

        let (loss, assignment, iterations, swaps): (f64, Vec<usize>, usize, usize) =
            kmedoids::fasterpam(&adapter, &mut medoids, request.max_iter);

        if assignment.len() != n || medoids.len() != request.k {
            return Err(Error::Clustering(format!(
                "expected {} assignments and {} medoids, got {} and {}",
                n,
                request.k,
                assignment.len(),
                medoids.len()
            )));
        }

        let mut clusters: Vec<Cluster> = medoids
            .iter()
            .map(|&medoid| Cluster {
                medoid,
                members: Vec::new(),
            })
            .collect();
        for (id, &c) in assignment.iter().enumerate() {
            let cluster = clusters.get_mut(c).ok_or_else(|| {
                Error::Clustering(format!("identifier {id} assigned to missing cluster {c}"))
            })?;
            cluster.members.push(id);
        }

        Ok(Clustering {
            clusters,
            loss,
            iterations,
            swaps,
        })
    }
}

fn initial_medoids<D: DistanceSource + ?Sized>(
    adapter: &PamAdapter<'_, D>,
    n: usize,
    request: &ClusterRequest,
) -> Vec<usize> {
    match request.init {
        InitStrategy::Build => {
            let (_loss, _assignment, medoids): (f64, Vec<usize>, Vec<usize>) =
                kmedoids::pam_build(adapter, request.k);
            medoids
        }
        InitStrategy::Random => {
            let mut rng = StdRng::seed_from_u64(request.seed);
            rand::seq::index::sample(&mut rng, n, request.k).into_vec()
        }
        InitStrategy::First => (0..request.k).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmap_core::{labels_from_clusters, DmapError};

    /// Two tight groups {0, 1, 2} and {3, 4, 5}, asymmetric within noise
    struct TwoGroups;

    impl DistanceSource for TwoGroups {
        fn len(&self) -> usize {
            6
        }

        fn distance(&self, i: usize, j: usize) -> f32 {
            if i == j {
                0.0
            } else if (i < 3) == (j < 3) {
                1.0 + 0.01 * i as f32
            } else {
                100.0
            }
        }
    }

    fn assert_two_groups(clustering: &Clustering) {
        assert_eq!(clustering.clusters.len(), 2);
        let labels = labels_from_clusters(6, &clustering.clusters).unwrap();
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[4], labels[5]);
        assert_ne!(labels[0], labels[3]);
        for cluster in &clustering.clusters {
            assert!(cluster.members.contains(&cluster.medoid));
        }
    }

    #[test]
    fn test_build_init() {
        let clustering = FasterPam.cluster(&TwoGroups, &ClusterRequest::new(2)).unwrap();
        assert_two_groups(&clustering);
        assert!(clustering.loss < 100.0);
    }

    #[test]
    fn test_random_init_is_seeded() {
        let request = ClusterRequest::new(2)
            .with_init(InitStrategy::Random)
            .with_seed(17);
        let a = FasterPam.cluster(&TwoGroups, &request).unwrap();
        let b = FasterPam.cluster(&TwoGroups, &request).unwrap();
        assert_two_groups(&a);
        assert_eq!(a.clusters, b.clusters);
    }

    #[test]
    fn test_first_init() {
        let request = ClusterRequest::new(2).with_init(InitStrategy::First);
        let clustering = FasterPam.cluster(&TwoGroups, &request).unwrap();
        assert_two_groups(&clustering);
    }

    #[test]
    fn test_invalid_k() {
        let err = FasterPam
            .cluster(&TwoGroups, &ClusterRequest::new(7))
            .unwrap_err();
        assert_eq!(err.kind(), Some(DmapError::InvalidClusterCount));

        let err = FasterPam
            .cluster(&TwoGroups, &ClusterRequest::new(0))
            .unwrap_err();
        assert_eq!(err.kind(), Some(DmapError::InvalidClusterCount));
    }
}
