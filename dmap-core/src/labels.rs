//! Label array construction from a cluster partition
//!
//! Entry `k` of the label array is the 0-based index, in algorithm output
//! order, of the cluster owning identifier `k`.

use alloc::vec;
use alloc::vec::Vec;

use crate::traits::Cluster;
use crate::DmapError;

/// Build the label array for `n` identifiers
///
/// Cluster ids follow the order of `clusters`, not any sorted order. Fails
/// with [`DmapError::InvalidPartition`] if a member is outside `0..n`, is
/// claimed twice, or if any identifier is left unassigned.
pub fn labels_from_clusters(n: usize, clusters: &[Cluster]) -> Result<Vec<i32>, DmapError> {
    if clusters.len() > i32::MAX as usize {
        return Err(DmapError::InvalidClusterCount);
    }

    let mut labels: Vec<Option<i32>> = vec![None; n];

    for (cid, cluster) in clusters.iter().enumerate() {
        for &member in &cluster.members {
            let slot = labels.get_mut(member).ok_or(DmapError::InvalidPartition)?;
            if slot.is_some() {
                return Err(DmapError::InvalidPartition);
            }
            *slot = Some(cid as i32);
        }
    }

    labels
        .into_iter()
        .map(|label| label.ok_or(DmapError::InvalidPartition))
        .collect()
}

/// Number of identifiers carrying each label
///
/// Index `c` of the result counts entries equal to `c`. A label outside
/// `0..labels.len()` cannot come from [`labels_from_clusters`] and is
/// rejected.
pub fn cluster_sizes(labels: &[i32]) -> Result<Vec<usize>, DmapError> {
    let mut sizes: Vec<usize> = Vec::new();
    for &label in labels {
        let idx = usize::try_from(label)
            .ok()
            .filter(|&idx| idx < labels.len())
            .ok_or(DmapError::InvalidPartition)?;
        if idx >= sizes.len() {
            sizes.resize(idx + 1, 0);
        }
        sizes[idx] += 1;
    }
    Ok(sizes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(medoid: usize, members: &[usize]) -> Cluster {
        Cluster {
            medoid,
            members: members.to_vec(),
        }
    }

    #[test]
    fn test_labels_follow_cluster_order() {
        // Cluster order, not medoid order, decides the ids
        let clusters = [cluster(3, &[2, 3]), cluster(0, &[0, 1])];
        let labels = labels_from_clusters(4, &clusters).unwrap();
        assert_eq!(labels, vec![1, 1, 0, 0]);
    }

    #[test]
    fn test_rejects_out_of_range_member() {
        let clusters = [cluster(0, &[0, 1]), cluster(4, &[2, 3, 4])];
        assert_eq!(
            labels_from_clusters(4, &clusters),
            Err(DmapError::InvalidPartition)
        );
    }

    #[test]
    fn test_rejects_overlap_and_gaps() {
        let overlapping = [cluster(0, &[0, 1]), cluster(1, &[1, 2, 3])];
        assert_eq!(
            labels_from_clusters(4, &overlapping),
            Err(DmapError::InvalidPartition)
        );

        let gapped = [cluster(0, &[0]), cluster(3, &[3])];
        assert_eq!(
            labels_from_clusters(4, &gapped),
            Err(DmapError::InvalidPartition)
        );
    }

    #[test]
    fn test_cluster_sizes() {
        assert_eq!(cluster_sizes(&[0, 1, 1, 2, 1]), Ok(vec![1, 3, 1]));
        assert_eq!(cluster_sizes(&[]), Ok(vec![]));
        assert_eq!(cluster_sizes(&[0, -1]), Err(DmapError::InvalidPartition));
    }

    #[test]
    fn test_cluster_sizes_rejects_label_past_count() {
        // A label can never exceed the number of entries
        assert_eq!(cluster_sizes(&[i32::MAX]), Err(DmapError::InvalidPartition));
        assert_eq!(cluster_sizes(&[0, 2]), Err(DmapError::InvalidPartition));
        assert_eq!(cluster_sizes(&[1, 1]), Ok(vec![0, 2]));
    }
}
