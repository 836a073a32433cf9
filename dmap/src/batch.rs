//! Batch orchestration: matrix files in, label files out
//!
//! For every unit the runner opens the unit's matrix, hands it to a
//! [`Clusterer`], turns the resulting partition into a label array and
//! writes it. A unit either produces a complete label file or none.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use dmap_core::{cluster_sizes, labels_from_clusters, ClusterRequest, Clusterer, DistanceSource};
use tracing::{info, warn};

use crate::config::{BatchConfig, OnError};
use crate::distance::DistanceMatrix;
use crate::mmap_backend::write_labels;
use crate::{Error, MapConfig, Result};

/// Outcome of one completed unit
#[derive(Debug, Clone)]
pub struct UnitReport {
    pub unit: usize,
    pub matrix_path: PathBuf,
    pub labels_path: PathBuf,
    /// Matrix dimension `N`
    pub n: usize,
    pub windowed: bool,
    /// Stripe mappings made during clustering; `None` for a full mapping
    pub remaps: Option<u64>,
    pub loss: f64,
    pub iterations: usize,
    pub swaps: usize,
    /// Members per cluster, in label order
    pub cluster_sizes: Vec<usize>,
    pub elapsed: Duration,
}

/// Outcome of a whole batch
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub completed: Vec<UnitReport>,
    /// Units that failed under [`OnError::Skip`]
    pub skipped: Vec<(usize, Error)>,
}

/// Cluster one matrix file and write its labels
///
/// This is the per-unit pipeline without any batch bookkeeping; the returned
/// report has `unit` set to 0.
pub fn cluster_file<C>(
    clusterer: &C,
    matrix_path: &Path,
    labels_path: &Path,
    dimension: Option<usize>,
    request: &ClusterRequest,
    map: &MapConfig,
) -> Result<UnitReport>
where
    C: Clusterer,
    Error: From<C::Error>,
{
    let matrix = DistanceMatrix::open(matrix_path, dimension, map)?;
    let n = matrix.len();
    request.validate(n).map_err(|e| Error::matrix(matrix_path, e))?;

    info!(
        path = %matrix_path.display(),
        n,
        windowed = matrix.is_windowed(),
        stripes = matrix.info().layout.stripe_count(),
        rows_per_stripe = matrix.info().layout.rows_per_stripe(),
        "clustering"
    );

    let started = Instant::now();
    let clustering = clusterer.cluster(&matrix, request);
    let elapsed = started.elapsed();
    // Distances read after a failed lookup are placeholders
    if let Some(e) = matrix.take_failure() {
        return Err(e);
    }
    let clustering = clustering?;

    let labels = labels_from_clusters(n, &clustering.clusters)?;
    let sizes = cluster_sizes(&labels)?;
    write_labels(labels_path, &labels)?;

    info!(
        elapsed_s = elapsed.as_secs_f64(),
        loss = clustering.loss,
        iterations = clustering.iterations,
        swaps = clustering.swaps,
        output = %labels_path.display(),
        "clustered"
    );

    Ok(UnitReport {
        unit: 0,
        matrix_path: matrix_path.to_path_buf(),
        labels_path: labels_path.to_path_buf(),
        n,
        windowed: matrix.is_windowed(),
        remaps: matrix.remap_count(),
        loss: clustering.loss,
        iterations: clustering.iterations,
        swaps: clustering.swaps,
        cluster_sizes: sizes,
        elapsed,
    })
}

/// Runs a [`BatchConfig`] with a given clustering algorithm
#[derive(Debug)]
pub struct BatchRunner<C> {
    config: BatchConfig,
    clusterer: C,
}

impl<C> BatchRunner<C>
where
    C: Clusterer,
    Error: From<C::Error>,
{
    /// Validate `config` and build a runner
    pub fn new(config: BatchConfig, clusterer: C) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, clusterer })
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Process a single unit
    pub fn run_unit(&self, unit: usize) -> Result<UnitReport> {
        let matrix_path = self.config.matrix_path(unit);
        let labels_path = self.config.labels_path(unit);
        info!(unit, "starting unit");

        let mut report = cluster_file(
            &self.clusterer,
            &matrix_path,
            &labels_path,
            self.config.dimension,
            &self.config.request(),
            &self.config.map,
        )?;
        report.unit = unit;
        Ok(report)
    }

    /// Process every unit in order, applying the configured error policy
    pub fn run(&self) -> Result<BatchSummary> {
        let mut summary = BatchSummary::default();

        for unit in self.config.units.clone() {
            match self.run_unit(unit) {
                Ok(report) => summary.completed.push(report),
                Err(e) => match self.config.on_error {
                    OnError::Abort => {
                        return Err(Error::Unit {
                            unit,
                            source: Box::new(e),
                        })
                    }
                    OnError::Skip => {
                        warn!(unit, category = %e.category(), error = %e, "skipping unit");
                        summary.skipped.push((unit, e));
                    }
                },
            }
        }

        info!(
            completed = summary.completed.len(),
            skipped = summary.skipped.len(),
            "batch finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mmap_backend::{read_labels, write_matrix_with};
    use dmap_core::{Cluster, Clustering, DmapError};

    /// Splits `0..N` into `k` contiguous blocks, last block first
    struct BlockClusterer;

    impl Clusterer for BlockClusterer {
        type Error = Error;

        fn cluster<D: DistanceSource + ?Sized>(
            &self,
            distances: &D,
            request: &ClusterRequest,
        ) -> Result<Clustering> {
            let n = distances.len();
            let block = n.div_ceil(request.k);
            let mut clusters: Vec<Cluster> = (0..request.k)
                .map(|c| {
                    let members: Vec<usize> = (c * block..((c + 1) * block).min(n)).collect();
                    // Touch every row so the window moves
                    for &m in &members {
                        distances.distance(m, 0);
                    }
                    Cluster {
                        medoid: members[0],
                        members,
                    }
                })
                .collect();
            clusters.reverse();
            Ok(Clustering::from_clusters(clusters))
        }
    }

    /// Reads one pair past the matrix edge when `N` is odd
    struct OddOverreach;

    impl Clusterer for OddOverreach {
        type Error = Error;

        fn cluster<D: DistanceSource + ?Sized>(
            &self,
            distances: &D,
            request: &ClusterRequest,
        ) -> Result<Clustering> {
            let n = distances.len();
            if n % 2 == 1 {
                distances.distance(n, 0);
            }
            BlockClusterer.cluster(distances, request)
        }
    }

    /// Always fails
    struct Broken;

    impl Clusterer for Broken {
        type Error = Error;

        fn cluster<D: DistanceSource + ?Sized>(
            &self,
            _distances: &D,
            _request: &ClusterRequest,
        ) -> Result<Clustering> {
            Err(Error::Clustering("no convergence".into()))
        }
    }

    fn write_unit(config: &BatchConfig, unit: usize, n: usize) {
        write_matrix_with(config.matrix_path(unit), n, |i, j| (i * n + j) as f32).unwrap();
    }

    #[test]
    fn test_labels_follow_clusterer_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = BatchConfig::new(dir.path(), 0..1, 2);
        write_unit(&config, 0, 6);

        let runner = BatchRunner::new(config.clone(), BlockClusterer).unwrap();
        let report = runner.run_unit(0).unwrap();
        assert_eq!(report.n, 6);
        assert_eq!(report.cluster_sizes, vec![3, 3]);

        // Block {3,4,5} was yielded first, so it is label 0
        let labels = read_labels(config.labels_path(0)).unwrap();
        assert_eq!(labels, vec![1, 1, 1, 0, 0, 0]);
    }

    #[test]
    fn test_windowed_unit() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BatchConfig::new(dir.path(), 0..1, 3);
        config.map = MapConfig::with_max_map_bytes(2 * 9 * 4);
        write_unit(&config, 0, 9);

        let report = BatchRunner::new(config, BlockClusterer)
            .unwrap()
            .run_unit(0)
            .unwrap();
        assert!(report.windowed);
        // Rows 0..9 swept in order across 5 stripes of 2 rows
        assert!(report.remaps.unwrap() >= 5);
    }

    #[test]
    fn test_abort_stops_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = BatchConfig::new(dir.path(), 0..3, 2);
        write_unit(&config, 0, 4);
        // unit 1 missing
        write_unit(&config, 2, 4);

        let runner = BatchRunner::new(config.clone(), BlockClusterer).unwrap();
        let err = runner.run().unwrap_err();
        assert!(matches!(err, Error::Unit { unit: 1, .. }));
        assert!(config.labels_path(0).exists());
        assert!(!config.labels_path(1).exists());
        assert!(!config.labels_path(2).exists());
    }

    #[test]
    fn test_skip_continues_and_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BatchConfig::new(dir.path(), 0..3, 2);
        config.on_error = OnError::Skip;
        write_unit(&config, 0, 4);
        std::fs::write(config.matrix_path(1), vec![0u8; 4 * 4 * 4 + 1]).unwrap();
        write_unit(&config, 2, 4);

        let summary = BatchRunner::new(config.clone(), BlockClusterer)
            .unwrap()
            .run()
            .unwrap();
        let done: Vec<usize> = summary.completed.iter().map(|r| r.unit).collect();
        assert_eq!(done, vec![0, 2]);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].0, 1);
        assert_eq!(summary.skipped[0].1.kind(), Some(DmapError::NotSquare));
        assert!(!config.labels_path(1).exists());
    }

    #[test]
    fn test_lookup_failure_fails_only_its_unit() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BatchConfig::new(dir.path(), 0..2, 2);
        config.on_error = OnError::Skip;
        config.map = MapConfig::default().with_force_windowed(true);
        write_unit(&config, 0, 5);
        write_unit(&config, 1, 6);

        let summary = BatchRunner::new(config.clone(), OddOverreach)
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].0, 0);
        assert_eq!(summary.skipped[0].1.kind(), Some(DmapError::IndexOutOfBounds));
        assert!(!config.labels_path(0).exists());

        assert_eq!(summary.completed.len(), 1);
        assert_eq!(summary.completed[0].unit, 1);
        assert_eq!(read_labels(config.labels_path(1)).unwrap().len(), 6);
    }

    #[test]
    fn test_lookup_failure_aborts_batch() {
        let dir = tempfile::tempdir().unwrap();
        let config = BatchConfig::new(dir.path(), 0..2, 2);
        write_unit(&config, 0, 5);
        write_unit(&config, 1, 6);

        let err = BatchRunner::new(config.clone(), OddOverreach)
            .unwrap()
            .run()
            .unwrap_err();
        assert!(matches!(err, Error::Unit { unit: 0, .. }));
        assert!(!config.labels_path(1).exists());
    }

    #[test]
    fn test_failed_clustering_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = BatchConfig::new(dir.path(), 0..1, 2);
        write_unit(&config, 0, 4);

        let err = BatchRunner::new(config.clone(), Broken)
            .unwrap()
            .run_unit(0)
            .unwrap_err();
        assert!(matches!(err, Error::Clustering(_)));
        assert!(!config.labels_path(0).exists());
    }

    #[test]
    fn test_k_larger_than_n() {
        let dir = tempfile::tempdir().unwrap();
        let config = BatchConfig::new(dir.path(), 0..1, 5);
        write_unit(&config, 0, 4);

        let err = BatchRunner::new(config, BlockClusterer)
            .unwrap()
            .run_unit(0)
            .unwrap_err();
        assert_eq!(err.kind(), Some(DmapError::InvalidClusterCount));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = BatchConfig::new(".", 0..1, 0);
        assert!(matches!(
            BatchRunner::new(config, BlockClusterer),
            Err(Error::Config(_))
        ));
    }
}
