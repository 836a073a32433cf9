//! Configuration for matrix mapping and batch runs

use std::ops::Range;
use std::path::PathBuf;

use dmap_core::format::constants::{
    DEFAULT_LABELS_TEMPLATE, DEFAULT_MATRIX_TEMPLATE, DEFAULT_MAX_ITER,
};
use dmap_core::{ClusterRequest, InitStrategy, MAX_MAP_BYTES};

use crate::{Error, Result};

/// Mapping limits for opening a matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MapConfig {
    /// Largest byte range mapped in one operation
    pub max_map_bytes: u64,
    /// Use the stripe window even when the whole file would fit one mapping
    pub force_windowed: bool,
}

impl MapConfig {
    /// Config with a custom mapping ceiling
    pub fn with_max_map_bytes(max_map_bytes: u64) -> Self {
        Self {
            max_map_bytes,
            force_windowed: false,
        }
    }

    /// Set whether small matrices are windowed too
    pub fn with_force_windowed(mut self, force_windowed: bool) -> Self {
        self.force_windowed = force_windowed;
        self
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            max_map_bytes: MAX_MAP_BYTES,
            force_windowed: false,
        }
    }
}

/// What a batch does when one unit fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OnError {
    /// Stop the batch and return the unit's error
    #[default]
    Abort,
    /// Log the failure, write nothing for that unit, continue
    Skip,
}

/// Settings for clustering a range of matrix files
///
/// Each unit `u` reads `base_dir/matrix_template` and writes
/// `base_dir/labels_template`, with `{unit}` replaced by `u` and `{k}` by the
/// cluster count.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BatchConfig {
    pub base_dir: PathBuf,
    /// Units to process, end exclusive
    pub units: Range<usize>,
    /// Target cluster count
    pub k: usize,
    pub max_iter: usize,
    pub init: InitStrategy,
    pub seed: u64,
    /// Explicit matrix dimension; derived from file size when absent
    pub dimension: Option<usize>,
    pub matrix_template: String,
    pub labels_template: String,
    pub on_error: OnError,
    pub map: MapConfig,
}

impl BatchConfig {
    /// Config for `units` in `base_dir` with `k` clusters and defaults elsewhere
    pub fn new(base_dir: impl Into<PathBuf>, units: Range<usize>, k: usize) -> Self {
        Self {
            base_dir: base_dir.into(),
            units,
            k,
            ..Self::default()
        }
    }

    /// Load a config from a JSON file
    #[cfg(feature = "serde")]
    pub fn from_json_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Check settings that can be verified before any file is touched
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(Error::Config("cluster count k must be at least 1".into()));
        }
        if self.units.start > self.units.end {
            return Err(Error::Config(format!(
                "unit range {}..{} is inverted",
                self.units.start, self.units.end
            )));
        }
        if self.units.len() > 1 {
            for (name, template) in [
                ("matrix", &self.matrix_template),
                ("labels", &self.labels_template),
            ] {
                if !template.contains("{unit}") {
                    return Err(Error::Config(format!(
                        "{name} template {template:?} has no {{unit}} placeholder"
                    )));
                }
            }
        }
        if let Some(n) = self.dimension {
            if self.k > n {
                return Err(Error::Config(format!(
                    "cluster count {} exceeds matrix dimension {n}",
                    self.k
                )));
            }
        }
        Ok(())
    }

    /// Input matrix path for `unit`
    pub fn matrix_path(&self, unit: usize) -> PathBuf {
        self.base_dir.join(self.render(&self.matrix_template, unit))
    }

    /// Label output path for `unit`
    pub fn labels_path(&self, unit: usize) -> PathBuf {
        self.base_dir.join(self.render(&self.labels_template, unit))
    }

    /// Clustering parameters shared by every unit
    pub fn request(&self) -> ClusterRequest {
        ClusterRequest::new(self.k)
            .with_max_iter(self.max_iter)
            .with_init(self.init)
            .with_seed(self.seed)
    }

    fn render(&self, template: &str, unit: usize) -> String {
        template
            .replace("{unit}", &unit.to_string())
            .replace("{k}", &self.k.to_string())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            units: 0..0,
            k: 0,
            max_iter: DEFAULT_MAX_ITER,
            init: InitStrategy::default(),
            seed: 0,
            dimension: None,
            matrix_template: DEFAULT_MATRIX_TEMPLATE.to_string(),
            labels_template: DEFAULT_LABELS_TEMPLATE.to_string(),
            on_error: OnError::default(),
            map: MapConfig::default(),
        }
    }
}
