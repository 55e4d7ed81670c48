//! Engine configuration, loadable from JSON.
use crate::error::{LcaError, Result};
use crate::matrix::Layout;
use crate::solver::SolverKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub solver: SolverKind,
    pub storage: StorageConfig,
    pub simulation: SimulationConfig,
    pub cache: CacheMode,
}

/// When built matrices are compacted into sparse storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Matrices with a fill ratio below this value are stored sparse.
    pub density_threshold: f64,
    /// Matrices smaller than this (in either dimension) are always dense.
    pub min_sparse_size: usize,
    /// Forces a layout regardless of density.
    pub force: Option<ForcedLayout>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForcedLayout {
    Dense,
    Sparse,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { density_threshold: 0.25, min_sparse_size: 250, force: None }
    }
}

impl StorageConfig {
    pub fn layout_for(&self, rows: usize, cols: usize, nonzeros: usize) -> Layout {
        match self.force {
            Some(ForcedLayout::Dense) => Layout::Dense,
            Some(ForcedLayout::Sparse) => Layout::Sparse,
            None => crate::matrix::choose_layout(rows, cols, nonzeros, self.density_threshold, self.min_sparse_size),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub runs: usize,
    pub seed: u64,
    /// Size of a dedicated rayon pool; `None` uses the global pool.
    pub threads: Option<usize>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { runs: 100, seed: 42, threads: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// Populate all tables when the cache is created.
    Eager,
    /// Populate tables on first use.
    #[default]
    Lazy,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| LcaError::Config(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    fn check(&self) -> Result<()> {
        let t = self.storage.density_threshold;
        if !(0.0..=1.0).contains(&t) {
            return Err(LcaError::Config(format!("density threshold {} outside of [0, 1]", t)));
        }
        if self.simulation.threads == Some(0) {
            return Err(LcaError::Config("simulation thread count must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.cache, CacheMode::Lazy);
    }

    #[test]
    fn test_partial_config() {
        let json = r#"{
            "solver": "portable",
            "storage": { "force": "sparse" },
            "simulation": { "runs": 10, "threads": 2 },
            "cache": "eager"
        }"#;
        let config = EngineConfig::from_json_str(json).unwrap();
        assert_eq!(config.solver, SolverKind::Portable);
        assert_eq!(config.storage.layout_for(2, 2, 4), Layout::Sparse);
        assert_eq!(config.storage.density_threshold, 0.25);
        assert_eq!(config.simulation.runs, 10);
        assert_eq!(config.simulation.seed, 42);
        assert_eq!(config.cache, CacheMode::Eager);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(matches!(EngineConfig::from_json_str("{\"solver\": \"gpu\"}"), Err(LcaError::Config(_))));
        let bad = r#"{ "storage": { "density_threshold": 3.0 } }"#;
        assert!(matches!(EngineConfig::from_json_str(bad), Err(LcaError::Config(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "simulation": { "seed": 7 } }"#).unwrap();
        assert_eq!(EngineConfig::from_file(&path).unwrap().simulation.seed, 7);
        assert!(matches!(EngineConfig::from_file(&dir.path().join("missing.json")), Err(LcaError::Io(_))));
    }
}
