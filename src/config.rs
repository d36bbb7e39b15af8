//! Configuration management for community detection runs

use crate::error::{LouvainError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Quality function used to score partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum QualityKind {
    /// Newman-Girvan modularity
    #[default]
    Modularity,
}

/// Order in which nodes are visited during a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MoveOrder {
    /// Visit nodes by increasing id
    Sequential,
    /// Visit nodes in a shuffled order, drawn once per level
    #[default]
    Random,
}

/// Settings for one Louvain run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LouvainConfig {
    /// Minimum quality gain per pass for a level to keep optimizing
    pub precision: f64,

    /// Quality function
    pub quality_function: QualityKind,

    /// Resolution parameter; values above 1 favour smaller communities
    pub resolution: f64,

    /// Maximum number of levels to compute
    pub max_levels: Option<usize>,

    /// Maximum number of passes per level
    pub max_passes: Option<usize>,

    /// Node visitation order
    pub move_order: MoveOrder,

    /// Seed for the shuffled visitation order. Unseeded runs draw from entropy.
    pub seed: Option<u64>,

    /// Keep every level's graph in the result
    pub retain_graphs: bool,
}

impl Default for LouvainConfig {
    fn default() -> Self {
        Self {
            precision: 0.000001,
            quality_function: QualityKind::Modularity,
            resolution: 1.0,
            max_levels: None,
            max_passes: None,
            move_order: MoveOrder::Random,
            seed: None,
            retain_graphs: false,
        }
    }
}

impl LouvainConfig {
    /// Deterministic configuration: nodes visited by id
    pub fn sequential() -> Self {
        Self {
            move_order: MoveOrder::Sequential,
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self =
            serde_json::from_str(&text).map_err(|e| LouvainError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_precision(mut self, precision: f64) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = Some(max_levels);
        self
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = Some(max_passes);
        self
    }

    /// Shuffled order with a fixed seed, reproducible across runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.move_order = MoveOrder::Random;
        self.seed = Some(seed);
        self
    }

    pub fn with_move_order(mut self, move_order: MoveOrder) -> Self {
        self.move_order = move_order;
        self
    }

    pub fn with_retained_graphs(mut self, retain: bool) -> Self {
        self.retain_graphs = retain;
        self
    }

    /// Reject settings the optimizer cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.precision.is_finite() || self.precision < 0.0 {
            return Err(LouvainError::Config(format!(
                "precision must be finite and non-negative, got {}",
                self.precision
            )));
        }
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(LouvainError::Config(format!(
                "resolution must be finite and positive, got {}",
                self.resolution
            )));
        }
        if self.max_levels == Some(0) {
            return Err(LouvainError::Config("max_levels must be at least 1".into()));
        }
        if self.max_passes == Some(0) {
            return Err(LouvainError::Config("max_passes must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = LouvainConfig::default();
        assert_eq!(config.precision, 1e-6);
        assert_eq!(config.quality_function, QualityKind::Modularity);
        assert_eq!(config.move_order, MoveOrder::Random);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(LouvainConfig::default().with_precision(f64::NAN).validate().is_err());
        assert!(LouvainConfig::default().with_precision(-1.0).validate().is_err());
        assert!(LouvainConfig::default().with_resolution(0.0).validate().is_err());
        assert!(LouvainConfig::default().with_max_levels(0).validate().is_err());
        assert!(LouvainConfig::default().with_max_passes(0).validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = r#"{"precision": 0.001, "move_order": "sequential", "max_levels": 3}"#;
        write!(file, "{}", json).unwrap();

        let config = LouvainConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.precision, 0.001);
        assert_eq!(config.move_order, MoveOrder::Sequential);
        assert_eq!(config.max_levels, Some(3));
        assert_eq!(config.resolution, 1.0);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_unknown_quality_function_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"quality_function": "conductance"}}"#).unwrap();

        let err = LouvainConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, LouvainError::Config(_)));
    }
}
