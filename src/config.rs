use crate::baseline::{Baseline, BaselineModel};
use crate::error::EvalError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for the synthetic comparison models
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Whether baselines are added to the report
    pub enabled: bool,
    /// Score predicted for every emotion by the constant baseline
    pub constant_score: f64,
    /// Lower bound of the random baseline
    pub random_low: f64,
    /// Upper bound of the random baseline
    pub random_high: f64,
    /// Seed for the random baseline; unseeded when absent
    pub seed: Option<u64>,
    /// Report name of the constant baseline
    pub constant_name: String,
    /// Report name of the random baseline
    pub random_name: String,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            constant_score: 3.0,
            random_low: 1.0,
            random_high: 5.0,
            seed: None,
            constant_name: "baseline".to_string(),
            random_name: "random_baseline".to_string(),
        }
    }
}

impl BaselineConfig {
    /// Baselines to evaluate, constant first; empty when disabled
    pub fn models(&self) -> Result<Vec<BaselineModel>, EvalError> {
        if !self.enabled {
            return Ok(Vec::new());
        }
        if self.constant_name == self.random_name {
            return Err(EvalError::DuplicateBaselineName(self.random_name.clone()));
        }

        Ok(vec![
            BaselineModel {
                name: self.constant_name.clone(),
                baseline: Baseline::Constant {
                    score: self.constant_score,
                },
            },
            BaselineModel {
                name: self.random_name.clone(),
                baseline: Baseline::uniform(self.random_low, self.random_high)?,
            },
        ])
    }
}

/// Optional run file for `evaluate`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Metric names; validated when the run starts
    pub metrics: Vec<String>,
    /// Synthetic baseline settings
    pub baselines: BaselineConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }
}
