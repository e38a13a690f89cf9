//! Analyzer configuration.
//!
//! Loaded from a TOML file. Every field is optional and falls back to its default:
//!
//! ```toml
//! risk_free_rate = 0.0435
//! lookback = "1y"
//! weight_tolerance = 0.001
//! undefined_ratio = "report"
//! ```

use crate::portfolio::{MetricsEngine, UndefinedRatioPolicy, DEFAULT_RISK_FREE_RATE};
use crate::types::Lookback;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV_VAR: &str = "PORTFOLIO_ANALYZER_CONFIG";

/// Allowed distance of the weight sum from 1.0.
pub const DEFAULT_WEIGHT_TOLERANCE: f64 = 0.001;

/// Settings for a portfolio analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Annual risk-free rate used by the Sharpe and Sortino ratios
    pub risk_free_rate: f64,
    /// Price history window
    pub lookback: Lookback,
    /// Allowed distance of the weight sum from 1.0
    pub weight_tolerance: f64,
    /// Handling of zero or undefined ratio denominators
    pub undefined_ratio: UndefinedRatioPolicy,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            lookback: Lookback::default(),
            weight_tolerance: DEFAULT_WEIGHT_TOLERANCE,
            undefined_ratio: UndefinedRatioPolicy::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Load the config from the default path.
    pub fn load() -> Result<Self> {
        Self::from_path(&Self::default_path())
    }

    /// Get the default config file path.
    ///
    /// Default path: `<config dir>/portfolio-analyzer/config.toml`
    /// Can be overridden with the `PORTFOLIO_ANALYZER_CONFIG` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("portfolio-analyzer/config.toml"))
            .unwrap_or_else(|| PathBuf::from("portfolio-analyzer.toml"))
    }

    /// Load the config from a file. A missing file yields the defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    /// Parse and validate a TOML config.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that values are usable.
    pub fn validate(&self) -> Result<()> {
        if !self.risk_free_rate.is_finite() {
            return Err(Error::Config(format!(
                "risk_free_rate must be a finite number, got {}",
                self.risk_free_rate
            )));
        }

        if !(0.0..1.0).contains(&self.weight_tolerance) {
            return Err(Error::Config(format!(
                "weight_tolerance must be in [0, 1), got {}",
                self.weight_tolerance
            )));
        }

        Ok(())
    }

    /// Build a metrics engine with these settings.
    pub fn engine(&self) -> MetricsEngine {
        MetricsEngine::new()
            .with_risk_free_rate(self.risk_free_rate)
            .with_undefined_ratio_policy(self.undefined_ratio)
    }
}
