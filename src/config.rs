//! # Configuration
//!
//! $$
//! r_f = 0.02,\quad w_{\max} = 0.25,\quad A = 252
//! $$
//!
//! Deployment constants for the allocator and the statements report.
//! Values are fixed when the [`AnalyticsConfig`] is built and passed
//! explicitly; nothing is read from the process environment.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::error::AnalyticsError;
use crate::error::Result;

/// Risk-aversion scalars per risk profile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskAversionTable {
  pub conservative: f64,
  pub moderate: f64,
  pub aggressive: f64,
}

impl Default for RiskAversionTable {
  fn default() -> Self {
    Self {
      conservative: 8.0,
      moderate: 4.0,
      aggressive: 1.5,
    }
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
  /// Annual risk-free rate used in the Sharpe ratio.
  pub risk_free_rate: f64,
  /// Per-asset weight cap applied by the simplex projection.
  pub max_weight: f64,
  /// Trading periods per year used to annualize return statistics.
  pub annualization_factor: f64,
  pub risk_aversion: RiskAversionTable,
  /// Skip generative explanations and emit the static text.
  pub offline: bool,
  /// Rows rendered in the MD&A context table.
  pub max_table_rows: usize,
}

impl Default for AnalyticsConfig {
  fn default() -> Self {
    Self {
      risk_free_rate: 0.02,
      max_weight: 0.25,
      annualization_factor: 252.0,
      risk_aversion: RiskAversionTable::default(),
      offline: true,
      max_table_rows: 20,
    }
  }
}

impl AnalyticsConfig {
  /// Load a YAML config file. Missing keys fall back to the defaults.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if !path.exists() {
      return Err(AnalyticsError::InputNotFound(path.to_path_buf()));
    }
    let contents = fs::read_to_string(path)?;
    let config: AnalyticsConfig = serde_yaml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    if !(self.max_weight > 0.0 && self.max_weight <= 1.0) {
      return Err(AnalyticsError::Config(format!(
        "max_weight must lie in (0, 1], got {}",
        self.max_weight
      )));
    }
    if !(self.annualization_factor.is_finite() && self.annualization_factor > 0.0) {
      return Err(AnalyticsError::Config(format!(
        "annualization_factor must be positive, got {}",
        self.annualization_factor
      )));
    }
    if !self.risk_free_rate.is_finite() {
      return Err(AnalyticsError::Config(
        "risk_free_rate must be finite".to_string(),
      ));
    }

    let table = &self.risk_aversion;
    for (label, lambda) in [
      ("conservative", table.conservative),
      ("moderate", table.moderate),
      ("aggressive", table.aggressive),
    ] {
      if !(lambda.is_finite() && lambda > 0.0) {
        return Err(AnalyticsError::Config(format!(
          "risk aversion for '{label}' must be positive, got {lambda}"
        )));
      }
    }

    Ok(())
  }
}
