//! # Portfolio Types
//!
//! $$
//! \mathbf{w}^\* \propto (\Sigma + \lambda I)^{+}\mu,\qquad
//! S = \frac{\mathbb E[R_p]-r_f}{\sigma_p + \varepsilon}
//! $$
//!
//! Shared enums and result containers for portfolio allocation.

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;

use crate::config::RiskAversionTable;
use crate::error::AnalyticsError;
use crate::error::Result;

/// Investor risk profile; selects the risk-aversion scalar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
  Conservative,
  #[default]
  Moderate,
  Aggressive,
}

impl RiskProfile {
  /// Parse a risk-tolerance label. Unknown labels fall back to [`RiskProfile::Moderate`].
  pub fn from_str(s: &str) -> Self {
    match s.trim().to_lowercase().as_str() {
      "conservative" => Self::Conservative,
      "aggressive" => Self::Aggressive,
      _ => Self::Moderate,
    }
  }

  /// Risk-aversion scalar `lambda` for this profile.
  pub fn risk_aversion(self, table: &RiskAversionTable) -> f64 {
    match self {
      Self::Conservative => table.conservative,
      Self::Moderate => table.moderate,
      Self::Aggressive => table.aggressive,
    }
  }
}

impl Display for RiskProfile {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      RiskProfile::Conservative => write!(f, "conservative"),
      RiskProfile::Moderate => write!(f, "moderate"),
      RiskProfile::Aggressive => write!(f, "aggressive"),
    }
  }
}

/// Caller-supplied allocation parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct AllocationRequest {
  pub risk_profile: RiskProfile,
  /// Investment horizon in years. Informational only.
  pub investment_horizon: u32,
  pub initial_capital: f64,
}

impl AllocationRequest {
  pub fn new(risk_tolerance: &str, investment_horizon: u32, initial_capital: f64) -> Self {
    Self {
      risk_profile: RiskProfile::from_str(risk_tolerance),
      investment_horizon,
      initial_capital,
    }
  }

  pub fn validate(&self) -> Result<()> {
    if self.investment_horizon == 0 {
      return Err(AnalyticsError::schema(
        "investment horizon must be a positive number of years",
      ));
    }
    if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
      return Err(AnalyticsError::schema(format!(
        "initial capital must be positive, got {}",
        self.initial_capital
      )));
    }
    Ok(())
  }
}

impl Default for AllocationRequest {
  fn default() -> Self {
    Self {
      risk_profile: RiskProfile::Moderate,
      investment_horizon: 10,
      initial_capital: 100_000.0,
    }
  }
}

/// Weight vector with its model performance figures.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PortfolioResult {
  /// Final portfolio weights.
  pub weights: Vec<f64>,
  /// Model expected portfolio return (annualized if inputs are annualized).
  pub expected_return: f64,
  /// Model portfolio volatility.
  pub volatility: f64,
  /// Sharpe ratio computed as `(expected_return - risk_free) / (volatility + eps)`.
  pub sharpe: f64,
}

/// Allocation output keyed by asset name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
  pub weights: BTreeMap<String, f64>,
  pub expected_return: f64,
  pub volatility: f64,
  pub sharpe_ratio: f64,
  pub initial_capital: f64,
  pub allocation_amounts: BTreeMap<String, f64>,
  pub llm_explanation: String,
}

impl AllocationResult {
  pub(crate) fn from_portfolio(
    assets: &[String],
    portfolio: PortfolioResult,
    initial_capital: f64,
    explanation: String,
  ) -> Self {
    let weights: BTreeMap<String, f64> = assets
      .iter()
      .cloned()
      .zip(portfolio.weights.iter().copied())
      .collect();
    let allocation_amounts = weights
      .iter()
      .map(|(asset, &w)| (asset.clone(), w * initial_capital))
      .collect();

    Self {
      weights,
      expected_return: portfolio.expected_return,
      volatility: portfolio.volatility,
      sharpe_ratio: portfolio.sharpe,
      initial_capital,
      allocation_amounts,
      llm_explanation: explanation,
    }
  }

  pub fn total_weight(&self) -> f64 {
    self.weights.values().sum()
  }
}
