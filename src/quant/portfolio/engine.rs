//! # Portfolio Engine
//!
//! $$
//! (P,\ \text{profile},\ C_0)\ \mapsto\ (\mathbf{w},\ \mathbb E[R_p],\ \sigma_p,\ S,\ C_0\mathbf{w})
//! $$
//!
//! High-level allocation API: price table in, [`AllocationResult`] out.

use std::path::Path;

use tracing::debug;
use tracing::info;
use tracing::instrument;

use super::data::PriceSeries;
use super::data::ReturnStatistics;
use super::optimizers::optimize_regularized_mean_variance;
use super::types::AllocationRequest;
use super::types::AllocationResult;
use crate::config::AnalyticsConfig;
use crate::error::AnalyticsError;
use crate::error::Result;

const OFFLINE_EXPLANATION: &str = "Offline mode: allocation explanation generated without LLM. \
   Weights emphasize diversification with risk-adjusted balance.";
const STATIC_EXPLANATION: &str =
  "Heuristic mean-variance allocation. Weights emphasize diversification with risk-adjusted balance.";

/// Stateless mean-variance allocator.
///
/// Holds only immutable configuration, so one instance can serve
/// concurrent callers.
#[derive(Clone, Debug, Default)]
pub struct PortfolioEngine {
  config: AnalyticsConfig,
}

impl PortfolioEngine {
  /// Construct a new engine with explicit configuration.
  pub fn new(config: AnalyticsConfig) -> Result<Self> {
    config.validate()?;
    Ok(Self { config })
  }

  /// Borrow engine configuration.
  pub fn config(&self) -> &AnalyticsConfig {
    &self.config
  }

  /// Load a price CSV and allocate.
  pub fn recommend(
    &self,
    csv_path: impl AsRef<Path>,
    request: &AllocationRequest,
  ) -> Result<AllocationResult> {
    request.validate()?;
    let prices = PriceSeries::from_csv_path(csv_path)?;
    self.allocate_prices(&prices, request)
  }

  /// Allocate capital across the assets of an in-memory price table.
  pub fn allocate(
    &self,
    prices: &PriceSeries,
    request: &AllocationRequest,
  ) -> Result<AllocationResult> {
    request.validate()?;
    self.allocate_prices(prices, request)
  }

  /// Allocate from precomputed return statistics. `assets` names the
  /// statistics' columns in order.
  pub fn allocate_with_statistics(
    &self,
    assets: &[String],
    stats: &ReturnStatistics,
    request: &AllocationRequest,
  ) -> Result<AllocationResult> {
    request.validate()?;
    if assets.len() != stats.n_assets() {
      return Err(AnalyticsError::schema(format!(
        "{} asset names for {} return series",
        assets.len(),
        stats.n_assets()
      )));
    }
    self.solve(assets, stats, request)
  }

  #[instrument(skip_all, fields(assets = prices.n_assets(), rows = prices.n_rows()))]
  fn allocate_prices(
    &self,
    prices: &PriceSeries,
    request: &AllocationRequest,
  ) -> Result<AllocationResult> {
    let stats = ReturnStatistics::from_prices(prices, self.config.annualization_factor)?;
    self.solve(prices.assets(), &stats, request)
  }

  fn solve(
    &self,
    assets: &[String],
    stats: &ReturnStatistics,
    request: &AllocationRequest,
  ) -> Result<AllocationResult> {
    let lambda = request
      .risk_profile
      .risk_aversion(&self.config.risk_aversion);
    debug!(
      lambda,
      observations = stats.n_observations,
      vols = ?stats.volatilities().to_vec(),
      "solving allocation"
    );

    let portfolio = optimize_regularized_mean_variance(
      &stats.mu,
      &stats.cov,
      lambda,
      self.config.max_weight,
      self.config.risk_free_rate,
    )?;

    info!(
      profile = %request.risk_profile,
      horizon = request.investment_horizon,
      expected_return = portfolio.expected_return,
      volatility = portfolio.volatility,
      sharpe = portfolio.sharpe,
      "allocation computed"
    );

    Ok(AllocationResult::from_portfolio(
      assets,
      portfolio,
      request.initial_capital,
      self.explanation().to_string(),
    ))
  }

  fn explanation(&self) -> &'static str {
    if self.config.offline {
      OFFLINE_EXPLANATION
    } else {
      STATIC_EXPLANATION
    }
  }
}
