//! # Portfolio Optimizers
//!
//! $$
//! \mathbf{w}_{raw} = (\Sigma + \lambda I)^{+}\mu,\qquad
//! \mathbf{w} = \Pi_{\Delta,\,w_{\max}}(\mathbf{w}_{raw})
//! $$
//!
//! Regularized closed-form mean-variance heuristic, capped simplex
//! projection and portfolio performance metrics.

use nalgebra::DMatrix;
use ndarray::Array1;
use ndarray::Array2;
use tracing::debug;
use tracing::warn;

use super::types::PortfolioResult;
use crate::error::AnalyticsError;
use crate::error::Result;

/// Added to the volatility in the Sharpe denominator.
pub const SHARPE_EPSILON: f64 = 1e-9;

/// Relative singular-value cutoff for the pseudo-inverse.
const PINV_RCOND: f64 = 1e-15;

/// Moore-Penrose pseudo-inverse via SVD.
pub(crate) fn pseudo_inverse(mat: &Array2<f64>) -> Result<Array2<f64>> {
  let (rows, cols) = mat.dim();
  let m = DMatrix::from_fn(rows, cols, |i, j| mat[[i, j]]);
  let svd = m.svd(true, true);
  let s_max = svd.singular_values.iter().cloned().fold(0.0_f64, f64::max);
  let pinv = svd
    .pseudo_inverse(PINV_RCOND * s_max)
    .map_err(|e| AnalyticsError::numerical(format!("pseudo-inverse failed: {e}")))?;

  Ok(Array2::from_shape_fn((cols, rows), |(i, j)| pinv[(i, j)]))
}

/// Unconstrained heuristic weights `pinv(cov + lambda I) mu`.
pub fn regularized_weights(mu: &Array1<f64>, cov: &Array2<f64>, lambda: f64) -> Result<Array1<f64>> {
  let n = mu.len();
  if cov.dim() != (n, n) {
    return Err(AnalyticsError::schema(format!(
      "covariance is {:?} but mu has {n} entries",
      cov.dim()
    )));
  }

  let cov_reg = cov + &(Array2::<f64>::eye(n) * lambda);
  let inv = pseudo_inverse(&cov_reg)?;
  let raw = inv.dot(mu);

  if raw.iter().any(|w| !w.is_finite()) {
    return Err(AnalyticsError::numerical("closed-form weights are not finite"));
  }

  Ok(raw)
}

/// Project weights onto the long-only simplex with a per-asset cap.
///
/// Excess above the cap is redistributed evenly over assets that were never
/// capped. When every asset ends up capped the loop stops and the weights
/// may sum to less than one.
pub fn project_capped_simplex(raw: &[f64], cap: f64) -> Vec<f64> {
  let n = raw.len();
  match n {
    0 => return Vec::new(),
    1 => return vec![1.0],
    _ => {}
  }

  let mut w: Vec<f64> = raw.iter().map(|&x| x.clamp(0.0, cap)).collect();
  let total: f64 = w.iter().sum();
  if total == 0.0 {
    warn!(assets = n, "no positive raw weight, falling back to equal weights");
    return vec![1.0 / n as f64; n];
  }
  for x in &mut w {
    *x /= total;
  }

  let mut capped = vec![false; n];
  loop {
    let over: Vec<usize> = (0..n).filter(|&i| !capped[i] && w[i] > cap).collect();
    if over.is_empty() {
      break;
    }

    let excess: f64 = over.iter().map(|&i| w[i] - cap).sum();
    for &i in &over {
      w[i] = cap;
      capped[i] = true;
    }

    let remaining: Vec<usize> = (0..n).filter(|&i| !capped[i]).collect();
    if remaining.is_empty() {
      warn!(assets = n, cap, "every asset capped, leaving excess unallocated");
      break;
    }
    let share = excess / remaining.len() as f64;
    for &i in &remaining {
      w[i] += share;
    }
  }

  w
}

/// Expected return, volatility and Sharpe ratio of a weight vector.
pub fn portfolio_metrics(
  weights: Vec<f64>,
  mu: &Array1<f64>,
  cov: &Array2<f64>,
  risk_free: f64,
) -> PortfolioResult {
  let w = Array1::from_vec(weights);
  let expected_return = w.dot(mu);
  let volatility = w.dot(&cov.dot(&w)).max(0.0).sqrt();
  let sharpe = (expected_return - risk_free) / (volatility + SHARPE_EPSILON);

  PortfolioResult {
    weights: w.to_vec(),
    expected_return,
    volatility,
    sharpe,
  }
}

/// Closed-form mean-variance allocation with capped simplex projection.
pub fn optimize_regularized_mean_variance(
  mu: &Array1<f64>,
  cov: &Array2<f64>,
  lambda: f64,
  max_weight: f64,
  risk_free: f64,
) -> Result<PortfolioResult> {
  let raw = regularized_weights(mu, cov, lambda)?;
  debug!(lambda, raw = ?raw.to_vec(), "closed-form weights");

  let w = project_capped_simplex(&raw.to_vec(), max_weight);
  Ok(portfolio_metrics(w, mu, cov, risk_free))
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;
  use ndarray::array;

  use super::*;

  #[test]
  fn pseudo_inverse_handles_singular_matrices() {
    let singular = array![[1.0, 1.0], [1.0, 1.0]];
    let pinv = pseudo_inverse(&singular).unwrap();
    for v in pinv.iter() {
      assert_relative_eq!(*v, 0.25, epsilon = 1e-12);
    }

    let diag = array![[2.0, 0.0], [0.0, 4.0]];
    let inv = pseudo_inverse(&diag).unwrap();
    assert_relative_eq!(inv[[0, 0]], 0.5, epsilon = 1e-12);
    assert_relative_eq!(inv[[1, 1]], 0.25, epsilon = 1e-12);
    assert_relative_eq!(inv[[0, 1]], 0.0, epsilon = 1e-12);
  }

  #[test]
  fn regularized_weights_shrink_with_risk_aversion() {
    let mu = array![0.1, 0.2];
    let cov = array![[0.04, 0.0], [0.0, 0.09]];

    let low = regularized_weights(&mu, &cov, 1.5).unwrap();
    let high = regularized_weights(&mu, &cov, 8.0).unwrap();

    assert_relative_eq!(low[0], 0.1 / 1.54, epsilon = 1e-12);
    assert_relative_eq!(low[1], 0.2 / 1.59, epsilon = 1e-12);
    assert!(high[0] < low[0] && high[1] < low[1]);
  }

  #[test]
  fn regularized_weights_reject_shape_mismatch() {
    let mu = array![0.1, 0.2, 0.3];
    let cov = array![[0.04, 0.0], [0.0, 0.09]];
    assert!(matches!(
      regularized_weights(&mu, &cov, 4.0),
      Err(AnalyticsError::SchemaError(_))
    ));
  }

  #[test]
  fn projection_redistributes_excess_to_uncapped_assets() {
    let w = project_capped_simplex(&[0.25, 0.05, 0.05, 0.05, 0.05, 0.05], 0.25);

    assert_relative_eq!(w[0], 0.25, epsilon = 1e-12);
    for &x in &w[1..] {
      assert_relative_eq!(x, 0.15, epsilon = 1e-12);
    }
    assert_relative_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
  }

  #[test]
  fn projection_clips_shorts_and_respects_cap() {
    let raw = [0.3, -0.2, 0.1, 0.05, 0.2, 0.0, 0.15];
    let w = project_capped_simplex(&raw, 0.25);

    assert_relative_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
    assert!(w.iter().all(|&x| (0.0..=0.25 + 1e-12).contains(&x)));
    // shorted assets are clipped to zero but still receive redistributed excess
    assert_relative_eq!(w[1], 0.02, epsilon = 1e-12);
  }

  #[test]
  fn projection_falls_back_to_equal_weights() {
    let w = project_capped_simplex(&[-0.1, -0.3, 0.0, -2.0], 0.25);
    assert_eq!(w, vec![0.25; 4]);
  }

  #[test]
  fn projection_terminates_when_every_asset_is_capped() {
    let w = project_capped_simplex(&[0.25, 0.1, 0.05], 0.25);

    assert_eq!(w.len(), 3);
    assert!(w.iter().all(|&x| x <= 0.25));
    assert!(w.iter().sum::<f64>() < 1.0);
  }

  #[test]
  fn projection_of_single_asset_is_fully_invested() {
    assert_eq!(project_capped_simplex(&[0.01], 0.25), vec![1.0]);
    assert_eq!(project_capped_simplex(&[-3.0], 0.25), vec![1.0]);
    assert!(project_capped_simplex(&[], 0.25).is_empty());
  }

  #[test]
  fn metrics_guard_zero_volatility() {
    let mu = array![0.05];
    let cov = array![[0.0]];
    let result = portfolio_metrics(vec![1.0], &mu, &cov, 0.02);

    assert_eq!(result.volatility, 0.0);
    assert_relative_eq!(result.sharpe, 0.03 / SHARPE_EPSILON, max_relative = 1e-12);
  }

  #[test]
  fn metrics_match_quadratic_form() {
    let mu = array![0.1, 0.2];
    let cov = array![[0.04, 0.01], [0.01, 0.09]];
    let result = portfolio_metrics(vec![0.5, 0.5], &mu, &cov, 0.02);

    let var: f64 = 0.25 * 0.04 + 0.25 * 0.09 + 2.0 * 0.25 * 0.01;
    assert_relative_eq!(result.expected_return, 0.15, epsilon = 1e-12);
    assert_relative_eq!(result.volatility, var.sqrt(), epsilon = 1e-12);
    assert_relative_eq!(
      result.sharpe,
      0.13 / (var.sqrt() + SHARPE_EPSILON),
      epsilon = 1e-12
    );
  }
}
