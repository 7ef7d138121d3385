//! # Portfolio Data Utilities
//!
//! $$
//! r_{t,i} = \ln\frac{P_{t,i}}{P_{t-1,i}},\qquad
//! \mu = A\,\bar r,\qquad \Sigma = \frac{A}{T-1}\sum_t (r_t-\bar r)(r_t-\bar r)^\top
//! $$
//!
//! Price-table loading, log-return preprocessing and annualized
//! mean/covariance estimation.

use std::fs::File;
use std::io;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::ReaderBuilder;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView2;
use ndarray::Axis;
use tracing::debug;

use crate::error::AnalyticsError;
use crate::error::Result;
use crate::quant::parse_date;
use crate::quant::parse_number;

/// Date-indexed close prices, one column per asset. Gaps are `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceSeries {
  dates: Vec<NaiveDate>,
  assets: Vec<String>,
  /// Column-major: `closes[asset][row]`.
  closes: Vec<Vec<Option<f64>>>,
}

impl PriceSeries {
  /// Build a series from columns, sorting rows by date.
  pub fn new(
    dates: Vec<NaiveDate>,
    assets: Vec<String>,
    closes: Vec<Vec<Option<f64>>>,
  ) -> Result<Self> {
    if assets.is_empty() {
      return Err(AnalyticsError::schema(
        "price table needs at least one asset column",
      ));
    }
    if closes.len() != assets.len() {
      return Err(AnalyticsError::schema(format!(
        "{} asset names but {} price columns",
        assets.len(),
        closes.len()
      )));
    }
    if let Some((asset, col)) = assets
      .iter()
      .zip(closes.iter())
      .find(|(_, col)| col.len() != dates.len())
    {
      return Err(AnalyticsError::schema(format!(
        "column '{asset}' has {} rows, expected {}",
        col.len(),
        dates.len()
      )));
    }
    if dates.len() < 2 {
      return Err(AnalyticsError::schema(format!(
        "price table needs at least 2 rows, got {}",
        dates.len()
      )));
    }

    let mut order: Vec<usize> = (0..dates.len()).collect();
    order.sort_by_key(|&i| dates[i]);

    let dates: Vec<NaiveDate> = order.iter().map(|&i| dates[i]).collect();
    if let Some(w) = dates.windows(2).find(|w| w[0] == w[1]) {
      return Err(AnalyticsError::schema(format!(
        "duplicate date {} in price table",
        w[0]
      )));
    }

    let closes = closes
      .into_iter()
      .map(|col| order.iter().map(|&i| col[i]).collect())
      .collect();

    Ok(Self {
      dates,
      assets,
      closes,
    })
  }

  /// Load a wide CSV: first column dates, remaining columns asset prices.
  pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| match err.kind() {
      io::ErrorKind::NotFound => AnalyticsError::InputNotFound(path.to_path_buf()),
      _ => AnalyticsError::Io(err),
    })?;
    debug!(path = %path.display(), "loading price table");
    Self::from_reader(file)
  }

  pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
    let mut rdr = ReaderBuilder::new()
      .has_headers(true)
      .trim(csv::Trim::All)
      .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(|s| s.to_string()).collect();
    if headers.len() < 2 {
      return Err(AnalyticsError::schema(format!(
        "price table needs a date column and at least one asset column, got {} column(s)",
        headers.len()
      )));
    }
    let assets = headers[1..].to_vec();

    let mut dates = Vec::new();
    let mut closes = vec![Vec::new(); assets.len()];
    for (row, record) in rdr.records().enumerate() {
      let record = record?;
      let raw_date = record.get(0).unwrap_or_default();
      let date = parse_date(raw_date).ok_or_else(|| {
        AnalyticsError::schema(format!("row {}: unparseable date '{raw_date}'", row + 1))
      })?;
      dates.push(date);

      for (j, asset) in assets.iter().enumerate() {
        let raw = record.get(j + 1).unwrap_or_default();
        let value = parse_number(raw).map_err(|_| {
          AnalyticsError::schema(format!(
            "row {}: non-numeric price '{raw}' for '{asset}'",
            row + 1
          ))
        })?;
        closes[j].push(value);
      }
    }

    Self::new(dates, assets, closes)
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn assets(&self) -> &[String] {
    &self.assets
  }

  pub fn n_assets(&self) -> usize {
    self.assets.len()
  }

  pub fn n_rows(&self) -> usize {
    self.dates.len()
  }

  /// Close-price column for one asset.
  pub fn closes(&self, asset: usize) -> &[Option<f64>] {
    &self.closes[asset]
  }

  /// Log returns as a `(periods, assets)` matrix.
  ///
  /// A period is kept only when every asset has both endpoint prices.
  /// Non-positive prices are kept and yield non-finite returns.
  pub fn log_returns(&self) -> Array2<f64> {
    let n = self.n_assets();
    let mut data = Vec::new();
    let mut rows = 0;

    for t in 1..self.n_rows() {
      let pairs: Option<Vec<(f64, f64)>> = self
        .closes
        .iter()
        .map(|col| Some((col[t - 1]?, col[t]?)))
        .collect();
      if let Some(pairs) = pairs {
        data.extend(pairs.iter().map(|&(prev, curr)| (curr / prev).ln()));
        rows += 1;
      }
    }

    Array2::from_shape_vec((rows, n), data).unwrap_or_else(|_| Array2::zeros((0, n)))
  }
}

/// Annualized return moments derived from a [`PriceSeries`].
#[derive(Clone, Debug, PartialEq)]
pub struct ReturnStatistics {
  /// Annualized mean log return per asset.
  pub mu: Array1<f64>,
  /// Annualized sample covariance of log returns.
  pub cov: Array2<f64>,
  /// Return periods that survived gap removal.
  pub n_observations: usize,
}

impl ReturnStatistics {
  /// Every present price must be positive and finite, including prices
  /// on rows later dropped for gaps.
  pub fn from_prices(prices: &PriceSeries, annualization: f64) -> Result<Self> {
    for (asset, col) in prices.assets().iter().zip(prices.closes.iter()) {
      let bad = col.iter().enumerate().find_map(|(row, p)| match *p {
        Some(p) if p <= 0.0 || !p.is_finite() => Some((row, p)),
        _ => None,
      });
      if let Some((row, p)) = bad {
        return Err(AnalyticsError::numerical(format!(
          "non-positive or non-finite price {p} for '{asset}' on {}",
          prices.dates()[row]
        )));
      }
    }

    let returns = prices.log_returns();
    Self::from_returns(returns.view(), annualization)
  }

  pub fn from_returns(returns: ArrayView2<f64>, annualization: f64) -> Result<Self> {
    let t = returns.nrows();
    if t < 2 {
      return Err(AnalyticsError::schema(format!(
        "need at least 2 complete return rows to estimate covariance, got {t}"
      )));
    }

    let mean = returns
      .mean_axis(Axis(0))
      .ok_or_else(|| AnalyticsError::schema("empty return matrix"))?;
    let centered = &returns - &mean.view().insert_axis(Axis(0));
    let cov = centered.t().dot(&centered) / (t - 1) as f64 * annualization;
    let mu = mean * annualization;

    if mu.iter().chain(cov.iter()).any(|v| !v.is_finite()) {
      return Err(AnalyticsError::numerical(
        "non-finite return statistics (zero or negative prices in input?)",
      ));
    }

    debug!(observations = t, assets = mu.len(), "estimated return statistics");

    Ok(Self {
      mu,
      cov,
      n_observations: t,
    })
  }

  pub fn n_assets(&self) -> usize {
    self.mu.len()
  }

  /// Annualized standard deviation per asset.
  pub fn volatilities(&self) -> Array1<f64> {
    self.cov.diag().mapv(|v| v.max(0.0).sqrt())
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;

  use super::*;

  fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
  }

  #[test]
  fn new_sorts_rows_by_date() {
    let series = PriceSeries::new(
      vec![day(3), day(1), day(2)],
      vec!["AAA".to_string()],
      vec![vec![Some(3.0), Some(1.0), Some(2.0)]],
    )
    .unwrap();

    assert_eq!(series.dates(), &[day(1), day(2), day(3)]);
    assert_eq!(series.closes(0), &[Some(1.0), Some(2.0), Some(3.0)]);
  }

  #[test]
  fn new_rejects_duplicate_dates_and_short_tables() {
    let dup = PriceSeries::new(
      vec![day(1), day(1)],
      vec!["AAA".to_string()],
      vec![vec![Some(1.0), Some(2.0)]],
    );
    assert!(matches!(dup, Err(AnalyticsError::SchemaError(_))));

    let short = PriceSeries::new(
      vec![day(1)],
      vec!["AAA".to_string()],
      vec![vec![Some(1.0)]],
    );
    assert!(matches!(short, Err(AnalyticsError::SchemaError(_))));
  }

  #[test]
  fn log_returns_drop_rows_touching_gaps() {
    let csv = "date,AAA,BBB\n\
               2024-01-01,100,50\n\
               2024-01-02,110,\n\
               2024-01-03,121,55\n\
               2024-01-04,133.1,60.5\n";
    let series = PriceSeries::from_reader(csv.as_bytes()).unwrap();
    let returns = series.log_returns();

    assert_eq!(returns.dim(), (1, 2));
    assert_relative_eq!(returns[[0, 0]], 1.1_f64.ln(), epsilon = 1e-12);
    assert_relative_eq!(returns[[0, 1]], 1.1_f64.ln(), epsilon = 1e-12);
  }

  #[test]
  fn from_reader_rejects_text_prices() {
    let csv = "date,AAA\n2024-01-01,100\n2024-01-02,abc\n";
    let err = PriceSeries::from_reader(csv.as_bytes()).unwrap_err();
    assert!(matches!(err, AnalyticsError::SchemaError(_)));
  }

  #[test]
  fn from_csv_path_reports_missing_file() {
    let err = PriceSeries::from_csv_path("no/such/prices.csv").unwrap_err();
    assert!(matches!(err, AnalyticsError::InputNotFound(_)));
  }

  #[test]
  fn statistics_are_annualized() {
    let returns = Array2::from_shape_vec((3, 2), vec![0.01, 0.02, -0.01, 0.0, 0.03, 0.01]).unwrap();
    let stats = ReturnStatistics::from_returns(returns.view(), 252.0).unwrap();

    assert_relative_eq!(stats.mu[0], 0.01 * 252.0, epsilon = 1e-12);
    assert_relative_eq!(stats.mu[1], 0.01 * 252.0, epsilon = 1e-12);
    // var([0.01, -0.01, 0.03]) = 4e-4, cov = 1e-4
    assert_relative_eq!(stats.cov[[0, 0]], 4e-4 * 252.0, epsilon = 1e-12);
    assert_relative_eq!(stats.cov[[0, 1]], 1e-4 * 252.0, epsilon = 1e-12);
    assert_relative_eq!(stats.cov[[0, 1]], stats.cov[[1, 0]], epsilon = 1e-15);
    assert_eq!(stats.n_observations, 3);
  }

  #[test]
  fn statistics_need_two_rows() {
    let returns = Array2::from_shape_vec((1, 1), vec![0.01]).unwrap();
    let err = ReturnStatistics::from_returns(returns.view(), 252.0).unwrap_err();
    assert!(matches!(err, AnalyticsError::SchemaError(_)));
  }

  #[test]
  fn zero_price_is_a_numerical_error() {
    let csv = "date,AAA\n2024-01-01,100\n2024-01-02,0\n2024-01-03,101\n2024-01-04,102\n";
    let series = PriceSeries::from_reader(csv.as_bytes()).unwrap();
    let err = ReturnStatistics::from_prices(&series, 252.0).unwrap_err();
    assert!(matches!(err, AnalyticsError::NumericalError(_)));
  }

  #[test]
  fn bad_price_on_a_gapped_row_is_still_rejected() {
    for bad in ["0", "-101"] {
      let csv = format!(
        "date,AAA,BBB\n\
         2024-01-01,100,50\n\
         2024-01-02,101,51\n\
         2024-01-03,{bad},\n\
         2024-01-04,102,52\n\
         2024-01-05,103,51\n\
         2024-01-06,104,53\n"
      );
      let series = PriceSeries::from_reader(csv.as_bytes()).unwrap();
      // the row is dropped for the gap, the price still fails
      assert_eq!(series.log_returns().nrows(), 3);

      let err = ReturnStatistics::from_prices(&series, 252.0).unwrap_err();
      assert!(
        matches!(err, AnalyticsError::NumericalError(_)),
        "price {bad}: {err:?}"
      );
    }
  }

  #[test]
  fn negative_price_is_a_numerical_error() {
    let csv = "date,AAA\n2024-01-01,100\n2024-01-02,-101\n2024-01-03,101\n2024-01-04,102\n";
    let series = PriceSeries::from_reader(csv.as_bytes()).unwrap();
    let err = ReturnStatistics::from_prices(&series, 252.0).unwrap_err();
    assert!(matches!(err, AnalyticsError::NumericalError(_)));
  }
}
