//! # Statement Data
//!
//! $$
//! \text{qoq}_t = \frac{x_t}{x_{t-1}} - 1,\qquad \text{yoy}_t = \frac{x_t}{x_{t-4}} - 1
//! $$
//!
//! Period-indexed statement tables with typed columns.

use std::fs::File;
use std::io;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::ReaderBuilder;
use tracing::debug;

use crate::error::AnalyticsError;
use crate::error::Result;
use crate::quant::NotANumber;
use crate::quant::parse_date;
use crate::quant::parse_number;

/// Column holding the reporting period.
pub const PERIOD_COLUMN: &str = "period";

/// Columns the KPI set is built from.
pub const EXPECTED_COLUMNS: [&str; 6] = [
  "period",
  "revenue",
  "net_income",
  "total_assets",
  "total_liabilities",
  "operating_cash_flow",
];

const QOQ_LAG: usize = 1;
const YOY_LAG: usize = 4;

#[derive(Clone, Debug, PartialEq)]
pub enum ColumnData {
  Period(Vec<NaiveDate>),
  Numeric(Vec<Option<f64>>),
  Text(Vec<String>),
}

impl ColumnData {
  fn len(&self) -> usize {
    match self {
      ColumnData::Period(v) => v.len(),
      ColumnData::Numeric(v) => v.len(),
      ColumnData::Text(v) => v.len(),
    }
  }

  fn reorder(&self, order: &[usize]) -> Self {
    match self {
      ColumnData::Period(v) => ColumnData::Period(order.iter().map(|&i| v[i]).collect()),
      ColumnData::Numeric(v) => ColumnData::Numeric(order.iter().map(|&i| v[i]).collect()),
      ColumnData::Text(v) => ColumnData::Text(order.iter().map(|&i| v[i].clone()).collect()),
    }
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
  pub name: String,
  pub data: ColumnData,
}

/// Statement table sorted by period.
#[derive(Clone, Debug, PartialEq)]
pub struct FinancialStatements {
  columns: Vec<Column>,
  n_rows: usize,
}

impl FinancialStatements {
  /// Build a table from columns. Exactly one `period` column is required;
  /// rows are sorted by it.
  pub fn new(columns: Vec<Column>) -> Result<Self> {
    let period_idx = columns
      .iter()
      .position(|c| c.name == PERIOD_COLUMN)
      .ok_or_else(|| missing_period_error(&columns))?;
    let periods = match &columns[period_idx].data {
      ColumnData::Period(p) => p.clone(),
      _ => {
        return Err(AnalyticsError::schema(format!(
          "column '{PERIOD_COLUMN}' must hold dates"
        )))
      }
    };

    let n_rows = periods.len();
    if let Some(c) = columns.iter().find(|c| c.data.len() != n_rows) {
      return Err(AnalyticsError::schema(format!(
        "column '{}' has {} rows, expected {n_rows}",
        c.name,
        c.data.len()
      )));
    }

    let mut order: Vec<usize> = (0..n_rows).collect();
    order.sort_by_key(|&i| periods[i]);
    let columns = columns
      .into_iter()
      .map(|c| Column {
        data: c.data.reorder(&order),
        name: c.name,
      })
      .collect();

    Ok(Self { columns, n_rows })
  }

  pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| match err.kind() {
      io::ErrorKind::NotFound => AnalyticsError::InputNotFound(path.to_path_buf()),
      _ => AnalyticsError::Io(err),
    })?;
    debug!(path = %path.display(), "loading financial statements");
    Self::from_reader(file)
  }

  /// Read a CSV. A column is numeric when every non-empty cell parses as a number.
  pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
    let mut rdr = ReaderBuilder::new()
      .has_headers(true)
      .trim(csv::Trim::All)
      .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(|s| s.to_string()).collect();
    if !headers.iter().any(|h| h == PERIOD_COLUMN) {
      return Err(missing_period_error_from_names(&headers));
    }

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in rdr.records() {
      let record = record?;
      for (j, col) in raw.iter_mut().enumerate() {
        col.push(record.get(j).unwrap_or_default().to_string());
      }
    }

    let columns = headers
      .into_iter()
      .zip(raw)
      .map(|(name, cells)| -> Result<Column> {
        let data = if name == PERIOD_COLUMN {
          let dates = cells
            .iter()
            .enumerate()
            .map(|(row, cell)| {
              parse_date(cell).ok_or_else(|| {
                AnalyticsError::schema(format!("row {}: unparseable period '{cell}'", row + 1))
              })
            })
            .collect::<Result<Vec<_>>>()?;
          ColumnData::Period(dates)
        } else {
          match cells
            .iter()
            .map(|c| parse_number(c))
            .collect::<std::result::Result<Vec<_>, NotANumber>>()
          {
            Ok(values) => ColumnData::Numeric(values),
            Err(NotANumber) => ColumnData::Text(cells),
          }
        };
        Ok(Column { name, data })
      })
      .collect::<Result<Vec<_>>>()?;

    Self::new(columns)
  }

  pub fn columns(&self) -> &[Column] {
    &self.columns
  }

  pub fn n_rows(&self) -> usize {
    self.n_rows
  }

  pub fn periods(&self) -> &[NaiveDate] {
    self
      .columns
      .iter()
      .find_map(|c| match &c.data {
        ColumnData::Period(p) => Some(p.as_slice()),
        _ => None,
      })
      .unwrap_or(&[])
  }

  pub fn numeric(&self, name: &str) -> Option<&[Option<f64>]> {
    self.columns.iter().find_map(|c| match &c.data {
      ColumnData::Numeric(v) if c.name == name => Some(v.as_slice()),
      _ => None,
    })
  }

  /// Value of a numeric column in the most recent period.
  pub fn latest(&self, name: &str) -> Option<f64> {
    self.numeric(name)?.last().copied().flatten()
  }

  /// Append `<col>_qoq` and `<col>_yoy` percent changes for every numeric column.
  pub fn with_period_deltas(&self) -> Self {
    let mut columns = self.columns.clone();
    for c in &self.columns {
      if let ColumnData::Numeric(values) = &c.data {
        columns.push(Column {
          name: format!("{}_qoq", c.name),
          data: ColumnData::Numeric(pct_change(values, QOQ_LAG)),
        });
        columns.push(Column {
          name: format!("{}_yoy", c.name),
          data: ColumnData::Numeric(pct_change(values, YOY_LAG)),
        });
      }
    }

    Self {
      columns,
      n_rows: self.n_rows,
    }
  }
}

/// Percent change against the value `lag` rows earlier.
pub fn pct_change(values: &[Option<f64>], lag: usize) -> Vec<Option<f64>> {
  (0..values.len())
    .map(|t| {
      let prev = values.get(t.checked_sub(lag)?).copied().flatten()?;
      let curr = values[t]?;
      Some(curr / prev - 1.0)
    })
    .collect()
}

fn missing_period_error(columns: &[Column]) -> AnalyticsError {
  let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
  missing_period_error_from_names(&names)
}

fn missing_period_error_from_names(names: &[String]) -> AnalyticsError {
  AnalyticsError::schema(format!(
    "missing required column '{PERIOD_COLUMN}'; available columns: {}; expected columns: {}",
    names.join(", "),
    EXPECTED_COLUMNS.join(", ")
  ))
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;

  use super::*;

  const SAMPLE: &str = "period,revenue,net_income,segment\n\
                        2023-06-30,120,12,retail\n\
                        2023-03-31,100,10,retail\n\
                        2023-09-30,150,,retail\n";

  #[test]
  fn from_reader_types_columns_and_sorts_by_period() {
    let fs = FinancialStatements::from_reader(SAMPLE.as_bytes()).unwrap();

    assert_eq!(fs.n_rows(), 3);
    assert_eq!(
      fs.periods()[0],
      NaiveDate::from_ymd_opt(2023, 3, 31).unwrap()
    );
    assert_eq!(
      fs.numeric("revenue").unwrap(),
      &[Some(100.0), Some(120.0), Some(150.0)]
    );
    assert_eq!(fs.numeric("net_income").unwrap()[2], None);
    assert!(fs.numeric("segment").is_none());
    assert_eq!(fs.latest("revenue"), Some(150.0));
    assert_eq!(fs.latest("net_income"), None);
  }

  #[test]
  fn missing_period_column_lists_available_columns() {
    let err = FinancialStatements::from_reader("date,revenue\n2023-01-01,1\n".as_bytes())
      .unwrap_err();
    let msg = err.to_string();

    assert!(matches!(err, AnalyticsError::SchemaError(_)));
    assert!(msg.contains("available columns: date, revenue"));
    assert!(msg.contains("operating_cash_flow"));
  }

  #[test]
  fn missing_file_is_input_not_found() {
    let err = FinancialStatements::from_csv_path("nope/financials.csv").unwrap_err();
    assert!(matches!(err, AnalyticsError::InputNotFound(_)));
  }

  #[test]
  fn pct_change_respects_lag_and_gaps() {
    let values = [Some(100.0), Some(110.0), None, Some(121.0), Some(0.0), Some(150.0)];

    let qoq = pct_change(&values, 1);
    assert_eq!(qoq[0], None);
    assert_relative_eq!(qoq[1].unwrap(), 0.1, epsilon = 1e-12);
    assert_eq!(qoq[2], None);
    assert_eq!(qoq[3], None);
    assert_relative_eq!(qoq[4].unwrap(), -1.0, epsilon = 1e-12);
    assert_eq!(qoq[5], Some(f64::INFINITY));

    let yoy = pct_change(&values, 4);
    assert_eq!(yoy[..4], [None, None, None, None]);
    assert_relative_eq!(yoy[4].unwrap(), -1.0, epsilon = 1e-12);
    assert_relative_eq!(yoy[5].unwrap(), 150.0 / 110.0 - 1.0, epsilon = 1e-12);
  }

  #[test]
  fn deltas_are_appended_for_numeric_columns_only() {
    let fs = FinancialStatements::from_reader(SAMPLE.as_bytes())
      .unwrap()
      .with_period_deltas();
    let names: Vec<&str> = fs.columns().iter().map(|c| c.name.as_str()).collect();

    assert_eq!(
      names,
      vec![
        "period",
        "revenue",
        "net_income",
        "segment",
        "revenue_qoq",
        "revenue_yoy",
        "net_income_qoq",
        "net_income_yoy",
      ]
    );
    assert_relative_eq!(fs.numeric("revenue_qoq").unwrap()[2].unwrap(), 0.25, epsilon = 1e-12);
  }
}
