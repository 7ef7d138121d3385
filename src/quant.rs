//! # Quant
//!
//! $$
//! \text{table}\ \xrightarrow{\text{parse}}\ (t_i, x_{ij})\ \xrightarrow{\text{analyse}}\ \text{report}
//! $$
//!
//! Portfolio allocation and financial-statement analytics, plus the cell
//! parsing shared by both CSV readers.

use chrono::NaiveDate;
use chrono::NaiveDateTime;

pub mod portfolio;
pub mod statements;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a calendar date cell. Timestamps are truncated to their date.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  DATE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
    .or_else(|| {
      DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
    })
}

/// Cells treated as gaps rather than values.
pub(crate) fn is_missing(raw: &str) -> bool {
  matches!(
    raw.trim().to_ascii_lowercase().as_str(),
    "" | "nan" | "na" | "n/a" | "null" | "none"
  )
}

/// A cell that is neither a gap nor a number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct NotANumber;

/// Parse a numeric cell: `Ok(None)` for a gap.
pub(crate) fn parse_number(raw: &str) -> Result<Option<f64>, NotANumber> {
  if is_missing(raw) {
    return Ok(None);
  }
  raw.trim().parse::<f64>().map(Some).map_err(|_| NotANumber)
}
