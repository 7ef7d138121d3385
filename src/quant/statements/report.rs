//! # MD&A Draft
//!
//! $$
//! \text{draft} = \text{table}(\text{statements} \oplus \Delta) \ \Vert\ \text{sections}(\text{KPIs})
//! $$
//!
//! Deterministic markdown drafting from statement tables.

use std::fmt::Write;
use std::path::Path;

use tracing::info;

use super::data::ColumnData;
use super::data::FinancialStatements;
use super::kpis::Kpi;
use super::kpis::compute_kpis;
use crate::config::AnalyticsConfig;
use crate::error::Result;

/// Templated MD&A generator.
#[derive(Clone, Debug, Default)]
pub struct MdaGenerator {
  config: AnalyticsConfig,
}

impl MdaGenerator {
  pub fn new(config: AnalyticsConfig) -> Result<Self> {
    config.validate()?;
    Ok(Self { config })
  }

  /// Load a statements CSV and render the draft.
  pub fn generate(&self, csv_path: impl AsRef<Path>) -> Result<String> {
    let statements = FinancialStatements::from_csv_path(csv_path)?;
    Ok(self.render(&statements))
  }

  pub fn render(&self, statements: &FinancialStatements) -> String {
    let with_deltas = statements.with_period_deltas();
    let kpis = compute_kpis(&with_deltas);
    info!(
      periods = statements.n_rows(),
      kpis = kpis.len(),
      "rendering MD&A draft"
    );

    let table = markdown_table(&with_deltas, self.config.max_table_rows);
    format!(
      "## Financials (context)\n\n{table}\n\n{}",
      draft_sections(&kpis)
    )
  }
}

fn format_kpis(kpis: &[Kpi]) -> String {
  if kpis.is_empty() {
    return "- No KPIs computed (missing columns?)".to_string();
  }
  kpis
    .iter()
    .map(|k| format!("- {}: {:.4}", k.name, k.value))
    .collect::<Vec<_>>()
    .join("\n")
}

fn draft_sections(kpis: &[Kpi]) -> String {
  format!(
    "### Trends & Performance\n\
     - Revenue trend inferred from latest periods; review above table.\n\
     - Margins reflected in KPIs below.\n\n\
     ### Revenue Drivers\n\
     - Mix and pricing effects inferred from revenue trajectory.\n\n\
     ### Liquidity & Cash Flows\n\
     - Operating cash flow vs net income informs quality of earnings.\n\n\
     ### Risks & Uncertainties\n\
     - Monitor macro sensitivity, concentration, and leverage.\n\n\
     ### KPIs\n\
     {}\n",
    format_kpis(kpis)
  )
}

/// Up to six significant decimals, trailing zeros trimmed.
fn format_number(v: f64) -> String {
  if !v.is_finite() {
    return v.to_string();
  }
  if v.fract() == 0.0 && v.abs() < 1e15 {
    return format!("{v:.0}");
  }
  let s = format!("{v:.6}");
  s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Pipe table: text left-aligned, numbers right-aligned.
fn markdown_table(statements: &FinancialStatements, max_rows: usize) -> String {
  let n_rows = statements.n_rows().min(max_rows);
  let columns = statements.columns();

  let cells: Vec<(bool, Vec<String>)> = columns
    .iter()
    .map(|c| match &c.data {
      ColumnData::Period(v) => (false, v[..n_rows].iter().map(|d| d.to_string()).collect()),
      ColumnData::Numeric(v) => (
        true,
        v[..n_rows]
          .iter()
          .map(|x| x.map(format_number).unwrap_or_default())
          .collect(),
      ),
      ColumnData::Text(v) => (false, v[..n_rows].to_vec()),
    })
    .collect();

  let widths: Vec<usize> = columns
    .iter()
    .zip(cells.iter())
    .map(|(c, (_, values))| {
      values
        .iter()
        .map(|s| s.len())
        .chain(std::iter::once(c.name.len()))
        .max()
        .unwrap_or(0)
    })
    .collect();

  let mut out = String::new();
  let pad = |s: &str, width: usize, right: bool| {
    if right {
      format!("{s:>width$}")
    } else {
      format!("{s:<width$}")
    }
  };

  let header: Vec<String> = columns
    .iter()
    .zip(cells.iter())
    .zip(widths.iter())
    .map(|((c, (numeric, _)), &w)| pad(&c.name, w, *numeric))
    .collect();
  let _ = writeln!(out, "| {} |", header.join(" | "));

  let rule: Vec<String> = cells
    .iter()
    .zip(widths.iter())
    .map(|((numeric, _), &w)| {
      if *numeric {
        format!("{}:", "-".repeat(w + 1))
      } else {
        format!(":{}", "-".repeat(w + 1))
      }
    })
    .collect();
  let _ = writeln!(out, "|{}|", rule.join("|"));

  for row in 0..n_rows {
    let line: Vec<String> = cells
      .iter()
      .zip(widths.iter())
      .map(|((numeric, values), &w)| pad(&values[row], w, *numeric))
      .collect();
    let _ = writeln!(out, "| {} |", line.join(" | "));
  }

  out.trim_end().to_string()
}
