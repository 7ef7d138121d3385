//! # Statement KPIs
//!
//! $$
//! \text{ROE} = \frac{NI}{A - L},\qquad \text{QoE} = \frac{CFO}{NI}
//! $$
//!
//! Headline ratios taken from the latest reporting period.

use super::data::FinancialStatements;

#[derive(Clone, Debug, PartialEq)]
pub struct Kpi {
  pub name: &'static str,
  pub value: f64,
}

/// Present and non-zero.
fn nonzero(v: Option<f64>) -> Option<f64> {
  v.filter(|&x| x != 0.0)
}

/// Compute KPIs from the latest period. A ratio is skipped when an input
/// is missing or a required operand is zero.
pub fn compute_kpis(statements: &FinancialStatements) -> Vec<Kpi> {
  let revenue = nonzero(statements.latest("revenue"));
  let net_income = nonzero(statements.latest("net_income"));
  let total_assets = nonzero(statements.latest("total_assets"));
  let total_liabilities = statements.latest("total_liabilities");
  let op_cf = nonzero(statements.latest("operating_cash_flow"));

  let mut kpis = Vec::new();
  let mut push = |name: &'static str, value: Option<f64>| {
    if let Some(value) = value {
      kpis.push(Kpi { name, value });
    }
  };

  push(
    "asset_turnover",
    revenue.zip(total_assets).map(|(r, a)| r / a),
  );
  push("net_margin", net_income.zip(revenue).map(|(n, r)| n / r));
  push("roa", net_income.zip(total_assets).map(|(n, a)| n / a));
  push(
    "roe",
    net_income
      .zip(total_assets)
      .zip(total_liabilities)
      .and_then(|((n, a), l)| nonzero(Some(a - l)).map(|equity| n / equity)),
  );
  push(
    "quality_of_earnings",
    op_cf.zip(net_income).map(|(cf, n)| cf / n),
  );

  kpis
}
