//! # Statements
//!
//! $$
//! \Delta^{(k)}_t x = \frac{x_t}{x_{t-k}} - 1,\qquad k\in\{1,4\}
//! $$
//!
//! Financial-statement loading, period-over-period deltas, headline KPIs
//! and the templated MD&A draft built from them.

pub mod data;
pub mod kpis;
pub mod report;

pub use data::Column;
pub use data::ColumnData;
pub use data::FinancialStatements;
pub use kpis::Kpi;
pub use kpis::compute_kpis;
pub use report::MdaGenerator;
