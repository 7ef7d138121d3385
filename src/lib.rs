//! # fin-analytics
//!
//! $$
//! \mathbf{w} = \Pi_{\Delta,\,w_{\max}}\big((\Sigma+\lambda I)^{+}\mu\big)
//! $$
//!
//! Analytics over tabular financial data:
//!
//! - [`quant::portfolio`]: single-period mean-variance allocation from price history.
//! - [`quant::statements`]: period deltas, KPIs and a templated MD&A draft.
//!
//! Every entry point is a synchronous, stateless function of its inputs and
//! the explicit [`config::AnalyticsConfig`].

pub mod config;
pub mod error;
pub mod quant;

pub use config::AnalyticsConfig;
pub use error::AnalyticsError;
pub use error::Result;
