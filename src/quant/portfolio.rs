//! # Portfolio
//!
//! $$
//! \sigma_p^2 = \mathbf{w}^\top \Sigma \mathbf{w}
//! $$
//!
//! Single-period mean-variance allocation from historical price tables.

pub mod data;
pub mod engine;
pub mod optimizers;
pub mod types;

pub use data::PriceSeries;
pub use data::ReturnStatistics;
pub use engine::PortfolioEngine;
pub use optimizers::optimize_regularized_mean_variance;
pub use optimizers::portfolio_metrics;
pub use optimizers::project_capped_simplex;
pub use optimizers::regularized_weights;
pub use types::AllocationRequest;
pub use types::AllocationResult;
pub use types::PortfolioResult;
pub use types::RiskProfile;
