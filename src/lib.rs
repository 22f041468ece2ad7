//! contractlab evaluates profitability and risk of supply-chain coordination
//! contracts under stochastic demand.
//!
//! Five single-period contracts are covered: wholesale price, buyback, revenue
//! sharing, capacity options and quantity flexibility. Each is evaluated
//! against a [`demand::DemandModel`] over one of four distribution families
//! (deterministic, zero-truncated normal, uniform, discrete).
//!
//! Layout:
//! - [`math`]: normal distribution helpers, adaptive Gauss-Kronrod quadrature, bounded memo cache.
//! - [`demand`]: the demand model, its expectation engine and input parsing.
//! - [`core`]: inventory primitives, cost rates, errors, reports and scenario files.
//! - [`contracts`]: the five contract evaluators.
//! - [`curves`]: chart series sampled from the evaluators.
//!
//! Numerical considerations:
//! - Normal expectations integrate over `[0, inf)` with the negative tail collapsed onto zero demand.
//! - Quadrature is capped at a fixed subdivision count; non-convergence is an error, never a partial value.
//! - Expected sales and expected demand under normal demand are memoized per process.
//!
//! # Quick Start
//! Evaluate a wholesale contract under normal demand:
//! ```rust
//! use contractlab::contracts::WholesaleContract;
//! use contractlab::core::{Contract, CostStructure, MetricKey};
//! use contractlab::demand::DemandModel;
//!
//! let demand = DemandModel::normal(100.0, 20.0).unwrap();
//! let contract = WholesaleContract::new(150.0, 90.0, 100.0);
//! let report = contract.evaluate(&demand, &CostStructure::none()).unwrap();
//!
//! let profit = report.value(MetricKey::ExpectedProfit).unwrap();
//! // 150 * E[min(100, D)] - 90 * 100 with E[min(100, D)] = 100 - 20 * phi(0)
//! assert!((profit - 4803.17).abs() < 0.1);
//! ```
//!
//! Newsvendor optimum from the critical fractile:
//! ```rust
//! use contractlab::contracts::WholesaleContract;
//! use contractlab::core::CostStructure;
//! use contractlab::demand::DemandModel;
//!
//! let demand = DemandModel::uniform(60.0, 140.0).unwrap();
//! let q = WholesaleContract::default()
//!     .optimal_order_qty(&demand, &CostStructure::none())
//!     .unwrap();
//! assert!((q - 92.0).abs() < 1e-9);
//! ```

pub mod contracts;
pub mod core;
pub mod curves;
pub mod demand;
pub mod math;

/// Common imports for ergonomic usage.
pub mod prelude {
    pub use crate::contracts::*;
    pub use crate::core::*;
    pub use crate::curves::{Chart, Series};
    pub use crate::demand::{DemandModel, DemandSpec, DistributionKind};
}
