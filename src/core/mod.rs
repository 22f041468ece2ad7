//! Core traits, common domain types, and library-wide result/error structures.

use crate::curves::Chart;
use crate::demand::DemandModel;
use crate::math::MathError;

pub mod inventory;
pub mod report;
pub mod serialization;
pub mod types;

pub use inventory::*;
pub use report::*;
pub use serialization::*;
pub use types::*;

/// Common interface implemented by every coordination contract.
///
/// Implementations evaluate a single stocking/procurement decision against a
/// [`DemandModel`]: the deterministic formulas are used when the model is a
/// point demand, the expected-value formulas otherwise.
pub trait Contract: std::fmt::Debug {
    /// Contract family.
    fn kind(&self) -> ContractKind;

    /// Checks contract parameters together with the inventory cost rates.
    fn validate(&self, costs: &CostStructure) -> Result<(), ContractError>;

    /// Produces the decision/financial/risk summary, including chart series.
    fn evaluate(
        &self,
        demand: &DemandModel,
        costs: &CostStructure,
    ) -> Result<ContractReport, ContractError>;

    /// Samples the contract's evaluation functions for display.
    fn curves(
        &self,
        demand: &DemandModel,
        costs: &CostStructure,
    ) -> Result<Vec<Chart>, ContractError>;
}

/// Evaluation and configuration errors surfaced by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// Malformed or inconsistent input parameters.
    InvalidInput(String),
    /// Distribution tag outside the supported families.
    UnsupportedDistribution(String),
    /// Numeric integration did not converge for this evaluation.
    IntegrationFailure(String),
    /// Scenario payload could not be read or written.
    Serialization(String),
}

impl std::fmt::Display for ContractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::UnsupportedDistribution(tag) => {
                write!(f, "unsupported demand distribution: {tag}")
            }
            Self::IntegrationFailure(msg) => write!(f, "integration failure: {msg}"),
            Self::Serialization(msg) => write!(f, "serialization error: {msg}"),
        }
    }
}

impl std::error::Error for ContractError {}

impl From<MathError> for ContractError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::InvalidInput(msg) => Self::InvalidInput(msg.to_string()),
            other => Self::IntegrationFailure(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ContractError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Rejects NaN/inf and negative values for a named parameter.
pub(crate) fn ensure_non_negative(name: &str, value: f64) -> Result<(), ContractError> {
    if !value.is_finite() {
        return Err(ContractError::InvalidInput(format!("{name} must be finite")));
    }
    if value < 0.0 {
        return Err(ContractError::InvalidInput(format!("{name} must be >= 0")));
    }
    Ok(())
}

/// Rejects NaN/inf and non-positive values for a named parameter.
pub(crate) fn ensure_positive(name: &str, value: f64) -> Result<(), ContractError> {
    if !value.is_finite() {
        return Err(ContractError::InvalidInput(format!("{name} must be finite")));
    }
    if value <= 0.0 {
        return Err(ContractError::InvalidInput(format!(
            "{name} must be greater than zero"
        )));
    }
    Ok(())
}
