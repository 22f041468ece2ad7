//! Scenario payloads and JSON helpers.
//!
//! A [`Scenario`] bundles one contract, one demand configuration and the
//! inventory cost rates into a single serde document:
//!
//! ```json
//! {
//!   "contract": { "contract": "wholesale", "retail_price": 150.0, "wholesale_price": 90.0, "order_qty": 100.0 },
//!   "demand": { "distribution": "normal", "mean": 100.0, "std": 20.0 },
//!   "costs": { "salvage": 10.0 }
//! }
//! ```
//!
//! # Examples
//! ```rust
//! use contractlab::core::{Scenario, from_json, to_json_pretty};
//!
//! let scenario: Scenario = from_json(
//!     r#"{"contract":{"contract":"option"},"demand":{"distribution":"deterministic","demand":120.0}}"#,
//! )
//! .expect("json deserialization");
//! let report = scenario.evaluate().expect("evaluation");
//! assert_eq!(report.value(contractlab::core::MetricKey::TotalCost), Some(12_900.0));
//!
//! let json = to_json_pretty(&scenario).expect("json serialization");
//! let decoded: Scenario = from_json(&json).expect("json deserialization");
//! assert_eq!(decoded, scenario);
//! ```

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ContractError, ContractReport, CostStructure};
use crate::contracts::ContractSpec;
use crate::demand::DemandSpec;

/// One evaluation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub contract: ContractSpec,
    pub demand: DemandSpec,
    /// Absent rates default to 0.
    #[serde(default)]
    pub costs: CostStructure,
}

impl Scenario {
    /// Builds the demand model and evaluates the contract against it.
    pub fn evaluate(&self) -> Result<ContractReport, ContractError> {
        let model = self.demand.build()?;
        self.contract.evaluate(&model, &self.costs)
    }
}

/// Reads a scenario document from disk.
///
/// # Errors
/// Returns [`ContractError::Serialization`] when the file cannot be read or parsed.
pub fn load_scenario(path: impl AsRef<Path>) -> Result<Scenario, ContractError> {
    let path = path.as_ref();
    let payload = std::fs::read_to_string(path)
        .map_err(|err| ContractError::Serialization(format!("{}: {err}", path.display())))?;
    let scenario: Scenario = from_json(&payload)?;
    info!(
        path = %path.display(),
        contract = %scenario.contract.kind(),
        distribution = scenario.demand.kind().as_str(),
        "scenario loaded"
    );
    Ok(scenario)
}

/// Serialize a value to pretty JSON.
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Deserialize a value from JSON.
pub fn from_json<T: DeserializeOwned>(payload: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(payload)
}
