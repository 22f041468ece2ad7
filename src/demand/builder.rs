//! Demand model construction from scenario files and raw dashboard inputs.

use serde::{Deserialize, Serialize};

use super::{DemandModel, Distribution, DistributionKind};
use crate::core::ContractError;

/// Serializable demand configuration, tagged by `distribution`.
///
/// # Examples
/// ```
/// use contractlab::demand::DemandSpec;
///
/// let spec: DemandSpec =
///     serde_json::from_str(r#"{"distribution":"uniform","low":60.0,"high":140.0}"#).unwrap();
/// let model = spec.build().unwrap();
/// assert_eq!(model.max_reasonable_demand(), 140.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "distribution", rename_all = "snake_case")]
pub enum DemandSpec {
    Deterministic { demand: f64 },
    Normal { mean: f64, std: f64 },
    Uniform { low: f64, high: f64 },
    Discrete { demands: Vec<f64>, probabilities: Vec<f64> },
}

impl DemandSpec {
    /// Validates the parameters and builds the model.
    pub fn build(&self) -> Result<DemandModel, ContractError> {
        match self {
            Self::Deterministic { demand } => DemandModel::deterministic(*demand),
            Self::Normal { mean, std } => DemandModel::normal(*mean, *std),
            Self::Uniform { low, high } => DemandModel::uniform(*low, *high),
            Self::Discrete {
                demands,
                probabilities,
            } => DemandModel::discrete(demands, probabilities),
        }
    }

    pub fn kind(&self) -> DistributionKind {
        match self {
            Self::Deterministic { .. } => DistributionKind::Deterministic,
            Self::Normal { .. } => DistributionKind::Normal,
            Self::Uniform { .. } => DistributionKind::Uniform,
            Self::Discrete { .. } => DistributionKind::Discrete,
        }
    }
}

impl From<&DemandModel> for DemandSpec {
    /// Discrete models export their condensed support.
    fn from(model: &DemandModel) -> Self {
        match model.distribution() {
            Distribution::Deterministic { demand } => Self::Deterministic { demand: *demand },
            Distribution::Normal { mean, std } => Self::Normal {
                mean: *mean,
                std: *std,
            },
            Distribution::Uniform { low, high } => Self::Uniform {
                low: *low,
                high: *high,
            },
            Distribution::Discrete(support) => Self::Discrete {
                demands: support.demands().to_vec(),
                probabilities: support.probabilities().to_vec(),
            },
        }
    }
}

/// Unvalidated form fields as entered on the dashboard.
///
/// Only the fields of the selected family are read. Discrete values arrive as
/// comma- or newline-separated text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDemandInputs {
    pub demand: Option<f64>,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub low: Option<f64>,
    pub high: Option<f64>,
    pub demands: Option<String>,
    pub probabilities: Option<String>,
}

fn required(name: &str, value: Option<f64>) -> Result<f64, ContractError> {
    value.ok_or_else(|| ContractError::InvalidInput(format!("{name} is required")))
}

/// Builds a validated model from a distribution tag and raw inputs.
///
/// The tag accepts the family names and the dashboard labels
/// (`"Uniform Distribution"`).
///
/// # Errors
/// [`ContractError::UnsupportedDistribution`] for an unknown tag,
/// [`ContractError::InvalidInput`] for missing or invalid parameters. A partially
/// valid model is never returned.
///
/// # Examples
/// ```
/// use contractlab::demand::{RawDemandInputs, demand_model_from_raw};
///
/// let raw = RawDemandInputs {
///     demands: Some("60, 100\n100, 140".to_string()),
///     probabilities: Some("0.2, 0.25, 0.25, 0.3".to_string()),
///     ..RawDemandInputs::default()
/// };
/// let model = demand_model_from_raw("Discrete Distribution", &raw).unwrap();
/// assert_eq!(model.demand_grid(90), vec![60.0, 100.0, 140.0]);
/// ```
pub fn demand_model_from_raw(
    tag: &str,
    raw: &RawDemandInputs,
) -> Result<DemandModel, ContractError> {
    let spec = match tag.parse::<DistributionKind>()? {
        DistributionKind::Deterministic => DemandSpec::Deterministic {
            demand: required("demand", raw.demand)?,
        },
        DistributionKind::Normal => DemandSpec::Normal {
            mean: required("demand mean", raw.mean)?,
            std: required("demand standard deviation", raw.std)?,
        },
        DistributionKind::Uniform => DemandSpec::Uniform {
            low: required("uniform lower bound", raw.low)?,
            high: required("uniform upper bound", raw.high)?,
        },
        DistributionKind::Discrete => DemandSpec::Discrete {
            demands: parse_float_list(raw.demands.as_deref().unwrap_or_default())?,
            probabilities: parse_float_list(raw.probabilities.as_deref().unwrap_or_default())?,
        },
    };
    spec.build()
}

/// Parses a comma- or newline-separated list of numbers, skipping empty items.
///
/// # Errors
/// Returns [`ContractError::InvalidInput`] if any item is not a number.
pub fn parse_float_list(text: &str) -> Result<Vec<f64>, ContractError> {
    text.replace('\n', ",")
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<f64>().map_err(|_| {
                ContractError::InvalidInput("discrete inputs must be numeric lists".to_string())
            })
        })
        .collect()
}
