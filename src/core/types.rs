use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ContractError, ensure_non_negative};

/// Per-unit inventory cost rates applied after demand is realised.
///
/// `salvage` credits leftover units, `holding` charges them; `shortage` and
/// `penalty` both charge unmet units and may be combined. Absent rates are 0,
/// which leaves every contract identical to its base newsvendor form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CostStructure {
    pub salvage: f64,
    pub holding: f64,
    pub shortage: f64,
    pub penalty: f64,
}

impl CostStructure {
    /// All rates zero.
    pub fn none() -> Self {
        Self::default()
    }

    /// Builds rates from a key/value mapping. Recognised keys are `salvage`,
    /// `holding`, `shortage` and `penalty`.
    ///
    /// # Errors
    /// Returns [`ContractError::InvalidInput`] for unknown keys or invalid rates.
    pub fn from_map(rates: &BTreeMap<String, f64>) -> Result<Self, ContractError> {
        let mut costs = Self::default();
        for (key, &rate) in rates {
            match key.as_str() {
                "salvage" => costs.salvage = rate,
                "holding" => costs.holding = rate,
                "shortage" => costs.shortage = rate,
                "penalty" => costs.penalty = rate,
                other => {
                    return Err(ContractError::InvalidInput(format!(
                        "unrecognised cost component `{other}`"
                    )));
                }
            }
        }
        costs.validate()?;
        Ok(costs)
    }

    pub fn with_salvage(mut self, rate: f64) -> Self {
        self.salvage = rate;
        self
    }

    pub fn with_holding(mut self, rate: f64) -> Self {
        self.holding = rate;
        self
    }

    pub fn with_shortage(mut self, rate: f64) -> Self {
        self.shortage = rate;
        self
    }

    pub fn with_penalty(mut self, rate: f64) -> Self {
        self.penalty = rate;
        self
    }

    /// Combined charge per unit of unmet demand.
    #[inline]
    pub fn unmet_rate(&self) -> f64 {
        self.shortage + self.penalty
    }

    pub fn validate(&self) -> Result<(), ContractError> {
        ensure_non_negative("salvage value", self.salvage)?;
        ensure_non_negative("holding cost", self.holding)?;
        ensure_non_negative("shortage cost", self.shortage)?;
        ensure_non_negative("penalty cost", self.penalty)?;
        Ok(())
    }
}

/// The five supported coordination contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    Wholesale,
    Buyback,
    RevenueSharing,
    Option,
    QuantityFlexibility,
}

impl ContractKind {
    pub const ALL: [ContractKind; 5] = [
        Self::Wholesale,
        Self::Buyback,
        Self::RevenueSharing,
        Self::Option,
        Self::QuantityFlexibility,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Wholesale => "Wholesale Price Contract",
            Self::Buyback => "Buyback Contract",
            Self::RevenueSharing => "Revenue Sharing Contract",
            Self::Option => "Option Contract",
            Self::QuantityFlexibility => "Quantity Flexibility Contract",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Wholesale => {
                "Evaluate stocking and profitability under standard wholesale procurement with \
                 optional inventory and shortage cost components."
            }
            Self::Buyback => {
                "Analyze retailer and manufacturer incentives when unsold inventory can be \
                 returned at a buyback price."
            }
            Self::RevenueSharing => {
                "Assess profit allocation between channel partners when downstream sales revenue \
                 is shared."
            }
            Self::Option => {
                "Compare hedging with capacity options versus pure spot-market purchasing under \
                 uncertain demand."
            }
            Self::QuantityFlexibility => {
                "Optimize final order adjustments around an initial commitment within a \
                 predefined flexibility band."
            }
        }
    }
}

impl std::fmt::Display for ContractKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Buyback coordination verdict from the critical-fractile gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinationStatus {
    /// Gap between retailer and system fractiles is at most 0.03.
    Coordinated,
    /// Gap is at most 0.10.
    PartiallyCoordinated,
    NotCoordinated,
    /// A fractile denominator is not positive.
    Indeterminate,
}

impl CoordinationStatus {
    pub const COORDINATED_GAP: f64 = 0.03;
    pub const PARTIAL_GAP: f64 = 0.10;

    /// Classifies the absolute gap between two critical fractiles.
    pub fn from_gap(gap: f64) -> Self {
        if gap <= Self::COORDINATED_GAP {
            Self::Coordinated
        } else if gap <= Self::PARTIAL_GAP {
            Self::PartiallyCoordinated
        } else {
            Self::NotCoordinated
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Coordinated => "Coordinated",
            Self::PartiallyCoordinated => "Partially Coordinated",
            Self::NotCoordinated => "Not Coordinated",
            Self::Indeterminate => "Indeterminate",
        }
    }
}
