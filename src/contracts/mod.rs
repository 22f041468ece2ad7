//! Supply-chain coordination contracts.
//!
//! Every contract exposes a deterministic evaluator (one realised demand) and an
//! expected evaluator (a [`DemandModel`]) with the same structure: where the
//! deterministic form calls [`inventory_stats`](crate::core::inventory_stats),
//! the expected form calls [`DemandModel::metrics`] or
//! [`DemandModel::expected_of`].
//!
//! | Contract | Parties | Decision |
//! |---|---|---|
//! | [`WholesaleContract`] | retailer | order quantity, critical fractile `(p - w) / (p - s)` |
//! | [`BuybackContract`] | retailer, manufacturer | coordination of `(p - w) / (p - b)` vs `(p - c) / (p - s)` |
//! | [`RevenueSharingContract`] | retailer, supplier | revenue share `alpha` |
//! | [`OptionContract`] | buyer | exercise iff `spot > strike` |
//! | [`QuantityFlexibilityContract`] | buyer | final order clamped to the flexibility band |

use serde::{Deserialize, Serialize};

use crate::core::{Contract, ContractError, ContractKind, ContractReport, CostStructure};
use crate::core::{InventoryAdjustment, MetricKey, MetricSection, MetricValue};
use crate::demand::DemandModel;
use crate::math::{EPS, clamp};

pub mod buyback;
pub mod option;
pub mod quantity_flexibility;
pub mod revenue_sharing;
pub mod wholesale;

pub use buyback::{BuybackContract, BuybackProfit};
pub use option::{OptionContract, OptionCost};
pub use quantity_flexibility::{FlexOutcome, QuantityFlexibilityContract};
pub use revenue_sharing::{RevenueSharingContract, RevenueSharingProfit};
pub use wholesale::WholesaleContract;

/// Serializable contract selection, tagged by `contract`.
///
/// Omitted parameters take the dashboard defaults.
///
/// # Examples
/// ```
/// use contractlab::contracts::ContractSpec;
/// use contractlab::core::ContractKind;
///
/// let spec: ContractSpec =
///     serde_json::from_str(r#"{"contract":"revenue_sharing","alpha":0.4}"#).unwrap();
/// assert_eq!(spec.kind(), ContractKind::RevenueSharing);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "contract", rename_all = "snake_case")]
pub enum ContractSpec {
    Wholesale(WholesaleContract),
    Buyback(BuybackContract),
    RevenueSharing(RevenueSharingContract),
    Option(OptionContract),
    QuantityFlexibility(QuantityFlexibilityContract),
}

impl ContractSpec {
    pub fn as_contract(&self) -> &dyn Contract {
        match self {
            Self::Wholesale(c) => c,
            Self::Buyback(c) => c,
            Self::RevenueSharing(c) => c,
            Self::Option(c) => c,
            Self::QuantityFlexibility(c) => c,
        }
    }

    pub fn kind(&self) -> ContractKind {
        self.as_contract().kind()
    }

    /// Default-parameter contract of the given family.
    pub fn default_for(kind: ContractKind) -> Self {
        match kind {
            ContractKind::Wholesale => Self::Wholesale(WholesaleContract::default()),
            ContractKind::Buyback => Self::Buyback(BuybackContract::default()),
            ContractKind::RevenueSharing => Self::RevenueSharing(RevenueSharingContract::default()),
            ContractKind::Option => Self::Option(OptionContract::default()),
            ContractKind::QuantityFlexibility => {
                Self::QuantityFlexibility(QuantityFlexibilityContract::default())
            }
        }
    }

    /// Validates and evaluates against `demand`.
    pub fn evaluate(
        &self,
        demand: &DemandModel,
        costs: &CostStructure,
    ) -> Result<ContractReport, ContractError> {
        self.as_contract().evaluate(demand, costs)
    }
}

/// `clamp(numerator / denominator, 0, 1)`, undefined when `denominator <= EPS`.
pub(crate) fn critical_fractile(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator > EPS).then(|| clamp(numerator / denominator, 0.0, 1.0))
}

/// Salvage, holding and shortage/penalty effects with charges shown as negatives.
pub(crate) fn cost_impacts(adjust: &InventoryAdjustment) -> MetricSection {
    vec![
        (
            MetricKey::SalvageContribution,
            MetricValue::Currency(adjust.salvage),
        ),
        (
            MetricKey::HoldingCostImpact,
            MetricValue::Currency(-adjust.holding),
        ),
        (
            MetricKey::ShortagePenaltyImpact,
            MetricValue::Currency(-(adjust.shortage + adjust.penalty)),
        ),
    ]
}
