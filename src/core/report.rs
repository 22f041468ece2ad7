//! Structured evaluation output handed to the presentation layer.
//!
//! A [`ContractReport`] groups typed metric values into the decision,
//! financial, risk and advanced sections of the dashboard. Values carry their
//! unit ([`MetricValue`]) but no formatting; display strings are produced by
//! the consumer.

use serde::{Deserialize, Serialize};

use super::{ContractKind, CoordinationStatus};
use crate::curves::Chart;

/// Identifier for every metric a contract evaluator can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    OrderQuantity,
    OptimalOrderQuantity,
    ServiceLevel,
    ExpectedLeftover,
    ExpectedSales,
    ExpectedDemand,
    ExpectedUnmetDemand,
    StockoutProbability,
    TargetServiceFractile,
    Profit,
    ExpectedProfit,
    ProcurementCost,
    SalvageContribution,
    HoldingCostImpact,
    ShortagePenaltyImpact,
    CoordinationIndicator,
    RetailerProfit,
    ManufacturerProfit,
    SupplierProfit,
    TotalProfit,
    RevenueShareRatio,
    ShouldExercise,
    QuantityExercised,
    BreakEvenSpotPrice,
    TotalCost,
    SpotOnlyCost,
    CostAdvantage,
    DemandAboveOptionProbability,
    ExpectedUnhedgedVolume,
    ExerciseTriggerPrice,
    TotalPremiumPaid,
    SpotRelativeToTrigger,
    FinalOrderQuantity,
    ExpectedFinalOrder,
    LowerFlexBound,
    UpperFlexBound,
    UnmetDemand,
    Overstock,
    DemandAboveUpperProbability,
    DemandBelowLowerProbability,
    SalvageOffset,
}

impl MetricKey {
    /// Stable snake_case identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OrderQuantity => "order_quantity",
            Self::OptimalOrderQuantity => "optimal_order_quantity",
            Self::ServiceLevel => "service_level",
            Self::ExpectedLeftover => "expected_leftover",
            Self::ExpectedSales => "expected_sales",
            Self::ExpectedDemand => "expected_demand",
            Self::ExpectedUnmetDemand => "expected_unmet_demand",
            Self::StockoutProbability => "stockout_probability",
            Self::TargetServiceFractile => "target_service_fractile",
            Self::Profit => "profit",
            Self::ExpectedProfit => "expected_profit",
            Self::ProcurementCost => "procurement_cost",
            Self::SalvageContribution => "salvage_contribution",
            Self::HoldingCostImpact => "holding_cost_impact",
            Self::ShortagePenaltyImpact => "shortage_penalty_impact",
            Self::CoordinationIndicator => "coordination_indicator",
            Self::RetailerProfit => "retailer_profit",
            Self::ManufacturerProfit => "manufacturer_profit",
            Self::SupplierProfit => "supplier_profit",
            Self::TotalProfit => "total_profit",
            Self::RevenueShareRatio => "revenue_share_ratio",
            Self::ShouldExercise => "should_exercise",
            Self::QuantityExercised => "quantity_exercised",
            Self::BreakEvenSpotPrice => "break_even_spot_price",
            Self::TotalCost => "total_cost",
            Self::SpotOnlyCost => "spot_only_cost",
            Self::CostAdvantage => "cost_advantage",
            Self::DemandAboveOptionProbability => "demand_above_option_probability",
            Self::ExpectedUnhedgedVolume => "expected_unhedged_volume",
            Self::ExerciseTriggerPrice => "exercise_trigger_price",
            Self::TotalPremiumPaid => "total_premium_paid",
            Self::SpotRelativeToTrigger => "spot_relative_to_trigger",
            Self::FinalOrderQuantity => "final_order_quantity",
            Self::ExpectedFinalOrder => "expected_final_order",
            Self::LowerFlexBound => "lower_flex_bound",
            Self::UpperFlexBound => "upper_flex_bound",
            Self::UnmetDemand => "unmet_demand",
            Self::Overstock => "overstock",
            Self::DemandAboveUpperProbability => "demand_above_upper_probability",
            Self::DemandBelowLowerProbability => "demand_below_lower_probability",
            Self::SalvageOffset => "salvage_offset",
        }
    }

    /// Human-readable label used by the dashboard.
    pub fn label(self) -> &'static str {
        match self {
            Self::OrderQuantity => "Order Quantity",
            Self::OptimalOrderQuantity => "Optimal Order Quantity",
            Self::ServiceLevel => "Service Level",
            Self::ExpectedLeftover => "Expected Leftover",
            Self::ExpectedSales => "Expected Sales",
            Self::ExpectedDemand => "Expected Demand",
            Self::ExpectedUnmetDemand => "Expected Unmet Demand",
            Self::StockoutProbability => "Stockout Probability",
            Self::TargetServiceFractile => "Target Service Fractile",
            Self::Profit => "Profit",
            Self::ExpectedProfit => "Expected Profit",
            Self::ProcurementCost => "Procurement Cost",
            Self::SalvageContribution => "Salvage Contribution",
            Self::HoldingCostImpact => "Holding Cost Impact",
            Self::ShortagePenaltyImpact => "Shortage & Penalty Impact",
            Self::CoordinationIndicator => "Coordination Indicator",
            Self::RetailerProfit => "Retailer Profit",
            Self::ManufacturerProfit => "Manufacturer Profit",
            Self::SupplierProfit => "Supplier Profit",
            Self::TotalProfit => "Total Profit",
            Self::RevenueShareRatio => "Revenue Share Ratio",
            Self::ShouldExercise => "Should Exercise?",
            Self::QuantityExercised => "Quantity Exercised",
            Self::BreakEvenSpotPrice => "Break-even Spot Price",
            Self::TotalCost => "Total Cost",
            Self::SpotOnlyCost => "Pure Spot Strategy Cost",
            Self::CostAdvantage => "Cost Advantage vs Spot",
            Self::DemandAboveOptionProbability => "Prob(Demand > Option Qty)",
            Self::ExpectedUnhedgedVolume => "Expected Unhedged Volume",
            Self::ExerciseTriggerPrice => "Exercise Trigger Price",
            Self::TotalPremiumPaid => "Total Premium Paid",
            Self::SpotRelativeToTrigger => "Current Spot Relative to Trigger",
            Self::FinalOrderQuantity => "Final Order Quantity",
            Self::ExpectedFinalOrder => "Expected Final Order",
            Self::LowerFlexBound => "Lower Flex Bound",
            Self::UpperFlexBound => "Upper Flex Bound",
            Self::UnmetDemand => "Unmet Demand",
            Self::Overstock => "Overstock",
            Self::DemandAboveUpperProbability => "Prob(Demand > Upper Band)",
            Self::DemandBelowLowerProbability => "Prob(Demand < Lower Band)",
            Self::SalvageOffset => "Salvage Offset",
        }
    }
}

/// Unit-tagged metric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MetricValue {
    Quantity(f64),
    Currency(f64),
    /// Fraction in `[0, 1]`.
    Percent(f64),
    Flag(bool),
    Label(String),
    /// Formula precondition failed; the figure is not well-defined.
    Undefined,
}

impl MetricValue {
    /// Numeric payload, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Quantity(v) | Self::Currency(v) | Self::Percent(v) => Some(*v),
            Self::Flag(_) | Self::Label(_) | Self::Undefined => None,
        }
    }

    /// `Undefined` for `None` and for non-finite quantities.
    pub fn quantity_or_undefined(value: Option<f64>) -> Self {
        value
            .filter(|v| v.is_finite())
            .map_or(Self::Undefined, Self::Quantity)
    }

    pub fn percent_or_undefined(value: Option<f64>) -> Self {
        value.map_or(Self::Undefined, Self::Percent)
    }
}

impl From<CoordinationStatus> for MetricValue {
    fn from(status: CoordinationStatus) -> Self {
        Self::Label(status.label().to_string())
    }
}

/// Ordered `(key, value)` entries of one report section.
pub type MetricSection = Vec<(MetricKey, MetricValue)>;

/// Per-contract output bundle. Transient; produced fresh per evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractReport {
    pub contract: ContractKind,
    /// Whether the demand model is random; risk metrics are empty otherwise.
    pub random_demand: bool,
    pub decision: MetricSection,
    pub financial: MetricSection,
    pub risk: MetricSection,
    pub advanced: MetricSection,
    /// Advisory notes such as undefined optima or ignored cost components.
    pub notes: Vec<String>,
    pub charts: Vec<Chart>,
}

impl ContractReport {
    pub fn new(contract: ContractKind, random_demand: bool) -> Self {
        Self {
            contract,
            random_demand,
            decision: Vec::new(),
            financial: Vec::new(),
            risk: Vec::new(),
            advanced: Vec::new(),
            notes: Vec::new(),
            charts: Vec::new(),
        }
    }

    /// Looks a metric up across all sections.
    pub fn get(&self, key: MetricKey) -> Option<&MetricValue> {
        self.sections()
            .flat_map(|section| section.iter())
            .find_map(|(k, v)| (*k == key).then_some(v))
    }

    /// Numeric value of a metric across all sections.
    pub fn value(&self, key: MetricKey) -> Option<f64> {
        self.get(key).and_then(MetricValue::as_f64)
    }

    pub fn contains_key(&self, key: MetricKey) -> bool {
        self.get(key).is_some()
    }

    fn sections(&self) -> impl Iterator<Item = &MetricSection> {
        [&self.decision, &self.financial, &self.risk, &self.advanced].into_iter()
    }
}
