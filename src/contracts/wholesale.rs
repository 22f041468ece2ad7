//! Wholesale price contract: the retailer buys `Q` units at `w` and sells at `p`.
//!
//! Profit is `p * sales - w * Q` plus the net inventory adjustment. Under random
//! demand the newsvendor optimum is `Q* = F^-1((p - w) / (p - s))` with salvage
//! value `s`; the fractile is clamped to `[0, 1]` and undefined when `p <= s`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{cost_impacts, critical_fractile};
use crate::core::{
    Contract, ContractError, ContractKind, ContractReport, CostStructure, MetricKey, MetricValue,
    ensure_non_negative, ensure_positive, inventory_adjustment, inventory_stats,
};
use crate::curves::{Chart, DEMAND_GRID_POINTS, Series, order_quantity_axis};
use crate::demand::DemandModel;

/// Wholesale price contract terms.
///
/// # Examples
/// ```
/// use contractlab::contracts::WholesaleContract;
/// use contractlab::core::CostStructure;
///
/// let contract = WholesaleContract::default();
/// let profit = contract.deterministic_profit(100.0, 100.0, &CostStructure::none());
/// assert_eq!(profit, 6000.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WholesaleContract {
    /// Retail price `p`.
    pub retail_price: f64,
    /// Wholesale price `w`.
    pub wholesale_price: f64,
    /// Chosen order quantity `Q`.
    pub order_qty: f64,
}

impl Default for WholesaleContract {
    fn default() -> Self {
        Self {
            retail_price: 150.0,
            wholesale_price: 90.0,
            order_qty: 100.0,
        }
    }
}

impl WholesaleContract {
    pub fn new(retail_price: f64, wholesale_price: f64, order_qty: f64) -> Self {
        Self {
            retail_price,
            wholesale_price,
            order_qty,
        }
    }

    /// Profit for one realised demand.
    pub fn deterministic_profit(&self, order_qty: f64, demand: f64, costs: &CostStructure) -> f64 {
        let s = inventory_stats(order_qty, demand);
        let adjust = inventory_adjustment(s.leftover, s.unmet, costs);
        self.retail_price * s.sales - self.wholesale_price * order_qty + adjust.net
    }

    /// Expected profit under `demand`.
    pub fn expected_profit(
        &self,
        order_qty: f64,
        demand: &DemandModel,
        costs: &CostStructure,
    ) -> Result<f64, ContractError> {
        let m = demand.metrics(order_qty)?;
        let adjust = inventory_adjustment(m.expected_leftover, m.expected_unmet, costs);
        Ok(self.retail_price * m.expected_sales - self.wholesale_price * order_qty + adjust.net)
    }

    /// `(p - w) / (p - salvage)` clamped to `[0, 1]`; `None` when `p <= salvage`.
    pub fn critical_fractile(&self, costs: &CostStructure) -> Option<f64> {
        critical_fractile(
            self.retail_price - self.wholesale_price,
            self.retail_price - costs.salvage,
        )
    }

    /// Newsvendor order quantity at the critical fractile.
    ///
    /// `None` when the fractile is undefined, or when it is 1 and the demand
    /// support is unbounded (normal demand with `w` equal to salvage).
    pub fn optimal_order_qty(&self, demand: &DemandModel, costs: &CostStructure) -> Option<f64> {
        self.critical_fractile(costs)
            .map(|cf| demand.ppf(cf))
            .filter(|q| q.is_finite())
    }

    fn profit_at(
        &self,
        order_qty: f64,
        demand: &DemandModel,
        costs: &CostStructure,
    ) -> Result<f64, ContractError> {
        match demand.point_demand() {
            Some(d) => Ok(self.deterministic_profit(order_qty, d, costs)),
            None => self.expected_profit(order_qty, demand, costs),
        }
    }
}

impl Contract for WholesaleContract {
    fn kind(&self) -> ContractKind {
        ContractKind::Wholesale
    }

    fn validate(&self, costs: &CostStructure) -> Result<(), ContractError> {
        ensure_positive("retail price", self.retail_price)?;
        ensure_non_negative("wholesale price", self.wholesale_price)?;
        ensure_non_negative("order quantity", self.order_qty)?;
        costs.validate()?;
        if costs.salvage > self.retail_price {
            return Err(ContractError::InvalidInput(
                "salvage value cannot exceed retail price".to_string(),
            ));
        }
        Ok(())
    }

    fn evaluate(
        &self,
        demand: &DemandModel,
        costs: &CostStructure,
    ) -> Result<ContractReport, ContractError> {
        self.validate(costs)?;
        let q = self.order_qty;
        let m = demand.metrics(q)?;
        let adjust = inventory_adjustment(m.expected_leftover, m.expected_unmet, costs);
        let profit = self.retail_price * m.expected_sales - self.wholesale_price * q + adjust.net;
        debug!(order_qty = q, profit, "wholesale contract evaluated");

        let random = demand.is_random();
        let mut report = ContractReport::new(self.kind(), random);
        report.decision = vec![
            (MetricKey::OrderQuantity, MetricValue::Quantity(q)),
            (MetricKey::ServiceLevel, MetricValue::Percent(m.service_level)),
            (
                MetricKey::ExpectedLeftover,
                MetricValue::Quantity(m.expected_leftover),
            ),
        ];
        let profit_key = if random {
            MetricKey::ExpectedProfit
        } else {
            MetricKey::Profit
        };
        report.financial = vec![
            (profit_key, MetricValue::Currency(profit)),
            (MetricKey::ExpectedSales, MetricValue::Quantity(m.expected_sales)),
            (
                MetricKey::ProcurementCost,
                MetricValue::Currency(self.wholesale_price * q),
            ),
        ];

        if random {
            let fractile = self.critical_fractile(costs);
            let optimum = self.optimal_order_qty(demand, costs);
            if fractile.is_none() {
                report.notes.push(
                    "optimal quantity is not well-defined with the current salvage and price settings"
                        .to_string(),
                );
            } else if optimum.is_none() {
                report.notes.push(
                    "optimal quantity is unbounded: overstock costs nothing at this wholesale price"
                        .to_string(),
                );
            }
            report.decision.push((
                MetricKey::OptimalOrderQuantity,
                MetricValue::quantity_or_undefined(optimum),
            ));
            report.risk = vec![
                (MetricKey::ExpectedDemand, MetricValue::Quantity(m.expected_demand)),
                (
                    MetricKey::StockoutProbability,
                    MetricValue::Percent(m.stockout_probability),
                ),
                (
                    MetricKey::TargetServiceFractile,
                    MetricValue::percent_or_undefined(fractile),
                ),
            ];
        }

        report.advanced = vec![(
            MetricKey::ExpectedUnmetDemand,
            MetricValue::Quantity(m.expected_unmet),
        )];
        report.advanced.extend(cost_impacts(&adjust));
        report.charts = self.curves(demand, costs)?;
        Ok(report)
    }

    fn curves(
        &self,
        demand: &DemandModel,
        costs: &CostStructure,
    ) -> Result<Vec<Chart>, ContractError> {
        let quantities = order_quantity_axis(self.order_qty, demand);
        let by_quantity = Series::try_sample("Profit", &quantities, |q| {
            self.profit_at(q, demand, costs)
        })?;

        let demands = demand.demand_grid(DEMAND_GRID_POINTS);
        let by_demand = Series::sample("Profit", &demands, |d| {
            self.deterministic_profit(self.order_qty, d, costs)
        });

        Ok(vec![
            Chart::new("Profit vs Order Quantity", "Order Quantity", "Profit")
                .with_series(by_quantity),
            Chart::new("Profit vs Demand", "Demand", "Profit").with_series(by_demand),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{from_json, to_json_pretty};
    use approx::assert_relative_eq;

    #[test]
    fn deterministic_profit_includes_inventory_costs() {
        let contract = WholesaleContract::default();
        let costs = CostStructure::none().with_salvage(20.0).with_holding(5.0);
        // sales 80, leftover 20: 150*80 - 90*100 + 20*20 - 5*20
        assert_eq!(contract.deterministic_profit(100.0, 80.0, &costs), 3300.0);

        let short = CostStructure::none().with_shortage(4.0).with_penalty(6.0);
        // sales 100, unmet 20: 6000 - 10*20
        assert_eq!(contract.deterministic_profit(100.0, 120.0, &short), 5800.0);
    }

    #[test]
    fn fractile_and_optimum_under_uniform_demand() {
        let contract = WholesaleContract::default();
        let demand = DemandModel::uniform(60.0, 140.0).unwrap();
        let costs = CostStructure::none();
        assert_relative_eq!(contract.critical_fractile(&costs).unwrap(), 0.4, epsilon = 1e-12);
        assert_relative_eq!(
            contract.optimal_order_qty(&demand, &costs).unwrap(),
            92.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn optimum_maximises_expected_profit_on_the_sweep() {
        let contract = WholesaleContract::default();
        let demand = DemandModel::normal(100.0, 20.0).unwrap();
        let costs = CostStructure::none();
        let q_star = contract.optimal_order_qty(&demand, &costs).unwrap();
        let best = contract.expected_profit(q_star, &demand, &costs).unwrap();
        for q in [q_star - 10.0, q_star - 2.0, q_star + 2.0, q_star + 10.0] {
            assert!(contract.expected_profit(q, &demand, &costs).unwrap() < best);
        }
    }

    #[test]
    fn salvage_equal_to_price_leaves_optimum_undefined() {
        let contract = WholesaleContract::default();
        let demand = DemandModel::normal(100.0, 20.0).unwrap();
        let costs = CostStructure::none().with_salvage(150.0);
        let report = contract.evaluate(&demand, &costs).unwrap();
        assert_eq!(
            report.get(MetricKey::OptimalOrderQuantity),
            Some(&MetricValue::Undefined)
        );
        assert_eq!(
            report.get(MetricKey::TargetServiceFractile),
            Some(&MetricValue::Undefined)
        );
        assert_eq!(report.notes.len(), 1);
    }

    #[test]
    fn unbounded_optimum_is_reported_as_undefined() {
        // w == salvage puts the fractile at 1, whose normal quantile is infinite.
        let contract = WholesaleContract::new(150.0, 0.0, 100.0);
        let demand = DemandModel::normal(100.0, 20.0).unwrap();
        let costs = CostStructure::none();
        assert_eq!(contract.critical_fractile(&costs), Some(1.0));
        assert_eq!(contract.optimal_order_qty(&demand, &costs), None);

        let report = contract.evaluate(&demand, &costs).unwrap();
        assert_eq!(
            report.get(MetricKey::OptimalOrderQuantity),
            Some(&MetricValue::Undefined)
        );
        assert_eq!(report.value(MetricKey::TargetServiceFractile), Some(1.0));
        assert_eq!(report.notes.len(), 1);

        let json = to_json_pretty(&report).unwrap();
        assert!(!json.contains("null"));
        let decoded: ContractReport = from_json(&json).unwrap();
        assert_eq!(
            decoded.get(MetricKey::OptimalOrderQuantity),
            Some(&MetricValue::Undefined)
        );
        assert_eq!(decoded.notes, report.notes);

        // Bounded support keeps a finite optimum at the same fractile.
        let uniform = DemandModel::uniform(60.0, 140.0).unwrap();
        assert_eq!(contract.optimal_order_qty(&uniform, &costs), Some(140.0));
    }

    #[test]
    fn validation_fails_closed() {
        let costs = CostStructure::none();
        let demand = DemandModel::deterministic(100.0).unwrap();
        let zero_price = WholesaleContract::new(0.0, 90.0, 100.0);
        assert!(zero_price.evaluate(&demand, &costs).is_err());

        let high_salvage = CostStructure::none().with_salvage(151.0);
        assert!(matches!(
            WholesaleContract::default().validate(&high_salvage),
            Err(ContractError::InvalidInput(msg)) if msg.contains("salvage")
        ));

        let nan_qty = WholesaleContract::new(150.0, 90.0, f64::NAN);
        assert!(nan_qty.validate(&costs).is_err());
    }

    #[test]
    fn deterministic_report_has_no_risk_section() {
        let report = WholesaleContract::default()
            .evaluate(&DemandModel::deterministic(100.0).unwrap(), &CostStructure::none())
            .unwrap();
        assert!(!report.random_demand);
        assert!(report.risk.is_empty());
        assert_eq!(report.value(MetricKey::Profit), Some(6000.0));
        assert!(!report.contains_key(MetricKey::OptimalOrderQuantity));
        assert_eq!(report.charts.len(), 2);
        assert_eq!(report.charts[0].series[0].len(), 70);
    }
}
