//! Revenue sharing contract: the supplier keeps a share `alpha` of retail revenue.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::cost_impacts;
use crate::core::{
    Contract, ContractError, ContractKind, ContractReport, CostStructure, MetricKey, MetricValue,
    ensure_non_negative, ensure_positive, inventory_adjustment, inventory_stats,
};
use crate::curves::{Chart, DEMAND_GRID_POINTS, Series, order_quantity_axis};
use crate::demand::DemandModel;

/// Revenue sharing contract terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevenueSharingContract {
    pub retail_price: f64,
    pub wholesale_price: f64,
    /// Supplier's share of retail revenue, in `[0, 1]`.
    pub alpha: f64,
    pub order_qty: f64,
}

impl Default for RevenueSharingContract {
    fn default() -> Self {
        Self {
            retail_price: 160.0,
            wholesale_price: 80.0,
            alpha: 0.30,
            order_qty: 100.0,
        }
    }
}

/// Profit split between retailer and supplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevenueSharingProfit {
    pub retailer: f64,
    pub supplier: f64,
    pub total: f64,
}

impl RevenueSharingContract {
    fn split(&self, order_qty: f64, sales: f64, net: f64) -> RevenueSharingProfit {
        let revenue = self.retail_price * sales;
        let procurement = self.wholesale_price * order_qty;
        let retailer = (1.0 - self.alpha) * revenue - procurement + net;
        let supplier = self.alpha * revenue + procurement;
        RevenueSharingProfit {
            retailer,
            supplier,
            total: retailer + supplier,
        }
    }

    pub fn deterministic_profit(
        &self,
        order_qty: f64,
        demand: f64,
        costs: &CostStructure,
    ) -> RevenueSharingProfit {
        let s = inventory_stats(order_qty, demand);
        let adjust = inventory_adjustment(s.leftover, s.unmet, costs);
        self.split(order_qty, s.sales, adjust.net)
    }

    pub fn expected_profit(
        &self,
        order_qty: f64,
        demand: &DemandModel,
        costs: &CostStructure,
    ) -> Result<RevenueSharingProfit, ContractError> {
        let m = demand.metrics(order_qty)?;
        let adjust = inventory_adjustment(m.expected_leftover, m.expected_unmet, costs);
        Ok(self.split(order_qty, m.expected_sales, adjust.net))
    }

    fn profit_at(
        &self,
        order_qty: f64,
        demand: &DemandModel,
        costs: &CostStructure,
    ) -> Result<RevenueSharingProfit, ContractError> {
        match demand.point_demand() {
            Some(d) => Ok(self.deterministic_profit(order_qty, d, costs)),
            None => self.expected_profit(order_qty, demand, costs),
        }
    }
}

impl Contract for RevenueSharingContract {
    fn kind(&self) -> ContractKind {
        ContractKind::RevenueSharing
    }

    fn validate(&self, costs: &CostStructure) -> Result<(), ContractError> {
        ensure_positive("retail price", self.retail_price)?;
        ensure_non_negative("wholesale price", self.wholesale_price)?;
        ensure_non_negative("order quantity", self.order_qty)?;
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(ContractError::InvalidInput(
                "revenue share ratio must be between 0 and 1".to_string(),
            ));
        }
        costs.validate()
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
        let profit = self.split(q, m.expected_sales, adjust.net);
        debug!(order_qty = q, alpha = self.alpha, ?profit, "revenue sharing contract evaluated");

        let mut report = ContractReport::new(self.kind(), demand.is_random());
        report.decision = vec![
            (MetricKey::OrderQuantity, MetricValue::Quantity(q)),
            (MetricKey::RevenueShareRatio, MetricValue::Percent(self.alpha)),
            (MetricKey::ServiceLevel, MetricValue::Percent(m.service_level)),
            (
                MetricKey::ExpectedLeftover,
                MetricValue::Quantity(m.expected_leftover),
            ),
        ];
        report.financial = vec![
            (MetricKey::RetailerProfit, MetricValue::Currency(profit.retailer)),
            (MetricKey::SupplierProfit, MetricValue::Currency(profit.supplier)),
            (MetricKey::TotalProfit, MetricValue::Currency(profit.total)),
        ];
        if demand.is_random() {
            report.risk = vec![
                (MetricKey::ExpectedDemand, MetricValue::Quantity(m.expected_demand)),
                (
                    MetricKey::StockoutProbability,
                    MetricValue::Percent(m.stockout_probability),
                ),
                (
                    MetricKey::ExpectedUnmetDemand,
                    MetricValue::Quantity(m.expected_unmet),
                ),
            ];
        }
        report.advanced = cost_impacts(&adjust);
        report.charts = self.curves(demand, costs)?;
        Ok(report)
    }

    fn curves(
        &self,
        demand: &DemandModel,
        costs: &CostStructure,
    ) -> Result<Vec<Chart>, ContractError> {
        let quantities = order_quantity_axis(self.order_qty, demand);
        let by_quantity =
            Series::try_sample_many(["Retailer", "Supplier", "Total"], &quantities, |q| {
                let p = self.profit_at(q, demand, costs)?;
                Ok([p.retailer, p.supplier, p.total])
            })?;

        let demands = demand.demand_grid(DEMAND_GRID_POINTS);
        let by_demand = Series::try_sample_many(["Retailer", "Supplier"], &demands, |d| {
            let p = self.deterministic_profit(self.order_qty, d, costs);
            Ok([p.retailer, p.supplier])
        })?;

        Ok(vec![
            Chart::new("Profit vs Order Quantity", "Order Quantity", "Profit")
                .with_all_series(by_quantity),
            Chart::new("Profit vs Demand", "Demand", "Profit").with_all_series(by_demand),
        ])
    }
}
