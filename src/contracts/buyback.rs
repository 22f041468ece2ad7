//! Buyback contract: the manufacturer repurchases unsold units at `b`.
//!
//! Retailer profit is `p * sales + b * leftover - w * Q + net`; the manufacturer
//! earns `w * Q - b * leftover`; the integrated chain earns
//! `p * sales - c * Q + net` with production cost `c`.
//!
//! The channel is coordinated when the retailer's fractile `(p - w) / (p - b)`
//! matches the system fractile `(p - c) / (p - s)`.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{cost_impacts, critical_fractile};
use crate::core::{
    Contract, ContractError, ContractKind, ContractReport, CoordinationStatus, CostStructure,
    MetricKey, MetricValue, ensure_non_negative, ensure_positive, inventory_adjustment,
    inventory_stats,
};
use crate::curves::{Chart, DEMAND_GRID_POINTS, Series, order_quantity_axis};
use crate::demand::DemandModel;

/// Buyback contract terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuybackContract {
    pub retail_price: f64,
    pub wholesale_price: f64,
    /// Per-unit repurchase price for leftover stock.
    pub buyback_price: f64,
    pub order_qty: f64,
    /// Manufacturer's unit production cost; defaults to the wholesale price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_cost: Option<f64>,
}

impl Default for BuybackContract {
    fn default() -> Self {
        Self {
            retail_price: 150.0,
            wholesale_price: 95.0,
            buyback_price: 40.0,
            order_qty: 100.0,
            production_cost: None,
        }
    }
}

/// Profit split between retailer, manufacturer and the integrated chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuybackProfit {
    pub retailer: f64,
    pub manufacturer: f64,
    pub total: f64,
}

impl BuybackContract {
    /// Production cost `c`, falling back to the wholesale price.
    pub fn production_cost(&self) -> f64 {
        self.production_cost.unwrap_or(self.wholesale_price)
    }

    fn split(&self, order_qty: f64, sales: f64, leftover: f64, net: f64) -> BuybackProfit {
        let retailer = self.retail_price * sales + self.buyback_price * leftover
            - self.wholesale_price * order_qty
            + net;
        let manufacturer = self.wholesale_price * order_qty - self.buyback_price * leftover;
        let total = self.retail_price * sales - self.production_cost() * order_qty + net;
        BuybackProfit {
            retailer,
            manufacturer,
            total,
        }
    }

    /// Profits for one realised demand.
    ///
    /// # Examples
    /// ```
    /// use contractlab::contracts::BuybackContract;
    /// use contractlab::core::CostStructure;
    ///
    /// let profit =
    ///     BuybackContract::default().deterministic_profit(100.0, 80.0, &CostStructure::none());
    /// assert_eq!((profit.retailer, profit.manufacturer, profit.total), (3300.0, 8700.0, 2500.0));
    /// ```
    pub fn deterministic_profit(
        &self,
        order_qty: f64,
        demand: f64,
        costs: &CostStructure,
    ) -> BuybackProfit {
        let s = inventory_stats(order_qty, demand);
        let adjust = inventory_adjustment(s.leftover, s.unmet, costs);
        self.split(order_qty, s.sales, s.leftover, adjust.net)
    }

    /// Expected profits under `demand`.
    pub fn expected_profit(
        &self,
        order_qty: f64,
        demand: &DemandModel,
        costs: &CostStructure,
    ) -> Result<BuybackProfit, ContractError> {
        let m = demand.metrics(order_qty)?;
        let adjust = inventory_adjustment(m.expected_leftover, m.expected_unmet, costs);
        Ok(self.split(order_qty, m.expected_sales, m.expected_leftover, adjust.net))
    }

    /// `(p - w) / (p - b)`, clamped; `None` when `p <= b`.
    pub fn retailer_fractile(&self) -> Option<f64> {
        critical_fractile(
            self.retail_price - self.wholesale_price,
            self.retail_price - self.buyback_price,
        )
    }

    /// `(p - c) / (p - salvage)`, clamped; `None` when `p <= salvage`.
    pub fn system_fractile(&self, costs: &CostStructure) -> Option<f64> {
        critical_fractile(
            self.retail_price - self.production_cost(),
            self.retail_price - costs.salvage,
        )
    }

    pub fn coordination(&self, costs: &CostStructure) -> CoordinationStatus {
        match (self.retailer_fractile(), self.system_fractile(costs)) {
            (Some(retailer), Some(system)) => {
                CoordinationStatus::from_gap((retailer - system).abs())
            }
            _ => CoordinationStatus::Indeterminate,
        }
    }

    fn profit_at(
        &self,
        order_qty: f64,
        demand: &DemandModel,
        costs: &CostStructure,
    ) -> Result<BuybackProfit, ContractError> {
        match demand.point_demand() {
            Some(d) => Ok(self.deterministic_profit(order_qty, d, costs)),
            None => self.expected_profit(order_qty, demand, costs),
        }
    }
}

impl Contract for BuybackContract {
    fn kind(&self) -> ContractKind {
        ContractKind::Buyback
    }

    fn validate(&self, costs: &CostStructure) -> Result<(), ContractError> {
        ensure_positive("retail price", self.retail_price)?;
        ensure_non_negative("wholesale price", self.wholesale_price)?;
        ensure_non_negative("buyback price", self.buyback_price)?;
        ensure_non_negative("order quantity", self.order_qty)?;
        ensure_non_negative("production cost", self.production_cost())?;
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
        let profit = self.split(q, m.expected_sales, m.expected_leftover, adjust.net);
        let coordination = self.coordination(costs);
        debug!(order_qty = q, ?profit, ?coordination, "buyback contract evaluated");

        let mut report = ContractReport::new(self.kind(), demand.is_random());
        if self.buyback_price > self.wholesale_price {
            warn!(
                buyback_price = self.buyback_price,
                wholesale_price = self.wholesale_price,
                "buyback price above wholesale price"
            );
            report.notes.push(
                "buyback price exceeds wholesale price; this may create aggressive return incentives"
                    .to_string(),
            );
        }

        report.decision = vec![
            (MetricKey::OrderQuantity, MetricValue::Quantity(q)),
            (MetricKey::CoordinationIndicator, coordination.into()),
            (
                MetricKey::ExpectedLeftover,
                MetricValue::Quantity(m.expected_leftover),
            ),
            (MetricKey::ServiceLevel, MetricValue::Percent(m.service_level)),
        ];
        report.financial = vec![
            (MetricKey::RetailerProfit, MetricValue::Currency(profit.retailer)),
            (
                MetricKey::ManufacturerProfit,
                MetricValue::Currency(profit.manufacturer),
            ),
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
        let by_quantity = Series::try_sample_many(
            ["Retailer", "Manufacturer", "Total"],
            &quantities,
            |q| {
                let p = self.profit_at(q, demand, costs)?;
                Ok([p.retailer, p.manufacturer, p.total])
            },
        )?;

        let demands = demand.demand_grid(DEMAND_GRID_POINTS);
        let by_demand = Series::try_sample_many(["Retailer", "Total"], &demands, |d| {
            let p = self.deterministic_profit(self.order_qty, d, costs);
            Ok([p.retailer, p.total])
        })?;

        Ok(vec![
            Chart::new("Profit vs Order Quantity", "Order Quantity", "Profit")
                .with_all_series(by_quantity),
            Chart::new("Profit vs Demand", "Demand", "Profit").with_all_series(by_demand),
        ])
    }
}
