//! Capacity option contract versus pure spot purchasing.
//!
//! The buyer reserves `n` units at premium `r` each and may buy them at strike
//! `k`; the rest of demand is sourced at the spot price `s`. Options are
//! exercised iff `s > k`, so the break-even spot price is `k + r`.
//!
//! Inventory cost components are not applied to this contract. The rates are
//! still validated: a scenario carries one cost table for whichever contract
//! it names, and a negative or non-finite rate is rejected for all of them.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{
    Contract, ContractError, ContractKind, ContractReport, CostStructure, MetricKey, MetricValue,
    ensure_non_negative,
};
use crate::curves::{Chart, DEMAND_GRID_POINTS, Series, spot_price_axis};
use crate::demand::DemandModel;

/// Option contract terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionContract {
    /// Reserved quantity `n`.
    pub option_qty: f64,
    /// Exercise price `k`.
    pub strike: f64,
    /// Reservation price per unit `r`.
    pub premium: f64,
    /// Current spot price `s`.
    pub spot: f64,
}

impl Default for OptionContract {
    fn default() -> Self {
        Self {
            option_qty: 100.0,
            strike: 95.0,
            premium: 12.0,
            spot: 110.0,
        }
    }
}

/// Procurement cost of the option strategy and of the pure spot strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionCost {
    pub should_exercise: bool,
    pub exercised_qty: f64,
    pub total_cost: f64,
    pub spot_only_cost: f64,
    pub expected_demand: f64,
    /// Demand not covered by exercised options.
    pub expected_unhedged: f64,
}

impl OptionCost {
    /// Savings of the option strategy over buying everything at spot.
    pub fn cost_advantage(&self) -> f64 {
        self.spot_only_cost - self.total_cost
    }
}

impl OptionContract {
    pub fn break_even_spot(&self) -> f64 {
        self.strike + self.premium
    }

    pub fn total_premium(&self) -> f64 {
        self.option_qty * self.premium
    }

    /// Cost at `spot` when `covered` units fall inside the option and `demand` are needed.
    fn cost(&self, spot: f64, covered: f64, demand: f64) -> OptionCost {
        let should_exercise = spot > self.strike;
        let (exercised_qty, total_cost) = if should_exercise {
            let spill = (demand - covered).max(0.0);
            (
                covered,
                self.total_premium() + covered * self.strike + spill * spot,
            )
        } else {
            (0.0, self.total_premium() + demand * spot)
        };
        OptionCost {
            should_exercise,
            exercised_qty,
            total_cost,
            spot_only_cost: demand * spot,
            expected_demand: demand,
            expected_unhedged: (demand - exercised_qty).max(0.0),
        }
    }

    /// Cost for one realised demand at the contract's spot price.
    ///
    /// # Examples
    /// ```
    /// use contractlab::contracts::OptionContract;
    ///
    /// let cost = OptionContract::default().deterministic_cost(120.0);
    /// assert!(cost.should_exercise);
    /// assert_eq!(cost.total_cost, 12_900.0);
    /// assert_eq!(cost.cost_advantage(), 300.0);
    /// ```
    pub fn deterministic_cost(&self, demand: f64) -> OptionCost {
        self.deterministic_cost_at(demand, self.spot)
    }

    pub fn deterministic_cost_at(&self, demand: f64, spot: f64) -> OptionCost {
        self.cost(spot, demand.min(self.option_qty), demand)
    }

    /// Expected cost, with `E[min(D, n)]` exercised and `E[D] - E[min(D, n)]` bought at spot.
    pub fn expected_cost(&self, demand: &DemandModel) -> Result<OptionCost, ContractError> {
        self.expected_cost_at(demand, self.spot)
    }

    pub fn expected_cost_at(
        &self,
        demand: &DemandModel,
        spot: f64,
    ) -> Result<OptionCost, ContractError> {
        let m = demand.metrics(self.option_qty)?;
        Ok(self.cost(spot, m.expected_sales, m.expected_demand))
    }
}

impl Contract for OptionContract {
    fn kind(&self) -> ContractKind {
        ContractKind::Option
    }

    fn validate(&self, costs: &CostStructure) -> Result<(), ContractError> {
        ensure_non_negative("option quantity", self.option_qty)?;
        ensure_non_negative("strike price", self.strike)?;
        ensure_non_negative("premium", self.premium)?;
        ensure_non_negative("spot price", self.spot)?;
        costs.validate()
    }

    fn evaluate(
        &self,
        demand: &DemandModel,
        costs: &CostStructure,
    ) -> Result<ContractReport, ContractError> {
        self.validate(costs)?;
        let random = demand.is_random();
        let outcome = match demand.point_demand() {
            Some(d) => self.deterministic_cost(d),
            None => self.expected_cost(demand)?,
        };
        debug!(?outcome, "option contract evaluated");

        let mut report = ContractReport::new(self.kind(), random);
        report.decision = vec![
            (
                MetricKey::ShouldExercise,
                MetricValue::Flag(outcome.should_exercise),
            ),
            (
                MetricKey::QuantityExercised,
                MetricValue::Quantity(outcome.exercised_qty),
            ),
            (
                MetricKey::BreakEvenSpotPrice,
                MetricValue::Currency(self.break_even_spot()),
            ),
        ];
        report.financial = vec![
            (MetricKey::TotalCost, MetricValue::Currency(outcome.total_cost)),
            (
                MetricKey::SpotOnlyCost,
                MetricValue::Currency(outcome.spot_only_cost),
            ),
            (
                MetricKey::CostAdvantage,
                MetricValue::Currency(outcome.cost_advantage()),
            ),
        ];
        if random {
            report.risk = vec![
                (
                    MetricKey::ExpectedDemand,
                    MetricValue::Quantity(outcome.expected_demand),
                ),
                (
                    MetricKey::DemandAboveOptionProbability,
                    MetricValue::Percent((1.0 - demand.cdf(self.option_qty)).clamp(0.0, 1.0)),
                ),
                (
                    MetricKey::ExpectedUnhedgedVolume,
                    MetricValue::Quantity(outcome.expected_unhedged),
                ),
            ];
        }
        let relative = if self.spot > self.strike {
            "Above Trigger"
        } else {
            "At/Below Trigger"
        };
        report.advanced = vec![
            (
                MetricKey::ExerciseTriggerPrice,
                MetricValue::Currency(self.strike),
            ),
            (
                MetricKey::TotalPremiumPaid,
                MetricValue::Currency(self.total_premium()),
            ),
            (
                MetricKey::SpotRelativeToTrigger,
                MetricValue::Label(relative.to_string()),
            ),
        ];
        report.notes.push(
            "inventory holding, salvage, shortage and penalty costs are not applied to option costs"
                .to_string(),
        );
        report.charts = self.curves(demand, costs)?;
        Ok(report)
    }

    fn curves(
        &self,
        demand: &DemandModel,
        _costs: &CostStructure,
    ) -> Result<Vec<Chart>, ContractError> {
        let spots = spot_price_axis(self.spot, self.strike, self.premium);
        let by_spot = match demand.point_demand() {
            Some(d) => Series::try_sample_many(
                ["Option Strategy", "Pure Spot Strategy"],
                &spots,
                |s| {
                    let c = self.deterministic_cost_at(d, s);
                    Ok([c.total_cost, c.spot_only_cost])
                },
            )?,
            None => {
                let m = demand.metrics(self.option_qty)?;
                Series::try_sample_many(
                    ["Option Strategy", "Pure Spot Strategy"],
                    &spots,
                    |s| {
                        let c = self.cost(s, m.expected_sales, m.expected_demand);
                        Ok([c.total_cost, c.spot_only_cost])
                    },
                )?
            }
        };

        let demands = demand.demand_grid(DEMAND_GRID_POINTS);
        let by_demand = Series::try_sample_many(
            ["Option Strategy", "Pure Spot Strategy"],
            &demands,
            |d| {
                let c = self.deterministic_cost(d);
                Ok([c.total_cost, c.spot_only_cost])
            },
        )?;

        Ok(vec![
            Chart::new("Cost vs Spot Price", "Spot Price", "Total Cost")
                .with_all_series(by_spot)
                .with_marker(self.strike),
            Chart::new("Cost vs Demand", "Demand", "Total Cost").with_all_series(by_demand),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn no_exercise_at_or_below_strike() {
        let contract = OptionContract {
            spot: 95.0,
            ..OptionContract::default()
        };
        let cost = contract.deterministic_cost(120.0);
        assert!(!cost.should_exercise);
        assert_eq!(cost.exercised_qty, 0.0);
        assert_eq!(cost.total_cost, 1200.0 + 120.0 * 95.0);
        assert_eq!(cost.cost_advantage(), -1200.0);
        assert_eq!(cost.expected_unhedged, 120.0);
    }

    #[test]
    fn demand_below_option_quantity_leaves_options_unused() {
        let cost = OptionContract::default().deterministic_cost(70.0);
        assert_eq!(cost.exercised_qty, 70.0);
        assert_eq!(cost.total_cost, 1200.0 + 70.0 * 95.0);
        assert_eq!(cost.expected_unhedged, 0.0);
    }

    #[test]
    fn expected_cost_uses_truncated_sales() {
        let contract = OptionContract::default();
        let demand = DemandModel::uniform(60.0, 140.0).unwrap();
        let cost = contract.expected_cost(&demand).unwrap();
        // E[min(D, 100)] = 90, E[D] = 100
        assert_relative_eq!(cost.exercised_qty, 90.0, epsilon = 1e-8);
        assert_relative_eq!(
            cost.total_cost,
            1200.0 + 90.0 * 95.0 + 10.0 * 110.0,
            epsilon = 1e-6
        );
        assert_relative_eq!(cost.spot_only_cost, 11_000.0, epsilon = 1e-6);
        assert_relative_eq!(cost.expected_unhedged, 10.0, epsilon = 1e-8);
    }

    #[test]
    fn spot_chart_marks_strike_and_crosses_at_break_even() {
        let contract = OptionContract::default();
        let demand = DemandModel::deterministic(100.0).unwrap();
        let charts = contract.curves(&demand, &CostStructure::none()).unwrap();
        assert_eq!(charts[0].markers, vec![95.0]);

        // Full coverage: option cost 1200 + 100 * 95 equals spot cost at 107.
        let at_break_even = contract.deterministic_cost_at(100.0, contract.break_even_spot());
        assert_relative_eq!(at_break_even.cost_advantage(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn report_flags_ignored_cost_components() {
        let costs = CostStructure::none().with_holding(5.0);
        let report = OptionContract::default()
            .evaluate(&DemandModel::normal(100.0, 20.0).unwrap(), &costs)
            .unwrap();
        assert_eq!(report.notes.len(), 1);
        assert_eq!(
            report.get(MetricKey::ShouldExercise),
            Some(&MetricValue::Flag(true))
        );
        assert_eq!(report.value(MetricKey::BreakEvenSpotPrice), Some(107.0));
        let p = report.value(MetricKey::DemandAboveOptionProbability).unwrap();
        assert_relative_eq!(p, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn cost_rates_are_validated_but_never_priced() {
        let demand = DemandModel::deterministic(120.0).unwrap();
        let contract = OptionContract::default();
        let plain = contract.evaluate(&demand, &CostStructure::none()).unwrap();
        let loaded = contract
            .evaluate(&demand, &CostStructure::none().with_holding(5.0).with_penalty(9.0))
            .unwrap();
        assert_eq!(loaded.value(MetricKey::TotalCost), plain.value(MetricKey::TotalCost));
        assert_eq!(loaded.value(MetricKey::SpotOnlyCost), Some(13_200.0));

        for bad in [
            CostStructure::none().with_salvage(-1.0),
            CostStructure::none().with_shortage(f64::NAN),
        ] {
            assert!(matches!(
                contract.evaluate(&demand, &bad),
                Err(ContractError::InvalidInput(_))
            ));
        }
    }
}
