//! Quantity flexibility contract: the final order may deviate from an initial
//! commitment `Q0` by at most `adj%` in either direction.
//!
//! `final = clamp(D, max(0, Q0 (1 - adj)), Q0 (1 + adj))`, and
//! `total = w * final + h * overstock + (shortage + penalty) * unmet - salvage * overstock`.
//!
//! The expected evaluator takes the expectation of the final order, the unmet
//! volume and the overstock separately and then applies the linear cost
//! formula to those expectations.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::cost_impacts;
use crate::core::{
    Contract, ContractError, ContractKind, ContractReport, CostStructure, MetricKey, MetricValue,
    ensure_non_negative, inventory_adjustment,
};
use crate::curves::{Chart, FLEX_GRID_POINTS, Series};
use crate::demand::DemandModel;
use crate::math::{EPS, clamp};

/// Quantity flexibility contract terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantityFlexibilityContract {
    /// Initial order commitment `Q0`.
    pub initial_commitment: f64,
    /// Allowed adjustment in percent of `Q0`, in `[0, 100]`.
    pub adjustment_pct: f64,
    pub wholesale_price: f64,
}

impl Default for QuantityFlexibilityContract {
    fn default() -> Self {
        Self {
            initial_commitment: 100.0,
            adjustment_pct: 20.0,
            wholesale_price: 92.0,
        }
    }
}

/// Band, final order and cost for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlexOutcome {
    pub lower: f64,
    pub upper: f64,
    pub final_order: f64,
    pub unmet: f64,
    pub overstock: f64,
    pub procurement_cost: f64,
    pub total_cost: f64,
    pub service_level: f64,
    pub expected_demand: f64,
}

impl QuantityFlexibilityContract {
    /// `(lower, upper)` flexibility band.
    pub fn bounds(&self) -> (f64, f64) {
        let span = self.adjustment_pct / 100.0;
        let lower = (self.initial_commitment * (1.0 - span)).max(0.0);
        let upper = self.initial_commitment * (1.0 + span);
        (lower, upper)
    }

    /// Final order for a realised demand.
    pub fn final_order(&self, demand: f64) -> f64 {
        let (lower, upper) = self.bounds();
        clamp(demand, lower, upper)
    }

    fn outcome(
        &self,
        final_order: f64,
        unmet: f64,
        overstock: f64,
        demand: f64,
        costs: &CostStructure,
    ) -> FlexOutcome {
        let (lower, upper) = self.bounds();
        let procurement_cost = self.wholesale_price * final_order;
        let adjust = inventory_adjustment(overstock, unmet, costs);
        let service_level = if demand <= EPS {
            1.0
        } else {
            clamp((demand - unmet) / demand, 0.0, 1.0)
        };
        FlexOutcome {
            lower,
            upper,
            final_order,
            unmet,
            overstock,
            procurement_cost,
            total_cost: procurement_cost - adjust.net,
            service_level,
            expected_demand: demand,
        }
    }

    /// Outcome for one realised demand.
    ///
    /// # Examples
    /// ```
    /// use contractlab::contracts::QuantityFlexibilityContract;
    /// use contractlab::core::CostStructure;
    ///
    /// let contract = QuantityFlexibilityContract::default();
    /// let out = contract.deterministic_outcome(130.0, &CostStructure::none());
    /// assert_eq!((out.lower, out.upper, out.final_order), (80.0, 120.0, 120.0));
    /// assert_eq!(out.unmet, 10.0);
    /// assert_eq!(out.total_cost, 11_040.0);
    /// ```
    pub fn deterministic_outcome(&self, demand: f64, costs: &CostStructure) -> FlexOutcome {
        let final_order = self.final_order(demand);
        let unmet = (demand - final_order).max(0.0);
        let overstock = (final_order - demand).max(0.0);
        self.outcome(final_order, unmet, overstock, demand, costs)
    }

    /// Per-term expected outcome.
    ///
    /// `E[final]`, `E[unmet]` and `E[overstock]` are computed independently and
    /// combined linearly. The service level is `(E[D] - E[unmet]) / E[D]`, an
    /// approximation of the expected per-realisation service level.
    ///
    /// # Errors
    /// Propagates quadrature failures as [`ContractError::IntegrationFailure`].
    pub fn expected_outcome(
        &self,
        demand: &DemandModel,
        costs: &CostStructure,
    ) -> Result<FlexOutcome, ContractError> {
        let (lower, upper) = self.bounds();
        let kinks = [lower, upper];
        let final_order = demand.expected_of_with_kinks(|d| self.final_order(d), &kinks)?;
        let unmet = demand.expected_of_with_kinks(|d| (d - self.final_order(d)).max(0.0), &kinks)?;
        let overstock =
            demand.expected_of_with_kinks(|d| (self.final_order(d) - d).max(0.0), &kinks)?;
        let expected_demand = demand.expected_demand()?;
        Ok(self.outcome(final_order, unmet, overstock, expected_demand, costs))
    }
}

impl Contract for QuantityFlexibilityContract {
    fn kind(&self) -> ContractKind {
        ContractKind::QuantityFlexibility
    }

    fn validate(&self, costs: &CostStructure) -> Result<(), ContractError> {
        ensure_non_negative("initial order commitment", self.initial_commitment)?;
        ensure_non_negative("wholesale price", self.wholesale_price)?;
        if !(0.0..=100.0).contains(&self.adjustment_pct) {
            return Err(ContractError::InvalidInput(
                "adjustment range must be between 0 and 100 percent".to_string(),
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
        let random = demand.is_random();
        let outcome = match demand.point_demand() {
            Some(d) => self.deterministic_outcome(d, costs),
            None => self.expected_outcome(demand, costs)?,
        };
        debug!(?outcome, "quantity flexibility contract evaluated");

        let final_key = if random {
            MetricKey::ExpectedFinalOrder
        } else {
            MetricKey::FinalOrderQuantity
        };
        let mut report = ContractReport::new(self.kind(), random);
        report.decision = vec![
            (final_key, MetricValue::Quantity(outcome.final_order)),
            (MetricKey::LowerFlexBound, MetricValue::Quantity(outcome.lower)),
            (MetricKey::UpperFlexBound, MetricValue::Quantity(outcome.upper)),
            (MetricKey::ServiceLevel, MetricValue::Percent(outcome.service_level)),
        ];
        report.financial = vec![
            (
                MetricKey::ProcurementCost,
                MetricValue::Currency(outcome.procurement_cost),
            ),
            (MetricKey::TotalCost, MetricValue::Currency(outcome.total_cost)),
            (MetricKey::UnmetDemand, MetricValue::Quantity(outcome.unmet)),
            (MetricKey::Overstock, MetricValue::Quantity(outcome.overstock)),
        ];
        if random {
            report.risk = vec![
                (
                    MetricKey::ExpectedDemand,
                    MetricValue::Quantity(outcome.expected_demand),
                ),
                (
                    MetricKey::DemandAboveUpperProbability,
                    MetricValue::Percent((1.0 - demand.cdf(outcome.upper)).clamp(0.0, 1.0)),
                ),
                (
                    MetricKey::DemandBelowLowerProbability,
                    MetricValue::Percent(demand.cdf(outcome.lower)),
                ),
            ];
        }

        let adjust = inventory_adjustment(outcome.overstock, outcome.unmet, costs);
        let impacts = cost_impacts(&adjust);
        report.advanced = impacts
            .into_iter()
            .filter(|(key, _)| *key != MetricKey::SalvageContribution)
            .collect();
        report
            .advanced
            .push((MetricKey::SalvageOffset, MetricValue::Currency(adjust.salvage)));
        report.charts = self.curves(demand, costs)?;
        Ok(report)
    }

    fn curves(
        &self,
        demand: &DemandModel,
        costs: &CostStructure,
    ) -> Result<Vec<Chart>, ContractError> {
        let demands = demand.demand_grid(FLEX_GRID_POINTS);
        let cost = Series::sample("Total Cost", &demands, |d| {
            self.deterministic_outcome(d, costs).total_cost
        });
        let orders = Series::try_sample_many(
            ["Final Order", "Lower Bound", "Upper Bound"],
            &demands,
            |d| {
                let out = self.deterministic_outcome(d, costs);
                Ok([out.final_order, out.lower, out.upper])
            },
        )?;

        Ok(vec![
            Chart::new("Total Cost vs Demand", "Demand", "Total Cost").with_series(cost),
            Chart::new("Final Order vs Demand", "Demand", "Final Order").with_all_series(orders),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{normal_cdf, normal_pdf};
    use approx::assert_relative_eq;

    #[test]
    fn band_is_floored_at_zero() {
        let contract = QuantityFlexibilityContract {
            adjustment_pct: 100.0,
            ..QuantityFlexibilityContract::default()
        };
        assert_eq!(contract.bounds(), (0.0, 200.0));
        assert_eq!(contract.final_order(250.0), 200.0);
        assert_eq!(contract.final_order(0.0), 0.0);
    }

    #[test]
    fn overstock_costs_net_against_salvage() {
        let contract = QuantityFlexibilityContract::default();
        let costs = CostStructure::none().with_holding(3.0).with_salvage(1.0);
        let out = contract.deterministic_outcome(50.0, &costs);
        assert_eq!(out.final_order, 80.0);
        assert_eq!(out.overstock, 30.0);
        assert_eq!(out.procurement_cost, 92.0 * 80.0);
        assert_eq!(out.total_cost, 92.0 * 80.0 + 3.0 * 30.0 - 30.0);
        assert_eq!(out.service_level, 1.0);
    }

    #[test]
    fn per_term_expectation_under_discrete_demand() {
        let contract = QuantityFlexibilityContract::default();
        let demand = DemandModel::discrete(&[60.0, 100.0, 140.0], &[0.2, 0.5, 0.3]).unwrap();
        let costs = CostStructure::none().with_shortage(10.0);
        let out = contract.expected_outcome(&demand, &costs).unwrap();
        // final: 0.2*80 + 0.5*100 + 0.3*120; unmet: 0.3*20; overstock: 0.2*20
        assert_relative_eq!(out.final_order, 102.0, epsilon = 1e-12);
        assert_relative_eq!(out.unmet, 6.0, epsilon = 1e-12);
        assert_relative_eq!(out.overstock, 4.0, epsilon = 1e-12);
        assert_relative_eq!(out.total_cost, 92.0 * 102.0 + 60.0, epsilon = 1e-9);
        assert_relative_eq!(out.service_level, (104.0 - 6.0) / 104.0, epsilon = 1e-12);
    }

    #[test]
    fn per_term_expectation_is_an_approximation() {
        let contract = QuantityFlexibilityContract::default();
        let demand = DemandModel::uniform(40.0, 160.0).unwrap();
        let costs = CostStructure::none().with_holding(4.0).with_penalty(7.0);
        let out = contract.expected_outcome(&demand, &costs).unwrap();
        let recomposed = contract.wholesale_price * out.final_order
            + costs.holding * out.overstock
            + costs.unmet_rate() * out.unmet;
        assert_relative_eq!(out.total_cost, recomposed, epsilon = 1e-9);

        // The cost is linear in each term, so it agrees with the composed expectation.
        let composed_cost = demand
            .expected_of(|d| contract.deterministic_outcome(d, &costs).total_cost)
            .unwrap();
        assert_relative_eq!(out.total_cost, composed_cost, max_relative = 1e-6);

        // The service level is a ratio of expectations and does not.
        // E[unmet] = 40^2 / (2 * 120), E[D] = 100.
        assert_relative_eq!(out.service_level, 1.0 - 20.0 / 3.0 / 100.0, epsilon = 1e-7);
        let composed_service = demand
            .expected_of(|d| contract.deterministic_outcome(d, &costs).service_level)
            .unwrap();
        // 2/3 + ln(4/3)
        assert_relative_eq!(
            composed_service,
            2.0 / 3.0 + (4.0_f64 / 3.0).ln(),
            epsilon = 1e-6
        );
        assert!(composed_service - out.service_level > 0.015);
    }

    #[test]
    fn narrow_band_under_wide_normal_spread() {
        // Band [40, 60] is a sliver of the [0, mu + 10 sd] bulk interval.
        let contract = QuantityFlexibilityContract {
            initial_commitment: 50.0,
            adjustment_pct: 20.0,
            wholesale_price: 92.0,
        };
        let (mean, std) = (50.0, 1.0e4);
        let demand = DemandModel::normal(mean, std).unwrap();
        let out = contract.expected_outcome(&demand, &CostStructure::none()).unwrap();

        let (lower, upper) = (40.0, 60.0);
        let (zl, zu) = ((lower - mean) / std, (upper - mean) / std);
        let final_exact = lower * normal_cdf(zl)
            + mean * (normal_cdf(zu) - normal_cdf(zl))
            + std * (normal_pdf(zl) - normal_pdf(zu))
            + upper * (1.0 - normal_cdf(zu));
        assert_relative_eq!(final_exact, 50.0, max_relative = 1e-12);
        assert_relative_eq!(out.final_order, final_exact, max_relative = 1e-7);

        // E[(D - U)+] = (mu - U)(1 - Phi(zu)) + sd * phi(zu)
        let unmet_exact = (mean - upper) * (1.0 - normal_cdf(zu)) + std * normal_pdf(zu);
        assert_relative_eq!(out.unmet, unmet_exact, max_relative = 1e-7);
        assert_relative_eq!(out.total_cost, 92.0 * out.final_order, max_relative = 1e-12);
    }

    #[test]
    fn adjustment_outside_percent_range_is_rejected() {
        for pct in [-1.0, 100.5] {
            let contract = QuantityFlexibilityContract {
                adjustment_pct: pct,
                ..QuantityFlexibilityContract::default()
            };
            assert!(contract.validate(&CostStructure::none()).is_err());
        }
    }

    #[test]
    fn random_report_includes_band_probabilities() {
        let demand = DemandModel::uniform(60.0, 140.0).unwrap();
        let report = QuantityFlexibilityContract::default()
            .evaluate(&demand, &CostStructure::none())
            .unwrap();
        assert!(report.contains_key(MetricKey::ExpectedFinalOrder));
        assert_relative_eq!(
            report.value(MetricKey::DemandAboveUpperProbability).unwrap(),
            0.25,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            report.value(MetricKey::DemandBelowLowerProbability).unwrap(),
            0.25,
            epsilon = 1e-12
        );
        assert_eq!(report.charts[0].series[0].len(), FLEX_GRID_POINTS);
        assert_eq!(report.advanced.len(), 3);
    }
}
