//! Chart series containers and sampling grids.
//!
//! Curves are pure consumers of the evaluation functions: each contract samples
//! its deterministic or expected evaluator over one of the grids below and
//! returns the raw `(x, y)` pairs. Rendering is left to the caller.

use serde::{Deserialize, Serialize};

use crate::core::ContractError;
use crate::demand::DemandModel;
use crate::math::linspace;

/// Points on the order-quantity axis of profit sweeps.
pub const ORDER_SWEEP_POINTS: usize = 70;
/// Points on demand-axis charts.
pub const DEMAND_GRID_POINTS: usize = 90;
/// Points on the spot-price axis of the option cost chart.
pub const SPOT_GRID_POINTS: usize = 90;
/// Points on the quantity-flexibility demand axis.
pub const FLEX_GRID_POINTS: usize = 100;

/// One named `(x, y)` series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Series {
    /// Samples an infallible function over `xs`.
    pub fn sample<F>(name: &str, xs: &[f64], f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        Self {
            name: name.to_string(),
            x: xs.to_vec(),
            y: xs.iter().map(|&x| f(x)).collect(),
        }
    }

    /// Samples a fallible function over `xs`, stopping at the first error.
    pub fn try_sample<F>(name: &str, xs: &[f64], f: F) -> Result<Self, ContractError>
    where
        F: Fn(f64) -> Result<f64, ContractError>,
    {
        let y = xs.iter().map(|&x| f(x)).collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: name.to_string(),
            x: xs.to_vec(),
            y,
        })
    }

    /// Samples several parties at once; `f` returns one value per name.
    pub fn try_sample_many<const N: usize, F>(
        names: [&str; N],
        xs: &[f64],
        f: F,
    ) -> Result<Vec<Self>, ContractError>
    where
        F: Fn(f64) -> Result<[f64; N], ContractError>,
    {
        let mut ys: Vec<Vec<f64>> = vec![Vec::with_capacity(xs.len()); N];
        for &x in xs {
            for (y, value) in ys.iter_mut().zip(f(x)?) {
                y.push(value);
            }
        }
        Ok(names
            .iter()
            .zip(ys)
            .map(|(name, y)| Self {
                name: (*name).to_string(),
                x: xs.to_vec(),
                y,
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// A titled chart with axis labels and optional vertical reference lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
    /// x positions of vertical markers (e.g. the option strike).
    pub markers: Vec<f64>,
}

impl Chart {
    pub fn new(title: &str, x_label: &str, y_label: &str) -> Self {
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            series: Vec::new(),
            markers: Vec::new(),
        }
    }

    pub fn with_series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn with_all_series(mut self, series: Vec<Series>) -> Self {
        self.series.extend(series);
        self
    }

    pub fn with_marker(mut self, x: f64) -> Self {
        self.markers.push(x);
        self
    }

    pub fn series_named(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.name == name)
    }
}

/// Order quantities for profit-vs-quantity sweeps: `[0, max(10, 2Q, 1.5 * max demand)]`.
pub fn order_quantity_axis(order_qty: f64, demand: &DemandModel) -> Vec<f64> {
    let upper = 10.0_f64
        .max(order_qty * 2.0)
        .max(demand.max_reasonable_demand() * 1.5);
    linspace(0.0, upper, ORDER_SWEEP_POINTS)
}

/// Spot prices bracketing the strike and break-even price.
pub fn spot_price_axis(spot: f64, strike: f64, premium: f64) -> Vec<f64> {
    let lower = (spot.min(strike) * 0.4).max(0.0);
    let upper = spot.max(strike).max(strike + premium) * 1.8 + 1.0;
    linspace(lower, upper, SPOT_GRID_POINTS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_axis_covers_demand_tail() {
        let model = DemandModel::uniform(60.0, 140.0).unwrap();
        let axis = order_quantity_axis(100.0, &model);
        assert_eq!(axis.len(), ORDER_SWEEP_POINTS);
        assert_eq!(axis[0], 0.0);
        assert_eq!(*axis.last().unwrap(), 210.0);

        let small = order_quantity_axis(0.0, &DemandModel::deterministic(0.0).unwrap());
        assert_eq!(*small.last().unwrap(), 10.0);
    }

    #[test]
    fn spot_axis_brackets_break_even() {
        let axis = spot_price_axis(110.0, 95.0, 12.0);
        assert!((axis[0] - 38.0).abs() < 1e-9);
        assert!((axis.last().unwrap() - 199.0).abs() < 1e-9);
    }

    #[test]
    fn try_sample_propagates_errors() {
        let xs = [1.0, 2.0, 3.0];
        let err = Series::try_sample("s", &xs, |x| {
            if x > 2.0 {
                Err(ContractError::InvalidInput("boom".to_string()))
            } else {
                Ok(x)
            }
        });
        assert!(err.is_err());

        let ok = Series::sample("double", &xs, |x| 2.0 * x);
        assert_eq!(ok.y, vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn sample_many_splits_parties() {
        let xs = [1.0, 2.0];
        let series =
            Series::try_sample_many(["a", "b"], &xs, |x| Ok([x, -x])).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name, "a");
        assert_eq!(series[1].y, vec![-1.0, -2.0]);

        let chart = Chart::new("t", "x", "y").with_all_series(series);
        assert_eq!(chart.series_named("b").unwrap().len(), 2);
    }
}
