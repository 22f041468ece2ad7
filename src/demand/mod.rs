//! Stochastic demand models and their expectation engine.
//!
//! [`DemandModel`] is an immutable value over four closed distribution
//! families. Every operation is an exhaustive match over [`Distribution`]:
//!
//! | Family | `expected_of` | `cdf` | `ppf` |
//! |---|---|---|---|
//! | deterministic | point evaluation | step at the demand | the demand |
//! | normal | adaptive quadrature on `[0, inf)` plus `payoff(0) * P(D <= 0)` | `Phi` evaluated at `max(x, 0)` | `max(mu + sigma * Phi^-1(p), 0)` |
//! | uniform | adaptive quadrature on `[low, high]` | clamped linear ramp | linear interpolation |
//! | discrete | exact weighted sum | cumulative mass of support `<= x` | smallest support value reaching `p` |
//!
//! Negative normal demand is not physical: its probability mass is collapsed
//! onto `d = 0`, so `cdf(x)` for `x <= 0` returns `Phi(-mu / sigma)` rather than 0.
//! A normal model with `sigma <= EPS` or a uniform model with `high - low <= EPS`
//! degrades to a point mass and never divides by the spread.
//!
//! Expected sales and expected demand under normal demand are memoized (see
//! [`normal`]) because chart sweeps re-evaluate them for identical arguments.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{ContractError, ensure_non_negative};
use crate::math::{EPS, QuadratureSettings, integrate, linspace, normal_cdf, normal_inv_cdf};

pub mod builder;
pub mod normal;

pub use builder::{DemandSpec, RawDemandInputs, demand_model_from_raw, parse_float_list};
pub use normal::{normal_expected_demand, normal_expected_sales};

/// Percentile used to bound the display range of unbounded distributions.
pub const DISPLAY_QUANTILE: f64 = 0.995;

/// Absolute tolerance on the probability sum of discrete input.
pub const PROBABILITY_SUM_TOLERANCE: f64 = 1e-4;

/// Distribution family tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionKind {
    Deterministic,
    Normal,
    Uniform,
    Discrete,
}

impl DistributionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deterministic => "deterministic",
            Self::Normal => "normal",
            Self::Uniform => "uniform",
            Self::Discrete => "discrete",
        }
    }
}

impl std::str::FromStr for DistributionKind {
    type Err = ContractError;

    /// Accepts the bare family names and the dashboard labels
    /// (`"Normal Distribution"`), case-insensitively.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let family = normalized
            .strip_suffix(" distribution")
            .unwrap_or(&normalized);
        match family {
            "deterministic" => Ok(Self::Deterministic),
            "normal" => Ok(Self::Normal),
            "uniform" => Ok(Self::Uniform),
            "discrete" => Ok(Self::Discrete),
            _ => Err(ContractError::UnsupportedDistribution(value.to_string())),
        }
    }
}

/// Finite support with aligned probabilities.
///
/// Support values are strictly increasing and probabilities sum to one; both
/// are established by [`DemandModel::discrete`].
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteSupport {
    demands: Vec<f64>,
    probabilities: Vec<f64>,
    cumulative: Vec<f64>,
}

impl DiscreteSupport {
    pub fn demands(&self) -> &[f64] {
        &self.demands
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Running sum of probabilities; the last entry is exactly 1.
    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    pub fn len(&self) -> usize {
        self.demands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.demands.is_empty()
    }
}

/// Parameters of each supported distribution family.
#[derive(Debug, Clone, PartialEq)]
pub enum Distribution {
    Deterministic { demand: f64 },
    Normal { mean: f64, std: f64 },
    Uniform { low: f64, high: f64 },
    Discrete(DiscreteSupport),
}

/// Expected inventory figures for a single order quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandMetrics {
    /// `E[min(Q, D)]`.
    pub expected_sales: f64,
    /// `E[D]`.
    pub expected_demand: f64,
    /// `max(Q - E[sales], 0)`.
    pub expected_leftover: f64,
    /// `max(E[D] - E[sales], 0)`.
    pub expected_unmet: f64,
    /// `E[sales] / E[D]`, 1 when expected demand is zero.
    pub service_level: f64,
    /// `1 - cdf(Q)`.
    pub stockout_probability: f64,
}

/// Immutable demand model. Construct through the validating factories.
///
/// # Examples
/// ```
/// use contractlab::demand::DemandModel;
///
/// let model = DemandModel::uniform(60.0, 140.0).unwrap();
/// let m = model.metrics(100.0).unwrap();
/// assert!((m.expected_sales - 90.0).abs() < 1e-9);
/// assert!((model.cdf(100.0) - 0.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DemandModel {
    distribution: Distribution,
}

impl DemandModel {
    /// Point demand.
    pub fn deterministic(demand: f64) -> Result<Self, ContractError> {
        ensure_non_negative("demand", demand)?;
        Ok(Self::from_distribution(Distribution::Deterministic { demand }))
    }

    /// Normal demand truncated at zero. `std == 0` yields a point mass at `mean`.
    pub fn normal(mean: f64, std: f64) -> Result<Self, ContractError> {
        ensure_non_negative("demand mean", mean)?;
        ensure_non_negative("demand standard deviation", std)?;
        Ok(Self::from_distribution(Distribution::Normal { mean, std }))
    }

    /// Uniform demand on `[low, high]`.
    pub fn uniform(low: f64, high: f64) -> Result<Self, ContractError> {
        ensure_non_negative("uniform lower bound", low)?;
        ensure_non_negative("uniform upper bound", high)?;
        if high < low {
            return Err(ContractError::InvalidInput(
                "uniform upper bound must be greater than or equal to lower bound".to_string(),
            ));
        }
        Ok(Self::from_distribution(Distribution::Uniform { low, high }))
    }

    /// Discrete demand. Duplicate support values are merged by summing their
    /// probabilities, then the result is sorted and renormalized.
    ///
    /// # Errors
    /// Returns [`ContractError::InvalidInput`] when the inputs are empty, of
    /// different lengths, contain negative or non-finite values, or when the
    /// probabilities do not sum to 1 within [`PROBABILITY_SUM_TOLERANCE`].
    pub fn discrete(demands: &[f64], probabilities: &[f64]) -> Result<Self, ContractError> {
        if demands.is_empty() || probabilities.is_empty() {
            return Err(ContractError::InvalidInput(
                "discrete demand values and probabilities cannot be empty".to_string(),
            ));
        }
        if demands.len() != probabilities.len() {
            return Err(ContractError::InvalidInput(
                "discrete demand values and probabilities must have the same length".to_string(),
            ));
        }
        if demands.iter().chain(probabilities).any(|v| !v.is_finite()) {
            return Err(ContractError::InvalidInput(
                "discrete inputs must be finite numbers".to_string(),
            ));
        }
        if demands.iter().any(|&d| d < 0.0) {
            return Err(ContractError::InvalidInput(
                "discrete demand values cannot be negative".to_string(),
            ));
        }
        if probabilities.iter().any(|&p| p < 0.0) {
            return Err(ContractError::InvalidInput(
                "probabilities cannot be negative".to_string(),
            ));
        }
        let total: f64 = probabilities.iter().sum();
        // Same closeness test as numpy.isclose(total, 1.0, atol=1e-4).
        if (total - 1.0).abs() > PROBABILITY_SUM_TOLERANCE + 1e-5 {
            return Err(ContractError::InvalidInput(format!(
                "probabilities must sum to 1, current sum: {total:.4}"
            )));
        }

        let mut pairs: Vec<(f64, f64)> = demands
            .iter()
            .copied()
            .zip(probabilities.iter().copied())
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut condensed: Vec<(f64, f64)> = Vec::with_capacity(pairs.len());
        for (demand, probability) in pairs {
            match condensed.last_mut() {
                Some((last, mass)) if *last == demand => *mass += probability,
                _ => condensed.push((demand, probability)),
            }
        }

        let mass: f64 = condensed.iter().map(|(_, p)| p).sum();
        let norm = mass.max(EPS);
        let (demands, probabilities): (Vec<f64>, Vec<f64>) =
            condensed.into_iter().map(|(d, p)| (d, p / norm)).unzip();

        let mut running = 0.0;
        let mut cumulative: Vec<f64> = probabilities
            .iter()
            .map(|p| {
                running += p;
                running
            })
            .collect();
        if let Some(last) = cumulative.last_mut() {
            *last = 1.0;
        }

        Ok(Self::from_distribution(Distribution::Discrete(DiscreteSupport {
            demands,
            probabilities,
            cumulative,
        })))
    }

    fn from_distribution(distribution: Distribution) -> Self {
        debug!(?distribution, "demand model constructed");
        Self { distribution }
    }

    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    pub fn kind(&self) -> DistributionKind {
        match self.distribution {
            Distribution::Deterministic { .. } => DistributionKind::Deterministic,
            Distribution::Normal { .. } => DistributionKind::Normal,
            Distribution::Uniform { .. } => DistributionKind::Uniform,
            Distribution::Discrete(_) => DistributionKind::Discrete,
        }
    }

    /// `false` only for deterministic demand; risk metrics are reported otherwise.
    pub fn is_random(&self) -> bool {
        !matches!(self.distribution, Distribution::Deterministic { .. })
    }

    /// The fixed demand of a deterministic model.
    pub fn point_demand(&self) -> Option<f64> {
        match self.distribution {
            Distribution::Deterministic { demand } => Some(demand),
            _ => None,
        }
    }

    /// `E[payoff(D)]`.
    ///
    /// # Errors
    /// Returns [`ContractError::IntegrationFailure`] when quadrature does not
    /// converge; no partial value is returned.
    pub fn expected_of<F>(&self, payoff: F) -> Result<f64, ContractError>
    where
        F: Fn(f64) -> f64,
    {
        self.expected_of_with_kinks(payoff, &[])
    }

    /// `E[payoff(D)]` for a payoff that is only piecewise smooth.
    ///
    /// `kinks` are the demand values where `payoff` or its slope jumps. The
    /// continuous models split their integration range there; deterministic
    /// and discrete models ignore them.
    ///
    /// # Errors
    /// Same conditions as [`DemandModel::expected_of`].
    ///
    /// # Examples
    /// ```
    /// use contractlab::demand::DemandModel;
    ///
    /// let model = DemandModel::normal(50.0, 1.0e4).unwrap();
    /// let sales = model.expected_of_with_kinks(|d| d.min(50.0), &[50.0]).unwrap();
    /// let cached = model.metrics(50.0).unwrap().expected_sales;
    /// assert!((sales - cached).abs() < 1e-6 * cached);
    /// ```
    pub fn expected_of_with_kinks<F>(&self, payoff: F, kinks: &[f64]) -> Result<f64, ContractError>
    where
        F: Fn(f64) -> f64,
    {
        let settings = QuadratureSettings::default();
        match &self.distribution {
            Distribution::Deterministic { demand } => Ok(payoff(*demand)),
            Distribution::Normal { mean, std } => {
                if *std <= EPS {
                    return Ok(payoff(mean.max(0.0)));
                }
                Ok(normal::truncated_expectation(&payoff, *mean, *std, kinks, &settings)?)
            }
            Distribution::Uniform { low, high } => {
                if (high - low).abs() <= EPS {
                    return Ok(payoff(*low));
                }
                let density = 1.0 / (high - low);
                let mut knots = vec![*low];
                knots.extend(kinks.iter().copied().filter(|&k| k > *low && k < *high));
                knots.push(*high);
                knots.sort_by(f64::total_cmp);
                knots.dedup();

                let mut total = 0.0;
                for pair in knots.windows(2) {
                    let r = integrate(|d| payoff(d) * density, pair[0], pair[1], &settings)?;
                    total += r.value;
                }
                Ok(total)
            }
            Distribution::Discrete(support) => Ok(support
                .demands
                .iter()
                .zip(&support.probabilities)
                .map(|(&d, &p)| payoff(d) * p)
                .sum()),
        }
    }

    /// `E[D]`; memoized for normal demand.
    pub fn expected_demand(&self) -> Result<f64, ContractError> {
        match self.distribution {
            Distribution::Normal { mean, std } => Ok(normal_expected_demand(mean, std)?),
            _ => self.expected_of(|d| d),
        }
    }

    /// `P(D <= x)`.
    pub fn cdf(&self, x: f64) -> f64 {
        match &self.distribution {
            Distribution::Deterministic { demand } => {
                if x >= *demand {
                    1.0
                } else {
                    0.0
                }
            }
            Distribution::Normal { mean, std } => {
                if *std <= EPS {
                    return if x >= mean.max(0.0) { 1.0 } else { 0.0 };
                }
                normal_cdf((x.max(0.0) - mean) / std)
            }
            Distribution::Uniform { low, high } => {
                if x <= *low {
                    0.0
                } else if x >= *high {
                    1.0
                } else {
                    (x - low) / (high - low).max(EPS)
                }
            }
            Distribution::Discrete(support) => {
                let below = support.demands.partition_point(|&d| d <= x);
                if below == 0 {
                    0.0
                } else {
                    support.cumulative[below - 1]
                }
            }
        }
    }

    /// Inverse CDF; `probability` is clamped to `[0, 1]` first.
    pub fn ppf(&self, probability: f64) -> f64 {
        let p = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        match &self.distribution {
            Distribution::Deterministic { demand } => *demand,
            Distribution::Normal { mean, std } => {
                if *std <= EPS {
                    return mean.max(0.0);
                }
                (mean + std * normal_inv_cdf(p)).max(0.0)
            }
            Distribution::Uniform { low, high } => low + p * (high - low),
            Distribution::Discrete(support) => {
                let idx = support
                    .cumulative
                    .partition_point(|&c| c < p)
                    .min(support.demands.len() - 1);
                support.demands[idx]
            }
        }
    }

    /// Expected sales, leftover, unmet demand and service figures for `order_qty`
    /// (negative quantities are treated as zero).
    ///
    /// # Errors
    /// Propagates quadrature failures as [`ContractError::IntegrationFailure`].
    pub fn metrics(&self, order_qty: f64) -> Result<DemandMetrics, ContractError> {
        let order_qty = order_qty.max(0.0);
        let (expected_sales, expected_demand) = match self.distribution {
            Distribution::Normal { mean, std } => (
                normal_expected_sales(mean, std, order_qty)?,
                normal_expected_demand(mean, std)?,
            ),
            _ => (
                self.expected_of_with_kinks(|d| order_qty.min(d), &[order_qty])?,
                self.expected_of(|d| d)?,
            ),
        };

        let service_level = if expected_demand <= EPS {
            1.0
        } else {
            (expected_sales / expected_demand).clamp(0.0, 1.0)
        };

        Ok(DemandMetrics {
            expected_sales,
            expected_demand,
            expected_leftover: (order_qty - expected_sales).max(0.0),
            expected_unmet: (expected_demand - expected_sales).max(0.0),
            service_level,
            stockout_probability: (1.0 - self.cdf(order_qty)).clamp(0.0, 1.0),
        })
    }

    /// Display grid of demand values.
    ///
    /// Continuous families return `n` evenly spaced points; a discrete model with
    /// more than one support value returns the support itself.
    pub fn demand_grid(&self, n: usize) -> Vec<f64> {
        match &self.distribution {
            Distribution::Deterministic { demand } => linspace(0.0, (demand * 2.0).max(1.0), n),
            Distribution::Normal { .. } => {
                linspace(0.0, self.ppf(DISPLAY_QUANTILE).max(1.0), n)
            }
            Distribution::Uniform { low, high } => {
                if (high - low).abs() <= EPS {
                    linspace(0.0, (low * 2.0).max(1.0), n)
                } else {
                    linspace(*low, *high, n)
                }
            }
            Distribution::Discrete(support) => {
                if support.demands.len() == 1 {
                    linspace(0.0, (support.demands[0] * 2.0).max(1.0), n)
                } else {
                    support.demands.clone()
                }
            }
        }
    }

    /// Upper bound for sweep ranges; always at least 1.
    pub fn max_reasonable_demand(&self) -> f64 {
        let upper = match &self.distribution {
            Distribution::Deterministic { demand } => *demand,
            Distribution::Normal { .. } => self.ppf(DISPLAY_QUANTILE),
            Distribution::Uniform { high, .. } => *high,
            Distribution::Discrete(support) => {
                support.demands.iter().copied().fold(f64::NEG_INFINITY, f64::max)
            }
        };
        upper.max(1.0)
    }
}
