//! Numeric kernels shared by the demand models: standard normal functions,
//! adaptive quadrature, and the bounded memo cache used for repeated integrals.

use statrs::function::erf::{erfc, erfc_inv};

pub mod cache;
pub mod quadrature;

pub use cache::BoundedCache;
pub use quadrature::{
    QuadratureResult, QuadratureSettings, integrate, integrate_to_infinity,
};

/// Tolerance below which a spread, denominator, or demand is treated as zero.
pub const EPS: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub enum MathError {
    /// Adaptive quadrature hit its subdivision cap before meeting tolerance.
    NonConvergence { subdivisions: usize, abs_error: f64 },
    InvalidInput(&'static str),
}

impl std::fmt::Display for MathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonConvergence {
                subdivisions,
                abs_error,
            } => write!(
                f,
                "quadrature did not converge after {subdivisions} subdivisions (error estimate {abs_error:e})"
            ),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

impl std::error::Error for MathError {}

pub fn normal_pdf(x: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal CDF via the complementary error function (full double precision).
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// Inverse standard normal CDF. Returns `-inf`/`+inf` at the endpoints and NaN outside `[0, 1]`.
pub fn normal_inv_cdf(p: f64) -> f64 {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    -std::f64::consts::SQRT_2 * erfc_inv(2.0 * p)
}

/// Clamps `value` into `[low, high]` without panicking when `low > high`.
#[inline]
pub fn clamp(value: f64, low: f64, high: f64) -> f64 {
    low.max(value.min(high))
}

/// `n` evenly spaced points over `[start, end]`, endpoints included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}
