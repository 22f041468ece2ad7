//! Zero-truncated normal expectations and their memo caches.
//!
//! Demand below zero is collapsed onto `d = 0`:
//! `E[g(D)] = int_0^inf g(d) f(d) dd + g(0) * Phi(-mu / sigma)`.
//!
//! The integral is split at `mu +/- 10 sigma` (clipped at zero) so the adaptive
//! rule starts on the bulk of the density, and the upper tail is integrated on
//! the mapped semi-infinite range.
//!
//! `E[min(Q, D)]` and `E[D]` are requested for identical `(mu, sigma, Q)`
//! triples many times during a chart sweep. Both are memoized in process-wide
//! LRU caches keyed on the exact bit patterns of their arguments; the cached
//! value is a pure function of the key, so concurrent callers can only race on
//! performance, never on results.

use std::sync::{Mutex, OnceLock, PoisonError};

use tracing::trace;

use crate::math::cache::{BoundedCache, float_key};
use crate::math::{
    EPS, MathError, QuadratureSettings, integrate, integrate_to_infinity, normal_cdf, normal_pdf,
};

/// Capacity of the expected-sales cache.
pub const SALES_CACHE_CAPACITY: usize = 4096;
/// Capacity of the expected-demand cache.
pub const DEMAND_CACHE_CAPACITY: usize = 1024;

const BULK_WIDTH_SIGMAS: f64 = 10.0;

type SalesCache = BoundedCache<[u64; 3], f64>;
type DemandCache = BoundedCache<[u64; 2], f64>;

static SALES_CACHE: OnceLock<Mutex<SalesCache>> = OnceLock::new();
static DEMAND_CACHE: OnceLock<Mutex<DemandCache>> = OnceLock::new();

fn sales_cache() -> &'static Mutex<SalesCache> {
    SALES_CACHE.get_or_init(|| Mutex::new(BoundedCache::new(SALES_CACHE_CAPACITY)))
}

fn demand_cache() -> &'static Mutex<DemandCache> {
    DEMAND_CACHE.get_or_init(|| Mutex::new(BoundedCache::new(DEMAND_CACHE_CAPACITY)))
}

/// `int_0^inf g(d) f(d) dd` for the normal density `f` with the given moments.
fn integrate_over_support<F>(
    payoff: &F,
    mean: f64,
    std: f64,
    breakpoints: &[f64],
    settings: &QuadratureSettings,
) -> Result<f64, MathError>
where
    F: Fn(f64) -> f64,
{
    let integrand = |d: f64| {
        let density = normal_pdf((d - mean) / std) / std;
        if density == 0.0 { 0.0 } else { payoff(d) * density }
    };

    let lower = (mean - BULK_WIDTH_SIGMAS * std).max(0.0);
    let upper = (mean + BULK_WIDTH_SIGMAS * std).max(lower);

    let mut knots = Vec::with_capacity(breakpoints.len() + 2);
    knots.push(lower);
    knots.extend(
        breakpoints
            .iter()
            .copied()
            .filter(|&b| b > lower && b < upper),
    );
    knots.push(upper);
    knots.sort_by(f64::total_cmp);
    knots.dedup();

    let mut total = 0.0;
    if lower > 0.0 {
        total += integrate(integrand, 0.0, lower, settings)?.value;
    }
    for pair in knots.windows(2) {
        total += integrate(integrand, pair[0], pair[1], settings)?.value;
    }
    total += integrate_to_infinity(integrand, upper, settings)?.value;
    Ok(total)
}

/// `E[payoff(D)]` for zero-truncated normal demand with `std > EPS`.
///
/// `breakpoints` are optional kinks of `payoff` used to split the bulk interval.
pub(crate) fn truncated_expectation<F>(
    payoff: &F,
    mean: f64,
    std: f64,
    breakpoints: &[f64],
    settings: &QuadratureSettings,
) -> Result<f64, MathError>
where
    F: Fn(f64) -> f64,
{
    let negative_mass = normal_cdf(-mean / std);
    let integral = integrate_over_support(payoff, mean, std, breakpoints, settings)?;
    Ok(integral + payoff(0.0) * negative_mass)
}

/// Memoized `E[min(Q, D)]` for zero-truncated normal demand.
///
/// Negative `order_qty` is treated as zero. With `std <= EPS` this is
/// `min(max(mean, 0), Q)`.
///
/// # Errors
/// Returns [`MathError::NonConvergence`] when quadrature fails; failures are not cached.
pub fn normal_expected_sales(mean: f64, std: f64, order_qty: f64) -> Result<f64, MathError> {
    let order_qty = order_qty.max(0.0);
    if std <= EPS {
        return Ok(mean.max(0.0).min(order_qty));
    }

    let key = float_key([mean, std, order_qty]);
    if let Some(hit) = sales_cache()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        trace!(mean, std, order_qty, "expected sales cache hit");
        return Ok(hit);
    }

    let settings = QuadratureSettings::default();
    let value = integrate_over_support(
        &|d: f64| order_qty.min(d),
        mean,
        std,
        &[order_qty],
        &settings,
    )?;

    sales_cache()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(key, value);
    Ok(value)
}

/// Memoized `E[D]` for zero-truncated normal demand.
///
/// # Errors
/// Returns [`MathError::NonConvergence`] when quadrature fails; failures are not cached.
pub fn normal_expected_demand(mean: f64, std: f64) -> Result<f64, MathError> {
    if std <= EPS {
        return Ok(mean.max(0.0));
    }

    let key = float_key([mean, std]);
    if let Some(hit) = demand_cache()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        trace!(mean, std, "expected demand cache hit");
        return Ok(hit);
    }

    let settings = QuadratureSettings::default();
    let value = integrate_over_support(&|d: f64| d, mean, std, &[], &settings)?;

    demand_cache()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(key, value);
    Ok(value)
}

/// Current number of memoized `(expected sales, expected demand)` entries.
pub fn normal_cache_len() -> (usize, usize) {
    let sales = sales_cache().lock().unwrap_or_else(PoisonError::into_inner).len();
    let demand = demand_cache().lock().unwrap_or_else(PoisonError::into_inner).len();
    (sales, demand)
}
