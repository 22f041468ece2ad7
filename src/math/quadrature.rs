//! Globally adaptive Gauss-Kronrod (7/15) quadrature.
//!
//! Each interval is estimated with the 15-point Kronrod rule and its error with
//! the difference to the embedded 7-point Gauss rule. The interval with the
//! largest error is bisected until the summed error meets
//! `max(abs_tol, rel_tol * |I|)` or the subdivision cap is reached.
//!
//! Semi-infinite ranges `[a, inf)` are mapped onto `(0, 1]` with
//! `x = a + (1 - t) / t`, `dx = dt / t^2` (Piessens et al., QUADPACK, 1983).

use tracing::warn;

use super::MathError;

const XGK: [f64; 8] = [
    0.991_455_371_120_812_639_206_854_697_526_329,
    0.949_107_912_342_758_524_526_189_684_047_851,
    0.864_864_423_359_769_072_789_712_788_640_926,
    0.741_531_185_599_394_439_863_864_773_280_788,
    0.586_087_235_467_691_130_294_144_845_693_013,
    0.405_845_151_377_397_166_906_606_412_076_961,
    0.207_784_955_007_898_467_600_689_403_773_245,
    0.0,
];

const WGK: [f64; 8] = [
    0.022_935_322_010_529_224_963_732_008_058_970,
    0.063_092_092_629_978_553_290_700_663_189_204,
    0.104_790_010_322_250_183_839_876_322_541_518,
    0.140_653_259_715_525_918_745_189_590_510_238,
    0.169_004_726_639_267_902_826_583_426_598_550,
    0.190_350_578_064_785_409_913_256_402_421_014,
    0.204_432_940_075_298_892_414_161_999_234_649,
    0.209_482_141_084_727_828_012_999_174_891_714,
];

// Gauss weights for XGK[1], XGK[3], XGK[5] and the centre.
const WG: [f64; 4] = [
    0.129_484_966_168_869_693_270_611_432_679_082,
    0.279_705_391_489_276_667_901_467_771_423_780,
    0.381_830_050_505_118_944_950_369_775_488_975,
    0.417_959_183_673_469_387_755_102_040_816_327,
];

/// Accuracy controls for [`integrate`] and [`integrate_to_infinity`].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QuadratureSettings {
    /// Absolute error target.
    pub abs_tol: f64,
    /// Relative error target.
    pub rel_tol: f64,
    /// Maximum number of intervals kept by the bisection loop.
    pub max_subdivisions: usize,
}

impl Default for QuadratureSettings {
    fn default() -> Self {
        Self {
            abs_tol: 1.49e-8,
            rel_tol: 1.49e-8,
            max_subdivisions: 250,
        }
    }
}

impl QuadratureSettings {
    fn validate(&self) -> Result<(), MathError> {
        if !(self.abs_tol >= 0.0 && self.rel_tol >= 0.0) {
            return Err(MathError::InvalidInput("tolerances must be non-negative"));
        }
        if self.abs_tol == 0.0 && self.rel_tol == 0.0 {
            return Err(MathError::InvalidInput("at least one tolerance must be positive"));
        }
        if self.max_subdivisions == 0 {
            return Err(MathError::InvalidInput("max_subdivisions must be > 0"));
        }
        Ok(())
    }
}

/// Integral estimate with its error bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadratureResult {
    pub value: f64,
    pub abs_error: f64,
    pub subdivisions: usize,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    a: f64,
    b: f64,
    value: f64,
    error: f64,
}

fn kronrod_15<F>(f: &F, a: f64, b: f64) -> Segment
where
    F: Fn(f64) -> f64,
{
    let centre = 0.5 * (a + b);
    let half = 0.5 * (b - a);
    let fc = f(centre);
    let mut res_k = fc * WGK[7];
    let mut res_g = fc * WG[3];

    for j in 0..7 {
        let dx = half * XGK[j];
        let pair = f(centre - dx) + f(centre + dx);
        res_k += WGK[j] * pair;
        if j % 2 == 1 {
            res_g += WG[j / 2] * pair;
        }
    }

    Segment {
        a,
        b,
        value: res_k * half,
        error: ((res_k - res_g) * half).abs(),
    }
}

/// Integrates `f` over the finite interval `[a, b]`.
///
/// # Errors
/// Returns [`MathError::NonConvergence`] when the subdivision cap is reached
/// before the tolerance is met, and [`MathError::InvalidInput`] for invalid
/// settings or non-finite bounds.
///
/// # Examples
/// ```
/// use contractlab::math::{QuadratureSettings, integrate};
///
/// let r = integrate(|x| x * x, 0.0, 3.0, &QuadratureSettings::default()).unwrap();
/// assert!((r.value - 9.0).abs() < 1e-12);
/// ```
pub fn integrate<F>(
    f: F,
    a: f64,
    b: f64,
    settings: &QuadratureSettings,
) -> Result<QuadratureResult, MathError>
where
    F: Fn(f64) -> f64,
{
    settings.validate()?;
    if !a.is_finite() || !b.is_finite() {
        return Err(MathError::InvalidInput("integration bounds must be finite"));
    }
    if a == b {
        return Ok(QuadratureResult {
            value: 0.0,
            abs_error: 0.0,
            subdivisions: 0,
        });
    }
    if b < a {
        let r = integrate(f, b, a, settings)?;
        return Ok(QuadratureResult {
            value: -r.value,
            ..r
        });
    }

    adaptive(&f, a, b, settings)
}

/// Integrates `f` over `[a, inf)`.
///
/// # Errors
/// Same conditions as [`integrate`].
pub fn integrate_to_infinity<F>(
    f: F,
    a: f64,
    settings: &QuadratureSettings,
) -> Result<QuadratureResult, MathError>
where
    F: Fn(f64) -> f64,
{
    settings.validate()?;
    if !a.is_finite() {
        return Err(MathError::InvalidInput("lower bound must be finite"));
    }

    let mapped = |t: f64| {
        if t <= 0.0 {
            return 0.0;
        }
        let x = a + (1.0 - t) / t;
        let fx = f(x);
        if fx == 0.0 { 0.0 } else { fx / (t * t) }
    };
    adaptive(&mapped, 0.0, 1.0, settings)
}

fn adaptive<F>(
    f: &F,
    a: f64,
    b: f64,
    settings: &QuadratureSettings,
) -> Result<QuadratureResult, MathError>
where
    F: Fn(f64) -> f64,
{
    let mut segments = Vec::with_capacity(settings.max_subdivisions.min(1024));
    segments.push(kronrod_15(f, a, b));

    loop {
        let value: f64 = segments.iter().map(|s| s.value).sum();
        let abs_error: f64 = segments.iter().map(|s| s.error).sum();

        if !value.is_finite() {
            return Err(MathError::InvalidInput("integrand produced a non-finite value"));
        }

        let tolerance = settings.abs_tol.max(settings.rel_tol * value.abs());
        if abs_error <= tolerance {
            return Ok(QuadratureResult {
                value,
                abs_error,
                subdivisions: segments.len(),
            });
        }

        if segments.len() >= settings.max_subdivisions {
            warn!(
                subdivisions = segments.len(),
                abs_error, tolerance, "adaptive quadrature hit its subdivision cap"
            );
            return Err(MathError::NonConvergence {
                subdivisions: segments.len(),
                abs_error,
            });
        }

        let worst = segments
            .iter()
            .enumerate()
            .max_by(|(_, l), (_, r)| l.error.total_cmp(&r.error))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let seg = segments.swap_remove(worst);
        let mid = 0.5 * (seg.a + seg.b);

        if mid <= seg.a || mid >= seg.b {
            // Interval can no longer be split in floating point.
            warn!(a = seg.a, b = seg.b, "quadrature interval collapsed to machine precision");
            return Err(MathError::NonConvergence {
                subdivisions: segments.len() + 1,
                abs_error,
            });
        }

        segments.push(kronrod_15(f, seg.a, mid));
        segments.push(kronrod_15(f, mid, seg.b));
    }
}
