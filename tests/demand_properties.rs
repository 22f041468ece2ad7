//! Distribution-level properties checked across all four demand families.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use contractlab::demand::{
    DemandModel, RawDemandInputs, demand_model_from_raw, normal_expected_demand,
    normal_expected_sales,
};
use contractlab::math::{linspace, normal_cdf, normal_pdf};

fn models() -> Vec<(&'static str, DemandModel)> {
    vec![
        ("deterministic", DemandModel::deterministic(100.0).unwrap()),
        ("normal", DemandModel::normal(100.0, 20.0).unwrap()),
        ("normal_near_zero", DemandModel::normal(5.0, 10.0).unwrap()),
        ("uniform", DemandModel::uniform(60.0, 140.0).unwrap()),
        (
            "discrete",
            DemandModel::discrete(&[60.0, 100.0, 140.0], &[0.2, 0.5, 0.3]).unwrap(),
        ),
    ]
}

#[test]
fn cdf_is_non_decreasing_and_bounded() {
    for (name, model) in models() {
        let xs = linspace(-10.0, 400.0, 500);
        let mut previous = 0.0;
        for x in xs {
            let c = model.cdf(x);
            assert!((0.0..=1.0).contains(&c), "{name}: cdf({x}) = {c}");
            assert!(c >= previous, "{name}: cdf decreased at {x}");
            previous = c;
        }
        assert_abs_diff_eq!(model.cdf(model.max_reasonable_demand() * 10.0), 1.0, epsilon = 1e-12);
    }
}

#[test]
fn expectation_of_constant() {
    for (name, model) in models() {
        let value = model.expected_of(|_| 3.5).unwrap();
        assert_relative_eq!(value, 3.5, max_relative = 1e-7);
        assert!(value.is_finite(), "{name}");
    }
}

#[test]
fn metrics_are_consistent() {
    for (name, model) in models() {
        for q in [0.0, 40.0, 100.0, 180.0] {
            let m = model.metrics(q).unwrap();
            assert!(m.expected_sales <= q + 1e-9, "{name}");
            assert!(m.expected_sales <= m.expected_demand + 1e-9, "{name}");
            assert!((0.0..=1.0).contains(&m.service_level), "{name}");
            assert!((0.0..=1.0).contains(&m.stockout_probability), "{name}");
            assert_relative_eq!(
                m.expected_sales + m.expected_leftover,
                q,
                epsilon = 1e-9
            );
        }
    }
}

#[test]
fn truncated_normal_mean_closed_form() {
    // E[max(D, 0)] = mu * Phi(mu/sigma) + sigma * phi(mu/sigma)
    let (mean, std) = (5.0, 10.0);
    let z = mean / std;
    let exact = mean * normal_cdf(z) + std * normal_pdf(z);
    assert_relative_eq!(normal_expected_demand(mean, std).unwrap(), exact, max_relative = 1e-7);

    let model = DemandModel::normal(mean, std).unwrap();
    assert_relative_eq!(
        model.expected_of(|d| d).unwrap(),
        exact,
        max_relative = 1e-7
    );
}

#[test]
fn cached_sales_agree_with_generic_expectation() {
    let model = DemandModel::normal(80.0, 30.0).unwrap();
    for q in [20.0, 80.0, 150.0] {
        let cached = normal_expected_sales(80.0, 30.0, q).unwrap();
        let generic = model.expected_of(|d| q.min(d)).unwrap();
        assert_relative_eq!(cached, generic, max_relative = 1e-7);
    }
}

#[test]
fn sweep_over_order_quantities_is_monotone() {
    let model = DemandModel::normal(100.0, 20.0).unwrap();
    let mut previous = 0.0;
    for q in linspace(0.0, 300.0, 70) {
        let m = model.metrics(q).unwrap();
        assert!(m.expected_sales >= previous - 1e-9);
        previous = m.expected_sales;
    }
    assert_relative_eq!(previous, 100.0, epsilon = 1e-4);
}

#[test]
fn raw_factory_reports_probability_sum() {
    let raw = RawDemandInputs {
        demands: Some("60, 100, 140".to_string()),
        probabilities: Some("0.2, 0.5, 0.2".to_string()),
        ..RawDemandInputs::default()
    };
    let err = demand_model_from_raw("discrete", &raw).unwrap_err();
    assert!(err.to_string().contains("0.9000"), "{err}");

    let mismatch = RawDemandInputs {
        demands: Some("60, 100".to_string()),
        probabilities: Some("1.0".to_string()),
        ..RawDemandInputs::default()
    };
    let err = demand_model_from_raw("discrete", &mismatch).unwrap_err();
    assert!(err.to_string().contains("same length"), "{err}");
}

#[test]
fn kinked_payoff_under_wide_spread_matches_cached_sales() {
    let model = DemandModel::normal(50.0, 1.0e4).unwrap();
    let cached = model.metrics(50.0).unwrap().expected_sales;
    let split = model
        .expected_of_with_kinks(|d| 50.0_f64.min(d), &[50.0])
        .unwrap();
    assert_relative_eq!(split, cached, max_relative = 1e-7);

    let uniform = DemandModel::uniform(0.0, 1.0e6).unwrap();
    // E[min(10, D)] = 10 - 10^2 / (2 * 10^6)
    assert_relative_eq!(
        uniform.metrics(10.0).unwrap().expected_sales,
        10.0 - 100.0 / 2.0e6,
        max_relative = 1e-9
    );
}
