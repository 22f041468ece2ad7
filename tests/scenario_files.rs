//! Scenario documents shipped under `demos/` load and evaluate end to end.

use std::path::PathBuf;

use approx::assert_relative_eq;
use contractlab::core::{
    ContractKind, ContractReport, MetricKey, Scenario, from_json, load_scenario, to_json_pretty,
};

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

fn evaluate(name: &str) -> ContractReport {
    load_scenario(demo(name))
        .expect("scenario load failed")
        .evaluate()
        .expect("evaluation failed")
}

#[test]
fn all_demos_evaluate() {
    let cases = [
        ("wholesale_normal.json", ContractKind::Wholesale),
        ("buyback_deterministic.json", ContractKind::Buyback),
        ("revenue_sharing_uniform.json", ContractKind::RevenueSharing),
        ("option_discrete.json", ContractKind::Option),
        (
            "quantity_flexibility_normal.json",
            ContractKind::QuantityFlexibility,
        ),
    ];
    for (file, kind) in cases {
        let report = evaluate(file);
        assert_eq!(report.contract, kind, "{file}");
        assert!(!report.decision.is_empty(), "{file}");
        assert!(!report.financial.is_empty(), "{file}");
    }
}

#[test]
fn buyback_demo_reproduces_reference_split() {
    let report = evaluate("buyback_deterministic.json");
    assert_eq!(report.value(MetricKey::RetailerProfit), Some(3300.0));
    assert_eq!(report.value(MetricKey::ManufacturerProfit), Some(8700.0));
    assert_eq!(report.value(MetricKey::TotalProfit), Some(2500.0));
}

#[test]
fn option_demo_uses_condensed_discrete_support() {
    // E[min(D, 100)] = 0.2*60 + 0.8*100 = 92, E[D] = 104
    let report = evaluate("option_discrete.json");
    assert_relative_eq!(
        report.value(MetricKey::QuantityExercised).unwrap(),
        92.0,
        epsilon = 1e-12
    );
    assert_relative_eq!(
        report.value(MetricKey::TotalCost).unwrap(),
        1200.0 + 92.0 * 95.0 + 12.0 * 110.0,
        epsilon = 1e-9
    );
    assert_relative_eq!(
        report.value(MetricKey::SpotOnlyCost).unwrap(),
        104.0 * 110.0,
        epsilon = 1e-9
    );
}

#[test]
fn report_serializes_to_json() {
    let report = evaluate("wholesale_normal.json");
    let json = to_json_pretty(&report).expect("json serialization");
    assert!(json.contains("\"expected_profit\""));
    assert!(json.contains("\"Profit vs Order Quantity\""));
    let decoded: ContractReport = from_json(&json).expect("json deserialization");
    assert_eq!(decoded.contract, ContractKind::Wholesale);
    assert_eq!(decoded.decision.len(), report.decision.len());
}

#[test]
fn scenario_roundtrip_keeps_defaults_implicit() {
    let scenario: Scenario = from_json(
        r#"{"contract":{"contract":"buyback"},"demand":{"distribution":"normal","mean":100.0,"std":20.0}}"#,
    )
    .expect("json deserialization");
    let json = to_json_pretty(&scenario).expect("json serialization");
    assert!(!json.contains("production_cost"));
    let decoded: Scenario = from_json(&json).expect("json deserialization");
    assert_eq!(decoded, scenario);
}
