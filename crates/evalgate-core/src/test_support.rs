use serde_json::{Value, json};

use crate::models::Report;
use crate::validate::validate_report;

pub(crate) fn report_value(score: f64, scenarios: &[(&str, bool)], metrics: Value) -> Value {
    let scenarios = scenarios
        .iter()
        .map(|(id, passed)| json!({ "id": id, "passed": passed }))
        .collect::<Vec<_>>();
    json!({
        "version": 1,
        "summary": { "score": score, "passed": true },
        "scenarios": scenarios,
        "metrics": metrics
    })
}

pub(crate) fn report(score: f64, scenarios: &[(&str, bool)], metrics: Value) -> Report {
    validate_report(&report_value(score, scenarios, metrics), None).expect("valid test report")
}

pub(crate) fn plain_report(score: f64) -> Report {
    report(score, &[("a", true)], json!({}))
}
