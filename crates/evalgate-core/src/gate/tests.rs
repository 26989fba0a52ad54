use serde_json::json;

use super::*;
use crate::diff::compute_diff;
use crate::models::MetricThreshold;
use crate::test_support::{plain_report, report};

fn evaluate_with(
    current: &Report,
    baseline: Option<&Report>,
    config: &GateConfig,
    command: &CommandStatus,
) -> GateResult {
    let diff = compute_diff(current, baseline);
    evaluate(current, baseline, diff.as_ref(), config, command)
}

#[test]
fn clean_run_without_baseline_passes() {
    let current = plain_report(1.0);
    let result = evaluate_with(
        &current,
        None,
        &GateConfig::default(),
        &CommandStatus::success(),
    );
    assert!(result.passed);
    assert!(result.reasons.is_empty());
    assert_eq!(result.failed_scenario_count, 0);
}

#[test]
fn single_failed_scenario_fails_with_default_config() {
    let current = report(1.0, &[("a", false)], json!({}));
    let result = evaluate_with(
        &current,
        None,
        &GateConfig::default(),
        &CommandStatus::success(),
    );
    assert!(!result.passed);
    assert_eq!(result.reasons, vec!["1 scenario(s) failed".to_string()]);
}

#[test]
fn failed_count_is_reported_when_scenario_check_disabled() {
    let current = report(1.0, &[("a", false), ("b", true), ("c", false)], json!({}));
    let config = GateConfig {
        fail_on_any_scenario_fail: false,
        ..GateConfig::default()
    };
    let result = evaluate_with(&current, None, &config, &CommandStatus::success());
    assert!(result.passed);
    assert_eq!(result.failed_scenario_count, 2);
}

#[test]
fn command_failure_respects_flag() {
    let current = plain_report(1.0);
    let failed = CommandStatus::exited(3);

    let result = evaluate_with(&current, None, &GateConfig::default(), &failed);
    assert_eq!(result.reasons, vec!["command failed (exit 3)".to_string()]);

    let lenient = GateConfig {
        fail_on_command_error: false,
        ..GateConfig::default()
    };
    let result = evaluate_with(&current, None, &lenient, &failed);
    assert!(result.passed);
}

#[test]
fn min_score_boundary_is_inclusive() {
    let config = GateConfig {
        min_score: Some(0.95),
        ..GateConfig::default()
    };
    let at_boundary = evaluate_with(
        &plain_report(0.95),
        None,
        &config,
        &CommandStatus::success(),
    );
    assert!(at_boundary.passed);

    let below = evaluate_with(
        &plain_report(0.9),
        None,
        &config,
        &CommandStatus::success(),
    );
    assert_eq!(
        below.reasons,
        vec!["score below min_score (0.9 < 0.95)".to_string()]
    );
}

#[test]
fn score_drop_without_baseline_is_informational() {
    let config = GateConfig {
        max_score_drop: Some(0.02),
        ..GateConfig::default()
    };
    for score in [0.0, 0.5, 1.0] {
        let result = evaluate_with(
            &plain_report(score),
            None,
            &config,
            &CommandStatus::success(),
        );
        assert!(
            result.reasons.iter().all(|reason| !reason.contains("score drop")),
            "{:?}",
            result.reasons
        );
    }
}

#[test]
fn score_drop_beyond_threshold_fails() {
    let config = GateConfig {
        max_score_drop: Some(0.02),
        ..GateConfig::default()
    };
    let baseline = plain_report(0.90);
    let result = evaluate_with(
        &plain_report(0.85),
        Some(&baseline),
        &config,
        &CommandStatus::success(),
    );
    assert!(!result.passed);
    assert_eq!(result.reasons.len(), 1);
    assert!(
        result.reasons[0].contains("score drop exceeded max_score_drop (0.050000000000000044 > 0.02)"),
        "{}",
        result.reasons[0]
    );
}

#[test]
fn score_drop_requires_diff_as_well_as_baseline() {
    let config = GateConfig {
        max_score_drop: Some(0.0),
        ..GateConfig::default()
    };
    let baseline = plain_report(1.0);
    let current = plain_report(0.1);
    let result = evaluate(
        &current,
        Some(&baseline),
        None,
        &config,
        &CommandStatus::success(),
    );
    assert!(result.passed);
}

#[test]
fn metric_regressions_follow_configured_order_and_skip_missing_deltas() {
    let config = GateConfig {
        max_metric_regressions: vec![
            MetricThreshold {
                key: "latency_ms".to_string(),
                max_increase: 10.0,
            },
            MetricThreshold {
                key: "new_metric".to_string(),
                max_increase: 0.0,
            },
            MetricThreshold {
                key: "cost_usd".to_string(),
                max_increase: 0.5,
            },
        ],
        ..GateConfig::default()
    };
    let baseline = report(
        1.0,
        &[("a", true)],
        json!({ "cost_usd": 1.0, "latency_ms": 100 }),
    );
    let current = report(
        1.0,
        &[("a", true)],
        json!({ "cost_usd": 2.0, "latency_ms": 125, "new_metric": 99 }),
    );
    let result = evaluate_with(
        &current,
        Some(&baseline),
        &config,
        &CommandStatus::success(),
    );
    assert_eq!(
        result.reasons,
        vec![
            "metric regression: latency_ms increased by 25 (threshold 10)".to_string(),
            "metric regression: cost_usd increased by 1 (threshold 0.5)".to_string(),
        ]
    );
}

#[test]
fn metric_at_threshold_passes() {
    let config = GateConfig {
        max_metric_regressions: vec![MetricThreshold {
            key: "errors".to_string(),
            max_increase: 2.0,
        }],
        ..GateConfig::default()
    };
    let baseline = report(1.0, &[], json!({ "errors": 1 }));
    let current = report(1.0, &[], json!({ "errors": 3 }));
    let result = evaluate_with(
        &current,
        Some(&baseline),
        &config,
        &CommandStatus::success(),
    );
    assert!(result.passed);
}

#[test]
fn reasons_keep_fixed_evaluation_order() {
    let config = GateConfig {
        fail_on_command_error: true,
        fail_on_any_scenario_fail: true,
        min_score: Some(0.9),
        max_score_drop: Some(0.1),
        max_metric_regressions: vec![MetricThreshold {
            key: "latency_ms".to_string(),
            max_increase: 0.0,
        }],
    };
    let baseline = report(1.0, &[("a", true)], json!({ "latency_ms": 1 }));
    let current = report(0.5, &[("a", false)], json!({ "latency_ms": 2 }));
    let result = evaluate_with(&current, Some(&baseline), &config, &CommandStatus::exited(1));
    assert_eq!(
        result.reasons,
        vec![
            "command failed (exit 1)".to_string(),
            "1 scenario(s) failed".to_string(),
            "score below min_score (0.5 < 0.9)".to_string(),
            "score drop exceeded max_score_drop (0.5 > 0.1)".to_string(),
            "metric regression: latency_ms increased by 1 (threshold 0)".to_string(),
        ]
    );
    assert_eq!(result.failed_scenario_count, 1);
}
