use crate::models::{CommandStatus, Diff, GateConfig, GateResult, Report};
use crate::text::format_number;

/// Applies the configured policies and collects failure reasons.
///
/// Reasons are appended in a fixed order: command status, scenario failures,
/// absolute score, score drop, metric regressions. The two regression checks
/// only run when both a baseline and a diff are present; without them they
/// are skipped rather than failed.
#[must_use]
pub fn evaluate(
    report: &Report,
    baseline: Option<&Report>,
    diff: Option<&Diff>,
    config: &GateConfig,
    command: &CommandStatus,
) -> GateResult {
    let mut reasons = Vec::<String>::new();

    if !command.succeeded() && config.fail_on_command_error {
        reasons.push(format!("command failed (exit {})", command.code));
    }

    let failed_scenario_count = report.failed_scenarios().len();
    if config.fail_on_any_scenario_fail && failed_scenario_count > 0 {
        reasons.push(format!("{failed_scenario_count} scenario(s) failed"));
    }

    let score = report.summary.score;
    if let Some(min_score) = config.min_score
        && score < min_score
    {
        reasons.push(format!(
            "score below min_score ({} < {})",
            format_number(score),
            format_number(min_score)
        ));
    }

    if let (Some(baseline), Some(diff)) = (baseline, diff) {
        if let Some(max_drop) = config.max_score_drop {
            let drop = baseline.summary.score - score;
            if drop > max_drop {
                reasons.push(format!(
                    "score drop exceeded max_score_drop ({} > {})",
                    format_number(drop),
                    format_number(max_drop)
                ));
            }
        }

        for threshold in &config.max_metric_regressions {
            let Some(delta) = diff.metric_delta(&threshold.key) else {
                continue;
            };
            if delta > threshold.max_increase {
                reasons.push(format!(
                    "metric regression: {} increased by {} (threshold {})",
                    threshold.key,
                    format_number(delta),
                    format_number(threshold.max_increase)
                ));
            }
        }
    }

    GateResult::from_reasons(reasons, failed_scenario_count)
}

#[cfg(test)]
mod tests;
