use crate::models::{Diff, MetricDelta, Report};

/// Pointwise comparison of a report against its baseline.
///
/// Metric keys are kept only when both sides hold a JSON number, so a metric
/// that was just introduced or retired never shows up as a delta.
#[must_use]
pub fn compute_diff(report: &Report, baseline: Option<&Report>) -> Option<Diff> {
    let baseline = baseline?;

    let metric_deltas = metric_key_union(report, baseline)
        .into_iter()
        .filter_map(|key| {
            let current = report.metric(key)?;
            let previous = baseline.metric(key)?;
            Some(MetricDelta {
                key: key.to_string(),
                current,
                baseline: previous,
                delta: current - previous,
            })
        })
        .collect();

    Some(Diff {
        score_delta: report.summary.score - baseline.summary.score,
        metric_deltas,
    })
}

fn metric_key_union<'a>(report: &'a Report, baseline: &'a Report) -> Vec<&'a str> {
    let mut keys = report
        .metrics
        .keys()
        .map(String::as_str)
        .collect::<Vec<_>>();
    for key in baseline.metrics.keys() {
        if !report.metrics.contains_key(key) {
            keys.push(key.as_str());
        }
    }
    keys
}
