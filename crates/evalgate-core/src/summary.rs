use std::cmp::Ordering;
use std::fmt::Write as _;

use crate::models::{Diff, GateConfig, GateResult, MetricDelta, Report, ReportLink, Scenario};
use crate::text::{format_display_number, format_signed_delta, single_line, truncate_text};

/// Hidden marker that identifies a rendered summary inside a PR comment.
pub const SUMMARY_MARKER: &str = "<!-- evalgate:summary -->";

pub const MAX_METRIC_ROWS: usize = 5;
pub const MAX_WORST_SCENARIOS: usize = 5;
pub const MAX_NOTE_CHARS: usize = 140;

#[derive(Debug, Clone, Copy)]
pub struct SummaryInput<'a> {
    pub title: &'a str,
    pub gate: &'a GateResult,
    pub report: &'a Report,
    pub baseline: Option<&'a Report>,
    pub diff: Option<&'a Diff>,
    pub config: &'a GateConfig,
    pub artifact_label: Option<&'a str>,
    pub report_label: &'a str,
    pub extra_links: &'a [ReportLink],
}

/// Renders the markdown summary. Output depends only on the input.
#[must_use]
pub fn render_summary(input: &SummaryInput<'_>) -> String {
    let mut out = String::new();
    out.push_str(SUMMARY_MARKER);
    out.push('\n');
    write_status_header(&mut out, input);
    write_score_block(&mut out, input);
    if !input.gate.passed {
        write_failure_reasons(&mut out, input.gate);
    }
    write_baseline_comparison(&mut out, input);
    write_worst_scenarios(&mut out, input.report);
    write_artifact_line(&mut out, input);
    write_links_line(&mut out, input);
    out
}

fn write_line(out: &mut String, args: std::fmt::Arguments<'_>) {
    let _ = out.write_fmt(args);
}

fn write_section_header(out: &mut String, title: &str) {
    write_line(out, format_args!("\n### {title}\n\n"));
}

fn write_status_header(out: &mut String, input: &SummaryInput<'_>) {
    let (icon, verdict) = if input.gate.passed {
        ("\u{2705}", "passed")
    } else {
        ("\u{274C}", "failed")
    };
    write_line(
        out,
        format_args!("## {icon} {}: {verdict}\n\n", single_line(input.title)),
    );
}

fn write_score_block(out: &mut String, input: &SummaryInput<'_>) {
    let report = input.report;
    let total = report.total_scenarios();
    let failed = input.gate.failed_scenario_count as u64;
    let passed = total.saturating_sub(failed);
    write_line(
        out,
        format_args!(
            "- score: `{}`\n",
            format_display_number(report.summary.score)
        ),
    );
    write_line(
        out,
        format_args!(
            "- scenarios: `{total}` total, `{passed}` passed, `{failed}` failed\n"
        ),
    );
    if let Some(min_score) = input.config.min_score {
        write_line(
            out,
            format_args!("- min_score: `{}`\n", format_display_number(min_score)),
        );
    }
}

fn write_failure_reasons(out: &mut String, gate: &GateResult) {
    write_section_header(out, "Failure reasons");
    for reason in &gate.reasons {
        write_line(out, format_args!("- {reason}\n"));
    }
}

fn write_baseline_comparison(out: &mut String, input: &SummaryInput<'_>) {
    write_section_header(out, "Baseline comparison");
    let (Some(diff), Some(baseline)) = (input.diff, input.baseline) else {
        out.push_str("- baseline not found; regression checks skipped\n");
        return;
    };

    write_line(
        out,
        format_args!(
            "- score delta: `{}` (baseline `{}`",
            format_signed_delta(diff.score_delta),
            format_display_number(baseline.summary.score)
        ),
    );
    if let Some(max_drop) = input.config.max_score_drop {
        write_line(
            out,
            format_args!(", max drop `{}`", format_display_number(max_drop)),
        );
    }
    out.push_str(")\n");

    if diff.metric_deltas.is_empty() {
        out.push_str("- no metrics present on both sides\n");
        return;
    }

    let rows = top_metric_rows(&diff.metric_deltas);
    out.push('\n');
    out.push_str("| metric | current | baseline | delta | threshold |\n");
    out.push_str("|---|---:|---:|---:|---:|\n");
    for row in &rows {
        let threshold = input
            .config
            .max_metric_regressions
            .iter()
            .find(|threshold| threshold.key == row.key)
            .map_or_else(
                || "-".to_string(),
                |threshold| format_display_number(threshold.max_increase),
            );
        write_line(
            out,
            format_args!(
                "| `{}` | {} | {} | {} | {threshold} |\n",
                single_line(&row.key),
                format_display_number(row.current),
                format_display_number(row.baseline),
                format_signed_delta(row.delta)
            ),
        );
    }
    if diff.metric_deltas.len() > rows.len() {
        write_line(
            out,
            format_args!(
                "\n_showing {} of {} changed metrics by magnitude_\n",
                rows.len(),
                diff.metric_deltas.len()
            ),
        );
    }
}

/// Largest absolute deltas first; ties keep report order.
fn top_metric_rows(deltas: &[MetricDelta]) -> Vec<&MetricDelta> {
    let mut rows = deltas.iter().collect::<Vec<_>>();
    rows.sort_by(|a, b| b.delta.abs().total_cmp(&a.delta.abs()));
    rows.truncate(MAX_METRIC_ROWS);
    rows
}

fn write_worst_scenarios(out: &mut String, report: &Report) {
    write_section_header(out, "Worst scenarios");
    let worst = worst_scenarios(report);
    if worst.is_empty() {
        out.push_str("- none\n");
        return;
    }
    for scenario in worst {
        write_line(out, format_args!("- `{}`", single_line(&scenario.id)));
        if let Some(score) = scenario.score {
            write_line(
                out,
                format_args!(" score `{}`", format_display_number(score)),
            );
        }
        if let Some(elapsed_ms) = scenario.elapsed_ms {
            write_line(
                out,
                format_args!(" ({} ms)", format_display_number(elapsed_ms)),
            );
        }
        if let Some(notes) = scenario.notes.as_deref() {
            let notes = single_line(&truncate_text(notes, MAX_NOTE_CHARS));
            if !notes.is_empty() {
                write_line(out, format_args!(": {notes}"));
            }
        }
        out.push('\n');
    }
}

/// Failed scenarios, lowest score first, unscored after scored.
fn worst_scenarios(report: &Report) -> Vec<&Scenario> {
    let mut failed = report.failed_scenarios();
    failed.sort_by(|a, b| match (a.score, b.score) {
        (Some(left), Some(right)) => left.total_cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    failed.truncate(MAX_WORST_SCENARIOS);
    failed
}

fn write_artifact_line(out: &mut String, input: &SummaryInput<'_>) {
    out.push('\n');
    match input.artifact_label {
        Some(artifact) => write_line(
            out,
            format_args!(
                "artifact: `{}` (report `{}`)\n",
                single_line(artifact),
                single_line(input.report_label)
            ),
        ),
        None => write_line(
            out,
            format_args!(
                "artifact: not uploaded (report `{}`)\n",
                single_line(input.report_label)
            ),
        ),
    }
}

fn write_links_line(out: &mut String, input: &SummaryInput<'_>) {
    let links = input
        .report
        .links
        .iter()
        .chain(input.extra_links.iter())
        .map(|link| format!("[{}]({})", single_line(&link.name), link.url.trim()))
        .collect::<Vec<_>>();
    if links.is_empty() {
        return;
    }
    write_line(out, format_args!("links: {}\n", links.join(" \u{b7} ")));
}
