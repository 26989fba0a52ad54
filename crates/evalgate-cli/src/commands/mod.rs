use std::path::Path;

use anyhow::{Context, Result};
use evalgate_core::baseline::{BaselineSettings, DEFAULT_BASELINE_BRANCH, locate_baseline};
use evalgate_core::config::{DEFAULT_ARTIFACT_NAME, DEFAULT_REPORT_PATH};
use evalgate_core::models::{CommandStatus, GateConfig};
use evalgate_core::{
    ErrorPayload, GateError, SummaryInput, compute_diff, evaluate, read_report_file, render_summary,
};
use serde_json::json;

use crate::cli::{Commands, CompareArgs, OutputFormat, ValidateArgs};

mod run;
mod support;


use self::support::{emit_workflow_error, emit_workflow_warning, print_json, print_text};

/// Whether the gate let the change through; maps to the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GateOutcome {
    Passed,
    Failed,
}

impl GateOutcome {
    const fn from_passed(passed: bool) -> Self {
        if passed { Self::Passed } else { Self::Failed }
    }
}

pub(crate) fn run(command: Commands) -> Result<GateOutcome> {
    match command {
        Commands::Run(args) => run::handle_run(&args),
        Commands::Validate(args) => handle_validate(&args),
        Commands::Compare(args) => handle_compare(&args),
    }
}

/// Prints an `::error::` annotation and the structured error payload on stderr.
pub(crate) fn report_fatal(operation: &str, err: &anyhow::Error) {
    let _ = emit_workflow_error(&format!("{err:#}"));
    if let Ok(payload) = serde_json::to_string(&fatal_payload(operation, err)) {
        eprintln!("{payload}");
    }
}

fn fatal_payload(operation: &str, err: &anyhow::Error) -> ErrorPayload {
    match err.downcast_ref::<GateError>() {
        Some(gate_error) => gate_error.to_payload(operation, None),
        None => GateError::Internal(format!("{err:#}")).to_payload(operation, None),
    }
}

fn handle_validate(args: &ValidateArgs) -> Result<GateOutcome> {
    let report = read_report_file(&args.report, None)
        .with_context(|| format!("report {} is not valid", args.report.display()))?;
    print_json(&report)?;
    Ok(GateOutcome::Passed)
}

/// Rendered `compare` document plus the warnings raised while producing it.
struct CompareOutput {
    document: String,
    warnings: Vec<String>,
    outcome: GateOutcome,
}

fn handle_compare(args: &CompareArgs) -> Result<GateOutcome> {
    let output = compare_reports(args)?;
    for warning in &output.warnings {
        emit_workflow_warning(warning)?;
    }
    print_text(&output.document)?;
    Ok(output.outcome)
}

fn compare_reports(args: &CompareArgs) -> Result<CompareOutput> {
    let config = GateConfig::from_inputs(&args.gate.to_inputs())?;
    let report = read_report_file(&args.report, None)
        .with_context(|| format!("report {} is not valid", args.report.display()))?;

    let outcome = locate_baseline(
        &local_baseline_settings(args.baseline.as_deref()),
        None,
    );
    let warnings = outcome.warning.iter().cloned().collect::<Vec<_>>();
    let baseline = outcome.baseline.as_ref();

    let diff = compute_diff(&report, baseline);
    let result = evaluate(
        &report,
        baseline,
        diff.as_ref(),
        &config,
        &CommandStatus::success(),
    );

    let document = match args.format {
        OutputFormat::Markdown => {
            let report_label = args.report.display().to_string();
            render_summary(&SummaryInput {
                title: &args.title,
                gate: &result,
                report: &report,
                baseline,
                diff: diff.as_ref(),
                config: &config,
                artifact_label: None,
                report_label: &report_label,
                extra_links: &[],
            })
        }
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "result": result,
            "score": report.summary.score,
            "baseline_found": baseline.is_some(),
            "baseline_source": outcome.source,
            "diff": diff,
            "warnings": warnings,
        }))?,
    };
    Ok(CompareOutput {
        document,
        warnings,
        outcome: GateOutcome::from_passed(result.passed),
    })
}

fn local_baseline_settings(path: Option<&Path>) -> BaselineSettings {
    BaselineSettings {
        local_path: path.map(|path| path.display().to_string()),
        workspace_dir: std::path::PathBuf::from("."),
        workflow: None,
        branch: DEFAULT_BASELINE_BRANCH.to_string(),
        artifact_name: DEFAULT_ARTIFACT_NAME.to_string(),
        report_file_name: DEFAULT_REPORT_PATH.to_string(),
        token: None,
        repository: None,
        exclude_run_id: None,
    }
}
