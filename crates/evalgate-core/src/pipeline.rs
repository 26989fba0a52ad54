//! One gate invocation from command to published summary.
//!
//! The sequence is linear: run the command, read and validate the report,
//! locate a baseline, diff, evaluate, render, write step outputs, then publish
//! the artifact and the PR comment. Only report problems abort the run; every
//! later side effect is best effort and ends up in [`GateRun::warnings`].

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::baseline::{BaselineSettings, locate_baseline};
use crate::command::SPAWN_FAILURE_EXIT_CODE;
use crate::diff::compute_diff;
use crate::error::Result;
use crate::gate::evaluate;
use crate::github::{append_outputs, append_step_summary};
use crate::models::{
    BaselineSource, CommandStatus, CommentMode, CommentOutcome, CommentTarget, Diff, GateConfig,
    GateResult, PublishedArtifact, RemoteBaseline, RemoteBaselineRequest, Report, ReportLink,
};
use crate::summary::{SummaryInput, render_summary};
use crate::text::format_number;
use crate::validate::read_report_file;

/// Runs the evaluation command to completion.
pub trait CommandRunner {
    fn run(&self, command: &str) -> Result<CommandStatus>;
}

/// Finds a baseline document from an earlier workflow run.
///
/// `Ok(None)` means nothing matched; `Err` is reserved for transport and auth
/// failures.
pub trait BaselineLookup {
    fn lookup(&self, request: &RemoteBaselineRequest) -> Result<Option<RemoteBaseline>>;
}

pub trait ArtifactPublisher {
    fn publish(&self, name: &str, path: &Path, retention_days: u32) -> Result<PublishedArtifact>;
}

pub trait CommentPublisher {
    fn publish(
        &self,
        target: &CommentTarget,
        body: &str,
        mode: CommentMode,
    ) -> Result<CommentOutcome>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub title: String,
    pub command: String,
    /// Resolved location of the report the command writes.
    pub report_path: PathBuf,
    /// Report path as configured, shown in the summary.
    pub report_label: String,
    pub gate: GateConfig,
    pub baseline: BaselineSettings,
    pub artifact_name: String,
    pub upload_artifact: bool,
    pub retention_days: u32,
    pub comment_mode: CommentMode,
    pub comment_target: Option<CommentTarget>,
    pub run_url: Option<String>,
    pub output_path: Option<PathBuf>,
    pub step_summary_path: Option<PathBuf>,
}

/// Side-effecting collaborators; absent ones skip their step.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub command: &'a dyn CommandRunner,
    pub baseline: Option<&'a dyn BaselineLookup>,
    pub artifacts: Option<&'a dyn ArtifactPublisher>,
    pub comments: Option<&'a dyn CommentPublisher>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateRun {
    pub run_id: String,
    pub elapsed_ms: u64,
    pub command_status: CommandStatus,
    pub report_path: String,
    pub artifact_name: String,
    pub report: Report,
    pub baseline_source: BaselineSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<Report>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<Diff>,
    pub result: GateResult,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PublishedArtifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<CommentOutcome>,
    pub warnings: Vec<String>,
}

impl GateRun {
    /// Step outputs in publication order.
    #[must_use]
    pub fn outputs(&self) -> Vec<(String, String)> {
        let reasons =
            serde_json::to_string(&self.result.reasons).unwrap_or_else(|_| "[]".to_string());
        vec![
            ("passed".to_string(), self.result.passed.to_string()),
            ("score".to_string(), format_number(self.report.summary.score)),
            (
                "score_delta".to_string(),
                self.diff
                    .as_ref()
                    .map(|diff| format_number(diff.score_delta))
                    .unwrap_or_default(),
            ),
            (
                "failed_scenarios".to_string(),
                self.result.failed_scenario_count.to_string(),
            ),
            ("report_path".to_string(), self.report_path.clone()),
            ("artifact_name".to_string(), self.artifact_name.clone()),
            (
                "baseline_found".to_string(),
                self.baseline.is_some().to_string(),
            ),
            (
                "baseline_run_id".to_string(),
                self.baseline_source
                    .run_id()
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
            ),
            ("reasons".to_string(), reasons),
        ]
    }
}

/// Runs the whole gate. Fails only when no gate decision can be made.
pub fn run_pipeline(settings: &RunSettings, collaborators: Collaborators<'_>) -> Result<GateRun> {
    let run_id = Uuid::new_v4().to_string();
    let started = Instant::now();
    let mut warnings = Vec::<String>::new();

    let command_status = match collaborators.command.run(&settings.command) {
        Ok(status) => status,
        Err(err) => {
            warnings.push(format!("evaluation command could not run: {err}"));
            CommandStatus::exited(SPAWN_FAILURE_EXIT_CODE)
        }
    };
    info!(
        code = command_status.code,
        signal = command_status.signal.as_deref().unwrap_or(""),
        "evaluation command finished"
    );

    let report = read_report_file(&settings.report_path, None)?;
    info!(
        score = report.summary.score,
        scenarios = report.scenarios.len(),
        "report validated"
    );

    let baseline_outcome = locate_baseline(&settings.baseline, collaborators.baseline);
    if let Some(warning) = baseline_outcome.warning.as_ref() {
        warnings.push(warning.clone());
    }
    let baseline = baseline_outcome.baseline;

    let diff = compute_diff(&report, baseline.as_ref());
    let result = evaluate(
        &report,
        baseline.as_ref(),
        diff.as_ref(),
        &settings.gate,
        &command_status,
    );
    info!(
        passed = result.passed,
        reasons = result.reasons.len(),
        "gate evaluated"
    );

    let extra_links = summary_links(settings.run_url.as_deref(), &baseline_outcome.source);
    let summary = render_summary(&SummaryInput {
        title: &settings.title,
        gate: &result,
        report: &report,
        baseline: baseline.as_ref(),
        diff: diff.as_ref(),
        config: &settings.gate,
        artifact_label: settings
            .upload_artifact
            .then_some(settings.artifact_name.as_str()),
        report_label: &settings.report_label,
        extra_links: &extra_links,
    });

    let mut run = GateRun {
        run_id,
        elapsed_ms: 0,
        command_status,
        report_path: settings.report_path.display().to_string(),
        artifact_name: settings.artifact_name.clone(),
        report,
        baseline_source: baseline_outcome.source,
        baseline,
        diff,
        result,
        summary,
        artifact: None,
        comment: None,
        warnings,
    };

    write_step_outputs(settings, &mut run);
    run.artifact = publish_artifact(settings, collaborators.artifacts, &mut run.warnings);
    run.comment = publish_comment(
        settings,
        collaborators.comments,
        &run.summary,
        &mut run.warnings,
    );
    run.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    Ok(run)
}

fn summary_links(run_url: Option<&str>, source: &BaselineSource) -> Vec<ReportLink> {
    let mut links = Vec::new();
    if let Some(url) = run_url {
        links.push(ReportLink {
            name: "workflow run".to_string(),
            url: url.to_string(),
        });
    }
    if let Some(url) = source.run_url().filter(|url| !url.is_empty()) {
        links.push(ReportLink {
            name: "baseline run".to_string(),
            url: url.to_string(),
        });
    }
    links
}

fn write_step_outputs(settings: &RunSettings, run: &mut GateRun) {
    if let Some(path) = settings.output_path.as_deref() {
        if let Err(err) = append_outputs(path, &run.outputs()) {
            record_warning(&mut run.warnings, format!("step outputs not written: {err}"));
        }
    }
    if let Some(path) = settings.step_summary_path.as_deref() {
        if let Err(err) = append_step_summary(path, &run.summary) {
            record_warning(&mut run.warnings, format!("step summary not written: {err}"));
        }
    }
}

fn publish_artifact(
    settings: &RunSettings,
    publisher: Option<&dyn ArtifactPublisher>,
    warnings: &mut Vec<String>,
) -> Option<PublishedArtifact> {
    if !settings.upload_artifact {
        return None;
    }
    let Some(publisher) = publisher else {
        record_warning(
            warnings,
            "artifact upload skipped: no artifact service available".to_string(),
        );
        return None;
    };
    match publisher.publish(
        &settings.artifact_name,
        &settings.report_path,
        settings.retention_days,
    ) {
        Ok(artifact) => Some(artifact),
        Err(err) => {
            record_warning(warnings, format!("artifact upload failed: {err}"));
            None
        }
    }
}

fn publish_comment(
    settings: &RunSettings,
    publisher: Option<&dyn CommentPublisher>,
    body: &str,
    warnings: &mut Vec<String>,
) -> Option<CommentOutcome> {
    if settings.comment_mode == CommentMode::Off {
        return Some(CommentOutcome::Skipped);
    }
    let Some(target) = settings.comment_target.as_ref() else {
        info!("not a pull request; summary comment skipped");
        return None;
    };
    let Some(publisher) = publisher else {
        record_warning(
            warnings,
            "summary comment skipped: no GitHub token provided".to_string(),
        );
        return None;
    };
    match publisher.publish(target, body, settings.comment_mode) {
        Ok(outcome) => Some(outcome),
        Err(err) => {
            record_warning(warnings, format!("summary comment failed: {err}"));
            None
        }
    }
}

fn record_warning(warnings: &mut Vec<String>, warning: String) {
    warn!(%warning, "best-effort step failed");
    warnings.push(warning);
}
