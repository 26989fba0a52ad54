use std::env;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use evalgate_core::baseline::{BaselineSettings, DEFAULT_BASELINE_BRANCH};
use evalgate_core::config::{
    DEFAULT_ARTIFACT_NAME, DEFAULT_REPORT_PATH, http_timeout_ms, parse_bool_input,
    parse_retention_days, resolve_report_path,
};
use evalgate_core::github::{
    ActionsArtifactPublisher, GitHubBaselineLookup, GitHubClient, GitHubCommentPublisher,
    GitHubConfig, WorkflowContext,
};
use evalgate_core::models::{CommentTarget, GateConfig};
use evalgate_core::{
    ArtifactPublisher, BaselineLookup, Collaborators, CommentPublisher, RunSettings,
    ShellCommandRunner, run_pipeline,
};
use tracing::{info, warn};

use crate::cli::{RunArgs, parse_comment_mode, parse_pr_number};

use super::GateOutcome;
use super::support::{emit_workflow_warning, non_empty, print_json};

pub(super) fn handle_run(args: &RunArgs) -> Result<GateOutcome> {
    let context = WorkflowContext::from_env();
    let settings = build_run_settings(args, &context)?;
    let token = non_empty(args.github_token.as_deref()).or_else(|| context.token.clone());
    let timeout_ms = http_timeout_ms();

    let mut setup_warnings = Vec::new();
    let github = github_client(token, &context, timeout_ms, &mut setup_warnings);
    let lookup = github.clone().map(GitHubBaselineLookup::new);
    let comments = github.map(GitHubCommentPublisher::new);
    let artifacts = if settings.upload_artifact {
        match ActionsArtifactPublisher::new(
            context.results_url.as_deref(),
            context.runtime_token.as_deref(),
            timeout_ms,
        ) {
            Ok(publisher) => Some(publisher),
            Err(err) => {
                warn!(error = %err, "artifact publisher unavailable");
                None
            }
        }
    } else {
        None
    };

    let command = ShellCommandRunner::new();
    let mut run = run_pipeline(
        &settings,
        Collaborators {
            command: &command,
            baseline: lookup.as_ref().map(|lookup| lookup as &dyn BaselineLookup),
            artifacts: artifacts
                .as_ref()
                .map(|publisher| publisher as &dyn ArtifactPublisher),
            comments: comments
                .as_ref()
                .map(|publisher| publisher as &dyn CommentPublisher),
        },
    )?;
    setup_warnings.append(&mut run.warnings);
    run.warnings = setup_warnings;

    for warning in &run.warnings {
        emit_workflow_warning(warning)?;
    }
    info!(
        run_id = %run.run_id,
        passed = run.result.passed,
        elapsed_ms = run.elapsed_ms,
        "gate run complete"
    );
    print_json(&run)?;
    Ok(GateOutcome::from_passed(run.result.passed))
}

/// A token the client cannot use leaves the run without remote lookup and comments.
pub(super) fn github_client(
    token: Option<String>,
    context: &WorkflowContext,
    timeout_ms: u64,
    warnings: &mut Vec<String>,
) -> Option<GitHubClient> {
    let config = GitHubConfig {
        api_url: context.api_url.clone(),
        token: token?,
        timeout_ms,
    };
    match GitHubClient::new(config) {
        Ok(client) => Some(client),
        Err(err) => {
            warn!(error = %err, "GitHub client unavailable");
            warnings.push(format!("GitHub client unavailable: {err}"));
            None
        }
    }
}

pub(super) fn build_run_settings(args: &RunArgs, context: &WorkflowContext) -> Result<RunSettings> {
    let workspace_dir = match context.workspace_dir.clone() {
        Some(dir) => dir,
        None => env::current_dir().context("failed to resolve working directory")?,
    };

    let gate = GateConfig::from_inputs(&args.gate.to_inputs())?;
    let report_path = resolve_report_path(args.report_path.as_deref(), &workspace_dir)?;
    let report_label = non_empty(args.report_path.as_deref())
        .unwrap_or_else(|| DEFAULT_REPORT_PATH.to_string());
    let report_file_name = report_file_name(&report_path);

    let artifact_name = non_empty(args.artifact_name.as_deref())
        .unwrap_or_else(|| DEFAULT_ARTIFACT_NAME.to_string());
    let retention_days = parse_retention_days(args.artifact_retention_days.as_deref())?;
    let upload_artifact = parse_bool_input("upload_artifact", args.upload_artifact.as_deref(), true)?;
    let comment_mode = parse_comment_mode(args.comment_mode.as_deref()).map_err(|e| anyhow!(e))?;
    let pr_number = match parse_pr_number(args.pr_number.as_deref()).map_err(|e| anyhow!(e))? {
        Some(number) => Some(number),
        None => context.pull_request_number(),
    };
    let comment_target = match (context.repository.as_ref(), pr_number) {
        (Some(repository), Some(issue_number)) => Some(CommentTarget {
            owner: repository.owner.clone(),
            repo: repository.repo.clone(),
            issue_number,
        }),
        _ => None,
    };

    Ok(RunSettings {
        title: args.title.clone(),
        command: args.command.clone(),
        report_path,
        report_label,
        gate,
        baseline: BaselineSettings {
            local_path: non_empty(args.baseline_path.as_deref()),
            workspace_dir: workspace_dir.clone(),
            workflow: non_empty(args.baseline_workflow.as_deref()),
            branch: non_empty(args.baseline_branch.as_deref())
                .unwrap_or_else(|| DEFAULT_BASELINE_BRANCH.to_string()),
            artifact_name: non_empty(args.baseline_artifact.as_deref())
                .unwrap_or_else(|| artifact_name.clone()),
            report_file_name,
            token: non_empty(args.github_token.as_deref()).or_else(|| context.token.clone()),
            repository: context.repository.clone(),
            exclude_run_id: context.run_id,
        },
        artifact_name,
        upload_artifact,
        retention_days,
        comment_mode,
        comment_target,
        run_url: context.run_url(),
        output_path: context.output_path.clone(),
        step_summary_path: context.step_summary_path.clone(),
    })
}

fn report_file_name(report_path: &Path) -> String {
    report_path
        .file_name()
        .map_or_else(
            || DEFAULT_REPORT_PATH.to_string(),
            |name| name.to_string_lossy().to_string(),
        )
}
