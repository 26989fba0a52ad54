//! Baseline acquisition: a local file wins over a remote workflow lookup.
//!
//! Never fails. Anything that prevents a usable baseline becomes a warning on
//! the returned [`BaselineOutcome`] and regression checks are skipped.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::github::Repository;
use crate::models::{BaselineOutcome, BaselineSource, RemoteBaselineRequest};
use crate::pipeline::BaselineLookup;
use crate::validate::{read_report_file, validate_report};

pub const BASELINE_LABEL: &str = "baseline";
pub const DEFAULT_BASELINE_BRANCH: &str = "main";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineSettings {
    pub local_path: Option<String>,
    pub workspace_dir: PathBuf,
    /// Workflow id, file name or display name. Enables the remote lookup.
    pub workflow: Option<String>,
    pub branch: String,
    pub artifact_name: String,
    pub report_file_name: String,
    pub token: Option<String>,
    pub repository: Option<Repository>,
    pub exclude_run_id: Option<u64>,
}

pub fn locate_baseline(
    settings: &BaselineSettings,
    lookup: Option<&dyn BaselineLookup>,
) -> BaselineOutcome {
    let outcome = if let Some(local) = non_empty(settings.local_path.as_deref()) {
        locate_local(&resolve(local, &settings.workspace_dir))
    } else if let Some(workflow) = non_empty(settings.workflow.as_deref()) {
        locate_remote(settings, workflow, lookup)
    } else {
        info!("no baseline configured; regression checks skipped");
        BaselineOutcome::not_configured()
    };

    match (&outcome.baseline, &outcome.warning) {
        (Some(_), _) => info!(source = ?outcome.source, "baseline loaded"),
        (None, Some(warning)) => warn!(%warning, "baseline unavailable"),
        (None, None) => {}
    }
    outcome
}

fn locate_local(path: &Path) -> BaselineOutcome {
    let source = BaselineSource::Local {
        path: path.display().to_string(),
    };
    match read_report_file(path, Some(BASELINE_LABEL)) {
        Ok(report) => BaselineOutcome::found(report, source),
        Err(err) => BaselineOutcome::unavailable(source, format!("baseline unavailable: {err}")),
    }
}

fn locate_remote(
    settings: &BaselineSettings,
    workflow: &str,
    lookup: Option<&dyn BaselineLookup>,
) -> BaselineOutcome {
    let Some(token) = non_empty(settings.token.as_deref()) else {
        return BaselineOutcome::unavailable(
            BaselineSource::NotConfigured,
            "baseline lookup skipped: no GitHub token provided",
        );
    };
    let Some(repository) = settings.repository.as_ref() else {
        return BaselineOutcome::unavailable(
            BaselineSource::NotConfigured,
            "baseline lookup skipped: repository is unknown",
        );
    };
    let Some(lookup) = lookup else {
        return BaselineOutcome::unavailable(
            BaselineSource::NotConfigured,
            "baseline lookup skipped: no lookup client available",
        );
    };

    let request = RemoteBaselineRequest {
        owner: repository.owner.clone(),
        repo: repository.repo.clone(),
        workflow: workflow.to_string(),
        branch: settings.branch.clone(),
        artifact_name: settings.artifact_name.clone(),
        report_file_name: settings.report_file_name.clone(),
        token: token.to_string(),
        exclude_run_id: settings.exclude_run_id,
    };

    let remote = match lookup.lookup(&request) {
        Ok(Some(remote)) => remote,
        Ok(None) => {
            return BaselineOutcome::unavailable(
                BaselineSource::NotConfigured,
                format!(
                    "baseline not found: no successful '{}' run on '{}' has artifact '{}'",
                    request.workflow, request.branch, request.artifact_name
                ),
            );
        }
        Err(err) => {
            return BaselineOutcome::unavailable(
                BaselineSource::NotConfigured,
                format!("baseline lookup failed: {err}"),
            );
        }
    };

    let source = BaselineSource::Remote {
        run_id: remote.run_id,
        run_url: remote.run_url,
        artifact_id: remote.artifact_id,
    };
    match validate_report(&remote.document, Some(BASELINE_LABEL)) {
        Ok(report) => BaselineOutcome::found(report, source),
        Err(err) => BaselineOutcome::unavailable(source, format!("baseline unavailable: {err}")),
    }
}

fn resolve(raw: &str, workspace_dir: &Path) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace_dir.join(path)
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}
