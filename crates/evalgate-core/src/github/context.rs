use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::read_non_empty_env;
use crate::error::{GateError, Result};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_SERVER_URL: &str = "https://github.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub repo: String,
}

impl Repository {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        match trimmed.split_once('/') {
            Some((owner, repo))
                if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(GateError::Config(format!(
                "repository must look like owner/repo, got '{trimmed}'"
            ))),
        }
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Workflow environment of the current job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowContext {
    pub repository: Option<Repository>,
    pub api_url: String,
    pub server_url: String,
    pub run_id: Option<u64>,
    pub event_path: Option<PathBuf>,
    pub workspace_dir: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub step_summary_path: Option<PathBuf>,
    pub runtime_token: Option<String>,
    pub results_url: Option<String>,
    pub token: Option<String>,
}

impl WorkflowContext {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(read_non_empty_env)
    }

    /// Builds the context from any variable source; unset and blank values
    /// must come back as `None`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            repository: lookup("GITHUB_REPOSITORY").and_then(|raw| Repository::parse(&raw).ok()),
            api_url: normalize_base_url(
                &lookup("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            ),
            server_url: normalize_base_url(
                &lookup("GITHUB_SERVER_URL").unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            ),
            run_id: lookup("GITHUB_RUN_ID").and_then(|raw| raw.parse::<u64>().ok()),
            event_path: lookup("GITHUB_EVENT_PATH").map(PathBuf::from),
            workspace_dir: lookup("GITHUB_WORKSPACE").map(PathBuf::from),
            output_path: lookup("GITHUB_OUTPUT").map(PathBuf::from),
            step_summary_path: lookup("GITHUB_STEP_SUMMARY").map(PathBuf::from),
            runtime_token: lookup("ACTIONS_RUNTIME_TOKEN"),
            results_url: lookup("ACTIONS_RESULTS_URL"),
            token: lookup("GITHUB_TOKEN"),
        }
    }

    #[must_use]
    pub fn run_url(&self) -> Option<String> {
        let repository = self.repository.as_ref()?;
        let run_id = self.run_id?;
        Some(format!(
            "{}/{}/actions/runs/{run_id}",
            self.server_url,
            repository.full_name()
        ))
    }

    /// Pull request number of the triggering event, when there is one.
    #[must_use]
    pub fn pull_request_number(&self) -> Option<u64> {
        let path = self.event_path.as_deref()?;
        read_event_payload(path).and_then(|event| pull_request_number_from_event(&event))
    }
}

fn read_event_payload(path: &Path) -> Option<Value> {
    let raw = fs::read(path).ok()?;
    serde_json::from_slice::<Value>(&raw).ok()
}

#[must_use]
pub fn pull_request_number_from_event(event: &Value) -> Option<u64> {
    if let Some(number) = event.pointer("/pull_request/number").and_then(Value::as_u64) {
        return Some(number);
    }
    let issue = event.get("issue")?;
    if issue.get("pull_request").is_some() {
        return issue.get("number").and_then(Value::as_u64);
    }
    None
}

#[must_use]
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
