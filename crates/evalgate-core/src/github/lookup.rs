use std::io::{Cursor, Read};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};
use zip::ZipArchive;

use crate::error::Result;
use crate::models::{RemoteBaseline, RemoteBaselineRequest};
use crate::pipeline::BaselineLookup;

use super::client::GitHubClient;

const RUNS_PER_PAGE: usize = 20;
const MAX_RUNS_SCANNED: usize = 10;
const MAX_BASELINE_BYTES: u64 = 32 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
struct WorkflowList {
    #[serde(default)]
    workflows: Vec<Workflow>,
}

#[derive(Debug, Clone, Deserialize)]
struct Workflow {
    id: u64,
    name: String,
    #[serde(default)]
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
struct WorkflowRunList {
    #[serde(default)]
    workflow_runs: Vec<WorkflowRun>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WorkflowRun {
    pub(crate) id: u64,
    #[serde(default)]
    pub(crate) html_url: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ArtifactList {
    #[serde(default)]
    artifacts: Vec<Artifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Artifact {
    pub(crate) id: u64,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) expired: bool,
}

/// How the configured workflow is addressed in the runs endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WorkflowRef {
    Id(String),
    File(String),
    Name(String),
}

impl WorkflowRef {
    pub(crate) fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Self::Id(trimmed.to_string());
        }
        if trimmed.ends_with(".yml") || trimmed.ends_with(".yaml") {
            let file = trimmed.rsplit('/').next().unwrap_or(trimmed);
            return Self::File(file.to_string());
        }
        Self::Name(trimmed.to_string())
    }
}

/// Finds the newest successful run on a branch that uploaded the baseline artifact.
#[derive(Debug, Clone)]
pub struct GitHubBaselineLookup {
    client: GitHubClient,
}

impl GitHubBaselineLookup {
    #[must_use]
    pub const fn new(client: GitHubClient) -> Self {
        Self { client }
    }

    fn resolve_workflow(&self, request: &RemoteBaselineRequest) -> Result<Option<String>> {
        match WorkflowRef::parse(&request.workflow) {
            WorkflowRef::Id(id) => Ok(Some(id)),
            WorkflowRef::File(file) => Ok(Some(file)),
            WorkflowRef::Name(name) => {
                let path = format!("repos/{}/{}/actions/workflows", request.owner, request.repo);
                let Some(list) = self
                    .client
                    .get_json::<WorkflowList>(&path, &[("per_page", "100".to_string())])?
                else {
                    return Ok(None);
                };
                Ok(list
                    .workflows
                    .iter()
                    .find(|workflow| workflow.name == name || workflow.path == name)
                    .map(|workflow| workflow.id.to_string()))
            }
        }
    }

    fn list_successful_runs(
        &self,
        request: &RemoteBaselineRequest,
        workflow: &str,
    ) -> Result<Vec<WorkflowRun>> {
        let path = format!(
            "repos/{}/{}/actions/workflows/{workflow}/runs",
            request.owner, request.repo
        );
        let query = [
            ("branch", request.branch.clone()),
            ("status", "success".to_string()),
            ("per_page", RUNS_PER_PAGE.to_string()),
        ];
        let runs = self
            .client
            .get_json::<WorkflowRunList>(&path, &query)?
            .map(|list| list.workflow_runs)
            .unwrap_or_default();
        Ok(candidate_runs(runs, request.exclude_run_id))
    }

    fn find_artifact(
        &self,
        request: &RemoteBaselineRequest,
        run_id: u64,
    ) -> Result<Option<Artifact>> {
        let path = format!(
            "repos/{}/{}/actions/runs/{run_id}/artifacts",
            request.owner, request.repo
        );
        let query = [
            ("name", request.artifact_name.clone()),
            ("per_page", "100".to_string()),
        ];
        let artifacts = self
            .client
            .get_json::<ArtifactList>(&path, &query)?
            .map(|list| list.artifacts)
            .unwrap_or_default();
        Ok(select_artifact(artifacts, &request.artifact_name))
    }
}

impl BaselineLookup for GitHubBaselineLookup {
    fn lookup(&self, request: &RemoteBaselineRequest) -> Result<Option<RemoteBaseline>> {
        let Some(workflow) = self.resolve_workflow(request)? else {
            info!(workflow = %request.workflow, "baseline workflow could not be resolved");
            return Ok(None);
        };

        for run in self.list_successful_runs(request, &workflow)? {
            let Some(artifact) = self.find_artifact(request, run.id)? else {
                debug!(run_id = run.id, "run has no usable baseline artifact");
                continue;
            };
            let path = format!(
                "repos/{}/{}/actions/artifacts/{}/zip",
                request.owner, request.repo, artifact.id
            );
            let Some(bytes) = self.client.download(&path)? else {
                debug!(artifact_id = artifact.id, "baseline artifact download vanished");
                continue;
            };
            match remote_baseline(&bytes, &request.report_file_name, &run, &artifact)? {
                Some(baseline) => return Ok(Some(baseline)),
                None => {
                    debug!(
                        run_id = run.id,
                        artifact_id = artifact.id,
                        "baseline artifact contains no JSON report"
                    );
                }
            }
        }
        Ok(None)
    }
}

pub(crate) fn candidate_runs(runs: Vec<WorkflowRun>, exclude_run_id: Option<u64>) -> Vec<WorkflowRun> {
    runs.into_iter()
        .filter(|run| Some(run.id) != exclude_run_id)
        .take(MAX_RUNS_SCANNED)
        .collect()
}

pub(crate) fn select_artifact(artifacts: Vec<Artifact>, name: &str) -> Option<Artifact> {
    artifacts
        .into_iter()
        .find(|artifact| artifact.name == name && !artifact.expired)
}

/// `None` when the artifact holds no JSON report, so the scan moves on.
pub(crate) fn remote_baseline(
    bytes: &[u8],
    report_file_name: &str,
    run: &WorkflowRun,
    artifact: &Artifact,
) -> Result<Option<RemoteBaseline>> {
    Ok(
        extract_report_from_zip(bytes, report_file_name)?.map(|document| RemoteBaseline {
            document,
            run_id: run.id,
            run_url: run.html_url.clone(),
            artifact_id: artifact.id,
        }),
    )
}

/// Picks the entry named like the report file, else the first `.json` entry.
pub(crate) fn extract_report_from_zip(bytes: &[u8], report_file_name: &str) -> Result<Option<Value>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut fallback = None;
    let mut preferred = None;
    for index in 0..archive.len() {
        let entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let file_name = name.rsplit('/').next().unwrap_or(&name);
        if file_name == report_file_name {
            preferred = Some(index);
            break;
        }
        if fallback.is_none() && file_name.ends_with(".json") {
            fallback = Some(index);
        }
    }

    let Some(index) = preferred.or(fallback) else {
        return Ok(None);
    };
    let entry = archive.by_index(index)?;
    let mut raw = Vec::new();
    entry.take(MAX_BASELINE_BYTES).read_to_end(&mut raw)?;
    Ok(Some(serde_json::from_slice::<Value>(&raw)?))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    use super::*;

    fn zip_with(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, body) in entries {
            zip.start_file(*name, options).expect("start file");
            zip.write_all(body.as_bytes()).expect("write entry");
        }
        zip.finish().expect("finish zip").into_inner()
    }

    fn run(id: u64) -> WorkflowRun {
        WorkflowRun {
            id,
            html_url: format!("https://github.test/runs/{id}"),
        }
    }

    fn artifact(id: u64, name: &str, expired: bool) -> Artifact {
        Artifact {
            id,
            name: name.to_string(),
            expired,
        }
    }

    #[test]
    fn workflow_ref_distinguishes_ids_files_and_names() {
        assert_eq!(WorkflowRef::parse("1234"), WorkflowRef::Id("1234".to_string()));
        assert_eq!(
            WorkflowRef::parse(".github/workflows/evals.yml"),
            WorkflowRef::File("evals.yml".to_string())
        );
        assert_eq!(
            WorkflowRef::parse("nightly.yaml"),
            WorkflowRef::File("nightly.yaml".to_string())
        );
        assert_eq!(
            WorkflowRef::parse("Nightly evals"),
            WorkflowRef::Name("Nightly evals".to_string())
        );
    }

    #[test]
    fn candidate_runs_skip_current_run_and_cap_scan() {
        let runs = (1..=15).map(run).collect::<Vec<_>>();
        let picked = candidate_runs(runs, Some(1));
        assert_eq!(picked.len(), MAX_RUNS_SCANNED);
        assert_eq!(picked[0].id, 2);
    }

    #[test]
    fn select_artifact_ignores_expired_and_other_names() {
        let picked = select_artifact(
            vec![
                artifact(1, "evalgate-report", true),
                artifact(2, "coverage", false),
                artifact(3, "evalgate-report", false),
            ],
            "evalgate-report",
        );
        assert_eq!(picked.map(|artifact| artifact.id), Some(3));
    }

    #[test]
    fn extract_prefers_named_report_entry() {
        let bytes = zip_with(&[
            ("other.json", r#"{"other": true}"#),
            ("nested/report.json", r#"{"version": 1}"#),
        ]);
        let document = extract_report_from_zip(&bytes, "report.json")
            .expect("extract")
            .expect("document");
        assert_eq!(document, json!({ "version": 1 }));
    }

    #[test]
    fn extract_falls_back_to_first_json_entry() {
        let bytes = zip_with(&[("notes.txt", "hello"), ("results.json", r#"{"a": 1}"#)]);
        let document = extract_report_from_zip(&bytes, "report.json")
            .expect("extract")
            .expect("document");
        assert_eq!(document, json!({ "a": 1 }));
    }

    #[test]
    fn extract_returns_none_without_json_entries() {
        let bytes = zip_with(&[("notes.txt", "hello")]);
        assert_eq!(
            extract_report_from_zip(&bytes, "report.json").expect("extract"),
            None
        );
    }

    #[test]
    fn artifact_without_json_report_is_not_a_baseline() {
        let bytes = zip_with(&[("notes.txt", "hello")]);
        let artifact = artifact(3, "evalgate-report", false);
        let found =
            remote_baseline(&bytes, "report.json", &run(7), &artifact).expect("no lookup error");
        assert!(found.is_none());
    }

    #[test]
    fn artifact_with_report_carries_run_provenance() {
        let bytes = zip_with(&[("report.json", r#"{"version": 1}"#)]);
        let artifact = artifact(3, "evalgate-report", false);
        let found = remote_baseline(&bytes, "report.json", &run(7), &artifact)
            .expect("lookup")
            .expect("baseline");
        assert_eq!(found.run_id, 7);
        assert_eq!(found.artifact_id, 3);
        assert_eq!(found.run_url, "https://github.test/runs/7");
        assert_eq!(found.document, json!({ "version": 1 }));
    }

    #[test]
    fn extract_rejects_invalid_archives() {
        assert!(extract_report_from_zip(b"not a zip", "report.json").is_err());
    }
}
