//! Actions artifact upload (results service, artifact v4).
//!
//! Three calls: `CreateArtifact` returns a signed blob URL, the zipped file is
//! PUT there as a block blob, and `FinalizeArtifact` commits it with its size.

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{SecondsFormat, TimeDelta, Utc};
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{GateError, Result};
use crate::models::PublishedArtifact;
use crate::pipeline::ArtifactPublisher;

use super::client::USER_AGENT_VALUE;
use super::context::normalize_base_url;

const ARTIFACT_SERVICE_PATH: &str = "twirp/github.actions.results.api.v1.ArtifactService";
const RESULTS_SCOPE_PREFIX: &str = "Actions.Results:";
const ARTIFACT_VERSION: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BackendIds {
    pub(crate) workflow_run_backend_id: String,
    pub(crate) workflow_job_run_backend_id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CreateArtifactResponse {
    ok: bool,
    #[serde(default)]
    signed_upload_url: String,
}

#[derive(Debug, Clone, Deserialize)]
struct FinalizeArtifactResponse {
    ok: bool,
    #[serde(default)]
    artifact_id: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct ActionsArtifactPublisher {
    results_url: String,
    runtime_token: String,
    http: Client,
}

impl ActionsArtifactPublisher {
    /// Needs `ACTIONS_RESULTS_URL` and `ACTIONS_RUNTIME_TOKEN` from the job.
    pub fn new(results_url: Option<&str>, runtime_token: Option<&str>, timeout_ms: u64) -> Result<Self> {
        let (Some(results_url), Some(runtime_token)) = (results_url, runtime_token) else {
            return Err(GateError::Publish(
                "artifact upload needs ACTIONS_RESULTS_URL and ACTIONS_RUNTIME_TOKEN".to_string(),
            ));
        };
        let http = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        Ok(Self {
            results_url: normalize_base_url(results_url),
            runtime_token: runtime_token.to_string(),
            http,
        })
    }

    fn twirp<T: for<'de> Deserialize<'de>>(&self, method: &str, body: &Value) -> Result<T> {
        let url = format!("{}/{ARTIFACT_SERVICE_PATH}/{method}", self.results_url);
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", self.runtime_token))
            .map_err(|e| GateError::Publish(format!("invalid runtime token: {e}")))?;
        auth.set_sensitive(true);
        let response = self
            .http
            .post(url)
            .header(AUTHORIZATION, auth)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .json(body)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(GateError::Publish(format!(
                "{method} failed with {status}: {}",
                crate::text::truncate_text(text.trim(), 200)
            )));
        }
        Ok(response.json::<T>()?)
    }
}

impl ArtifactPublisher for ActionsArtifactPublisher {
    fn publish(&self, name: &str, path: &Path, retention_days: u32) -> Result<PublishedArtifact> {
        let ids = parse_backend_ids(&self.runtime_token)?;
        let archive = build_artifact_zip(path)?;
        let size_bytes = archive.len() as u64;

        let created = self.twirp::<CreateArtifactResponse>(
            "CreateArtifact",
            &json!({
                "workflow_run_backend_id": ids.workflow_run_backend_id,
                "workflow_job_run_backend_id": ids.workflow_job_run_backend_id,
                "name": name,
                "version": ARTIFACT_VERSION,
                "expires_at": expires_at(retention_days),
            }),
        )?;
        if !created.ok || created.signed_upload_url.is_empty() {
            return Err(GateError::Publish(format!(
                "artifact '{name}' was not accepted by the results service"
            )));
        }

        let upload = self
            .http
            .put(&created.signed_upload_url)
            .header("x-ms-blob-type", "BlockBlob")
            .header(CONTENT_TYPE, "application/zip")
            .body(archive)
            .send()?;
        if !upload.status().is_success() {
            return Err(GateError::Publish(format!(
                "artifact blob upload failed with {}",
                upload.status()
            )));
        }

        let finalized = self.twirp::<FinalizeArtifactResponse>(
            "FinalizeArtifact",
            &json!({
                "workflow_run_backend_id": ids.workflow_run_backend_id,
                "workflow_job_run_backend_id": ids.workflow_job_run_backend_id,
                "name": name,
                "size": size_bytes.to_string(),
            }),
        )?;
        if !finalized.ok {
            return Err(GateError::Publish(format!(
                "artifact '{name}' could not be finalized"
            )));
        }

        let artifact_id = finalized.artifact_id.as_ref().and_then(parse_artifact_id);
        info!(name, ?artifact_id, size_bytes, "artifact uploaded");
        Ok(PublishedArtifact {
            name: name.to_string(),
            artifact_id,
            size_bytes,
        })
    }
}

/// Reads the run and job backend ids from the runtime token's `scp` claim.
pub(crate) fn parse_backend_ids(token: &str) -> Result<BackendIds> {
    let invalid = |detail: &str| GateError::Publish(format!("invalid runtime token: {detail}"));

    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| invalid("not a JWT"))?;
    let decoded = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| invalid("payload is not base64url"))?;
    let claims = serde_json::from_slice::<Value>(&decoded).map_err(|_| invalid("payload is not JSON"))?;
    let scopes = claims
        .get("scp")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("missing scp claim"))?;

    for scope in scopes.split_whitespace() {
        let Some(rest) = scope.strip_prefix(RESULTS_SCOPE_PREFIX) else {
            continue;
        };
        if let Some((run, job)) = rest.split_once(':')
            && !run.is_empty()
            && !job.is_empty()
        {
            return Ok(BackendIds {
                workflow_run_backend_id: run.to_string(),
                workflow_job_run_backend_id: job.to_string(),
            });
        }
    }
    Err(invalid("no Actions.Results scope"))
}

/// Zips a single file under its own file name.
pub(crate) fn build_artifact_zip(path: &Path) -> Result<Vec<u8>> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| GateError::Publish(format!("not a file: {}", path.display())))?;
    let bytes = fs::read(path)?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(file_name, options)?;
    zip.write_all(&bytes)?;
    Ok(zip.finish()?.into_inner())
}

fn expires_at(retention_days: u32) -> String {
    (Utc::now() + TimeDelta::days(i64::from(retention_days)))
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_artifact_id(raw: &Value) -> Option<u64> {
    raw.as_u64()
        .or_else(|| raw.as_str().and_then(|text| text.parse::<u64>().ok()))
}
