use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{GateError, Result};

use super::context::normalize_base_url;

pub const USER_AGENT_VALUE: &str = concat!("evalgate/", env!("CARGO_PKG_VERSION"));
const API_VERSION_HEADER: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub api_url: String,
    pub token: String,
    pub timeout_ms: u64,
}

/// Blocking REST client for the GitHub API.
#[derive(Clone)]
pub struct GitHubClient {
    api_url: String,
    http: Client,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token.trim()))
            .map_err(|e| GateError::Config(format!("invalid github token: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            api_url: normalize_base_url(&config.api_url),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    /// GET returning `None` on 404.
    pub fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>> {
        let response = self.http.get(self.url(path)).query(query).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success("GET", path, response)?;
        Ok(Some(response.json::<T>()?))
    }

    pub fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        self.send_json("POST", path, self.http.post(self.url(path)).json(body))
    }

    pub fn patch_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        self.send_json("PATCH", path, self.http.patch(self.url(path)).json(body))
    }

    /// Downloads raw bytes, following redirects; `None` on 404 or 410.
    pub fn download(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let response = self.http.get(self.url(path)).send()?;
        if matches!(response.status(), StatusCode::NOT_FOUND | StatusCode::GONE) {
            return Ok(None);
        }
        let response = ensure_success("GET", path, response)?;
        Ok(Some(response.bytes()?.to_vec()))
    }

    fn send_json<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = ensure_success(method, path, request.send()?)?;
        Ok(response.json::<T>()?)
    }
}

fn ensure_success(method: &str, path: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(GateError::GitHub(describe_failure(method, path, status, &body)))
}

fn describe_failure(method: &str, path: &str, status: StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(Value::as_str)
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| crate::text::truncate_text(body.trim(), 200));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => format!(
            "{method} {path} was rejected with {status}: {message} (check token permissions)"
        ),
        _ => format!("{method} {path} failed with {status}: {message}"),
    }
}
