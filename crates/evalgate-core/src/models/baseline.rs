use serde::Serialize;

use super::Report;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BaselineSource {
    NotConfigured,
    Local {
        path: String,
    },
    Remote {
        run_id: u64,
        run_url: String,
        artifact_id: u64,
    },
}

impl BaselineSource {
    #[must_use]
    pub fn run_id(&self) -> Option<u64> {
        match self {
            Self::Remote { run_id, .. } => Some(*run_id),
            _ => None,
        }
    }

    #[must_use]
    pub fn run_url(&self) -> Option<&str> {
        match self {
            Self::Remote { run_url, .. } => Some(run_url.as_str()),
            _ => None,
        }
    }
}

/// Result of baseline acquisition. Never an error: an unavailable baseline
/// carries a warning and no report.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineOutcome {
    pub baseline: Option<Report>,
    pub source: BaselineSource,
    pub warning: Option<String>,
}

impl BaselineOutcome {
    #[must_use]
    pub const fn not_configured() -> Self {
        Self {
            baseline: None,
            source: BaselineSource::NotConfigured,
            warning: None,
        }
    }

    #[must_use]
    pub fn unavailable(source: BaselineSource, warning: impl Into<String>) -> Self {
        Self {
            baseline: None,
            source,
            warning: Some(warning.into()),
        }
    }

    #[must_use]
    pub const fn found(baseline: Report, source: BaselineSource) -> Self {
        Self {
            baseline: Some(baseline),
            source,
            warning: None,
        }
    }
}

/// Inputs for a remote baseline lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBaselineRequest {
    pub owner: String,
    pub repo: String,
    pub workflow: String,
    pub branch: String,
    pub artifact_name: String,
    pub report_file_name: String,
    pub token: String,
    pub exclude_run_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteBaseline {
    pub document: serde_json::Value,
    pub run_id: u64,
    pub run_url: String,
    pub artifact_id: u64,
}
