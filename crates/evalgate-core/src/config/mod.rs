//! Gate configuration parsed from raw action inputs.
//!
//! Inputs arrive as strings (CLI flags or `INPUT_*` variables). Empty strings
//! mean "unset". Malformed values are configuration errors and abort the run
//! before the evaluation command starts.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{GateError, Result};
use crate::models::{GateConfig, MetricThreshold};

pub(crate) mod env;

pub use env::{
    EVALGATE_HTTP_TIMEOUT_MS_ENV, EVALGATE_LOG_ENV, http_timeout_ms, read_non_empty_env,
};

pub const DEFAULT_REPORT_PATH: &str = "evalgate-report.json";
pub const DEFAULT_ARTIFACT_NAME: &str = "evalgate-report";
pub const DEFAULT_RETENTION_DAYS: u32 = 14;
pub const MAX_RETENTION_DAYS: u32 = 90;

/// Raw, unparsed gate inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateConfigInputs {
    pub fail_on_command_error: Option<String>,
    pub fail_on_any_scenario_fail: Option<String>,
    pub min_score: Option<String>,
    pub max_score_drop: Option<String>,
    pub max_metric_regressions: Option<String>,
}

impl GateConfig {
    pub fn from_inputs(inputs: &GateConfigInputs) -> Result<Self> {
        Ok(Self {
            fail_on_command_error: parse_bool_input(
                "fail_on_command_error",
                inputs.fail_on_command_error.as_deref(),
                true,
            )?,
            fail_on_any_scenario_fail: parse_bool_input(
                "fail_on_any_scenario_fail",
                inputs.fail_on_any_scenario_fail.as_deref(),
                true,
            )?,
            min_score: parse_number_input("min_score", inputs.min_score.as_deref())?,
            max_score_drop: parse_number_input("max_score_drop", inputs.max_score_drop.as_deref())?,
            max_metric_regressions: parse_metric_thresholds(
                inputs.max_metric_regressions.as_deref(),
            )?,
        })
    }
}

pub fn parse_bool_input(name: &str, raw: Option<&str>, default_value: bool) -> Result<bool> {
    let Some(value) = non_empty(raw) else {
        return Ok(default_value);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(GateError::Config(format!(
            "{name} must be a boolean, got '{value}'"
        ))),
    }
}

pub fn parse_number_input(name: &str, raw: Option<&str>) -> Result<Option<f64>> {
    let Some(value) = non_empty(raw) else {
        return Ok(None);
    };
    let parsed = value
        .parse::<f64>()
        .map_err(|_| GateError::Config(format!("{name} must be a number, got '{value}'")))?;
    if !parsed.is_finite() {
        return Err(GateError::Config(format!(
            "{name} must be finite, got '{value}'"
        )));
    }
    Ok(Some(parsed))
}

/// Parses a JSON object of metric key to allowed increase, keeping declared order.
pub fn parse_metric_thresholds(raw: Option<&str>) -> Result<Vec<MetricThreshold>> {
    let Some(value) = non_empty(raw) else {
        return Ok(Vec::new());
    };
    let parsed = serde_json::from_str::<Value>(value).map_err(|err| {
        GateError::Config(format!("max_metric_regressions is not valid JSON: {err}"))
    })?;
    let Some(object) = parsed.as_object() else {
        return Err(GateError::Config(
            "max_metric_regressions must be a JSON object of metric -> number".to_string(),
        ));
    };
    object
        .iter()
        .map(|(key, threshold)| {
            let max_increase = threshold
                .as_f64()
                .filter(|value| value.is_finite())
                .ok_or_else(|| {
                    GateError::Config(format!(
                        "max_metric_regressions.{key} must be a number, got {threshold}"
                    ))
                })?;
            Ok(MetricThreshold {
                key: key.clone(),
                max_increase,
            })
        })
        .collect()
}

pub fn parse_retention_days(raw: Option<&str>) -> Result<u32> {
    let Some(value) = non_empty(raw) else {
        return Ok(DEFAULT_RETENTION_DAYS);
    };
    let days = value.parse::<u32>().map_err(|_| {
        GateError::Config(format!(
            "artifact_retention_days must be a whole number, got '{value}'"
        ))
    })?;
    if !(1..=MAX_RETENTION_DAYS).contains(&days) {
        return Err(GateError::Config(format!(
            "artifact_retention_days must be within 1..={MAX_RETENTION_DAYS}, got {days}"
        )));
    }
    Ok(days)
}

/// Resolves the report path against the workspace directory.
pub fn resolve_report_path(raw: Option<&str>, workspace_dir: &Path) -> Result<PathBuf> {
    let value = match raw {
        None => DEFAULT_REPORT_PATH,
        Some(value) if value.trim().is_empty() => {
            return Err(GateError::Config("report_path must not be empty".to_string()));
        }
        Some(value) => value.trim(),
    };
    if value.contains('\0') {
        return Err(GateError::Config(
            "report_path must not contain NUL bytes".to_string(),
        ));
    }
    if value.ends_with('/') || value.ends_with('\\') {
        return Err(GateError::Config(format!(
            "report_path must name a file, got '{value}'"
        )));
    }
    let path = Path::new(value);
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(workspace_dir.join(path))
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}
