//! Structural validation boundary for report documents.
//!
//! Everything produced by the evaluation command (and every baseline) crosses
//! this boundary before any other component sees it. Checks run in a fixed
//! order and stop at the first violation.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{GateError, Result};
use crate::models::{Report, ReportLink, ReportSummary, Scenario};

pub const DEFAULT_REPORT_LABEL: &str = "report";

pub fn validate_report(value: &Value, label: Option<&str>) -> Result<Report> {
    let label = label.unwrap_or(DEFAULT_REPORT_LABEL);

    let Some(root) = value.as_object() else {
        return Err(schema_error(label, "document must be a JSON object"));
    };

    let version = match root.get("version") {
        Some(Value::Number(number)) => number.clone(),
        _ => return Err(schema_error(label, "version must be a number")),
    };

    let Some(summary) = root.get("summary").and_then(Value::as_object) else {
        return Err(schema_error(label, "summary must be an object"));
    };
    let Some(score) = summary.get("score").and_then(Value::as_f64) else {
        return Err(schema_error(label, "summary.score must be a number"));
    };
    let Some(passed) = summary.get("passed").and_then(Value::as_bool) else {
        return Err(schema_error(label, "summary.passed must be a boolean"));
    };

    let Some(raw_scenarios) = root.get("scenarios").and_then(Value::as_array) else {
        return Err(schema_error(label, "scenarios must be an array"));
    };
    let scenarios = raw_scenarios
        .iter()
        .enumerate()
        .map(|(index, raw)| validate_scenario(raw, index, label))
        .collect::<Result<Vec<_>>>()?;

    Ok(Report {
        version,
        summary: ReportSummary {
            score,
            passed,
            total_scenarios: summary.get("totalScenarios").and_then(as_count),
        },
        scenarios,
        metrics: root
            .get("metrics")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
        links: root
            .get("links")
            .and_then(Value::as_object)
            .map(collect_links)
            .unwrap_or_default(),
    })
}

/// Decodes raw bytes as JSON and validates the result.
pub fn parse_report_bytes(bytes: &[u8], label: Option<&str>) -> Result<Report> {
    let label_text = label.unwrap_or(DEFAULT_REPORT_LABEL);
    let value = serde_json::from_slice::<Value>(bytes).map_err(|err| {
        GateError::ReportUnavailable(format!("{label_text}: invalid JSON: {err}"))
    })?;
    validate_report(&value, label)
}

pub fn read_report_file(path: &Path, label: Option<&str>) -> Result<Report> {
    let label_text = label.unwrap_or(DEFAULT_REPORT_LABEL);
    let bytes = fs::read(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => GateError::ReportUnavailable(format!(
            "{label_text}: file not found: {}",
            path.display()
        )),
        _ => GateError::ReportUnavailable(format!(
            "{label_text}: failed to read {}: {err}",
            path.display()
        )),
    })?;
    parse_report_bytes(&bytes, label)
}

fn validate_scenario(raw: &Value, index: usize, label: &str) -> Result<Scenario> {
    let Some(object) = raw.as_object() else {
        return Err(schema_error(
            label,
            &format!("scenarios[{index}] must be an object"),
        ));
    };
    let id = match object.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            return Err(schema_error(
                label,
                &format!("scenarios[{index}].id must be a non-empty string"),
            ));
        }
    };
    let Some(passed) = object.get("passed").and_then(Value::as_bool) else {
        return Err(schema_error(
            label,
            &format!("scenarios[{index}].passed must be a boolean"),
        ));
    };

    Ok(Scenario {
        id,
        passed,
        score: object.get("score").and_then(Value::as_f64),
        elapsed_ms: object
            .get("elapsedMs")
            .and_then(Value::as_f64)
            .filter(|value| value.is_finite() && *value >= 0.0),
        notes: object
            .get("notes")
            .and_then(Value::as_str)
            .map(ToString::to_string),
        details: object.get("details").filter(|value| !value.is_null()).cloned(),
    })
}

fn collect_links(raw: &Map<String, Value>) -> Vec<ReportLink> {
    raw.iter()
        .filter_map(|(name, url)| {
            url.as_str().map(|url| ReportLink {
                name: name.clone(),
                url: url.to_string(),
            })
        })
        .collect()
}

fn as_count(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|raw| raw.is_finite() && *raw >= 0.0 && raw.fract() == 0.0)
            .map(|raw| raw as u64)
    })
}

fn schema_error(label: &str, message: &str) -> GateError {
    GateError::Schema(format!("{label}: {message}"))
}
