use serde::Serialize;
use serde_json::{Map, Number, Value};

/// A structurally validated evaluation report.
///
/// Only built by [`crate::validate::validate_report`]; optional fields keep the
/// raw JSON they were given so downstream consumers decide how to coerce them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub version: Number,
    pub summary: ReportSummary,
    pub scenarios: Vec<Scenario>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub metrics: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<ReportLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub score: f64,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_scenarios: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLink {
    pub name: String,
    pub url: String,
}

impl Report {
    /// Numeric metric value, `None` for missing or non-numeric entries.
    #[must_use]
    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).and_then(Value::as_f64)
    }

    #[must_use]
    pub fn failed_scenarios(&self) -> Vec<&Scenario> {
        self.scenarios
            .iter()
            .filter(|scenario| !scenario.passed)
            .collect()
    }

    /// Declared total when the report carries one, otherwise the scenario count.
    #[must_use]
    pub fn total_scenarios(&self) -> u64 {
        self.summary
            .total_scenarios
            .unwrap_or(self.scenarios.len() as u64)
    }
}

/// A metric key with its numeric change from the baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDelta {
    pub key: String,
    pub current: f64,
    pub baseline: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diff {
    pub score_delta: f64,
    pub metric_deltas: Vec<MetricDelta>,
}

impl Diff {
    #[must_use]
    pub fn metric_delta(&self, key: &str) -> Option<f64> {
        self.metric_deltas
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.delta)
    }
}
