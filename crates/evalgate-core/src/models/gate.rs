use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricThreshold {
    pub key: String,
    pub max_increase: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateConfig {
    pub fail_on_command_error: bool,
    pub fail_on_any_scenario_fail: bool,
    pub min_score: Option<f64>,
    pub max_score_drop: Option<f64>,
    /// Declared order is evaluation order.
    pub max_metric_regressions: Vec<MetricThreshold>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            fail_on_command_error: true,
            fail_on_any_scenario_fail: true,
            min_score: None,
            max_score_drop: None,
            max_metric_regressions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateResult {
    pub passed: bool,
    pub reasons: Vec<String>,
    pub failed_scenario_count: usize,
}

impl GateResult {
    #[must_use]
    pub fn from_reasons(reasons: Vec<String>, failed_scenario_count: usize) -> Self {
        Self {
            passed: reasons.is_empty(),
            reasons,
            failed_scenario_count,
        }
    }
}

/// Exit status of the evaluation command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandStatus {
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
}

impl CommandStatus {
    #[must_use]
    pub const fn success() -> Self {
        Self {
            code: 0,
            signal: None,
        }
    }

    #[must_use]
    pub const fn exited(code: i32) -> Self {
        Self { code, signal: None }
    }

    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.code == 0
    }
}
