use std::path::PathBuf;

use clap::{Args, ValueEnum};
use evalgate_core::config::GateConfigInputs;

/// Threshold inputs. Values stay raw so empty action inputs mean "unset".
#[derive(Debug, Clone, Default, Args)]
pub struct GateArgs {
    #[arg(long, env = "INPUT_FAIL_ON_COMMAND_ERROR", value_name = "BOOL")]
    pub fail_on_command_error: Option<String>,
    #[arg(long, env = "INPUT_FAIL_ON_ANY_SCENARIO_FAIL", value_name = "BOOL")]
    pub fail_on_any_scenario_fail: Option<String>,
    /// Fail when `summary.score` is below this value.
    #[arg(long, env = "INPUT_MIN_SCORE")]
    pub min_score: Option<String>,
    /// Fail when the score drops by more than this versus the baseline.
    #[arg(long, env = "INPUT_MAX_SCORE_DROP")]
    pub max_score_drop: Option<String>,
    /// JSON object of metric key to allowed increase, e.g. `{"latency_ms": 50}`.
    #[arg(long, env = "INPUT_MAX_METRIC_REGRESSIONS", value_name = "JSON")]
    pub max_metric_regressions: Option<String>,
}

impl GateArgs {
    pub fn to_inputs(&self) -> GateConfigInputs {
        GateConfigInputs {
            fail_on_command_error: self.fail_on_command_error.clone(),
            fail_on_any_scenario_fail: self.fail_on_any_scenario_fail.clone(),
            min_score: self.min_score.clone(),
            max_score_drop: self.max_score_drop.clone(),
            max_metric_regressions: self.max_metric_regressions.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Shell command that runs the evaluation and writes the report.
    #[arg(long, env = "INPUT_COMMAND")]
    pub command: String,
    /// Report location, relative to the workspace.
    #[arg(long, env = "INPUT_REPORT_PATH")]
    pub report_path: Option<String>,
    #[arg(long, env = "INPUT_TITLE", default_value = "Eval gate")]
    pub title: String,
    #[command(flatten)]
    pub gate: GateArgs,
    /// Local baseline report; takes precedence over the workflow lookup.
    #[arg(long, env = "INPUT_BASELINE_PATH")]
    pub baseline_path: Option<String>,
    /// Workflow id, file name or name whose runs hold baseline artifacts.
    #[arg(long, env = "INPUT_BASELINE_WORKFLOW")]
    pub baseline_workflow: Option<String>,
    #[arg(long, env = "INPUT_BASELINE_BRANCH")]
    pub baseline_branch: Option<String>,
    /// Baseline artifact name; defaults to the artifact name.
    #[arg(long, env = "INPUT_BASELINE_ARTIFACT")]
    pub baseline_artifact: Option<String>,
    #[arg(long, env = "INPUT_ARTIFACT_NAME")]
    pub artifact_name: Option<String>,
    #[arg(long, env = "INPUT_ARTIFACT_RETENTION_DAYS", value_name = "DAYS")]
    pub artifact_retention_days: Option<String>,
    #[arg(long, env = "INPUT_UPLOAD_ARTIFACT", value_name = "BOOL")]
    pub upload_artifact: Option<String>,
    /// create, update (create-or-update) or off.
    #[arg(long, env = "INPUT_COMMENT_MODE")]
    pub comment_mode: Option<String>,
    /// Pull request to comment on; read from the event payload when unset.
    #[arg(long, env = "INPUT_PR_NUMBER")]
    pub pr_number: Option<String>,
    /// Falls back to `GITHUB_TOKEN`.
    #[arg(long, env = "INPUT_GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[arg(long)]
    pub report: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    #[arg(long)]
    pub report: PathBuf,
    #[arg(long)]
    pub baseline: Option<PathBuf>,
    #[arg(long, default_value = "Eval gate")]
    pub title: String,
    #[command(flatten)]
    pub gate: GateArgs,
    #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
    pub format: OutputFormat,
}
