// Public fallible APIs in this crate share one concrete error contract (`GateError`).
// Repeating per-function `# Errors` boilerplate obscures behavior more than it clarifies.
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type; per-item boilerplate would duplicate contract"
)]

pub mod baseline;
pub mod command;
pub mod config;
pub mod diff;
pub mod error;
pub mod gate;
pub mod github;
pub mod models;
pub mod pipeline;
pub mod summary;
pub(crate) mod text;
pub mod validate;

#[cfg(test)]
mod test_support;

pub use baseline::{BaselineSettings, locate_baseline};
pub use command::ShellCommandRunner;
pub use diff::compute_diff;
pub use error::{ErrorPayload, GateError, Result};
pub use gate::evaluate;
pub use pipeline::{
    ArtifactPublisher, BaselineLookup, Collaborators, CommandRunner, CommentPublisher, GateRun,
    RunSettings, run_pipeline,
};
pub use summary::{SUMMARY_MARKER, SummaryInput, render_summary};
pub use validate::{parse_report_bytes, read_report_file, validate_report};
