//! GitHub-backed collaborators: REST client, baseline lookup, artifact upload,
//! PR comments and workflow step outputs.

mod artifacts;
mod client;
mod comments;
pub mod context;
mod lookup;
pub mod outputs;

pub use artifacts::ActionsArtifactPublisher;
pub use client::{GitHubClient, GitHubConfig, USER_AGENT_VALUE};
pub use comments::GitHubCommentPublisher;
pub use context::{Repository, WorkflowContext, pull_request_number_from_event};
pub use lookup::GitHubBaselineLookup;
pub use outputs::{append_outputs, append_step_summary, format_output_entry};
