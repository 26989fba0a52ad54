use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::Result;
use crate::models::{CommentMode, CommentOutcome, CommentTarget};
use crate::pipeline::CommentPublisher;
use crate::summary::SUMMARY_MARKER;

use super::client::GitHubClient;

const COMMENTS_PER_PAGE: usize = 100;
const MAX_COMMENT_PAGES: usize = 50;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct IssueComment {
    pub(crate) id: u64,
    #[serde(default)]
    pub(crate) body: Option<String>,
}

/// Posts the summary on a pull request, replacing the previous one in update mode.
#[derive(Debug, Clone)]
pub struct GitHubCommentPublisher {
    client: GitHubClient,
}

impl GitHubCommentPublisher {
    #[must_use]
    pub const fn new(client: GitHubClient) -> Self {
        Self { client }
    }

    fn find_existing(&self, target: &CommentTarget) -> Result<Option<u64>> {
        let path = format!(
            "repos/{}/{}/issues/{}/comments",
            target.owner, target.repo, target.issue_number
        );
        for page in 1..=MAX_COMMENT_PAGES {
            let query = [
                ("per_page", COMMENTS_PER_PAGE.to_string()),
                ("page", page.to_string()),
            ];
            let comments = self
                .client
                .get_json::<Vec<IssueComment>>(&path, &query)?
                .unwrap_or_default();
            if let Some(id) = find_marker_comment(&comments, SUMMARY_MARKER) {
                return Ok(Some(id));
            }
            if comments.len() < COMMENTS_PER_PAGE {
                break;
            }
        }
        Ok(None)
    }

    fn create(&self, target: &CommentTarget, body: &str) -> Result<CommentOutcome> {
        let path = format!(
            "repos/{}/{}/issues/{}/comments",
            target.owner, target.repo, target.issue_number
        );
        let created = self
            .client
            .post_json::<IssueComment>(&path, &json!({ "body": body }))?;
        info!(comment_id = created.id, "summary comment created");
        Ok(CommentOutcome::Created {
            comment_id: created.id,
        })
    }

    fn update(&self, target: &CommentTarget, comment_id: u64, body: &str) -> Result<CommentOutcome> {
        let path = format!(
            "repos/{}/{}/issues/comments/{comment_id}",
            target.owner, target.repo
        );
        let updated = self
            .client
            .patch_json::<IssueComment>(&path, &json!({ "body": body }))?;
        info!(comment_id = updated.id, "summary comment updated");
        Ok(CommentOutcome::Updated {
            comment_id: updated.id,
        })
    }
}

impl CommentPublisher for GitHubCommentPublisher {
    fn publish(
        &self,
        target: &CommentTarget,
        body: &str,
        mode: CommentMode,
    ) -> Result<CommentOutcome> {
        match mode {
            CommentMode::Off => Ok(CommentOutcome::Skipped),
            CommentMode::Create => self.create(target, body),
            CommentMode::Update => match self.find_existing(target)? {
                Some(comment_id) => self.update(target, comment_id, body),
                None => self.create(target, body),
            },
        }
    }
}

pub(crate) fn find_marker_comment(comments: &[IssueComment], marker: &str) -> Option<u64> {
    comments
        .iter()
        .find(|comment| {
            comment
                .body
                .as_deref()
                .is_some_and(|body| body.contains(marker))
        })
        .map(|comment| comment.id)
}
