use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentMode {
    Create,
    Update,
    Off,
}

impl CommentMode {
    pub fn parse(raw: &str) -> std::result::Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "update" | "create-or-update" | "upsert" => Ok(Self::Update),
            "off" | "none" | "false" | "" => Ok(Self::Off),
            other => Err(format!(
                "comment mode must be one of create, update, off (got '{other}')"
            )),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Off => "off",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentTarget {
    pub owner: String,
    pub repo: String,
    pub issue_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CommentOutcome {
    Skipped,
    Created { comment_id: u64 },
    Updated { comment_id: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedArtifact {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<u64>,
    pub size_bytes: u64,
}
