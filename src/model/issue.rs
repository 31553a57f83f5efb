use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::mapping::vocabulary::DestinationStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRecord {
    pub key: String,
    pub title: String,
    /// Markdown.
    pub description: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapped_status: Option<DestinationStatus>,
    pub priority: u8,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<FixedOffset>>,
    pub assignee: String,
    pub reporter: String,
    pub project: String,
    #[serde(default)]
    pub comments: Vec<CommentRecord>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRecord>,
}

impl IssueRecord {
    pub fn task_name(&self) -> String {
        format!("[{}] {}", self.key, self.title)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: String,
    pub author: String,
    pub author_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<FixedOffset>>,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub id: String,
    pub filename: String,
    /// Size in bytes, 0 when the export value is not a number.
    pub size: u64,
    pub author: String,
    pub author_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<FixedOffset>>,
}
