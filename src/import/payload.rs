use crate::model::issue::{CommentRecord, IssueRecord};
use crate::providers::types::{CustomFieldValue, TaskPayload};
use crate::util::date::{format_long, format_short, to_unix_ms};

/// Task description: a metadata block followed by the normalized description.
pub fn compose_description(record: &IssueRecord) -> String {
    let mut metadata = Vec::new();
    if let Some(created) = &record.created {
        metadata.push(format!("**Created:** {}", format_long(created)));
    }
    if !record.assignee.is_empty() {
        metadata.push(format!("**Assignee:** {}", record.assignee));
    }
    if !record.reporter.is_empty() {
        metadata.push(format!("**Reporter:** {}", record.reporter));
    }

    let mut parts = Vec::new();
    if !metadata.is_empty() {
        parts.push(metadata.join("\n"));
    }
    if !record.description.is_empty() {
        parts.push(format!("## Description\n\n{}", record.description));
    }
    parts.join("\n\n")
}

pub fn build_payload(record: &IssueRecord, custom_fields: Vec<CustomFieldValue>) -> TaskPayload {
    TaskPayload {
        name: record.task_name(),
        markdown_content: compose_description(record),
        priority: record.priority,
        tags: record.tags.clone(),
        status: record.mapped_status,
        due_date: record.due.as_ref().map(to_unix_ms),
        custom_fields,
    }
}

pub fn comment_text(comment: &CommentRecord) -> String {
    format!(
        "Original comment by {} ({}):\n\n{}",
        comment.author,
        format_short(comment.created.as_ref()),
        comment.content
    )
}
