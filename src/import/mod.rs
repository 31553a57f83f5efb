pub mod payload;
pub mod relay;

use std::time::Duration;

use crate::mapping::custom_fields::CustomFieldResolver;
use crate::model::issue::IssueRecord;
use crate::model::outcome::{CreatedRecord, FailedRecord, ImportReport};
use crate::providers::Destination;
use payload::{build_payload, comment_text};
use relay::{AttachmentRelay, RelayOutcome};

/// Fixed pauses that keep the run under the destination's rate limits.
/// Failed calls are never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    /// After each comment or attachment call.
    pub item_delay: Duration,
    pub record_delay: Duration,
}

impl Throttle {
    #[cfg(test)]
    pub const NONE: Self = Self {
        item_delay: Duration::ZERO,
        record_delay: Duration::ZERO,
    };
}

impl Default for Throttle {
    fn default() -> Self {
        Self {
            item_delay: Duration::from_millis(500),
            record_delay: Duration::from_millis(1000),
        }
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// One importer holds one run's state, including the custom-field cache.
pub struct Importer {
    destination: Box<dyn Destination>,
    relay: AttachmentRelay,
    fields: CustomFieldResolver,
    throttle: Throttle,
}

impl Importer {
    pub fn new(
        destination: Box<dyn Destination>,
        relay: AttachmentRelay,
        fields: CustomFieldResolver,
        throttle: Throttle,
    ) -> Self {
        Self {
            destination,
            relay,
            fields,
            throttle,
        }
    }

    /// A record's failure never stops the records after it. In a dry run
    /// nothing is created and `created`/`failed` stay empty.
    pub async fn run(&mut self, records: &[IssueRecord], dry_run: bool) -> ImportReport {
        let mut report = ImportReport::new(dry_run);
        let total = records.len();
        let prefix = if dry_run { "DRY RUN: " } else { "" };
        println!("\n{prefix}Starting import of {total} tasks...");
        tracing::info!(
            destination = self.destination.name(),
            total,
            dry_run,
            attachments = self.relay.is_enabled(),
            assignee_field = self.fields.field_id().unwrap_or("-"),
            "Import started"
        );

        for (index, record) in records.iter().enumerate() {
            report.processed += 1;
            let name = record.task_name();
            println!(
                "\n[{}/{total}] Processing task: {} - {}",
                index + 1,
                record.key,
                truncate(&name, 50)
            );

            let custom_fields = self
                .fields
                .custom_fields_for(self.destination.as_ref(), &record.assignee)
                .await;
            let payload = build_payload(record, custom_fields);

            if dry_run {
                match serde_json::to_string_pretty(&payload) {
                    Ok(json) => println!("  Would create task: {json}"),
                    Err(err) => println!("  Would create task {name} (payload not printable: {err})"),
                }
                continue;
            }

            match self.destination.create_task(&payload).await {
                Ok(task) => {
                    println!("  \u{2713} Successfully created task with ID: {}", task.id);
                    if let Some(url) = &task.url {
                        println!("    {url}");
                    }
                    let created = self.replay_children(record, &task.id).await;
                    report.created.push(created);
                }
                Err(err) => {
                    println!("  \u{2717} Failed to create task: {err}");
                    tracing::warn!(key = %record.key, error = %err, "Task creation failed");
                    report.failed.push(FailedRecord {
                        key: record.key.clone(),
                        title: record.title.clone(),
                        error: err.to_string(),
                    });
                }
            }

            pause(self.throttle.record_delay).await;
        }

        tracing::info!(
            processed = report.processed,
            created = report.created.len(),
            failed = report.failed.len(),
            "Import finished"
        );
        report
    }

    /// Sub-item failures are counted but never undo the created task.
    async fn replay_children(&self, record: &IssueRecord, task_id: &str) -> CreatedRecord {
        let mut created = CreatedRecord::new(&record.key, task_id, &record.title);
        let destination = self.destination.as_ref();

        if !record.comments.is_empty() {
            println!("  Adding {} comments...", record.comments.len());
        }
        for (index, comment) in record.comments.iter().enumerate() {
            match destination.add_comment(task_id, &comment_text(comment)).await {
                Ok(()) => {
                    println!("    \u{2713} Added comment {}", index + 1);
                    created.comments_added += 1;
                }
                Err(err) => {
                    println!("    \u{2717} Failed to add comment {}: {err}", index + 1);
                    tracing::warn!(key = %record.key, comment = %comment.id, error = %err, "Comment failed");
                    created.comments_failed += 1;
                }
            }
            pause(self.throttle.item_delay).await;
        }

        if !record.attachments.is_empty() {
            println!("  Processing {} attachments...", record.attachments.len());
        }
        for (index, attachment) in record.attachments.iter().enumerate() {
            let n = index + 1;
            let filename = &attachment.filename;
            match self.relay.relay(destination, task_id, attachment).await {
                RelayOutcome::Uploaded { bytes } => {
                    println!("    \u{2713} Added attachment {n}: {filename}");
                    tracing::debug!(key = %record.key, filename = %filename, bytes, "Attachment relayed");
                    created.attachments_uploaded += 1;
                }
                RelayOutcome::Skipped => {
                    println!("    - Skipped attachment {n}: {filename} (no source credentials)");
                    created.attachments_skipped += 1;
                }
                RelayOutcome::DownloadFailed(err) => {
                    println!("    \u{2717} Failed to download attachment {n}: {filename}");
                    tracing::warn!(key = %record.key, filename = %filename, error = %err, "Attachment download failed");
                    created.attachments_failed += 1;
                }
                RelayOutcome::UploadFailed(err) => {
                    println!("    \u{2717} Failed to upload attachment {n}: {filename}");
                    tracing::warn!(key = %record.key, filename = %filename, error = %err, "Attachment upload failed");
                    created.attachments_failed += 1;
                }
            }
            pause(self.throttle.item_delay).await;
        }

        created
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}
