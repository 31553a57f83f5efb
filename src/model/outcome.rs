use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CreatedRecord {
    pub key: String,
    pub task_id: String,
    pub title: String,
    pub comments_added: usize,
    pub comments_failed: usize,
    pub attachments_uploaded: usize,
    pub attachments_failed: usize,
    pub attachments_skipped: usize,
}

impl CreatedRecord {
    pub fn new(key: &str, task_id: &str, title: &str) -> Self {
        Self {
            key: key.to_string(),
            task_id: task_id.to_string(),
            title: title.to_string(),
            comments_added: 0,
            comments_failed: 0,
            attachments_uploaded: 0,
            attachments_failed: 0,
            attachments_skipped: 0,
        }
    }

    /// At least one comment or attachment reached the destination.
    pub fn has_side_effects(&self) -> bool {
        self.comments_added > 0 || self.attachments_uploaded > 0
    }

    fn has_child_failures(&self) -> bool {
        self.comments_failed > 0 || self.attachments_failed > 0
    }
}

/// Nothing beyond the create call was attempted for a failed record.
#[derive(Debug, Clone, Serialize)]
pub struct FailedRecord {
    pub key: String,
    pub title: String,
    pub error: String,
}

/// `created` and `failed` are disjoint and, after a non-dry run, together
/// cover every processed record. `unparsed` holds items the export reader
/// had to drop, which never became records.
#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub dry_run: bool,
    pub processed: usize,
    pub created: Vec<CreatedRecord>,
    pub failed: Vec<FailedRecord>,
    pub unparsed: Vec<String>,
    pub recovered: bool,
}

impl ImportReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty() || !self.unparsed.is_empty()
    }

    pub fn print_summary(&self) {
        print!("{}", self.summary());
    }

    fn summary(&self) -> String {
        let mut out = String::new();
        let prefix = if self.dry_run { "DRY RUN " } else { "" };
        out.push_str(&format!("\n{prefix}IMPORT SUMMARY:\n"));
        out.push_str(&format!("Total tasks processed: {}\n", self.processed));
        if self.recovered {
            out.push_str("Export was malformed and read item by item\n");
        }

        if !self.dry_run {
            let with_history = self.created.iter().filter(|c| c.has_side_effects()).count();
            out.push_str(&format!("Successfully created: {}\n", self.created.len()));
            out.push_str(&format!("  with comments or attachments: {with_history}\n"));
            out.push_str(&format!("Failed: {}\n", self.failed.len()));

            if !self.failed.is_empty() {
                out.push_str("\nFailed tasks:\n");
                for failed in &self.failed {
                    out.push_str(&format!("  - {}: {} ({})\n", failed.key, failed.title, failed.error));
                }
            }

            let partial: Vec<&CreatedRecord> =
                self.created.iter().filter(|c| c.has_child_failures()).collect();
            if !partial.is_empty() {
                out.push_str("\nCreated with missing comments or attachments:\n");
                for created in partial {
                    out.push_str(&format!(
                        "  - {}: {} comment(s), {} attachment(s) failed\n",
                        created.key, created.comments_failed, created.attachments_failed
                    ));
                }
            }
        }

        if !self.unparsed.is_empty() {
            out.push_str(&format!("\nUnreadable items skipped: {}\n", self.unparsed.len()));
            for key in &self.unparsed {
                out.push_str(&format!("  - {key}\n"));
            }
        }
        out
    }
}
