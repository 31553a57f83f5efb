use std::io;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::model::issue::AttachmentRecord;
use crate::providers::{ApiError, AttachmentSource, Destination};
use crate::util::mime::guess_content_type;

#[derive(Debug)]
pub enum RelayOutcome {
    Uploaded { bytes: u64 },
    /// No source credentials; nothing was attempted.
    Skipped,
    DownloadFailed(ApiError),
    UploadFailed(ApiError),
}

pub struct AttachmentRelay {
    source: Option<Box<dyn AttachmentSource>>,
}

impl AttachmentRelay {
    pub fn new(source: Box<dyn AttachmentSource>) -> Self {
        Self {
            source: Some(source),
        }
    }

    /// Every attachment is reported as skipped.
    pub fn disabled() -> Self {
        Self { source: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.source.is_some()
    }

    /// The transient file is removed whatever the outcome.
    pub async fn relay(
        &self,
        destination: &dyn Destination,
        task_id: &str,
        attachment: &AttachmentRecord,
    ) -> RelayOutcome {
        let Some(source) = &self.source else {
            tracing::debug!(attachment = %attachment.filename, "No source credentials, skipping attachment");
            return RelayOutcome::Skipped;
        };

        let transient = match transient_file(&attachment.filename) {
            Ok(file) => file,
            Err(err) => return RelayOutcome::DownloadFailed(err.into()),
        };

        let bytes = match source.download(&attachment.id, transient.path()).await {
            Ok(bytes) => bytes,
            Err(err) => return RelayOutcome::DownloadFailed(err),
        };

        let content_type = guess_content_type(&attachment.filename);
        let outcome = match destination
            .upload_attachment(task_id, transient.path(), &attachment.filename, content_type)
            .await
        {
            Ok(()) => RelayOutcome::Uploaded { bytes },
            Err(err) => RelayOutcome::UploadFailed(err),
        };

        if let Err(err) = transient.close() {
            tracing::debug!(error = %err, "Could not remove transient attachment file");
        }
        outcome
    }
}

/// Keeps the attachment's extension.
fn transient_file(filename: &str) -> io::Result<NamedTempFile> {
    let suffix = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    tempfile::Builder::new()
        .prefix("jira-attachment-")
        .suffix(&suffix)
        .tempfile()
}
