pub mod clickup;
pub mod jira;
pub mod types;

use std::path::Path;

use async_trait::async_trait;

use types::{CreatedTask, FieldDefinition, TaskPayload};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

#[async_trait]
pub trait Destination: Send + Sync {
    fn name(&self) -> &str;
    async fn create_task(&self, payload: &TaskPayload) -> Result<CreatedTask, ApiError>;
    async fn add_comment(&self, task_id: &str, text: &str) -> Result<(), ApiError>;
    async fn upload_attachment(
        &self,
        task_id: &str,
        file: &Path,
        filename: &str,
        content_type: &str,
    ) -> Result<(), ApiError>;
    async fn list_fields(&self) -> Result<Vec<FieldDefinition>, ApiError>;
}

#[async_trait]
pub trait AttachmentSource: Send + Sync {
    /// Returns the number of bytes written to `dest`.
    async fn download(&self, attachment_id: &str, dest: &Path) -> Result<u64, ApiError>;
}

pub(crate) async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), body = %body, "Request rejected");
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}
