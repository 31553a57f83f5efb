use std::path::Path;

use async_trait::async_trait;
use base64::Engine;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use super::{ensure_success, ApiError, AttachmentSource};

pub struct JiraAttachmentSource {
    base_url: String,
    auth_header: String,
    client: reqwest::Client,
}

impl JiraAttachmentSource {
    pub fn new(base_url: &str, email: &str, api_token: &str) -> Self {
        let creds = format!("{email}:{api_token}");
        let encoded = base64::engine::general_purpose::STANDARD.encode(creds);
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            auth_header: format!("Basic {encoded}"),
            client: reqwest::Client::new(),
        }
    }

    /// Build a source only when every credential is present and non-empty.
    pub fn from_credentials(
        base_url: Option<&str>,
        email: Option<&str>,
        api_token: Option<&str>,
    ) -> Option<Self> {
        Some(Self::new(
            present(base_url)?,
            present(email)?,
            present(api_token)?,
        ))
    }

    fn content_url(&self, attachment_id: &str) -> String {
        format!("{}/rest/api/3/attachment/content/{attachment_id}", self.base_url)
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[async_trait]
impl AttachmentSource for JiraAttachmentSource {
    async fn download(&self, attachment_id: &str, dest: &Path) -> Result<u64, ApiError> {
        let url = self.content_url(attachment_id);
        tracing::debug!(url = %url, "Downloading attachment");

        let resp = self
            .client
            .get(&url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "*/*")
            .send()
            .await?;
        let resp = ensure_success(resp).await?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        tracing::debug!(attachment_id, bytes = written, "Attachment downloaded");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_basic_auth_and_content_url() {
        let source = JiraAttachmentSource::new("https://acme.atlassian.net/", "me@acme.io", "tok");
        assert_eq!(source.auth_header, "Basic bWVAYWNtZS5pbzp0b2s=");
        assert_eq!(
            source.content_url("10042"),
            "https://acme.atlassian.net/rest/api/3/attachment/content/10042"
        );
    }

    #[test]
    fn padded_credentials_are_trimmed() {
        let source = JiraAttachmentSource::from_credentials(
            Some(" https://acme.atlassian.net/ "),
            Some(" me@acme.io "),
            Some("tok\n"),
        )
        .unwrap();
        assert_eq!(source.auth_header, "Basic bWVAYWNtZS5pbzp0b2s=");
        assert_eq!(
            source.content_url("7"),
            "https://acme.atlassian.net/rest/api/3/attachment/content/7"
        );
    }

    #[test]
    fn missing_credentials_yield_no_source() {
        let url = Some("https://acme.atlassian.net");
        assert!(JiraAttachmentSource::from_credentials(url, Some("me@acme.io"), Some("tok")).is_some());
        assert!(JiraAttachmentSource::from_credentials(url, None, Some("tok")).is_none());
        assert!(JiraAttachmentSource::from_credentials(url, Some("me@acme.io"), Some("  ")).is_none());
        assert!(JiraAttachmentSource::from_credentials(None, Some("me@acme.io"), Some("tok")).is_none());
    }
}
