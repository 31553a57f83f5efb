use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::json;

use super::types::{CreatedTask, FieldDefinition, FieldList, TaskPayload};
use super::{ensure_success, ApiError, Destination};

const BASE_URL: &str = "https://api.clickup.com/api/v2";

pub struct ClickUpDestination {
    base_url: String,
    list_id: String,
    auth_header: String,
    client: reqwest::Client,
}

impl ClickUpDestination {
    pub fn new(api_token: &str, list_id: String) -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            list_id,
            auth_header: personal_token(api_token),
            client: reqwest::Client::new(),
        }
    }
}

/// Personal API tokens carry a `pk_` prefix; add it only when missing.
pub fn personal_token(token: &str) -> String {
    let token = token.trim();
    if token.starts_with("pk_") {
        token.to_string()
    } else {
        format!("pk_{token}")
    }
}

#[async_trait]
impl Destination for ClickUpDestination {
    fn name(&self) -> &str {
        "ClickUp"
    }

    async fn create_task(&self, payload: &TaskPayload) -> Result<CreatedTask, ApiError> {
        let url = format!("{}/list/{}/task", self.base_url, self.list_id);
        tracing::debug!(url = %url, name = %payload.name, "Creating task");

        let resp = self
            .client
            .post(&url)
            .header("Authorization", &self.auth_header)
            .json(payload)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;

        let created: CreatedTask = resp.json().await?;
        tracing::debug!(task_id = %created.id, "Task created");
        Ok(created)
    }

    async fn add_comment(&self, task_id: &str, text: &str) -> Result<(), ApiError> {
        let url = format!("{}/task/{task_id}/comment", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("Authorization", &self.auth_header)
            .json(&json!({ "comment_text": text }))
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }

    async fn upload_attachment(
        &self,
        task_id: &str,
        file: &Path,
        filename: &str,
        content_type: &str,
    ) -> Result<(), ApiError> {
        let url = format!("{}/task/{task_id}/attachment", self.base_url);
        tracing::debug!(task_id, filename, content_type, "Uploading attachment");

        let bytes = tokio::fs::read(file).await?;
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)?;
        let form = Form::new().part("attachment", part);

        // Content-Type comes from the multipart form, not the JSON default.
        let resp = self
            .client
            .post(&url)
            .header("Authorization", &self.auth_header)
            .multipart(form)
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }

    async fn list_fields(&self) -> Result<Vec<FieldDefinition>, ApiError> {
        let url = format!("{}/list/{}/field", self.base_url, self.list_id);
        let resp = self
            .client
            .get(&url)
            .header("Authorization", &self.auth_header)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;

        let list: FieldList = resp
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(list.fields)
    }
}
