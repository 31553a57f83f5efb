use serde::{Deserialize, Serialize};

use crate::mapping::vocabulary::DestinationStatus;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TaskPayload {
    pub name: String,
    pub markdown_content: String,
    pub priority: u8,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DestinationStatus>,
    /// Milliseconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<CustomFieldValue>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CustomFieldValue {
    pub id: String,
    pub value: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedTask {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldList {
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: String,
    #[serde(default)]
    pub type_config: FieldTypeConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldTypeConfig {
    #[serde(default)]
    pub options: Vec<FieldOption>,
    #[serde(default)]
    pub allow_create_options: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldOption {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl FieldOption {
    /// Label-type fields use `label`, others `name`.
    pub fn display_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.label.as_deref())
    }
}
