use std::collections::HashMap;

use crate::providers::types::{CustomFieldValue, FieldDefinition};
use crate::providers::Destination;

pub const DEFAULT_ASSIGNEE_FIELD_ID: &str = "8385553f-b815-469f-9258-f1102e1f9239";

/// The field list is fetched at most once. A failed fetch is cached as an
/// empty map, so every later lookup in the run is absent.
pub struct CustomFieldResolver {
    field_id: Option<String>,
    options: Option<HashMap<String, String>>,
}

impl CustomFieldResolver {
    /// `None` or an empty id disables the enrichment.
    pub fn new(field_id: Option<String>) -> Self {
        Self {
            field_id: field_id.filter(|id| !id.trim().is_empty()),
            options: None,
        }
    }

    pub fn field_id(&self) -> Option<&str> {
        self.field_id.as_deref()
    }

    pub async fn option_for(&mut self, destination: &dyn Destination, name: &str) -> Option<String> {
        if name.is_empty() {
            return None;
        }
        let field_id = self.field_id.clone()?;
        if self.options.is_none() {
            self.options = Some(fetch_options(destination, &field_id).await);
        }
        self.options.as_ref()?.get(name).cloned()
    }

    pub async fn custom_fields_for(
        &mut self,
        destination: &dyn Destination,
        assignee: &str,
    ) -> Vec<CustomFieldValue> {
        let Some(field_id) = self.field_id.clone() else {
            return Vec::new();
        };
        match self.option_for(destination, assignee).await {
            Some(option_id) => {
                tracing::debug!(assignee, option_id = %option_id, "Mapped assignee to field option");
                vec![CustomFieldValue {
                    id: field_id,
                    value: vec![option_id],
                }]
            }
            None => {
                if !assignee.is_empty() {
                    tracing::info!(assignee, "No matching field option, assignee stays in the description only");
                }
                Vec::new()
            }
        }
    }
}

async fn fetch_options(destination: &dyn Destination, field_id: &str) -> HashMap<String, String> {
    match destination.list_fields().await {
        Ok(fields) => {
            let options = options_for_field(&fields, field_id);
            tracing::debug!(field_id, options = options.len(), "Loaded custom field options");
            options
        }
        Err(err) => {
            tracing::warn!(error = %err, "Could not load custom fields, continuing without them");
            HashMap::new()
        }
    }
}

/// Options named `None` are the destination's placeholder and are skipped.
pub fn options_for_field(fields: &[FieldDefinition], field_id: &str) -> HashMap<String, String> {
    let Some(field) = fields.iter().find(|f| f.id == field_id) else {
        tracing::warn!(field_id, "Custom field not found on list");
        return HashMap::new();
    };
    field
        .type_config
        .options
        .iter()
        .filter_map(|option| {
            let name = option.display_name()?;
            let id = option.id.as_deref()?;
            (name != "None").then(|| (name.to_string(), id.to_string()))
        })
        .collect()
}
