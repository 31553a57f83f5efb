use std::collections::HashMap;

use roxmltree::Node;

use super::xml::{child, plain_text};

const PERSON_ELEMENTS: &[&str] = &["assignee", "reporter"];

#[derive(Debug, Default, Clone)]
pub struct IdentityMap {
    names: HashMap<String, String>,
}

impl IdentityMap {
    /// Later occurrences of the same account overwrite earlier ones.
    pub fn build<'a, 'input: 'a>(items: impl IntoIterator<Item = Node<'a, 'input>>) -> Self {
        let mut map = Self::default();
        for item in items {
            for tag in PERSON_ELEMENTS {
                if let Some(person) = child(item, tag) {
                    map.insert(account_id(person), &plain_text(person));
                }
            }
        }
        tracing::debug!(users = map.len(), "Built identity map");
        map
    }

    pub fn insert(&mut self, account_id: &str, display_name: &str) {
        if account_id.is_empty() || display_name.is_empty() {
            return;
        }
        self.names
            .insert(account_id.to_string(), display_name.to_string());
    }

    /// Display name for `account_id`, or the id itself when unknown.
    pub fn resolve<'a>(&'a self, account_id: &'a str) -> &'a str {
        self.names
            .get(account_id)
            .map_or(account_id, String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

/// Cloud exports use `accountid`; older server exports only carry `username`.
pub fn account_id<'a>(person: Node<'a, '_>) -> &'a str {
    person
        .attribute("accountid")
        .or_else(|| person.attribute("username"))
        .unwrap_or_default()
}
