use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::import::Throttle;
use crate::mapping::custom_fields::DEFAULT_ASSIGNEE_FIELD_ID;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    pub clickup: Option<ClickUpConfig>,
    pub jira: Option<JiraConfig>,
    pub throttle: Option<ThrottleConfig>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ClickUpConfig {
    pub api_token: Option<String>,
    pub list_id: Option<String>,
    pub assignee_field_id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct JiraConfig {
    pub base_url: Option<String>,
    pub email: Option<String>,
    pub api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ThrottleConfig {
    #[serde(default = "default_comment_delay_ms")]
    pub comment_delay_ms: u64,
    #[serde(default = "default_record_delay_ms")]
    pub record_delay_ms: u64,
}

fn default_comment_delay_ms() -> u64 {
    500
}

fn default_record_delay_ms() -> u64 {
    1000
}

impl From<&ThrottleConfig> for Throttle {
    fn from(config: &ThrottleConfig) -> Self {
        Throttle {
            item_delay: Duration::from_millis(config.comment_delay_ms),
            record_delay: Duration::from_millis(config.record_delay_ms),
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("jira2clickup")
        .join("config.toml")
}

/// The default location may be absent; an explicit `--config` path must exist.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = config_path();
            if !path.exists() {
                return Ok(AppConfig::default());
            }
            path
        }
    };
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

fn parse_config(contents: &str) -> Result<AppConfig> {
    Ok(toml::from_str(contents)?)
}

/// Flags, with clap's env fallbacks already applied.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub clickup_token: Option<String>,
    pub list_id: Option<String>,
    pub assignee_field_id: Option<String>,
    pub jira_base_url: Option<String>,
    pub jira_email: Option<String>,
    pub jira_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DestinationSettings {
    pub api_token: String,
    pub list_id: String,
    /// `None` when the assignee field is disabled.
    pub assignee_field_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SourceSettings {
    pub base_url: Option<String>,
    pub email: Option<String>,
    pub api_token: Option<String>,
}

impl SourceSettings {
    pub fn is_complete(&self) -> bool {
        self.base_url.is_some() && self.email.is_some() && self.api_token.is_some()
    }
}

fn pick(flag: Option<&String>, file: Option<&String>) -> Option<String> {
    flag.or(file)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    pub fn destination(&self, overrides: &Overrides) -> Result<DestinationSettings> {
        let file = self.clickup.as_ref();
        let api_token = pick(
            overrides.clickup_token.as_ref(),
            file.and_then(|c| c.api_token.as_ref()),
        );
        let list_id = pick(
            overrides.list_id.as_ref(),
            file.and_then(|c| c.list_id.as_ref()),
        );
        let Some(api_token) = api_token else {
            bail!("ClickUp API token is required. Set CLICKUP_API_TOKEN or pass --clickup-token");
        };
        let Some(list_id) = list_id else {
            bail!("ClickUp list id is required. Set CLICKUP_LIST_ID or pass --list-id");
        };

        // An explicitly empty value disables the field; absence means the default.
        let assignee_field_id = match overrides
            .assignee_field_id
            .as_ref()
            .or(file.and_then(|c| c.assignee_field_id.as_ref()))
        {
            Some(id) if id.trim().is_empty() => None,
            Some(id) => Some(id.trim().to_string()),
            None => Some(DEFAULT_ASSIGNEE_FIELD_ID.to_string()),
        };

        Ok(DestinationSettings {
            api_token,
            list_id,
            assignee_field_id,
        })
    }

    pub fn source(&self, overrides: &Overrides) -> SourceSettings {
        let file = self.jira.as_ref();
        SourceSettings {
            base_url: pick(
                overrides.jira_base_url.as_ref(),
                file.and_then(|c| c.base_url.as_ref()),
            ),
            email: pick(
                overrides.jira_email.as_ref(),
                file.and_then(|c| c.email.as_ref()),
            ),
            api_token: pick(
                overrides.jira_token.as_ref(),
                file.and_then(|c| c.api_token.as_ref()),
            ),
        }
    }

    pub fn throttle(&self) -> Throttle {
        self.throttle
            .as_ref()
            .map(Throttle::from)
            .unwrap_or_default()
    }
}
