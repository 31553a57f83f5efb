use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::config::{self, AppConfig, Overrides};
use crate::export::extract::extract_file;
use crate::import::relay::AttachmentRelay;
use crate::import::Importer;
use crate::mapping::custom_fields::CustomFieldResolver;
use crate::providers::clickup::ClickUpDestination;
use crate::providers::jira::JiraAttachmentSource;
use crate::providers::types::FieldDefinition;
use crate::providers::Destination;

#[derive(Parser, Debug)]
#[command(name = "jira2clickup", version, about = "Replay a Jira XML export into a ClickUp list")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (defaults to <config dir>/jira2clickup/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create one ClickUp task per exported issue, with comments and attachments
    Import {
        #[command(flatten)]
        export: ExportArgs,

        /// Print the payloads without creating anything
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        clickup: ClickUpArgs,

        #[command(flatten)]
        jira: JiraArgs,
    },
    /// Print the extracted records as JSON without touching the network
    Extract {
        #[command(flatten)]
        export: ExportArgs,
    },
    /// Show the custom fields defined on the ClickUp list
    ListFields {
        #[command(flatten)]
        clickup: ClickUpArgs,
    },
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Jira RSS/XML export
    #[arg(env = "JIRA_XML_FILE")]
    pub xml_file: Option<PathBuf>,

    /// Only process the first N issues
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub struct ClickUpArgs {
    #[arg(long, env = "CLICKUP_API_TOKEN", hide_env_values = true)]
    pub clickup_token: Option<String>,

    #[arg(long, env = "CLICKUP_LIST_ID")]
    pub list_id: Option<String>,

    /// Label field recording the Jira assignee; pass "" to disable
    #[arg(long, env = "CLICKUP_ASSIGNEE_FIELD_ID")]
    pub assignee_field_id: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct JiraArgs {
    /// e.g. https://acme.atlassian.net
    #[arg(long, env = "JIRA_BASE_URL")]
    pub jira_base_url: Option<String>,

    #[arg(long, env = "JIRA_EMAIL")]
    pub jira_email: Option<String>,

    #[arg(long, env = "JIRA_API_TOKEN", hide_env_values = true)]
    pub jira_token: Option<String>,
}

fn overrides(clickup: ClickUpArgs, jira: JiraArgs) -> Overrides {
    Overrides {
        clickup_token: clickup.clickup_token,
        list_id: clickup.list_id,
        assignee_field_id: clickup.assignee_field_id,
        jira_base_url: jira.jira_base_url,
        jira_email: jira.jira_email,
        jira_token: jira.jira_token,
    }
}

pub async fn run(cli: Cli) -> Result<ExitCode> {
    let config = config::load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Import {
            export,
            dry_run,
            clickup,
            jira,
        } => handle_import(&config, export, dry_run, overrides(clickup, jira)).await,
        Commands::Extract { export } => handle_extract(export),
        Commands::ListFields { clickup } => {
            handle_list_fields(&config, overrides(clickup, JiraArgs::default())).await
        }
    }
}

fn require_export(path: Option<&Path>) -> Result<&Path> {
    let Some(path) = path else {
        bail!("Jira XML file is required. Set JIRA_XML_FILE or pass it as an argument");
    };
    if !path.exists() {
        bail!("XML file not found: {}", path.display());
    }
    Ok(path)
}

async fn handle_import(
    config: &AppConfig,
    export: ExportArgs,
    dry_run: bool,
    overrides: Overrides,
) -> Result<ExitCode> {
    let settings = config.destination(&overrides)?;
    let xml_file = require_export(export.xml_file.as_deref())?;

    let source = config.source(&overrides);
    if !source.is_complete() {
        tracing::warn!("Jira credentials not set, attachments will be skipped");
    }

    let extraction = extract_file(xml_file, export.limit)?;
    tracing::debug!(people = extraction.identities.len(), "Resolved account ids");
    if extraction.records.is_empty() {
        println!("No tasks found in XML file");
        return Ok(ExitCode::FAILURE);
    }
    if extraction.records.len() < extraction.total_items {
        println!(
            "Found {} tasks, importing the first {}",
            extraction.total_items,
            extraction.records.len()
        );
    } else {
        println!("Found {} tasks to import", extraction.records.len());
    }

    let relay = match JiraAttachmentSource::from_credentials(
        source.base_url.as_deref(),
        source.email.as_deref(),
        source.api_token.as_deref(),
    ) {
        Some(jira) => AttachmentRelay::new(Box::new(jira)),
        None => AttachmentRelay::disabled(),
    };

    let destination = ClickUpDestination::new(&settings.api_token, settings.list_id);
    let mut importer = Importer::new(
        Box::new(destination),
        relay,
        CustomFieldResolver::new(settings.assignee_field_id),
        config.throttle(),
    );

    let mut report = importer.run(&extraction.records, dry_run).await;
    report.unparsed = extraction.skipped_items;
    report.recovered = extraction.recovered;
    report.print_summary();

    if report.has_failures() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn handle_extract(export: ExportArgs) -> Result<ExitCode> {
    let xml_file = require_export(export.xml_file.as_deref())?;
    let extraction = extract_file(xml_file, export.limit)?;
    let json = serde_json::to_string_pretty(&extraction.records)
        .context("Failed to serialize records")?;
    println!("{json}");
    Ok(ExitCode::SUCCESS)
}

async fn handle_list_fields(config: &AppConfig, overrides: Overrides) -> Result<ExitCode> {
    let settings = config.destination(&overrides)?;
    let destination = ClickUpDestination::new(&settings.api_token, settings.list_id.clone());
    let fields = destination
        .list_fields()
        .await
        .with_context(|| format!("Failed to fetch custom fields for list {}", settings.list_id))?;

    println!("Custom fields on list {}:", settings.list_id);
    if fields.is_empty() {
        println!("  (none)");
    }
    for field in &fields {
        print!("{}", describe_field(field));
    }
    Ok(ExitCode::SUCCESS)
}

fn describe_field(field: &FieldDefinition) -> String {
    let mut out = format!("\n  {} ({})\n    id: {}\n", field.name, field.field_type, field.id);
    let config = &field.type_config;
    if field.field_type == "labels" || !config.options.is_empty() {
        if let Some(allow) = config.allow_create_options {
            out.push_str(&format!("    new options allowed: {}\n", if allow { "yes" } else { "no" }));
        }
        for option in &config.options {
            out.push_str(&format!(
                "    - {} [{}]{}\n",
                option.display_name().unwrap_or("(unnamed)"),
                option.id.as_deref().unwrap_or("?"),
                option
                    .color
                    .as_deref()
                    .map(|c| format!(" {c}"))
                    .unwrap_or_default()
            ));
        }
    }
    out
}
