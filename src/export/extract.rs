use std::path::Path;

use anyhow::{Context, Result};
use roxmltree::Node;

use super::identity::{account_id, IdentityMap};
use super::xml::{child, child_text, inner_markup, plain_text, ExportDocument};
use crate::mapping::vocabulary::{map_priority, map_status, DestinationStatus};
use crate::model::issue::{AttachmentRecord, CommentRecord, IssueRecord};
use crate::util::date::parse_jira_date;
use crate::util::html::{html_to_markdown, html_to_plain_text};

const FALLBACK_PRIORITY: &str = "Medium";

#[derive(Debug)]
pub struct Extraction {
    pub records: Vec<IssueRecord>,
    pub identities: IdentityMap,
    pub total_items: usize,
    /// Keys of items even item-by-item parsing could not read.
    pub skipped_items: Vec<String>,
    pub recovered: bool,
}

pub fn extract_file(path: &Path, limit: Option<usize>) -> Result<Extraction> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read XML export {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "Parsing XML export");
    Ok(extract(&bytes, limit))
}

/// The identity map covers every item, including those beyond `limit`.
pub fn extract(bytes: &[u8], limit: Option<usize>) -> Extraction {
    let export = ExportDocument::from_bytes(bytes);
    let parsed = export.parse();

    let identities = IdentityMap::build(parsed.items());
    let total_items = parsed.items().count();
    tracing::info!(items = total_items, "Found items in export");

    let records: Vec<IssueRecord> = parsed
        .items()
        .take(limit.unwrap_or(usize::MAX))
        .map(|item| extract_issue(item, &identities))
        .collect();

    if records.len() < total_items {
        tracing::info!(limit = records.len(), "Limiting to first items");
    }

    Extraction {
        records,
        identities,
        total_items,
        skipped_items: parsed.skipped().to_vec(),
        recovered: parsed.recovered(),
    }
}

fn extract_issue(item: Node<'_, '_>, identities: &IdentityMap) -> IssueRecord {
    let key = child_text(item, "key");
    let status = child_text(item, "status");

    let priority = child_text(item, "priority");
    let priority = if priority.is_empty() {
        FALLBACK_PRIORITY
    } else {
        priority.as_str()
    };

    let description = child(item, "description")
        .map(|node| html_to_markdown(&inner_markup(node)))
        .unwrap_or_default();

    let (project, project_key) = match child(item, "project") {
        Some(node) => (
            plain_text(node),
            node.attribute("key").unwrap_or_default().to_string(),
        ),
        None => (String::new(), String::new()),
    };
    let tags = if project_key.is_empty() {
        Vec::new()
    } else {
        vec![project_key]
    };

    let record = IssueRecord {
        title: child_text(item, "summary"),
        description,
        mapped_status: map_status(&status),
        priority: map_priority(priority),
        tags,
        created: parse_jira_date(&child_text(item, "created")),
        updated: parse_jira_date(&child_text(item, "updated")),
        due: parse_jira_date(&child_text(item, "due")),
        assignee: person_name(item, "assignee", identities),
        reporter: person_name(item, "reporter", identities),
        project,
        comments: extract_comments(item, identities),
        attachments: extract_attachments(item, identities),
        key,
        status,
    };

    tracing::debug!(
        key = %record.key,
        status = %record.status,
        mapped = record.mapped_status.map_or("-", DestinationStatus::as_str),
        priority = record.priority,
        comments = record.comments.len(),
        attachments = record.attachments.len(),
        "Extracted issue"
    );
    record
}

fn person_name(item: Node<'_, '_>, tag: &str, identities: &IdentityMap) -> String {
    let Some(person) = child(item, tag) else {
        return String::new();
    };
    let text = plain_text(person);
    if !text.is_empty() {
        return text;
    }
    identities.resolve(account_id(person)).to_string()
}

fn extract_comments(item: Node<'_, '_>, identities: &IdentityMap) -> Vec<CommentRecord> {
    item.descendants()
        .filter(|n| n.has_tag_name("comment"))
        .map(|node| {
            let author_id = node.attribute("author").unwrap_or_default();
            CommentRecord {
                id: node.attribute("id").unwrap_or_default().to_string(),
                author: identities.resolve(author_id).to_string(),
                author_id: author_id.to_string(),
                created: node.attribute("created").and_then(parse_jira_date),
                content: html_to_plain_text(&inner_markup(node)),
            }
        })
        .collect()
}

fn extract_attachments(item: Node<'_, '_>, identities: &IdentityMap) -> Vec<AttachmentRecord> {
    item.descendants()
        .filter(|n| n.has_tag_name("attachment"))
        .map(|node| {
            let author_id = node.attribute("author").unwrap_or_default();
            AttachmentRecord {
                id: node.attribute("id").unwrap_or_default().to_string(),
                filename: node.attribute("name").unwrap_or_default().to_string(),
                size: node
                    .attribute("size")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(0),
                author: identities.resolve(author_id).to_string(),
                author_id: author_id.to_string(),
                created: node.attribute("created").and_then(parse_jira_date),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<!--  RSS generated by JIRA (1001.0.0) at Wed Jul 09 14:40:00 UTC 2025 -->
<rss version="0.92">
<channel>
    <title>Export</title>
    <item>
        <title>[PROJ-1] Login broken</title>
        <key id="10001">PROJ-1</key>
        <summary>Login broken</summary>
        <description>&lt;p&gt;Users see &lt;b&gt;500&lt;/b&gt; on &lt;a href="https://x.io/login"&gt;login&lt;/a&gt;&lt;/p&gt;</description>
        <status id="3">In Progress</status>
        <priority id="2">High</priority>
        <assignee accountid="acc-ada">Ada Lovelace</assignee>
        <reporter accountid="acc-rita">Rita Reporter</reporter>
        <project id="1" key="PROJ">Project One</project>
        <created>Wed, 9 Jul 2025 14:31:57 +0200</created>
        <updated>Thu, 10 Jul 2025 08:00:00 +0200</updated>
        <due>Fri, 1 Aug 2025 00:00:00 +0200</due>
        <comments>
            <comment id="20001" author="acc-rita" created="Wed, 9 Jul 2025 15:00:00 +0200">&lt;p&gt;Seen on &lt;code&gt;prod&lt;/code&gt; too&lt;/p&gt;</comment>
        </comments>
        <attachments>
            <attachment id="30001" name="trace.log" size="2048" author="acc-ada" created="Wed, 9 Jul 2025 15:05:00 +0200"/>
        </attachments>
    </item>
    <item>
        <key id="10002">PROJ-2</key>
        <status>Unknown Custom State</status>
    </item>
</channel>
</rss>"#;

    #[test]
    fn extracts_full_item() {
        let extraction = extract(SAMPLE.as_bytes(), None);
        assert_eq!(extraction.total_items, 2);
        assert_eq!(extraction.records.len(), 2);

        let issue = &extraction.records[0];
        assert_eq!(issue.key, "PROJ-1");
        assert_eq!(issue.title, "Login broken");
        assert_eq!(issue.description, "Users see **500** on [login](https://x.io/login)");
        assert_eq!(issue.status, "In Progress");
        assert_eq!(issue.mapped_status, Some(DestinationStatus::WorkInProgress));
        assert_eq!(issue.priority, 2);
        assert_eq!(issue.tags, vec!["PROJ"]);
        assert_eq!(issue.project, "Project One");
        assert_eq!(issue.assignee, "Ada Lovelace");
        assert_eq!(issue.reporter, "Rita Reporter");
        assert!(issue.created.is_some());
        assert!(issue.updated.is_some());
        assert!(issue.due.is_some());

        assert_eq!(issue.comments.len(), 1);
        let comment = &issue.comments[0];
        assert_eq!(comment.id, "20001");
        assert_eq!(comment.author, "Rita Reporter");
        assert_eq!(comment.author_id, "acc-rita");
        assert_eq!(comment.content, "Seen on prod too");
        assert!(comment.created.is_some());

        assert_eq!(issue.attachments.len(), 1);
        let attachment = &issue.attachments[0];
        assert_eq!(attachment.id, "30001");
        assert_eq!(attachment.filename, "trace.log");
        assert_eq!(attachment.size, 2048);
        assert_eq!(attachment.author, "Ada Lovelace");
    }

    #[test]
    fn sparse_item_gets_defaults() {
        let extraction = extract(SAMPLE.as_bytes(), None);
        let issue = &extraction.records[1];
        assert_eq!(issue.key, "PROJ-2");
        assert_eq!(issue.title, "");
        assert_eq!(issue.description, "");
        assert_eq!(issue.mapped_status, None);
        assert_eq!(issue.status, "Unknown Custom State");
        assert_eq!(issue.priority, 3);
        assert!(issue.tags.is_empty());
        assert!(issue.created.is_none());
        assert!(issue.due.is_none());
        assert_eq!(issue.assignee, "");
        assert!(issue.comments.is_empty());
        assert!(issue.attachments.is_empty());
    }

    #[test]
    fn limit_truncates_in_document_order() {
        let extraction = extract(SAMPLE.as_bytes(), Some(1));
        assert_eq!(extraction.total_items, 2);
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].key, "PROJ-1");
        assert_eq!(extraction.identities.resolve("acc-rita"), "Rita Reporter");
    }

    #[test]
    fn bad_attachment_size_and_date_degrade() {
        let xml = r#"<rss><channel><item><key>X-1</key>
            <attachments><attachment id="1" name="a.png" size="big" created="yesterday"/></attachments>
            <comments><comment id="2" author="ghost">hi</comment></comments>
        </item></channel></rss>"#;
        let extraction = extract(xml.as_bytes(), None);
        let issue = &extraction.records[0];
        assert_eq!(issue.attachments[0].size, 0);
        assert!(issue.attachments[0].created.is_none());
        assert_eq!(issue.comments[0].author, "ghost");
        assert!(issue.comments[0].created.is_none());
    }

    #[test]
    fn person_without_text_resolves_through_identity_map() {
        let xml = r#"<rss><channel>
            <item><key>X-1</key><reporter accountid="acc-1"/></item>
            <item><key>X-2</key><assignee accountid="acc-1">Grace</assignee></item>
        </channel></rss>"#;
        let extraction = extract(xml.as_bytes(), None);
        assert_eq!(extraction.records[0].reporter, "Grace");
    }

    #[test]
    fn garbage_input_yields_no_records() {
        let extraction = extract(b"not xml at all", None);
        assert!(extraction.records.is_empty());
        assert_eq!(extraction.total_items, 0);
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = extract_file(&dir.path().join("missing.xml"), None);
        assert!(result.is_err());
    }

    #[test]
    fn html_entities_in_plain_fields_are_decoded() {
        let xml = r#"<rss><channel><item><key>X-1</key>
            <summary>Caf&eacute; menu&nbsp;fix</summary>
            <assignee accountid="acc-1">Jos&eacute; &amp; Co</assignee>
            <project key="CAF">Caf&eacute;</project>
        </item></channel></rss>"#;
        let extraction = extract(xml.as_bytes(), None);
        let issue = &extraction.records[0];
        assert_eq!(issue.title, "Caf\u{e9} menu fix");
        assert_eq!(issue.assignee, "Jos\u{e9} & Co");
        assert_eq!(issue.project, "Caf\u{e9}");
        assert_eq!(extraction.identities.resolve("acc-1"), "Jos\u{e9} & Co");
    }

    #[test]
    fn control_character_keeps_the_item() {
        let xml = "<rss><channel>\
            <item><key>A-1</key></item>\
            <item><key>A-2</key><summary>has \u{000C} formfeed</summary></item>\
            <item><key>A-3</key></item>\
            </channel></rss>";
        let extraction = extract(xml.as_bytes(), None);
        let keys: Vec<&str> = extraction.records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["A-1", "A-2", "A-3"]);
        assert_eq!(extraction.records[1].title, "has  formfeed");
        assert!(extraction.skipped_items.is_empty());
    }

    #[test]
    fn unescaped_less_than_keeps_the_item() {
        let xml = "<rss><channel>\
            <item><key>A-1</key><summary>if x < 5</summary></item>\
            <item><key>A-2</key></item>\
            </channel></rss>";
        let extraction = extract(xml.as_bytes(), None);
        let keys: Vec<&str> = extraction.records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["A-1", "A-2"]);
        assert_eq!(extraction.records[0].title, "if x < 5");
        assert!(!extraction.recovered);
    }

    #[test]
    fn unrecoverable_item_is_reported_by_key() {
        let xml = "<rss><channel>\
            <item><key>A-1</key></item>\
            <item><key>A-2</key><open></item>\
            </channel>";
        let extraction = extract(xml.as_bytes(), None);
        assert!(extraction.recovered);
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.skipped_items, vec!["A-2"]);
    }
}
