use once_cell::sync::Lazy;
use regex::Regex;
use roxmltree::{Document, Node, ParsingOptions};

use crate::util::html::decode_entities;

static ENTITY_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^&(#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z_][A-Za-z0-9._-]*);").expect("static regex")
});
static ITEM_FRAGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<item\b[^>]*>.*?</item>").expect("static regex"));
static FRAGMENT_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<key\b[^>]*>\s*([^<\s]+)\s*</key>").expect("static regex"));

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

fn parsing_options() -> ParsingOptions {
    ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    }
}

/// Export text with the banner stripped and anything the XML parser would
/// reject on sight neutralised.
pub struct ExportDocument {
    text: String,
}

impl ExportDocument {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let raw = String::from_utf8_lossy(bytes);
        let body = strip_invalid_chars(strip_preamble(&raw));
        Self {
            text: sanitize_markup(&body),
        }
    }

    pub fn parse(&self) -> ParsedExport<'_> {
        match Document::parse_with_options(&self.text, parsing_options()) {
            Ok(doc) => ParsedExport {
                documents: vec![doc],
                recovered: false,
                skipped: Vec::new(),
            },
            Err(err) => {
                tracing::warn!(error = %err, "Export is not well-formed, recovering item by item");
                self.parse_fragments()
            }
        }
    }

    fn parse_fragments(&self) -> ParsedExport<'_> {
        let mut documents = Vec::new();
        let mut skipped = Vec::new();
        for (index, fragment) in ITEM_FRAGMENT.find_iter(&self.text).enumerate() {
            match Document::parse_with_options(fragment.as_str(), parsing_options()) {
                Ok(doc) => documents.push(doc),
                Err(err) => {
                    let label = FRAGMENT_KEY
                        .captures(fragment.as_str())
                        .map(|caps| caps[1].to_string())
                        .unwrap_or_else(|| format!("item {}", index + 1));
                    tracing::warn!(item = %label, error = %err, "Skipping malformed item");
                    skipped.push(label);
                }
            }
        }
        ParsedExport {
            documents,
            recovered: true,
            skipped,
        }
    }
}

pub struct ParsedExport<'input> {
    documents: Vec<Document<'input>>,
    recovered: bool,
    skipped: Vec<String>,
}

impl<'input> ParsedExport<'input> {
    pub fn items(&self) -> impl Iterator<Item = Node<'_, 'input>> + '_ {
        self.documents
            .iter()
            .flat_map(|doc| doc.descendants().filter(|n| n.has_tag_name("item")))
    }

    pub fn recovered(&self) -> bool {
        self.recovered
    }

    /// Keys (or `item N` when no key was readable) of dropped items.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }
}

/// Jira exports open with an `<rss` element; other documents fall back to
/// the first element tag.
fn strip_preamble(raw: &str) -> &str {
    if let Some(pos) = raw.find("<rss") {
        return &raw[pos..];
    }
    let bytes = raw.as_bytes();
    let first_element = raw
        .match_indices('<')
        .map(|(pos, _)| pos)
        .find(|&pos| bytes.get(pos + 1).is_some_and(u8::is_ascii_alphabetic));
    match first_element {
        Some(pos) => &raw[pos..],
        None => raw,
    }
}

fn strip_invalid_chars(text: &str) -> String {
    text.chars().filter(|&c| is_xml_char(c)).collect()
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
}

/// CDATA sections are copied untouched.
fn sanitize_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find(&['&', '<'][..]) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with(CDATA_OPEN) {
            let end = tail
                .find(CDATA_CLOSE)
                .map_or(tail.len(), |e| e + CDATA_CLOSE.len());
            out.push_str(&tail[..end]);
            rest = &tail[end..];
        } else if tail.starts_with('<') {
            if opens_markup(&tail[1..]) {
                out.push('<');
            } else {
                out.push_str("&lt;");
            }
            rest = &tail[1..];
        } else {
            match ENTITY_REF.captures(tail) {
                Some(caps) if is_xml_reference(&caps[1]) => {
                    out.push_str(&caps[0]);
                    rest = &tail[caps[0].len()..];
                }
                _ => {
                    out.push_str("&amp;");
                    rest = &tail[1..];
                }
            }
        }
    }
    out.push_str(rest);
    out
}

/// A `<` starts markup only before a name, `/`, `!` or `?`.
fn opens_markup(after: &str) -> bool {
    after
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || matches!(c, '_' | ':' | '/' | '!' | '?'))
}

fn is_xml_reference(name: &str) -> bool {
    name.starts_with('#') || matches!(name, "amp" | "lt" | "gt" | "quot" | "apos")
}

pub fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

pub fn child_text(node: Node<'_, '_>, name: &str) -> String {
    child(node, name).map(plain_text).unwrap_or_default()
}

/// Also decodes HTML-only entities. Never use on markup.
pub fn plain_text(node: Node<'_, '_>) -> String {
    decode_entities(&text_content(node)).trim().to_string()
}

pub fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Descriptions arrive either as escaped HTML text, which the parser already
/// decoded back into markup, or as literal child elements, which are sliced
/// verbatim from the source.
pub fn inner_markup(node: Node<'_, '_>) -> String {
    if !node.children().any(|c| c.is_element()) {
        return text_content(node);
    }
    let outer = &node.document().input_text()[node.range()];
    let start = outer.find('>').map_or(0, |i| i + 1);
    let end = outer.rfind("</").unwrap_or(outer.len());
    if start >= end {
        return String::new();
    }
    outer[start..end].trim().to_string()
}
