use once_cell::sync::Lazy;
use regex::{Captures, Regex};

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static regex")
}

static PRE_BLOCK: Lazy<Regex> = Lazy::new(|| re(r"(?is)<pre\b[^>]*>(.*?)</pre>"));
static CODE_TAG: Lazy<Regex> = Lazy::new(|| re(r"(?i)</?code\b[^>]*>"));
static ANY_TAG: Lazy<Regex> = Lazy::new(|| re(r"<[^>]+>"));
static ENTITY: Lazy<Regex> =
    Lazy::new(|| re(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{1,31});"));
static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| re(r"\n{3,}"));

// Order matters: `<pre>` first, then these, then every remaining tag is
// stripped, and only then are entities decoded so an escaped `&lt;` never
// becomes a tag.
static MARKDOWN_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (re(r"(?is)<code\b[^>]*>(.*?)</code>"), "`${1}`"),
        (re(r"(?is)<h1\b[^>]*>(.*?)</h1>"), "\n# ${1}\n\n"),
        (re(r"(?is)<h2\b[^>]*>(.*?)</h2>"), "\n## ${1}\n\n"),
        (re(r"(?is)<h3\b[^>]*>(.*?)</h3>"), "\n### ${1}\n\n"),
        (re(r"(?is)<h4\b[^>]*>(.*?)</h4>"), "\n#### ${1}\n\n"),
        (re(r"(?is)<h5\b[^>]*>(.*?)</h5>"), "\n##### ${1}\n\n"),
        (re(r"(?is)<h6\b[^>]*>(.*?)</h6>"), "\n###### ${1}\n\n"),
        (re(r"(?is)<strong\b[^>]*>(.*?)</strong>"), "**${1}**"),
        (re(r"(?is)<b\b[^>]*>(.*?)</b>"), "**${1}**"),
        (re(r"(?is)<em\b[^>]*>(.*?)</em>"), "*${1}*"),
        (re(r"(?is)<i\b[^>]*>(.*?)</i>"), "*${1}*"),
        (
            re(r#"(?is)<a\b[^>]*?\bhref\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a>"#),
            "[${2}](${1})",
        ),
        (re(r"(?i)</?(?:ul|ol)\b[^>]*>"), "\n"),
        (re(r"(?is)<li\b[^>]*>(.*?)</li>"), "- ${1}\n"),
        (re(r"(?is)<p\b[^>]*>(.*?)</p>"), "${1}\n\n"),
        (re(r"(?i)<br\b[^>]*/?>"), "\n"),
        (re(r"(?is)<div\b[^>]*>(.*?)</div>"), "${1}\n"),
        (re(r"(?is)<blockquote\b[^>]*>(.*?)</blockquote>"), "\n> ${1}\n"),
    ]
});

static PLAIN_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (re(r"(?m)^```.*$"), ""),
        (re(r"\[([^\]]+)\]\([^)]+\)"), "${1}"),
        (re(r"\*\*([^*]+)\*\*"), "${1}"),
        (re(r"\*([^*]+)\*"), "${1}"),
        (re(r"`([^`]+)`"), "${1}"),
        (re(r"(?m)^#+[ \t]+"), ""),
        (re(r"(?m)^>[ \t]*"), ""),
        (re(r"(?m)^- "), ""),
    ]
});

pub fn html_to_markdown(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let mut content = PRE_BLOCK
        .replace_all(html, |caps: &Captures| {
            let body = CODE_TAG.replace_all(&caps[1], "");
            format!("\n```\n{}\n```\n", body.trim_matches('\n'))
        })
        .into_owned();

    for (pattern, replacement) in MARKDOWN_RULES.iter() {
        content = pattern.replace_all(&content, *replacement).into_owned();
    }

    let stripped = ANY_TAG.replace_all(&content, "");
    tidy(&decode_entities(&stripped))
}

pub fn html_to_plain_text(html: &str) -> String {
    let mut content = html_to_markdown(html);
    if content.is_empty() {
        return content;
    }
    for (pattern, replacement) in PLAIN_RULES.iter() {
        content = pattern.replace_all(&content, *replacement).into_owned();
    }
    tidy(&content)
}

/// Decode named and numeric character references. Unknown names are kept
/// verbatim.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            decode_entity(name).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_entity(name: &str) -> Option<String> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    let decoded = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "laquo" => "\u{ab}",
        "raquo" => "\u{bb}",
        "bull" => "\u{2022}",
        "middot" => "\u{b7}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "trade" => "\u{2122}",
        "euro" => "\u{20ac}",
        "deg" => "\u{b0}",
        "times" => "\u{d7}",
        "rarr" => "\u{2192}",
        "larr" => "\u{2190}",
        "auml" => "\u{e4}",
        "ouml" => "\u{f6}",
        "uuml" => "\u{fc}",
        "Auml" => "\u{c4}",
        "Ouml" => "\u{d6}",
        "Uuml" => "\u{dc}",
        "szlig" => "\u{df}",
        "eacute" => "\u{e9}",
        "egrave" => "\u{e8}",
        "agrave" => "\u{e0}",
        "ccedil" => "\u{e7}",
        _ => return None,
    };
    Some(decoded.to_string())
}

fn tidy(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let joined = lines.join("\n");
    BLANK_RUNS.replace_all(&joined, "\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_gives_empty_output() {
        assert_eq!(html_to_markdown(""), "");
        assert_eq!(html_to_markdown("   \n "), "");
        assert_eq!(html_to_plain_text(""), "");
    }

    #[test]
    fn plain_text_passes_through() {
        let text = "Deploy fails on staging\nsecond line";
        assert_eq!(html_to_markdown(text), text);
        assert_eq!(html_to_plain_text(text), text);
    }

    #[test]
    fn plain_text_only_loses_surrounding_whitespace() {
        assert_eq!(html_to_markdown("  padded line  \n\n\n\nnext  "), "padded line\n\nnext");
    }

    #[test]
    fn paragraphs_and_lists() {
        let html = "<p>Hello <strong>world</strong></p><ul><li>one</li><li>two</li></ul>";
        assert_eq!(html_to_markdown(html), "Hello **world**\n\n- one\n- two");
    }

    #[test]
    fn headings_links_and_inline_code() {
        let html = r#"<h2>Steps</h2><ol><li>Open <a href="https://x.io">app</a></li><li>Click <code>Save</code></li></ol>"#;
        assert_eq!(
            html_to_markdown(html),
            "## Steps\n\n- Open [app](https://x.io)\n- Click `Save`"
        );
        assert_eq!(html_to_plain_text(html), "Steps\n\nOpen app\nClick Save");
    }

    #[test]
    fn line_breaks_are_not_bold() {
        assert_eq!(html_to_markdown("first<br/>second<br>third"), "first\nsecond\nthird");
        assert_eq!(html_to_markdown("<b>bold</b> and <i>it</i>"), "**bold** and *it*");
    }

    #[test]
    fn pre_blocks_are_fenced() {
        let html = "<pre><code>let x = 1;</code></pre>";
        assert_eq!(html_to_markdown(html), "```\nlet x = 1;\n```");
        assert_eq!(html_to_plain_text(html), "let x = 1;");
    }

    #[test]
    fn blockquote_gets_prefix() {
        assert_eq!(html_to_markdown("<blockquote>quoted</blockquote>"), "> quoted");
        assert_eq!(html_to_plain_text("<blockquote>quoted</blockquote>"), "quoted");
    }

    #[test]
    fn unknown_tags_are_stripped_and_entities_decoded() {
        let html = r#"<span class="x">a &lt; b &amp;&amp; c&nbsp;&#8211; d</span>"#;
        assert_eq!(html_to_markdown(html), "a < b && c \u{2013} d");
    }

    #[test]
    fn escaped_markup_is_not_reinterpreted() {
        assert_eq!(html_to_markdown("&lt;script&gt;"), "<script>");
    }

    #[test]
    fn unknown_entities_are_kept() {
        assert_eq!(decode_entities("x &bogus; y"), "x &bogus; y");
        assert_eq!(decode_entities("&#x41;&#66;"), "AB");
        assert_eq!(decode_entities("&#1114112;"), "&#1114112;");
    }

    #[test]
    fn malformed_markup_does_not_panic() {
        for input in ["<p>unclosed", "<<>>", "<a href=\"x\">no close", "</li></ul>", "<b><i>x</b></i>"] {
            let _ = html_to_markdown(input);
            let _ = html_to_plain_text(input);
        }
    }
}
