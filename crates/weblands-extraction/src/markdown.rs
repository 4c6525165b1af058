//! Link and media mining over Markdown-like readable text.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;
use weblands_types::{MediaKind, MediaRef};

/// Absolute URL inside parentheses, as produced by Markdown links.
static PAREN_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((https?://[^\s]+)\)").expect("paren url pattern"));

/// Markdown image syntax `![alt](url "title")`.
static MARKDOWN_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"!\[[^\]]*\]\(([^)\s]+)(?:\s+"[^"]*")?\)"#).expect("image pattern"));

/// Extracts outbound links from readable Markdown: every absolute URL in
/// parentheses, with a trailing unmatched `)` trimmed, deduplicated in
/// order of appearance.
pub fn links_from_markdown(markdown: &str) -> Vec<String> {
    let mut links = Vec::new();
    for captures in PAREN_URL.captures_iter(markdown) {
        let mut url = captures[1].to_string();
        while url.ends_with(')') && !balanced(&url) {
            url.pop();
        }
        if !links.contains(&url) {
            links.push(url);
        }
    }
    links
}

fn balanced(url: &str) -> bool {
    let open = url.matches('(').count();
    let close = url.matches(')').count();
    close <= open
}

/// Extracts image references from Markdown image syntax, resolved against
/// the page URL.
pub fn media_from_markdown(markdown: &str, base_url: &str) -> Vec<MediaRef> {
    let Ok(base) = Url::parse(base_url) else {
        return Vec::new();
    };
    let mut media = Vec::new();
    for captures in MARKDOWN_IMAGE.captures_iter(markdown) {
        let Ok(resolved) = base.join(&captures[1]) else {
            continue;
        };
        let reference = MediaRef {
            url: resolved.to_string(),
            kind: MediaKind::Img,
        };
        if !media.contains(&reference) {
            media.push(reference);
        }
    }
    media
}
