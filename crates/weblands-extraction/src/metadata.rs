//! Metadata fallback chains.
//!
//! Each field resolves through Open Graph, then Twitter, then Schema.org
//! `itemprop`, then the standard tags; the first non-empty value wins.

use scraper::{Html, Selector};
use weblands_types::PageMeta;

const TITLE_CHAIN: [&str; 3] = [
    "meta[property='og:title']",
    "meta[name='twitter:title']",
    "meta[itemprop='name']",
];

const DESCRIPTION_CHAIN: [&str; 4] = [
    "meta[property='og:description']",
    "meta[name='twitter:description']",
    "meta[itemprop='description']",
    "meta[name='description']",
];

const KEYWORDS_CHAIN: [&str; 3] = [
    "meta[property='og:keywords']",
    "meta[itemprop='keywords']",
    "meta[name='keywords']",
];

/// Extracts title, description, keywords and language from an HTML body.
pub fn extract_page_meta(html: &str) -> PageMeta {
    let document = Html::parse_document(html);
    let mut meta = PageMeta {
        title: meta_chain(&document, &TITLE_CHAIN),
        description: meta_chain(&document, &DESCRIPTION_CHAIN),
        keywords: meta_chain(&document, &KEYWORDS_CHAIN),
        lang: None,
    };

    // Standard fallback for the title is the <title> element text.
    if meta.title.is_none() {
        if let Ok(selector) = Selector::parse("title") {
            meta.title = document
                .select(&selector)
                .next()
                .map(|element| element.text().collect::<String>().trim().to_string())
                .filter(|title| !title.is_empty());
        }
    }

    if let Ok(selector) = Selector::parse("html") {
        meta.lang = document
            .select(&selector)
            .next()
            .and_then(|element| element.value().attr("lang"))
            .map(|lang| lang.trim().to_string())
            .filter(|lang| !lang.is_empty());
    }

    meta
}

fn meta_chain(document: &Html, selectors: &[&str]) -> Option<String> {
    for selector_str in selectors {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            if let Some(content) = element.value().attr("content") {
                let content = content.trim();
                if !content.is_empty() {
                    return Some(content.to_string());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_graph_wins_over_standard() {
        let html = r#"<html><head>
            <meta property="og:title" content="OG title">
            <title>Element title</title>
            <meta name="description" content="Standard description">
        </head><body></body></html>"#;
        let meta = extract_page_meta(html);
        assert_eq!(meta.title.as_deref(), Some("OG title"));
        assert_eq!(meta.description.as_deref(), Some("Standard description"));
    }

    #[test]
    fn twitter_fills_in_when_og_is_absent() {
        let html = r#"<html><head>
            <meta name="twitter:title" content="Tweeted">
        </head><body></body></html>"#;
        assert_eq!(extract_page_meta(html).title.as_deref(), Some("Tweeted"));
    }

    #[test]
    fn title_element_is_the_last_resort() {
        let html = "<html lang='fr'><head><title> Page </title></head><body></body></html>";
        let meta = extract_page_meta(html);
        assert_eq!(meta.title.as_deref(), Some("Page"));
        assert_eq!(meta.lang.as_deref(), Some("fr"));
    }

    #[test]
    fn empty_meta_content_is_skipped() {
        let html = r#"<html><head>
            <meta property="og:title" content="  ">
            <title>Fallback</title>
        </head><body></body></html>"#;
        assert_eq!(extract_page_meta(html).title.as_deref(), Some("Fallback"));
    }

    #[test]
    fn keywords_come_from_standard_meta() {
        let html = r#"<html><head>
            <meta name="keywords" content="cats,dogs">
        </head><body></body></html>"#;
        assert_eq!(
            extract_page_meta(html).keywords.as_deref(),
            Some("cats,dogs")
        );
    }
}
