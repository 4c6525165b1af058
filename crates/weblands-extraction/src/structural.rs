//! Structural HTML fallback: DOM cleaning and visible-text extraction.

use scraper::{Html, Selector};
use url::Url;

/// DOM subtrees carrying no readable value.
const REMOVE_SELECTORS: [&str; 11] = [
    "script", "style", "iframe", "form", "footer", ".footer", "nav", ".nav", ".menu", ".social",
    ".modal",
];

/// Cleans the DOM and extracts visible text, line by line with blanks
/// dropped. Returns `None` when the remaining text is too short to carry
/// signal (100 characters or less).
pub fn structural_text(html: &str) -> Option<String> {
    let mut document = Html::parse_document(html);

    for selector_str in REMOVE_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        let doomed: Vec<_> = document.select(&selector).map(|element| element.id()).collect();
        for id in doomed {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }
    }

    let text = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    let cleaned = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    (cleaned.len() > 100).then_some(cleaned)
}

/// Collects `<a href>` targets resolved against the page URL, in document
/// order and deduplicated. Crawlability filtering is the caller's concern.
pub fn links_from_html(html: &str, base_url: &str) -> Vec<String> {
    let Ok(base) = Url::parse(base_url) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut links = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href.trim()) else {
            continue;
        };
        let resolved = resolved.to_string();
        if !links.contains(&resolved) {
            links.push(resolved);
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chrome_is_stripped_from_text() {
        let html = r#"<html><body>
            <nav>Menu Home About</nav>
            <script>var x = 1;</script>
            <div class="social">Share on everything</div>
            <article>
              <p>Le contenu principal de la page, suffisamment long pour être conservé
              par l'extracteur structurel après suppression des menus.</p>
            </article>
            <footer>Copyright</footer>
        </body></html>"#;
        let text = structural_text(html).expect("text");
        assert!(text.contains("contenu principal"));
        assert!(!text.contains("Menu Home"));
        assert!(!text.contains("var x"));
        assert!(!text.contains("Copyright"));
        assert!(!text.contains("Share on everything"));
    }

    #[test]
    fn short_pages_yield_nothing() {
        assert!(structural_text("<html><body><p>court</p></body></html>").is_none());
    }

    #[test]
    fn links_resolve_against_the_page() {
        let html = r#"<html><body>
            <a href="/about">About</a>
            <a href="https://b.test/page">Other</a>
            <a href="/about">Duplicate</a>
        </body></html>"#;
        let links = links_from_html(html, "https://a.test/article");
        assert_eq!(
            links,
            vec![
                "https://a.test/about".to_string(),
                "https://b.test/page".to_string()
            ]
        );
    }
}
