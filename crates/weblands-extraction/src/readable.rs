//! In-process readability extraction.

use async_trait::async_trait;
use tracing::debug;
use url::Url;
use weblands_types::{ReadabilityExtractor, ReadableDocument};

/// Runs the readability algorithm over an HTML body and projects the main
/// content to Markdown. Returns `None` when the result is not substantial
/// (readable text of 100 characters or less).
pub fn extract_readable(html: &str, url: &str) -> Option<ReadableDocument> {
    let base = Url::parse(url).ok()?;
    let mut input = std::io::Cursor::new(html.as_bytes());
    let product = match readability::extractor::extract(&mut input, &base) {
        Ok(product) => product,
        Err(err) => {
            debug!(url, error = %err, "readability extraction failed");
            return None;
        }
    };

    let markdown = html2md::parse_html(&product.content);
    let document = ReadableDocument {
        title: non_empty(product.title),
        markdown: non_empty(markdown.trim().to_string()),
        content_html: non_empty(product.content),
        excerpt: None,
        lang: None,
        published_at: None,
    };
    document.is_substantial().then_some(document)
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Port adapter around [`extract_readable`].
pub struct InProcessReadability;

#[async_trait]
impl ReadabilityExtractor for InProcessReadability {
    async fn extract(&self, url: &str, html: Option<&str>) -> Option<ReadableDocument> {
        extract_readable(html?, url)
    }

    fn name(&self) -> &'static str {
        "readability"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(body: &str) -> String {
        format!(
            "<html><head><title>T</title></head><body><article><h1>T</h1>{body}</article>\
             </body></html>"
        )
    }

    #[test]
    fn substantial_articles_pass() {
        let paragraph = "Les chats dorment pendant la plus grande partie de la journée, \
                         et les chiens gardent la maison depuis des siècles.";
        let html = article(&format!("<p>{paragraph}</p><p>{paragraph}</p>"));
        let document = extract_readable(&html, "https://a.test/article").expect("document");
        assert!(document.markdown.expect("markdown").contains("chats"));
        assert!(document.content_html.is_some());
    }

    #[test]
    fn short_content_is_rejected() {
        let html = article("<p>court</p>");
        assert!(extract_readable(&html, "https://a.test/short").is_none());
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(extract_readable("<html></html>", "not a url").is_none());
    }
}
