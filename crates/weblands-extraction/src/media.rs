//! Media tag extraction from HTML.

use scraper::{Html, Selector};
use url::Url;
use weblands_types::{MediaKind, MediaRef};

/// Extensions accepted for `img` references. Non-image tags (`video`,
/// `audio`) are recorded verbatim.
const IMAGE_EXTENSIONS: [&str; 7] = [".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp", ".svg"];

/// Whether a URL looks like a raster/vector image, ignoring any query
/// string.
pub fn is_image_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Extracts `img|video|audio` `src` references from an HTML fragment,
/// resolved against the page URL. Image sources without an image extension
/// are dropped.
pub fn media_from_html(html: &str, base_url: &str) -> Vec<MediaRef> {
    let Ok(base) = Url::parse(base_url) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let mut media = Vec::new();

    for (tag, kind) in [
        ("img", MediaKind::Img),
        ("video", MediaKind::Video),
        ("audio", MediaKind::Audio),
    ] {
        let Ok(selector) = Selector::parse(&format!("{tag}[src]")) else {
            continue;
        };
        for element in document.select(&selector) {
            let Some(src) = element.value().attr("src") else {
                continue;
            };
            let Ok(resolved) = base.join(src.trim()) else {
                continue;
            };
            let resolved = resolved.to_string();
            if kind == MediaKind::Img && !is_image_url(&resolved) {
                continue;
            }
            let reference = MediaRef {
                url: resolved,
                kind,
            };
            if !media.contains(&reference) {
                media.push(reference);
            }
        }
    }
    media
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_extensions_are_broadly_accepted() {
        assert!(is_image_url("https://a.test/p.jpg"));
        assert!(is_image_url("https://a.test/p.PNG"));
        assert!(is_image_url("https://a.test/p.webp?w=200"));
        assert!(!is_image_url("https://a.test/p.mp4"));
        assert!(!is_image_url("https://a.test/page"));
    }

    #[test]
    fn media_tags_resolve_and_filter() {
        let html = r#"<div>
            <img src="/img/a.jpg">
            <img src="/tracking/pixel">
            <video src="https://cdn.test/v.mp4"></video>
            <audio src="/sound.ogg"></audio>
            <img src="/img/a.jpg">
        </div>"#;
        let media = media_from_html(html, "https://a.test/article");
        assert_eq!(media.len(), 3);
        assert_eq!(media[0].url, "https://a.test/img/a.jpg");
        assert_eq!(media[0].kind, MediaKind::Img);
        assert_eq!(media[1].kind, MediaKind::Video);
        // Non-image tags keep their source verbatim, whatever the extension.
        assert_eq!(media[2].url, "https://a.test/sound.ogg");
    }
}
