//! URL canonicalization, crawlability and domain attribution.

use url::Url;
use weblands_config::Heuristic;

/// Extensions that never yield crawlable HTML.
const EXCLUDED_EXTENSIONS: [&str; 12] = [
    ".jpg", ".jpeg", ".png", ".bmp", ".webp", ".pdf", ".txt", ".csv", ".xls", ".xlsx", ".doc",
    ".docx",
];

/// Strips the fragment: everything from the first `#` at a position > 0.
/// Idempotent; input is returned unchanged when there is no fragment.
pub fn canonicalize(url: &str) -> String {
    match url.find('#') {
        Some(position) if position > 0 => url[..position].to_string(),
        _ => url.to_string(),
    }
}

/// Whether a URL is worth queuing: well-formed, HTTP(S), and not a plain
/// media/document file. The extension check is case-sensitive.
pub fn is_crawlable(url: &str) -> bool {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return false;
    }
    if Url::parse(url).is_err() {
        return false;
    }
    !EXCLUDED_EXTENSIONS.iter().any(|ext| url.ends_with(ext))
}

/// Domain identity of a URL: `host[:port]`, rewritten by the first
/// matching heuristic capture so distinct accounts on a shared platform
/// stay distinct domains. `None` for unparsable URLs.
pub fn domain_of(url: &str, heuristics: &[Heuristic]) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let mut name = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    for heuristic in heuristics {
        if name.ends_with(&heuristic.suffix) {
            if let Some(captures) = heuristic.pattern.captures(url) {
                if let Some(capture) = captures.get(1) {
                    name = capture.as_str().to_string();
                }
            }
        }
    }
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use weblands_config::default_heuristics;

    #[test]
    fn canonicalize_strips_fragments() {
        assert_eq!(canonicalize("https://a.test/x#section"), "https://a.test/x");
        assert_eq!(canonicalize("https://a.test/x"), "https://a.test/x");
        // A fragment marker at position zero is left alone.
        assert_eq!(canonicalize("#fragment"), "#fragment");
    }

    #[test]
    fn canonicalize_is_idempotent() {
        for url in ["https://a.test/x#s", "https://a.test/", "#x", "https://a.test/a#b#c"] {
            let once = canonicalize(url);
            assert_eq!(canonicalize(&once), once);
        }
    }

    #[test]
    fn crawlable_requires_http_scheme() {
        assert!(is_crawlable("https://a.test/"));
        assert!(is_crawlable("http://a.test/page"));
        assert!(!is_crawlable("ftp://a.test/file"));
        assert!(!is_crawlable("mailto:x@a.test"));
        assert!(!is_crawlable("not a url"));
        assert!(!is_crawlable("https://"));
    }

    #[test]
    fn crawlable_rejects_every_excluded_extension() {
        for ext in EXCLUDED_EXTENSIONS {
            let url = format!("https://a.test/file{ext}");
            assert!(!is_crawlable(&url), "{url} should be rejected");
        }
        // Case-sensitive: an upper-cased extension is not on the list.
        assert!(is_crawlable("https://a.test/file.JPG"));
    }

    #[test]
    fn domain_keeps_host_and_port() {
        assert_eq!(
            domain_of("https://sub.a.test:8443/page", &[]),
            Some("sub.a.test:8443".to_string())
        );
        assert_eq!(domain_of("not a url", &[]), None);
    }

    #[test]
    fn heuristics_split_platform_accounts() {
        let heuristics = default_heuristics();
        assert_eq!(
            domain_of("https://www.twitter.com/someuser/status/12345", &heuristics),
            Some("www.twitter.com/someuser".to_string())
        );
        // A host not covered by any heuristic keeps its netloc.
        assert_eq!(
            domain_of("https://blog.a.test/post", &heuristics),
            Some("blog.a.test".to_string())
        );
    }
}
