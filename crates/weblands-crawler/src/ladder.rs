//! The fetch ladder: a deterministic sequence of extraction attempts.
//!
//! Stage order: direct fetch, readability over the fetched body,
//! structural DOM fallback, archival mirror lookup with readability over
//! the snapshot. The status observed by the direct fetch is preserved on
//! the result whatever stage finally produced content.

use tracing::debug;
use weblands_config::Config;
use weblands_extraction::{
    extract_page_meta, extract_readable, links_from_html, links_from_markdown, media_from_html,
    media_from_markdown,
};
use weblands_fetch::{ArchiveClient, FetchError, HttpFetcher};
use weblands_types::{ContentSource, FetchStatus, LadderResult, MediaRef, ReadableDocument};

pub struct FetchLadder<'a> {
    fetcher: &'a HttpFetcher,
    archive: ArchiveClient<'a>,
}

impl<'a> FetchLadder<'a> {
    pub fn new(fetcher: &'a HttpFetcher, config: &Config) -> Self {
        let archive = ArchiveClient::new(
            fetcher,
            config.archive_lookup_timeout,
            config.archive_fetch_timeout,
        );
        Self { fetcher, archive }
    }

    /// Points the archival stage at another availability endpoint (tests).
    pub fn with_archive_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.archive = self.archive.with_endpoint(endpoint);
        self
    }

    /// Runs every stage needed to settle one URL. Never fails: the worst
    /// outcome is a result with a status and no content.
    pub async fn run(&self, url: &str) -> LadderResult {
        let mut result = LadderResult::default();

        // Stage 1: direct fetch.
        match self.fetcher.fetch_page(url).await {
            Ok(page) => {
                result.status = Some(FetchStatus::Code(page.status));
                result.html = page.html;
            }
            Err(FetchError::Transport(err)) => {
                debug!(url, error = %err, "direct fetch failed");
                result.status = Some(FetchStatus::Transport);
            }
            Err(err) => {
                debug!(url, error = %err, "direct fetch errored");
                result.status = Some(FetchStatus::Error);
            }
        }

        if let Some(html) = &result.html {
            result.meta = extract_page_meta(html);
        }

        // Stage 2: readability over the fetched body.
        if let Some(html) = result.html.clone() {
            if let Some(document) = extract_readable(&html, url) {
                self.apply_document(&mut result, document, url, ContentSource::Readability);
            }
        }

        // Stage 3: structural fallback on the cleaned DOM.
        if result.readable.is_none() {
            if let Some(html) = result.html.clone() {
                if let Some(text) = weblands_extraction::structural_text(&html) {
                    result.readable = Some(text);
                    result.links = links_from_html(&html, url);
                    result.media = media_from_html(&html, url);
                    result.source = Some(ContentSource::Structural);
                }
            }
        }

        // Stage 4: archival mirror.
        if result.readable.is_none() {
            self.try_archive(&mut result, url).await;
        }

        result
    }

    async fn try_archive(&self, result: &mut LadderResult, url: &str) {
        let Some(snapshot) = self.archive.lookup(url).await else {
            return;
        };
        debug!(url, snapshot = %snapshot.url, "archival snapshot found");
        let Some(body) = self.archive.fetch_snapshot(&snapshot.url).await else {
            return;
        };
        // Snapshot HTML can still enrich sparse metadata fields.
        result.meta.fill_missing(extract_page_meta(&body));
        if let Some(document) = extract_readable(&body, url) {
            self.apply_document(result, document, url, ContentSource::Archive);
        }
    }

    fn apply_document(
        &self,
        result: &mut LadderResult,
        document: ReadableDocument,
        url: &str,
        source: ContentSource,
    ) {
        let markdown = document.markdown.unwrap_or_default();
        result.links = links_from_markdown(&markdown);

        let mut media: Vec<MediaRef> = Vec::new();
        if let Some(content_html) = &document.content_html {
            media.extend(media_from_html(content_html, url));
        }
        for reference in media_from_markdown(&markdown, url) {
            if !media.contains(&reference) {
                media.push(reference);
            }
        }
        result.media = media;

        if let Some(title) = document.title {
            result.meta.fill_missing(weblands_types::PageMeta {
                title: Some(title),
                ..weblands_types::PageMeta::default()
            });
        }

        result.readable = Some(markdown);
        result.source = Some(source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn long_article(extra: &str) -> String {
        let paragraph = "Les chats et les chiens occupent les foyers depuis des siècles, \
                         et les pages qui en parlent sont remarquablement nombreuses.";
        format!(
            "<html lang=\"fr\"><head><title>Chats et chiens</title></head>\
             <body><article><h1>Chats et chiens</h1><p>{paragraph}</p><p>{paragraph}</p>\
             {extra}</article></body></html>"
        )
    }

    async fn html_page(server: &MockServer, route: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(route.to_string()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(body)
                    .insert_header("content-type", "text/html; charset=utf-8"),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn direct_fetch_feeds_readability() {
        let server = MockServer::start().await;
        html_page(
            &server,
            "/article",
            long_article(r#"<p><a href="https://b.test/page">suite</a></p>"#),
        )
        .await;

        let config = Config::default();
        let fetcher = HttpFetcher::new(&config).expect("client");
        let ladder = FetchLadder::new(&fetcher, &config)
            .with_archive_endpoint("http://127.0.0.1:1/wayback/available");

        let result = ladder.run(&format!("{}/article", server.uri())).await;
        assert_eq!(result.status, Some(FetchStatus::Code(200)));
        assert_eq!(result.source, Some(ContentSource::Readability));
        assert!(result.readable.expect("readable").contains("chats"));
        assert!(result.links.contains(&"https://b.test/page".to_string()));
        assert_eq!(result.meta.lang.as_deref(), Some("fr"));
    }

    #[tokio::test]
    async fn transport_failure_ends_with_sentinel() {
        let config = Config::default();
        let fetcher = HttpFetcher::new(&config).expect("client");
        let ladder = FetchLadder::new(&fetcher, &config)
            .with_archive_endpoint("http://127.0.0.1:1/wayback/available");

        let result = ladder.run("http://127.0.0.1:1/").await;
        assert_eq!(result.status, Some(FetchStatus::Transport));
        assert!(result.readable.is_none());
        assert_eq!(result.status_column(), "000");
    }

    #[tokio::test]
    async fn archival_stage_recovers_missing_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let snapshot_url = format!("{}/snapshot", server.uri());
        Mock::given(method("GET"))
            .and(path("/wayback/available"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"{{"archived_snapshots":{{"closest":{{"available":true,
                    "url":"{snapshot_url}","status":"200"}}}}}}"#
            )))
            .mount(&server)
            .await;
        html_page(&server, "/snapshot", long_article("")).await;

        let config = Config::default();
        let fetcher = HttpFetcher::new(&config).expect("client");
        let ladder = FetchLadder::new(&fetcher, &config)
            .with_archive_endpoint(format!("{}/wayback/available", server.uri()));

        let result = ladder.run(&format!("{}/gone", server.uri())).await;
        // The direct status survives archival recovery.
        assert_eq!(result.status, Some(FetchStatus::Code(404)));
        assert_eq!(result.source, Some(ContentSource::Archive));
        assert!(result.readable.is_some());
    }

    #[tokio::test]
    async fn structural_fallback_handles_plain_pages() {
        let server = MockServer::start().await;
        // No <article> main content: readability yields little, the
        // structural pass still extracts the visible text.
        let body = "<html><body>\
            <nav>menu</nav>\
            <div>Une page sans structure éditoriale mais avec suffisamment de \
            texte visible pour que l'extraction structurelle la retienne comme \
            contenu lisible, liens compris.</div>\
            <a href=\"https://b.test/next\">next</a>\
            </body></html>";
        html_page(&server, "/plain", body.to_string()).await;

        let config = Config::default();
        let fetcher = HttpFetcher::new(&config).expect("client");
        let ladder = FetchLadder::new(&fetcher, &config)
            .with_archive_endpoint("http://127.0.0.1:1/wayback/available");

        let result = ladder.run(&format!("{}/plain", server.uri())).await;
        assert!(result.readable.is_some());
        assert!(matches!(
            result.source,
            Some(ContentSource::Structural) | Some(ContentSource::Readability)
        ));
    }
}
