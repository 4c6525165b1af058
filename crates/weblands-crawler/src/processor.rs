//! Expression processor: applies the fetch ladder to one pending
//! expression and persists every side effect.
//!
//! No error escapes a processor. Failures are recorded on the expression
//! (status sentinel, `fetched_at`) and surface only in the batch counts.

use chrono::Utc;
use tracing::{debug, info, warn};
use weblands_config::Config;
use weblands_store::Store;
use weblands_text::{passes_language_gate, DictionaryMatcher, Lemmatizer};
use weblands_types::{DynamicMediaExtractor, Expression, Land, MediaKind};

use crate::gate::GateHandle;
use crate::ladder::FetchLadder;
use crate::urls::{canonicalize, domain_of, is_crawlable};

/// Children are spawned only below this depth, so their depth never
/// exceeds it.
pub const MAX_SPAWN_DEPTH: i64 = 3;

/// Shared per-run state handed to every processor of a crawl.
pub(crate) struct CrawlContext<'a> {
    pub store: &'a Store,
    pub config: &'a Config,
    pub land: &'a Land,
    pub fetcher: &'a weblands_fetch::HttpFetcher,
    pub lemmatizer: &'a Lemmatizer,
    pub matcher: DictionaryMatcher,
    pub terms: Vec<String>,
    pub ladder: FetchLadder<'a>,
    pub gate: Option<&'a GateHandle>,
    pub dynamic_media: Option<&'a dyn DynamicMediaExtractor>,
}

impl<'a> CrawlContext<'a> {
    /// Term score forced to zero by the language gate. Offline passes
    /// (consolidation, dictionary recompute) use this directly.
    pub(crate) fn term_score(&self, expression: &Expression) -> i64 {
        if !passes_language_gate(expression.lang.as_deref(), &self.land.lang) {
            return 0;
        }
        self.matcher.score(
            self.lemmatizer,
            expression.title.as_deref(),
            expression.readable.as_deref(),
        )
    }

    /// Term score, forced to zero by the language gate, optionally vetoed
    /// by the LLM gate.
    pub(crate) async fn relevance_of(&self, expression: &Expression) -> i64 {
        let score = self.term_score(expression);
        if score > 0 {
            if let Some(gate) = self.gate {
                if gate.assess(self.land, &self.terms, expression).await == Some(false) {
                    debug!(url = %expression.url, "relevance gate veto");
                    return 0;
                }
            }
        }
        score
    }

    /// Creates the child expression for an outbound link and the edge to
    /// it. Duplicate edges are benign; other store failures bubble up.
    pub(crate) fn link_to(
        &self,
        source: &Expression,
        target_url: &str,
    ) -> Result<(), weblands_store::StoreError> {
        let url = canonicalize(target_url);
        if !is_crawlable(&url) {
            return Ok(());
        }
        let Some(domain_name) = domain_of(&url, &self.config.heuristics) else {
            return Ok(());
        };
        let domain = self.store.get_or_create_domain(&domain_name)?;
        let target =
            self.store
                .get_or_create_expression(self.land.id, domain.id, &url, source.depth + 1)?;
        self.store.insert_link(source.id, target.id)?;
        Ok(())
    }
}

/// Processes one pending expression. Returns `true` when the ladder
/// produced content and every write landed.
pub(crate) async fn process_expression(
    ctx: &CrawlContext<'_>,
    mut expression: Expression,
) -> bool {
    debug!(url = %expression.url, depth = expression.depth, "processing expression");

    expression.fetched_at = Some(Utc::now());
    expression.http_status = Some("000".to_string());

    let result = ctx.ladder.run(&expression.url).await;
    expression.http_status = Some(result.status_column());

    if !result.has_content() {
        // Failure path: keep the sentinel and the attempt timestamp.
        if let Err(err) = ctx.store.save_expression(&expression) {
            warn!(url = %expression.url, error = %err, "failed to save expression");
        }
        return false;
    }

    let meta = result.meta.clone();
    if let Some(title) = meta.title.filter(|title| !title.trim().is_empty()) {
        expression.title = Some(title);
    }
    if expression.title.is_none() {
        expression.title = Some(expression.url.clone());
    }
    if let Some(description) = meta.description {
        expression.description = Some(description);
    }
    if let Some(keywords) = meta.keywords {
        expression.keywords = Some(keywords);
    }
    if let Some(lang) = meta.lang {
        expression.lang = Some(lang);
    }
    expression.readable = result.readable.clone();

    if ctx.config.archive {
        if let Some(html) = &result.html {
            archive_html(ctx, &expression, html).await;
        }
    }

    let relevance = ctx.relevance_of(&expression).await;
    expression.relevance = Some(relevance);
    expression.approved_at = if relevance > 0 {
        Some(Utc::now())
    } else {
        None
    };

    if let Err(err) = ctx.store.save_expression(&expression) {
        warn!(url = %expression.url, error = %err, "failed to save expression");
        return false;
    }
    if relevance > 0 {
        info!(url = %expression.url, relevance, "expression approved");
    }

    let mut clean = true;

    for media in &result.media {
        if let Err(err) = ctx.store.insert_media(expression.id, &media.url, media.kind) {
            if !err.is_integrity_conflict() {
                warn!(url = %media.url, error = %err, "failed to record media");
                clean = false;
            }
        }
    }

    if relevance > 0 && ctx.config.dynamic_media_extraction {
        if let Some(extractor) = ctx.dynamic_media {
            for media in extractor.extract_media(&expression.url).await {
                if media.kind == MediaKind::Img && !weblands_extraction::is_image_url(&media.url) {
                    continue;
                }
                if let Err(err) = ctx.store.insert_media(expression.id, &media.url, media.kind) {
                    if !err.is_integrity_conflict() {
                        clean = false;
                    }
                }
            }
        }
    }

    if let Err(err) = ctx.store.delete_links_from(expression.id) {
        warn!(url = %expression.url, error = %err, "failed to clear links");
        clean = false;
    }

    if relevance > 0 && expression.depth < MAX_SPAWN_DEPTH {
        for link in &result.links {
            if let Err(err) = ctx.link_to(&expression, link) {
                if !err.is_integrity_conflict() {
                    warn!(link = %link, error = %err, "failed to link expression");
                    clean = false;
                }
            }
        }
    }

    clean
}

/// Persists the fetched HTML under `<data_location>/lands/<land>/<id>.html`.
async fn archive_html(ctx: &CrawlContext<'_>, expression: &Expression, html: &str) {
    let dir = ctx.config.land_dir(ctx.land.id);
    if let Err(err) = tokio::fs::create_dir_all(&dir).await {
        warn!(error = %err, "cannot create archive directory");
        return;
    }
    let path = dir.join(format!("{}.html", expression.id));
    if let Err(err) = tokio::fs::write(&path, html.trim()).await {
        warn!(path = %path.display(), error = %err, "cannot archive html");
    }
}
