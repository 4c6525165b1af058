//! Readable-reprocess pipeline.
//!
//! Re-extracts readable content for approved expressions through a variant
//! ladder (in-process readability over a fresh fetch, then the subprocess
//! extractor, then the archival mirror) and merges the result with stored
//! fields under a configurable strategy. `readable_at` marks the pass;
//! when the readable text changes, relevance, links and media are rebuilt
//! from the final Markdown.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, warn};
use weblands_extraction::{
    extract_page_meta, extract_readable, links_from_markdown, media_from_markdown,
    SubprocessReadability,
};
use weblands_fetch::ArchiveClient;
use weblands_types::{
    Expression, MergeStrategy, PageMeta, ReadabilityExtractor, ReadableDocument,
};

use crate::error::Error;
use crate::processor::{CrawlContext, MAX_SPAWN_DEPTH};
use crate::scheduler::CrawlStats;

/// Readable-reprocess invocation parameters.
#[derive(Debug, Clone, Default)]
pub struct ReadableOptions {
    pub limit: usize,
    pub depth: Option<i64>,
    pub merge: MergeStrategy,
}

pub(crate) async fn run_readable(
    ctx: &CrawlContext<'_>,
    options: &ReadableOptions,
    shutdown: &AtomicBool,
) -> Result<CrawlStats, Error> {
    let expressions =
        ctx.store
            .approved_for_readable(ctx.land.id, options.depth, options.limit)?;
    let subprocess = SubprocessReadability::new(&ctx.config.readable_command);
    let batch_size = ctx.config.parallel_connections.max(1);
    let mut stats = CrawlStats::default();

    for window in expressions.chunks(batch_size) {
        if shutdown.load(Ordering::SeqCst) {
            info!("readable pass interrupted, current batch drained");
            break;
        }
        let results = join_all(window.iter().cloned().map(|expression| {
            reprocess_expression(ctx, &subprocess, expression, options.merge)
        }))
        .await;
        for success in results {
            stats.processed += 1;
            if !success {
                stats.errors += 1;
            }
        }
    }

    info!(
        land = %ctx.land.name,
        processed = stats.processed,
        errors = stats.errors,
        "readable pass finished"
    );
    Ok(stats)
}

/// Variant ladder for one expression: fresh fetch + readability, then the
/// subprocess extractor, then the archival mirror. Also returns the raw
/// HTML when the fetch produced one, for metadata enrichment.
async fn extract_document(
    ctx: &CrawlContext<'_>,
    subprocess: &SubprocessReadability,
    url: &str,
) -> (Option<ReadableDocument>, Option<String>) {
    let html = match ctx.fetcher.fetch_page(url).await {
        Ok(page) => page.html,
        Err(err) => {
            debug!(url, error = %err, "refetch failed");
            None
        }
    };

    if let Some(html) = &html {
        if let Some(document) = extract_readable(html, url) {
            return (Some(document), Some(html.clone()));
        }
    }

    if let Some(document) = subprocess.extract(url, html.as_deref()).await {
        return (Some(document), html);
    }

    let archive = ArchiveClient::new(
        ctx.fetcher,
        ctx.config.archive_lookup_timeout,
        ctx.config.archive_fetch_timeout,
    );
    if let Some(snapshot) = archive.lookup(url).await {
        if let Some(body) = archive.fetch_snapshot(&snapshot.url).await {
            if let Some(document) = extract_readable(&body, url) {
                return (Some(document), html);
            }
        }
    }

    (None, html)
}

async fn reprocess_expression(
    ctx: &CrawlContext<'_>,
    subprocess: &SubprocessReadability,
    mut expression: Expression,
    strategy: MergeStrategy,
) -> bool {
    let (document, html) = extract_document(ctx, subprocess, &expression.url).await;
    let Some(document) = document else {
        debug!(url = %expression.url, "no readable document extracted");
        return false;
    };

    let readable_before = expression.readable.clone();

    expression.title = merge_field(
        expression.title.as_deref(),
        document.title.as_deref(),
        strategy,
        FieldKind::PreferLongest,
    );
    expression.description = merge_field(
        expression.description.as_deref(),
        document.excerpt.as_deref(),
        strategy,
        FieldKind::PreferLongest,
    );
    expression.readable = merge_field(
        expression.readable.as_deref(),
        document.markdown.as_deref(),
        strategy,
        FieldKind::PreferIncoming,
    );
    expression.lang = merge_field(
        expression.lang.as_deref(),
        document.lang.as_deref(),
        strategy,
        FieldKind::PreferIncoming,
    );
    expression.published_at = match (expression.published_at, document.published_at) {
        (None, incoming) => incoming,
        (current, None) => current,
        (current, incoming) => match strategy {
            MergeStrategy::PreserveExisting => current,
            _ => incoming,
        },
    };

    // Sparse metadata can be enriched from the refetched page; values
    // override only when non-empty.
    if expression.title.is_none() || expression.description.is_none() {
        if let Some(html) = &html {
            let fetched = extract_page_meta(html);
            let mut meta = PageMeta {
                title: expression.title.clone(),
                description: expression.description.clone(),
                keywords: expression.keywords.clone(),
                lang: expression.lang.clone(),
            };
            meta.fill_missing(fetched);
            expression.title = meta.title;
            expression.description = meta.description;
            expression.keywords = meta.keywords;
            expression.lang = meta.lang;
        }
    }

    expression.readable_at = Some(Utc::now());

    let readable_changed = expression.readable != readable_before;
    if readable_changed {
        let relevance = ctx.relevance_of(&expression).await;
        expression.relevance = Some(relevance);
        expression.approved_at = if relevance > 0 {
            Some(expression.approved_at.unwrap_or_else(Utc::now))
        } else {
            None
        };
    }

    if let Err(err) = ctx.store.save_expression(&expression) {
        warn!(url = %expression.url, error = %err, "failed to save expression");
        return false;
    }

    if !readable_changed {
        return true;
    }

    let mut clean = true;
    if let Err(err) = ctx.store.delete_media_for(expression.id) {
        warn!(url = %expression.url, error = %err, "failed to clear media");
        clean = false;
    }
    if let Err(err) = ctx.store.delete_links_from(expression.id) {
        warn!(url = %expression.url, error = %err, "failed to clear links");
        clean = false;
    }

    let Some(readable) = expression.readable.clone() else {
        return clean;
    };
    for media in media_from_markdown(&readable, &expression.url) {
        if let Err(err) = ctx.store.insert_media(expression.id, &media.url, media.kind) {
            if !err.is_integrity_conflict() {
                clean = false;
            }
        }
    }
    if expression.is_approved() && expression.depth < MAX_SPAWN_DEPTH {
        for link in links_from_markdown(&readable) {
            if let Err(err) = ctx.link_to(&expression, &link) {
                if !err.is_integrity_conflict() {
                    warn!(link = %link, error = %err, "failed to link expression");
                    clean = false;
                }
            }
        }
    }

    clean
}

#[derive(Debug, Clone, Copy)]
enum FieldKind {
    /// Smart merge keeps the longer value (titles, descriptions).
    PreferLongest,
    /// Smart merge trusts the extractor (readable text, language).
    PreferIncoming,
}

/// Combines a stored field with the extractor's value. An empty side never
/// wins over a non-empty one.
fn merge_field(
    current: Option<&str>,
    incoming: Option<&str>,
    strategy: MergeStrategy,
    kind: FieldKind,
) -> Option<String> {
    let current = current.map(str::trim).filter(|value| !value.is_empty());
    let incoming = incoming.map(str::trim).filter(|value| !value.is_empty());
    let merged = match (current, incoming) {
        (None, incoming) => incoming,
        (current, None) => current,
        (Some(current), Some(incoming)) => match strategy {
            MergeStrategy::MercuryPriority => Some(incoming),
            MergeStrategy::PreserveExisting => Some(current),
            MergeStrategy::SmartMerge => match kind {
                FieldKind::PreferLongest => {
                    if incoming.len() > current.len() {
                        Some(incoming)
                    } else {
                        Some(current)
                    }
                }
                FieldKind::PreferIncoming => Some(incoming),
            },
        },
    };
    merged.map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_values_never_win() {
        for strategy in [
            MergeStrategy::MercuryPriority,
            MergeStrategy::PreserveExisting,
            MergeStrategy::SmartMerge,
        ] {
            assert_eq!(
                merge_field(Some("kept"), None, strategy, FieldKind::PreferIncoming),
                Some("kept".to_string())
            );
            assert_eq!(
                merge_field(Some("kept"), Some("  "), strategy, FieldKind::PreferIncoming),
                Some("kept".to_string())
            );
            assert_eq!(
                merge_field(None, Some("new"), strategy, FieldKind::PreferLongest),
                Some("new".to_string())
            );
        }
    }

    #[test]
    fn strategies_resolve_conflicts() {
        assert_eq!(
            merge_field(
                Some("old"),
                Some("new"),
                MergeStrategy::MercuryPriority,
                FieldKind::PreferLongest
            ),
            Some("new".to_string())
        );
        assert_eq!(
            merge_field(
                Some("old"),
                Some("new"),
                MergeStrategy::PreserveExisting,
                FieldKind::PreferLongest
            ),
            Some("old".to_string())
        );
    }

    #[test]
    fn smart_merge_is_field_aware() {
        // Longest wins for titles and descriptions.
        assert_eq!(
            merge_field(
                Some("a short one"),
                Some("a much longer candidate"),
                MergeStrategy::SmartMerge,
                FieldKind::PreferLongest
            ),
            Some("a much longer candidate".to_string())
        );
        assert_eq!(
            merge_field(
                Some("a much longer current"),
                Some("short"),
                MergeStrategy::SmartMerge,
                FieldKind::PreferLongest
            ),
            Some("a much longer current".to_string())
        );
        // The extractor wins for readable text.
        assert_eq!(
            merge_field(
                Some("stored readable that is quite long"),
                Some("fresh"),
                MergeStrategy::SmartMerge,
                FieldKind::PreferIncoming
            ),
            Some("fresh".to_string())
        );
    }
}
