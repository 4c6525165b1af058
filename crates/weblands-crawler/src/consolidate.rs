//! Consolidation: re-derives relevance, links and media from stored
//! readable text without refetching.
//!
//! Useful after dictionary changes or extractor upgrades. Idempotent on
//! stable input: running it twice yields identical link and media sets.
//! Depths are never altered.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use futures::future::join_all;
use tracing::{info, warn};
use weblands_extraction::{links_from_markdown, media_from_markdown};
use weblands_types::Expression;

use crate::error::Error;
use crate::processor::{CrawlContext, MAX_SPAWN_DEPTH};
use crate::scheduler::CrawlStats;

pub(crate) async fn run_consolidation(
    ctx: &CrawlContext<'_>,
    limit: usize,
    depth: Option<i64>,
    shutdown: &AtomicBool,
) -> Result<CrawlStats, Error> {
    let expressions = ctx
        .store
        .fetched_for_consolidation(ctx.land.id, depth, limit)?;
    let batch_size = ctx.config.parallel_connections.max(1);
    let mut stats = CrawlStats::default();

    for window in expressions.chunks(batch_size) {
        if shutdown.load(Ordering::SeqCst) {
            info!("consolidation interrupted, current batch drained");
            break;
        }
        let results = join_all(
            window
                .iter()
                .cloned()
                .map(|expression| consolidate_expression(ctx, expression)),
        )
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
        "consolidation finished"
    );
    Ok(stats)
}

async fn consolidate_expression(ctx: &CrawlContext<'_>, mut expression: Expression) -> bool {
    // Offline pass: the score comes from stored text only, with no LLM
    // gate round trip.
    let relevance = ctx.term_score(&expression);
    expression.relevance = Some(relevance);
    expression.approved_at = if relevance > 0 {
        Some(expression.approved_at.unwrap_or_else(Utc::now))
    } else {
        None
    };

    if let Err(err) = ctx.store.save_expression(&expression) {
        warn!(url = %expression.url, error = %err, "failed to save expression");
        return false;
    }

    let mut clean = true;
    if let Err(err) = ctx.store.delete_links_from(expression.id) {
        warn!(url = %expression.url, error = %err, "failed to clear links");
        clean = false;
    }
    if let Err(err) = ctx.store.delete_media_for(expression.id) {
        warn!(url = %expression.url, error = %err, "failed to clear media");
        clean = false;
    }

    let Some(readable) = expression.readable.clone() else {
        return clean;
    };

    for media in media_from_markdown(&readable, &expression.url) {
        if let Err(err) = ctx.store.insert_media(expression.id, &media.url, media.kind) {
            if !err.is_integrity_conflict() {
                warn!(url = %media.url, error = %err, "failed to record media");
                clean = false;
            }
        }
    }

    if relevance > 0 && expression.depth < MAX_SPAWN_DEPTH {
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
