//! Batch scheduler: depth-by-depth barrier over windowed batches.
//!
//! Expressions are processed in non-decreasing depth order across the
//! whole crawl; children spawned at depth `d` become eligible at `d+1`
//! within the same run. Within one depth, candidates are paged in stable
//! windows of the batch size and run concurrently; the shared client caps
//! in-flight requests at the same number.

use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::join_all;
use tracing::{debug, info};
use weblands_store::PendingFilter;

use crate::error::Error;
use crate::processor::{process_expression, CrawlContext};

/// Crawl invocation parameters.
#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    /// Stop once this many expressions succeeded (0 = unbounded).
    pub limit: usize,
    /// Refetch expressions recorded with this status instead of pending
    /// ones.
    pub http_status: Option<String>,
    /// Process exactly this depth.
    pub depth: Option<i64>,
}

/// Aggregated counts of one batched pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Expressions attempted.
    pub processed: usize,
    /// Attempts that did not produce content or failed to persist.
    pub errors: usize,
}

impl CrawlStats {
    pub fn successes(&self) -> usize {
        self.processed - self.errors
    }
}

/// Outcome of one depth pass.
enum DepthOutcome {
    Continue,
    Stop,
}

pub(crate) async fn run_crawl(
    ctx: &CrawlContext<'_>,
    options: &CrawlOptions,
    shutdown: &AtomicBool,
) -> Result<CrawlStats, Error> {
    let filter = match &options.http_status {
        Some(status) => PendingFilter::HttpStatus(status.clone()),
        None => PendingFilter::Unfetched,
    };
    let mut stats = CrawlStats::default();

    if let Some(depth) = options.depth {
        process_depth(ctx, &filter, depth, options.limit, shutdown, &mut stats).await?;
        info!(
            land = %ctx.land.name,
            processed = stats.processed,
            errors = stats.errors,
            "crawl finished"
        );
        return Ok(stats);
    }

    // Depths are re-enumerated after each pass so children spawned at
    // depth d are picked up at d+1 in the same run.
    let mut last_depth: Option<i64> = None;
    loop {
        let depths = ctx.store.pending_depths(ctx.land.id, &filter)?;
        let next = depths
            .into_iter()
            .find(|depth| last_depth.map_or(true, |last| *depth > last));
        let Some(depth) = next else {
            break;
        };
        last_depth = Some(depth);
        match process_depth(ctx, &filter, depth, options.limit, shutdown, &mut stats).await? {
            DepthOutcome::Stop => break,
            DepthOutcome::Continue => {}
        }
    }

    info!(
        land = %ctx.land.name,
        processed = stats.processed,
        errors = stats.errors,
        "crawl finished"
    );
    Ok(stats)
}

async fn process_depth(
    ctx: &CrawlContext<'_>,
    filter: &PendingFilter,
    depth: i64,
    limit: usize,
    shutdown: &AtomicBool,
    stats: &mut CrawlStats,
) -> Result<DepthOutcome, Error> {
    let ids = ctx.store.pending_ids_at_depth(ctx.land.id, filter, depth)?;
    debug!(depth, candidates = ids.len(), "starting depth pass");
    let batch_size = ctx.config.parallel_connections.max(1);

    for window in ids.chunks(batch_size) {
        if shutdown.load(Ordering::SeqCst) {
            info!("crawl interrupted, current batch drained");
            return Ok(DepthOutcome::Stop);
        }

        let mut batch = Vec::with_capacity(window.len());
        for id in window {
            match ctx.store.expression_by_id(*id) {
                Ok(expression) => batch.push(expression),
                // Deleted between the snapshot and now; skip quietly.
                Err(weblands_store::StoreError::NotFound { .. }) => continue,
                Err(err) => return Err(err.into()),
            }
        }

        let results = join_all(
            batch
                .into_iter()
                .map(|expression| process_expression(ctx, expression)),
        )
        .await;

        for success in results {
            stats.processed += 1;
            if !success {
                stats.errors += 1;
            }
        }

        if limit > 0 && stats.successes() >= limit {
            info!(limit, "crawl limit reached");
            return Ok(DepthOutcome::Stop);
        }
    }

    Ok(DepthOutcome::Continue)
}
