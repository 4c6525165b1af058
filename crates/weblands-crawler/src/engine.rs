//! Land orchestrator: the long-lived engine value behind the CLI.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use weblands_config::Config;
use weblands_extraction::extract_page_meta;
use weblands_fetch::HttpFetcher;
use weblands_store::{LandSummary, Store};
use weblands_text::{passes_language_gate, DictionaryMatcher, Lemmatizer};
use weblands_types::{
    DynamicMediaExtractor, ExportKind, Exporter, Land, MediaAnalyzer, PageMeta, RelevanceGate,
    TagExportKind,
};

use crate::consolidate::run_consolidation;
use crate::error::Error;
use crate::gate::GateHandle;
use crate::ladder::FetchLadder;
use crate::processor::CrawlContext;
use crate::readable::{run_readable, ReadableOptions};
use crate::scheduler::{run_crawl, CrawlOptions, CrawlStats};
use crate::urls::{canonicalize, domain_of, is_crawlable};

/// Outcome of `land delete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    LandDeleted,
    ExpressionsDeleted(usize),
}

/// Top-level entry point coordinating store, fetcher, scorer and the
/// optional capabilities. Created once at startup and shared for the
/// whole run.
pub struct Engine {
    config: Config,
    store: Store,
    fetcher: HttpFetcher,
    lemmatizer: Lemmatizer,
    gate: Option<GateHandle>,
    dynamic_media: Option<Arc<dyn DynamicMediaExtractor>>,
    shutdown: Arc<AtomicBool>,
    archive_endpoint: Option<String>,
}

impl Engine {
    /// Opens the store under `data_location` and builds the shared client.
    pub fn new(config: Config) -> Result<Self, Error> {
        let store = Store::open(config.db_path())?;
        Self::with_store(config, store)
    }

    /// Builds the engine over an existing store (tests use an in-memory
    /// one).
    pub fn with_store(config: Config, store: Store) -> Result<Self, Error> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self {
            config,
            store,
            fetcher,
            lemmatizer: Lemmatizer::new(),
            gate: None,
            dynamic_media: None,
            shutdown: Arc::new(AtomicBool::new(false)),
            archive_endpoint: None,
        })
    }

    /// Attaches the optional LLM relevance gate.
    pub fn with_gate(mut self, gate: Arc<dyn RelevanceGate>) -> Self {
        self.gate = Some(GateHandle::new(gate, &self.config.gate));
        self
    }

    /// Attaches the optional headless-browser media extractor.
    pub fn with_dynamic_media(mut self, extractor: Arc<dyn DynamicMediaExtractor>) -> Self {
        self.dynamic_media = Some(extractor);
        self
    }

    /// Overrides the archival availability endpoint (tests).
    pub fn with_archive_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.archive_endpoint = Some(endpoint.into());
        self
    }

    /// Flag flipped by the interrupt handler; checked between batches so
    /// the current batch drains before return.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn land(&self, name: &str) -> Result<Land, Error> {
        self.store
            .land_by_name(name)?
            .ok_or_else(|| Error::LandNotFound {
                name: name.to_string(),
            })
    }

    fn context<'a>(&'a self, land: &'a Land) -> Result<CrawlContext<'a>, Error> {
        let matcher = DictionaryMatcher::new(self.store.land_lemmas(land.id)?);
        let terms = self.store.land_terms(land.id)?;
        let mut ladder = FetchLadder::new(&self.fetcher, &self.config);
        if let Some(endpoint) = &self.archive_endpoint {
            ladder = ladder.with_archive_endpoint(endpoint.clone());
        }
        Ok(CrawlContext {
            store: &self.store,
            config: &self.config,
            land,
            fetcher: &self.fetcher,
            lemmatizer: &self.lemmatizer,
            matcher,
            terms,
            ladder,
            gate: self.gate.as_ref(),
            dynamic_media: self.dynamic_media.as_deref(),
        })
    }

    /// Creates a land and its data subdirectory.
    pub fn create_land(
        &self,
        name: &str,
        description: &str,
        langs: &[String],
    ) -> Result<Land, Error> {
        let land = self
            .store
            .create_land(name, description, langs)
            .map_err(|err| {
                if err.is_integrity_conflict() {
                    Error::validation(format!("land \"{name}\" already exists"))
                } else {
                    err.into()
                }
            })?;
        std::fs::create_dir_all(self.config.land_dir(land.id))?;
        info!(land = %land.name, "land created");
        Ok(land)
    }

    /// Adds terms to a land's dictionary, then recomputes relevance over
    /// every expression already carrying readable text.
    pub fn add_terms(&self, land_name: &str, terms: &[String]) -> Result<usize, Error> {
        let land = self.land(land_name)?;
        let mut added = 0;
        for term in terms {
            let term = term.trim();
            if term.is_empty() {
                continue;
            }
            let lemma = self.lemmatizer.lemmatize(term);
            self.store.add_dictionary_term(land.id, term, &lemma)?;
            info!(term, land = %land.name, "term added");
            added += 1;
        }
        let updated = self.recompute_relevance(&land)?;
        if updated > 0 {
            info!(updated, "relevance recomputed");
        }
        Ok(added)
    }

    /// Recomputes relevance (and approval) from stored text for the whole
    /// land. Returns the number of expressions touched.
    pub fn recompute_relevance(&self, land: &Land) -> Result<usize, Error> {
        let matcher = DictionaryMatcher::new(self.store.land_lemmas(land.id)?);
        let expressions = self.store.expressions_with_readable(land.id)?;
        let count = expressions.len();
        for mut expression in expressions {
            let relevance = if passes_language_gate(expression.lang.as_deref(), &land.lang) {
                matcher.score(
                    &self.lemmatizer,
                    expression.title.as_deref(),
                    expression.readable.as_deref(),
                )
            } else {
                0
            };
            expression.relevance = Some(relevance);
            expression.approved_at = if relevance > 0 {
                Some(expression.approved_at.unwrap_or_else(Utc::now))
            } else {
                None
            };
            self.store.save_expression(&expression)?;
        }
        Ok(count)
    }

    /// Adds seed URLs at depth 0. Returns how many expressions were
    /// actually created.
    pub fn add_urls(&self, land_name: &str, urls: &[String]) -> Result<usize, Error> {
        let land = self.land(land_name)?;
        let mut added = 0;
        for raw in urls {
            let url = canonicalize(raw.trim());
            if url.is_empty() || !is_crawlable(&url) {
                continue;
            }
            let Some(domain_name) = domain_of(&url, &self.config.heuristics) else {
                continue;
            };
            if self.store.expression_by_url(land.id, &url)?.is_some() {
                continue;
            }
            let domain = self.store.get_or_create_domain(&domain_name)?;
            self.store
                .get_or_create_expression(land.id, domain.id, &url, 0)?;
            added += 1;
        }
        info!(added, land = %land_name, "urls added");
        Ok(added)
    }

    /// Deletes a land, or with `maxrel` only its fetched expressions
    /// scoring below the threshold.
    pub fn delete_land(&self, name: &str, maxrel: Option<i64>) -> Result<DeleteOutcome, Error> {
        let land = self.land(name)?;
        match maxrel {
            Some(maxrel) if maxrel > 0 => {
                let deleted = self
                    .store
                    .delete_expressions_below_relevance(land.id, maxrel)?;
                info!(deleted, land = %name, "expressions deleted");
                Ok(DeleteOutcome::ExpressionsDeleted(deleted))
            }
            _ => {
                self.store.delete_land(land.id)?;
                info!(land = %name, "land deleted");
                Ok(DeleteOutcome::LandDeleted)
            }
        }
    }

    pub fn list_lands(&self, name: Option<&str>) -> Result<Vec<LandSummary>, Error> {
        Ok(self.store.list_lands(name)?)
    }

    /// Crawls pending expressions of a land (§ batch scheduler).
    pub async fn crawl(&self, land_name: &str, options: CrawlOptions) -> Result<CrawlStats, Error> {
        let land = self.land(land_name)?;
        let ctx = self.context(&land)?;
        run_crawl(&ctx, &options, &self.shutdown).await
    }

    /// Readable-reprocess pass over approved expressions.
    pub async fn readable(
        &self,
        land_name: &str,
        options: ReadableOptions,
    ) -> Result<CrawlStats, Error> {
        let land = self.land(land_name)?;
        let ctx = self.context(&land)?;
        run_readable(&ctx, &options, &self.shutdown).await
    }

    /// Consolidation pass re-deriving links, media and relevance from
    /// stored readable text.
    pub async fn consolidate(
        &self,
        land_name: &str,
        limit: usize,
        depth: Option<i64>,
    ) -> Result<CrawlStats, Error> {
        let land = self.land(land_name)?;
        let ctx = self.context(&land)?;
        run_consolidation(&ctx, limit, depth, &self.shutdown).await
    }

    /// Domain metadata pass: fetches `https://<name>` (falling back to
    /// plain HTTP) for every domain matching the selection and records
    /// status and metadata. Returns how many domains yielded content.
    pub async fn crawl_domains(
        &self,
        limit: usize,
        http_status: Option<&str>,
    ) -> Result<usize, Error> {
        let domains = self.store.domains_to_crawl(limit, http_status)?;
        let mut processed = 0;
        for domain in domains {
            let fetched_at = Utc::now();
            let mut status: Option<String> = None;
            let mut meta: Option<PageMeta> = None;
            for scheme in ["https", "http"] {
                let url = format!("{scheme}://{}", domain.name);
                match self
                    .fetcher
                    .fetch_page_with_timeout(&url, self.config.domain_timeout)
                    .await
                {
                    Ok(page) => {
                        status = Some(format!("{:03}", page.status));
                        if let Some(html) = page.html {
                            meta = Some(extract_page_meta(&html));
                            processed += 1;
                        }
                        break;
                    }
                    Err(_) => continue,
                }
            }
            let status = status.unwrap_or_else(|| "000".to_string());
            let meta = meta.unwrap_or_default();
            self.store.save_domain_fetch(
                domain.id,
                Some(&status),
                meta.title.as_deref(),
                meta.description.as_deref(),
                meta.keywords.as_deref(),
                fetched_at,
            )?;
        }
        info!(processed, "domains processed");
        Ok(processed)
    }

    /// Re-derives domain identity for every expression URL and reattaches
    /// the ones whose identity changed. Returns the update count.
    pub fn update_heuristics(&self) -> Result<usize, Error> {
        let pairs = self.store.expression_domain_pairs()?;
        let mut names: HashMap<i64, String> = HashMap::new();
        let mut updated = 0;
        for (expression_id, url, domain_id) in pairs {
            let Some(new_name) = domain_of(&url, &self.config.heuristics) else {
                continue;
            };
            let current = match names.get(&domain_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self.store.domain_by_id(domain_id)?.name;
                    names.insert(domain_id, name.clone());
                    name
                }
            };
            if new_name != current {
                let domain = self.store.get_or_create_domain(&new_name)?;
                self.store
                    .reassign_expression_domain(expression_id, domain.id)?;
                updated += 1;
            }
        }
        info!(updated, "domains updated from heuristics");
        Ok(updated)
    }

    /// Applies the external media analyzer to every media row of the
    /// selected expressions. Returns the number of media rows analyzed.
    pub async fn media_analysis(
        &self,
        land_name: &str,
        analyzer: &dyn MediaAnalyzer,
        max_depth: Option<i64>,
        min_relevance: Option<i64>,
    ) -> Result<usize, Error> {
        let land = self.land(land_name)?;
        let expressions =
            self.store
                .expressions_for_media_analysis(land.id, max_depth, min_relevance)?;
        let mut analyzed = 0;
        for expression in expressions {
            for media in self.store.media_for_expression(expression.id)? {
                let analysis = analyzer.analyze(&media.url, media.kind).await;
                self.store.save_media_analysis(media.id, &analysis)?;
                analyzed += 1;
            }
        }
        info!(analyzed, land = %land_name, "media analyzed");
        Ok(analyzed)
    }

    /// Assembles the export corpus and delegates serialization.
    pub fn export(
        &self,
        land_name: &str,
        kind: ExportKind,
        min_relevance: i64,
        exporter: &dyn Exporter,
    ) -> Result<(PathBuf, usize), Error> {
        let land = self.land(land_name)?;
        let corpus = self.store.export_corpus(land.id, min_relevance)?;
        std::fs::create_dir_all(&self.config.data_location)?;
        let stamp = Utc::now().format("%Y%m%d%H%M%S");
        let path = self.config.data_location.join(format!(
            "export_{}_{}_{stamp}.{}",
            land.name,
            kind.as_str(),
            kind.extension()
        ));
        let count = exporter.export_land(kind, &corpus, &path)?;
        Ok((path, count))
    }

    /// Tag export counterpart of [`Engine::export`].
    pub fn export_tags(
        &self,
        land_name: &str,
        kind: TagExportKind,
        min_relevance: i64,
        exporter: &dyn Exporter,
    ) -> Result<(PathBuf, usize), Error> {
        let land = self.land(land_name)?;
        let corpus = self.store.export_corpus(land.id, min_relevance)?;
        std::fs::create_dir_all(&self.config.data_location)?;
        let stamp = Utc::now().format("%Y%m%d%H%M%S");
        let path = self.config.data_location.join(format!(
            "export_{}_tag_{}_{stamp}.csv",
            land.name,
            kind.as_str()
        ));
        let count = exporter.export_tags(kind, &corpus, &path)?;
        Ok((path, count))
    }
}
