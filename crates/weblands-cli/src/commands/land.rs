//! `land` verbs.

use std::path::PathBuf;

use clap::Subcommand;
use weblands_crawler::{CrawlOptions, DeleteOutcome, Error, ReadableOptions};
use weblands_types::{ExportKind, MergeStrategy};

use crate::exporter::CsvExporter;

use super::{confirm, engine, install_interrupt, split_arg};

#[derive(Subcommand)]
pub enum LandVerb {
    /// List lands with counts and status histograms
    List {
        #[arg(long)]
        name: Option<String>,
    },
    /// Create a land
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        desc: String,
        /// Accepted language codes, comma separated
        #[arg(long, default_value = "fr")]
        lang: String,
    },
    /// Delete a land, or only its low-relevance expressions
    Delete {
        #[arg(long)]
        name: String,
        /// Delete fetched expressions with relevance below this threshold
        #[arg(long)]
        maxrel: Option<i64>,
    },
    /// Crawl pending expressions
    Crawl {
        #[arg(long)]
        name: String,
        /// Stop after this many successful fetches
        #[arg(long)]
        limit: Option<usize>,
        /// Refetch expressions recorded with this HTTP status
        #[arg(long)]
        http: Option<String>,
        /// Only crawl expressions at this depth
        #[arg(long)]
        depth: Option<i64>,
    },
    /// Re-extract readable content for approved expressions
    Readable {
        #[arg(long)]
        name: String,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        depth: Option<i64>,
        /// smart_merge, mercury_priority or preserve_existing
        #[arg(long, default_value = "smart_merge")]
        merge: String,
    },
    /// Rebuild links, media and relevance from stored readable text
    Consolidate {
        #[arg(long)]
        name: String,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        depth: Option<i64>,
    },
    /// Export the corpus
    Export {
        #[arg(long)]
        name: String,
        /// pagecsv, fullpagecsv, nodecsv, pagegexf, nodegexf, mediacsv, corpus
        #[arg(long = "type")]
        export_type: String,
        #[arg(long)]
        minrel: Option<i64>,
    },
    /// Add terms to the land dictionary
    Addterm {
        #[arg(long)]
        land: String,
        /// Comma-separated terms
        #[arg(long)]
        terms: String,
    },
    /// Add seed URLs
    Addurl {
        #[arg(long)]
        land: String,
        /// Comma-separated URLs
        #[arg(long)]
        urls: Option<String>,
        /// File of newline-separated URLs
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Run the external media analyzer over the land's media
    Medianalyse {
        #[arg(long)]
        name: String,
        #[arg(long)]
        depth: Option<i64>,
        #[arg(long)]
        minrel: Option<i64>,
    },
}

pub async fn run(verb: LandVerb) -> Result<(), Error> {
    match verb {
        LandVerb::List { name } => {
            let engine = engine()?;
            let summaries = engine.list_lands(name.as_deref())?;
            if summaries.is_empty() {
                println!("No land created");
                return Ok(());
            }
            for summary in summaries {
                let land = &summary.land;
                println!(
                    "{} - ({})\n\t{}",
                    land.name,
                    land.created_at.format("%B %d %Y %H:%M"),
                    land.description
                );
                println!(
                    "\t{} terms in land dictionary {:?}",
                    summary.terms.len(),
                    summary.terms
                );
                println!(
                    "\t{} expressions in land ({} remaining to crawl)",
                    summary.expression_count, summary.remaining_to_crawl
                );
                let histogram = summary
                    .http_statuses
                    .iter()
                    .map(|(status, count)| format!("{status}: {count}"))
                    .collect::<Vec<_>>()
                    .join(" - ");
                println!("\tStatus codes: {histogram}\n");
            }
            Ok(())
        }
        LandVerb::Create { name, desc, lang } => {
            let engine = engine()?;
            engine.create_land(&name, &desc, &split_arg(&lang))?;
            println!("Land \"{name}\" created");
            Ok(())
        }
        LandVerb::Delete { name, maxrel } => {
            if !confirm("Land and/or underlying objects will be deleted, type 'Y' to proceed : ") {
                return Ok(());
            }
            let engine = engine()?;
            match engine.delete_land(&name, maxrel)? {
                DeleteOutcome::LandDeleted => println!("Land {name} deleted"),
                DeleteOutcome::ExpressionsDeleted(count) => {
                    println!("{count} expressions deleted")
                }
            }
            Ok(())
        }
        LandVerb::Crawl {
            name,
            limit,
            http,
            depth,
        } => {
            let engine = engine()?;
            install_interrupt(&engine);
            let stats = engine
                .crawl(
                    &name,
                    CrawlOptions {
                        limit: limit.unwrap_or(0),
                        http_status: http,
                        depth,
                    },
                )
                .await?;
            println!(
                "{} expressions processed ({} errors)",
                stats.processed, stats.errors
            );
            Ok(())
        }
        LandVerb::Readable {
            name,
            limit,
            depth,
            merge,
        } => {
            let strategy = MergeStrategy::parse(&merge).ok_or_else(|| {
                Error::validation(format!(
                    "invalid merge strategy \"{merge}\" \
                     [smart_merge, mercury_priority, preserve_existing]"
                ))
            })?;
            let engine = engine()?;
            install_interrupt(&engine);
            let stats = engine
                .readable(
                    &name,
                    ReadableOptions {
                        limit: limit.unwrap_or(0),
                        depth,
                        merge: strategy,
                    },
                )
                .await?;
            println!(
                "{} expressions processed ({} errors)",
                stats.processed, stats.errors
            );
            Ok(())
        }
        LandVerb::Consolidate { name, limit, depth } => {
            let engine = engine()?;
            install_interrupt(&engine);
            let stats = engine
                .consolidate(&name, limit.unwrap_or(0), depth)
                .await?;
            println!(
                "{} expressions consolidated ({} errors)",
                stats.processed, stats.errors
            );
            Ok(())
        }
        LandVerb::Export {
            name,
            export_type,
            minrel,
        } => {
            let kind = ExportKind::parse(&export_type).ok_or_else(|| {
                let accepted = ExportKind::ALL
                    .iter()
                    .map(|kind| kind.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                Error::validation(format!(
                    "invalid export type \"{export_type}\" [{accepted}]"
                ))
            })?;
            let engine = engine()?;
            let (path, count) = engine.export(&name, kind, minrel.unwrap_or(1), &CsvExporter)?;
            if count > 0 {
                println!("Successfully exported {count} records to {}", path.display());
            } else {
                println!(
                    "No records to export, check crawling state or lower the minimum \
                     relevance threshold"
                );
            }
            Ok(())
        }
        LandVerb::Addterm { land, terms } => {
            let engine = engine()?;
            let added = engine.add_terms(&land, &split_arg(&terms))?;
            println!("{added} terms added to land {land}");
            Ok(())
        }
        LandVerb::Addurl { land, urls, path } => {
            let mut list = Vec::new();
            if let Some(urls) = urls {
                list.extend(split_arg(&urls));
            }
            if let Some(path) = path {
                let body = std::fs::read_to_string(&path)?;
                list.extend(
                    body.lines()
                        .map(str::trim)
                        .filter(|line| !line.is_empty())
                        .map(str::to_string),
                );
            }
            if list.is_empty() {
                return Err(Error::validation("provide --urls and/or --path"));
            }
            let engine = engine()?;
            let added = engine.add_urls(&land, &list)?;
            println!("{added} URLs created in land {land}");
            Ok(())
        }
        LandVerb::Medianalyse { name, .. } => {
            let engine = engine()?;
            // Validate the land before reporting on the capability.
            if engine.list_lands(Some(&name))?.is_empty() {
                return Err(Error::LandNotFound { name });
            }
            Err(Error::validation(
                "no media analyzer is configured; the byte-level analyzer is an external \
                 collaborator consuming the media rows this engine produces",
            ))
        }
    }
}
