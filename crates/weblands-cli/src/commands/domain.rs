//! `domain` verbs.

use clap::Subcommand;
use weblands_crawler::Error;

use super::engine;

#[derive(Subcommand)]
pub enum DomainVerb {
    /// Fetch metadata for domains referenced by expressions
    Crawl {
        #[arg(long)]
        limit: Option<usize>,
        /// Refetch domains recorded with this HTTP status
        #[arg(long)]
        http: Option<String>,
    },
}

pub async fn run(verb: DomainVerb) -> Result<(), Error> {
    match verb {
        DomainVerb::Crawl { limit, http } => {
            let engine = engine()?;
            let processed = engine
                .crawl_domains(limit.unwrap_or(0), http.as_deref())
                .await?;
            println!("{processed} domains processed");
            Ok(())
        }
    }
}
