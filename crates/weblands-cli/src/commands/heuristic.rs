//! `heuristic` verbs.

use clap::Subcommand;
use weblands_crawler::Error;

use super::engine;

#[derive(Subcommand)]
pub enum HeuristicVerb {
    /// Re-derive domain identities from the configured heuristics
    Update,
}

pub async fn run(verb: HeuristicVerb) -> Result<(), Error> {
    match verb {
        HeuristicVerb::Update => {
            let engine = engine()?;
            let updated = engine.update_heuristics()?;
            println!("{updated} domain(s) updated");
            Ok(())
        }
    }
}
