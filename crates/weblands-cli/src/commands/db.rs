//! `db` verbs.

use clap::Subcommand;
use weblands_crawler::Error;

use super::{confirm, engine};

#[derive(Subcommand)]
pub enum DbVerb {
    /// Drop and recreate every table (destructive)
    Setup,
    /// Apply pending schema migrations
    Migrate,
}

pub async fn run(verb: DbVerb) -> Result<(), Error> {
    match verb {
        DbVerb::Setup => {
            if !confirm("Warning, existing data will be lost, type 'Y' to proceed : ") {
                return Ok(());
            }
            let engine = engine()?;
            engine.store().setup()?;
            println!("Model created, setup complete");
            Ok(())
        }
        DbVerb::Migrate => {
            let engine = engine()?;
            let applied = engine.store().migrate()?;
            if applied.is_empty() {
                println!("No pending migrations");
            } else {
                for version in applied {
                    println!("Migration {version} applied");
                }
            }
            Ok(())
        }
    }
}
