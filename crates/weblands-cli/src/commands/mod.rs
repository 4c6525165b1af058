//! Command dispatch: objects, verbs and shared helpers.

use std::io::Write;

use clap::Subcommand;
use weblands_config::Config;
use weblands_crawler::{Engine, Error};

pub mod db;
pub mod domain;
pub mod heuristic;
pub mod land;
pub mod tag;

#[derive(Subcommand)]
pub enum Object {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        verb: db::DbVerb,
    },
    /// Land lifecycle: create, feed, crawl, enrich, export
    Land {
        #[command(subcommand)]
        verb: land::LandVerb,
    },
    /// Domain metadata pass
    Domain {
        #[command(subcommand)]
        verb: domain::DomainVerb,
    },
    /// Tag exports
    Tag {
        #[command(subcommand)]
        verb: tag::TagVerb,
    },
    /// Domain heuristics maintenance
    Heuristic {
        #[command(subcommand)]
        verb: heuristic::HeuristicVerb,
    },
}

pub async fn dispatch(object: Object) -> Result<(), Error> {
    match object {
        Object::Db { verb } => db::run(verb).await,
        Object::Land { verb } => land::run(verb).await,
        Object::Domain { verb } => domain::run(verb).await,
        Object::Tag { verb } => tag::run(verb).await,
        Object::Heuristic { verb } => heuristic::run(verb).await,
    }
}

/// Builds the engine from environment-backed configuration.
pub(crate) fn engine() -> Result<Engine, Error> {
    let config = Config::from_env().map_err(|err| Error::validation(err.to_string()))?;
    Engine::new(config)
}

/// Splits a comma-separated argument into trimmed, non-empty items.
pub(crate) fn split_arg(arg: &str) -> Vec<String> {
    arg.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Interactive confirmation: proceeds only on a literal `Y`.
pub(crate) fn confirm(message: &str) -> bool {
    print!("{message}");
    let _ = std::io::stdout().flush();
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    answer.trim_end() == "Y"
}

/// Flips the engine's shutdown flag on ctrl-c so the current batch drains
/// before the command returns.
pub(crate) fn install_interrupt(engine: &Engine) {
    let flag = engine.shutdown_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("interrupt received, draining current batch");
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
        }
    });
}
