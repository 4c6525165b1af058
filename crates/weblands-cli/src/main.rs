//! weblands - research-oriented web-intelligence engine.
//!
//! Command surface: `weblands <object> <verb> [flags]` over lands,
//! domains, tags and heuristics.

use clap::Parser;

mod commands;
mod error;
mod exporter;

use error::exit_code;

#[derive(Parser)]
#[command(name = "weblands")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build curated, relevance-scored web corpora", long_about = None)]
struct Cli {
    #[command(subcommand)]
    object: commands::Object,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match commands::dispatch(cli.object).await {
        Ok(()) => {}
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(exit_code(&err));
        }
    }
}
