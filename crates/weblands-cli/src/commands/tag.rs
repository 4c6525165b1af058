//! `tag` verbs.

use clap::Subcommand;
use weblands_crawler::Error;
use weblands_types::TagExportKind;

use crate::exporter::CsvExporter;

use super::engine;

#[derive(Subcommand)]
pub enum TagVerb {
    /// Export land tags
    Export {
        #[arg(long)]
        name: String,
        /// matrix or content
        #[arg(long = "type")]
        export_type: String,
        #[arg(long)]
        minrel: Option<i64>,
    },
}

pub async fn run(verb: TagVerb) -> Result<(), Error> {
    match verb {
        TagVerb::Export {
            name,
            export_type,
            minrel,
        } => {
            let kind = TagExportKind::parse(&export_type).ok_or_else(|| {
                Error::validation(format!(
                    "invalid export type \"{export_type}\" [matrix, content]"
                ))
            })?;
            let engine = engine()?;
            let (path, count) =
                engine.export_tags(&name, kind, minrel.unwrap_or(1), &CsvExporter)?;
            if count > 0 {
                println!("Successfully exported {count} records to {}", path.display());
            } else {
                println!("No records to export");
            }
            Ok(())
        }
    }
}
