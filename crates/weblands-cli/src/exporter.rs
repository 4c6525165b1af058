//! Built-in CSV exporter backend.
//!
//! Covers the CSV export shapes; GEXF graphs and the ZIP corpus are
//! produced by external exporter tooling and report as unavailable here.

use std::path::Path;

use weblands_types::{ExportCorpus, ExportError, ExportKind, Exporter, TagExportKind};

pub struct CsvExporter;

fn csv_io(err: csv::Error) -> ExportError {
    ExportError::Io(std::io::Error::other(err))
}

impl CsvExporter {
    fn write_pages(
        corpus: &ExportCorpus,
        path: &Path,
        with_readable: bool,
    ) -> Result<usize, ExportError> {
        let mut writer = csv::Writer::from_path(path).map_err(csv_io)?;
        let mut header = vec![
            "id",
            "url",
            "title",
            "description",
            "keywords",
            "relevance",
            "depth",
            "domain_id",
            "domain_name",
            "domain_description",
            "domain_keywords",
        ];
        if with_readable {
            header.insert(5, "readable");
        }
        writer.write_record(&header).map_err(csv_io)?;
        for page in &corpus.pages {
            let mut record = vec![
                page.id.to_string(),
                page.url.clone(),
                page.title.clone(),
                page.description.clone(),
                page.keywords.clone(),
                page.relevance.to_string(),
                page.depth.to_string(),
                page.domain_id.to_string(),
                page.domain_name.clone(),
                page.domain_description.clone(),
                page.domain_keywords.clone(),
            ];
            if with_readable {
                record.insert(5, page.readable.clone());
            }
            writer.write_record(&record).map_err(csv_io)?;
        }
        writer.flush()?;
        Ok(corpus.pages.len())
    }

    fn write_nodes(corpus: &ExportCorpus, path: &Path) -> Result<usize, ExportError> {
        let mut writer = csv::Writer::from_path(path).map_err(csv_io)?;
        writer
            .write_record([
                "id",
                "name",
                "description",
                "keywords",
                "expressions",
                "average_relevance",
            ])
            .map_err(csv_io)?;
        for node in &corpus.nodes {
            writer
                .write_record([
                    node.id.to_string(),
                    node.name.clone(),
                    node.description.clone(),
                    node.keywords.clone(),
                    node.expressions.to_string(),
                    node.average_relevance.to_string(),
                ])
                .map_err(csv_io)?;
        }
        writer.flush()?;
        Ok(corpus.nodes.len())
    }

    fn write_media(corpus: &ExportCorpus, path: &Path) -> Result<usize, ExportError> {
        let mut writer = csv::Writer::from_path(path).map_err(csv_io)?;
        writer
            .write_record(["id", "expression_id", "url", "type"])
            .map_err(csv_io)?;
        for media in &corpus.media {
            writer
                .write_record([
                    media.id.to_string(),
                    media.expression_id.to_string(),
                    media.url.clone(),
                    media.kind.clone(),
                ])
                .map_err(csv_io)?;
        }
        writer.flush()?;
        Ok(corpus.media.len())
    }

    fn write_tag_content(corpus: &ExportCorpus, path: &Path) -> Result<usize, ExportError> {
        let mut writer = csv::Writer::from_path(path).map_err(csv_io)?;
        writer
            .write_record(["id", "tag_id", "expression_id", "text", "from_char", "to_char"])
            .map_err(csv_io)?;
        for content in &corpus.tagged_content {
            writer
                .write_record([
                    content.id.to_string(),
                    content.tag_id.to_string(),
                    content.expression_id.to_string(),
                    content.text.clone(),
                    content.from_char.to_string(),
                    content.to_char.to_string(),
                ])
                .map_err(csv_io)?;
        }
        writer.flush()?;
        Ok(corpus.tagged_content.len())
    }
}

impl Exporter for CsvExporter {
    fn export_land(
        &self,
        kind: ExportKind,
        corpus: &ExportCorpus,
        path: &Path,
    ) -> Result<usize, ExportError> {
        match kind {
            ExportKind::PageCsv => Self::write_pages(corpus, path, false),
            ExportKind::FullPageCsv => Self::write_pages(corpus, path, true),
            ExportKind::NodeCsv => Self::write_nodes(corpus, path),
            ExportKind::MediaCsv => Self::write_media(corpus, path),
            ExportKind::PageGexf | ExportKind::NodeGexf | ExportKind::Corpus => {
                Err(ExportError::Unavailable {
                    kind: kind.as_str().to_string(),
                })
            }
        }
    }

    fn export_tags(
        &self,
        kind: TagExportKind,
        corpus: &ExportCorpus,
        path: &Path,
    ) -> Result<usize, ExportError> {
        match kind {
            TagExportKind::Content => Self::write_tag_content(corpus, path),
            TagExportKind::Matrix => Err(ExportError::Unavailable {
                kind: kind.as_str().to_string(),
            }),
        }
    }
}
