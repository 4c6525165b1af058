//! Export-row assembly.
//!
//! The store guarantees every exported field is populated (empty string for
//! absent text); serialization is the exporter collaborator's concern.

use rusqlite::params;
use weblands_types::{
    ExportCorpus, LinkExportRow, MediaExportRow, NodeExportRow, PageExportRow, Tag, TaggedContent,
};

use crate::error::StoreError;
use crate::store::Store;

impl Store {
    /// Assembles everything an exporter may need for one land, restricted
    /// to expressions with `relevance >= min_relevance`.
    pub fn export_corpus(
        &self,
        land_id: i64,
        min_relevance: i64,
    ) -> Result<ExportCorpus, StoreError> {
        let conn = self.lock();
        let land_name: String =
            conn.query_row("SELECT name FROM land WHERE id = ?1", [land_id], |row| {
                row.get(0)
            })?;

        let mut pages = Vec::new();
        {
            let mut stmt = conn.prepare(
                "SELECT e.id, e.url, e.title, e.description, e.keywords, e.readable, \
                        e.relevance, e.depth, e.domain_id, d.name, d.description, d.keywords \
                 FROM expression e \
                 JOIN domain d ON d.id = e.domain_id \
                 WHERE e.land_id = ?1 AND COALESCE(e.relevance, 0) >= ?2 \
                 ORDER BY e.id",
            )?;
            let rows = stmt.query_map(params![land_id, min_relevance], |row| {
                Ok(PageExportRow {
                    id: row.get(0)?,
                    url: row.get(1)?,
                    title: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    description: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    keywords: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                    readable: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                    relevance: row.get::<_, Option<i64>>(6)?.unwrap_or_default(),
                    depth: row.get(7)?,
                    domain_id: row.get(8)?,
                    domain_name: row.get(9)?,
                    domain_description: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
                    domain_keywords: row.get::<_, Option<String>>(11)?.unwrap_or_default(),
                })
            })?;
            for page in rows {
                pages.push(page?);
            }
        }

        let mut nodes = Vec::new();
        {
            let mut stmt = conn.prepare(
                "SELECT d.id, d.name, d.description, d.keywords, COUNT(*), \
                        ROUND(AVG(COALESCE(e.relevance, 0)), 2) \
                 FROM domain d \
                 JOIN expression e ON e.domain_id = d.id \
                 WHERE e.land_id = ?1 AND COALESCE(e.relevance, 0) >= ?2 \
                 GROUP BY d.id ORDER BY d.id",
            )?;
            let rows = stmt.query_map(params![land_id, min_relevance], |row| {
                Ok(NodeExportRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    keywords: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    expressions: row.get(4)?,
                    average_relevance: row.get(5)?,
                })
            })?;
            for node in rows {
                nodes.push(node?);
            }
        }

        let mut links = Vec::new();
        {
            let mut stmt = conn.prepare(
                "SELECT el.source_id, el.target_id \
                 FROM expression_link el \
                 JOIN expression s ON s.id = el.source_id \
                 JOIN expression t ON t.id = el.target_id \
                 WHERE s.land_id = ?1 \
                   AND COALESCE(s.relevance, 0) >= ?2 \
                   AND COALESCE(t.relevance, 0) >= ?2 \
                 ORDER BY el.source_id, el.target_id",
            )?;
            let rows = stmt.query_map(params![land_id, min_relevance], |row| {
                Ok(LinkExportRow {
                    source_id: row.get(0)?,
                    target_id: row.get(1)?,
                })
            })?;
            for link in rows {
                links.push(link?);
            }
        }

        let mut media = Vec::new();
        {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.expression_id, m.url, m.type \
                 FROM media m \
                 JOIN expression e ON e.id = m.expression_id \
                 WHERE e.land_id = ?1 AND COALESCE(e.relevance, 0) >= ?2 \
                 ORDER BY m.id",
            )?;
            let rows = stmt.query_map(params![land_id, min_relevance], |row| {
                Ok(MediaExportRow {
                    id: row.get(0)?,
                    expression_id: row.get(1)?,
                    url: row.get(2)?,
                    kind: row.get(3)?,
                })
            })?;
            for item in rows {
                media.push(item?);
            }
        }

        let mut tags = Vec::new();
        {
            let mut stmt = conn.prepare(
                "SELECT id, land_id, parent_id, name, sorting, color \
                 FROM tag WHERE land_id = ?1 ORDER BY sorting, id",
            )?;
            let rows = stmt.query_map([land_id], |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    land_id: row.get(1)?,
                    parent_id: row.get(2)?,
                    name: row.get(3)?,
                    sorting: row.get(4)?,
                    color: row.get(5)?,
                })
            })?;
            for tag in rows {
                tags.push(tag?);
            }
        }

        let mut tagged_content = Vec::new();
        {
            let mut stmt = conn.prepare(
                "SELECT tc.id, tc.tag_id, tc.expression_id, tc.text, tc.from_char, tc.to_char \
                 FROM tagged_content tc \
                 JOIN tag t ON t.id = tc.tag_id \
                 WHERE t.land_id = ?1 ORDER BY tc.id",
            )?;
            let rows = stmt.query_map([land_id], |row| {
                Ok(TaggedContent {
                    id: row.get(0)?,
                    tag_id: row.get(1)?,
                    expression_id: row.get(2)?,
                    text: row.get(3)?,
                    from_char: row.get(4)?,
                    to_char: row.get(5)?,
                })
            })?;
            for content in rows {
                tagged_content.push(content?);
            }
        }

        Ok(ExportCorpus {
            land_name,
            pages,
            nodes,
            links,
            media,
            tags,
            tagged_content,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn corpus_fields_are_populated() {
        let store = Store::open_in_memory().expect("open");
        let land = store.create_land("l", "", &[]).expect("land");
        let domain = store.get_or_create_domain("a.test").expect("domain");
        let mut expression = store
            .get_or_create_expression(land.id, domain.id, "https://a.test/", 0)
            .expect("expression");
        expression.relevance = Some(3);
        expression.fetched_at = Some(Utc::now());
        store.save_expression(&expression).expect("save");

        let corpus = store.export_corpus(land.id, 1).expect("corpus");
        assert_eq!(corpus.land_name, "l");
        assert_eq!(corpus.pages.len(), 1);
        // Text fields are never null in export rows.
        assert_eq!(corpus.pages[0].title, "");
        assert_eq!(corpus.pages[0].relevance, 3);
        assert_eq!(corpus.nodes.len(), 1);
        assert_eq!(corpus.nodes[0].name, "a.test");
    }

    #[test]
    fn min_relevance_filters_pages() {
        let store = Store::open_in_memory().expect("open");
        let land = store.create_land("l", "", &[]).expect("land");
        let domain = store.get_or_create_domain("a.test").expect("domain");
        let mut low = store
            .get_or_create_expression(land.id, domain.id, "https://a.test/low", 0)
            .expect("expression");
        low.relevance = Some(1);
        store.save_expression(&low).expect("save");

        assert_eq!(store.export_corpus(land.id, 2).expect("corpus").pages.len(), 0);
        assert_eq!(store.export_corpus(land.id, 1).expect("corpus").pages.len(), 1);
    }
}
