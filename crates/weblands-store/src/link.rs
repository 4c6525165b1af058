//! Directed expression-link edges.

use rusqlite::params;
use weblands_types::ExpressionLink;

use crate::error::StoreError;
use crate::store::Store;

impl Store {
    /// Inserts one edge. Duplicate-key races are benign: the edge exists
    /// either way and `false` is returned.
    pub fn insert_link(&self, source_id: i64, target_id: i64) -> Result<bool, StoreError> {
        let conn = self.lock();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO expression_link (source_id, target_id) VALUES (?1, ?2)",
            params![source_id, target_id],
        )?;
        Ok(inserted > 0)
    }

    /// Drops every outgoing edge of a source expression.
    pub fn delete_links_from(&self, source_id: i64) -> Result<usize, StoreError> {
        let conn = self.lock();
        Ok(conn.execute(
            "DELETE FROM expression_link WHERE source_id = ?1",
            [source_id],
        )?)
    }

    /// Outgoing edges of one expression, target-ordered.
    pub fn links_from(&self, source_id: i64) -> Result<Vec<ExpressionLink>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT source_id, target_id FROM expression_link \
             WHERE source_id = ?1 ORDER BY target_id",
        )?;
        let rows = stmt.query_map([source_id], |row| {
            Ok(ExpressionLink {
                source_id: row.get(0)?,
                target_id: row.get(1)?,
            })
        })?;
        let mut links = Vec::new();
        for link in rows {
            links.push(link?);
        }
        Ok(links)
    }

    /// All edges within one land, source-then-target ordered.
    pub fn links_in_land(&self, land_id: i64) -> Result<Vec<ExpressionLink>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT el.source_id, el.target_id FROM expression_link el
             JOIN expression source ON source.id = el.source_id
             WHERE source.land_id = ?1
             ORDER BY el.source_id, el.target_id",
        )?;
        let rows = stmt.query_map([land_id], |row| {
            Ok(ExpressionLink {
                source_id: row.get(0)?,
                target_id: row.get(1)?,
            })
        })?;
        let mut links = Vec::new();
        for link in rows {
            links.push(link?);
        }
        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_links_collapse() {
        let store = Store::open_in_memory().expect("open");
        let land = store.create_land("l", "", &[]).expect("land");
        let domain = store.get_or_create_domain("a.test").expect("domain");
        let source = store
            .get_or_create_expression(land.id, domain.id, "https://a.test/", 0)
            .expect("source");
        let target = store
            .get_or_create_expression(land.id, domain.id, "https://a.test/p", 1)
            .expect("target");

        assert!(store.insert_link(source.id, target.id).expect("insert"));
        assert!(!store.insert_link(source.id, target.id).expect("repeat"));
        assert_eq!(store.links_from(source.id).expect("links").len(), 1);

        assert_eq!(store.delete_links_from(source.id).expect("delete"), 1);
        assert!(store.links_from(source.id).expect("links").is_empty());
    }
}
