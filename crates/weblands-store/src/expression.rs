//! Expression rows: upserts, state transitions and crawl selections.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use weblands_types::Expression;

use crate::error::StoreError;
use crate::store::{from_column, to_column, Store};

const EXPRESSION_COLUMNS: &str = "id, land_id, url, domain_id, http_status, lang, title, \
     description, keywords, readable, created_at, published_at, fetched_at, approved_at, \
     readable_at, relevance, depth";

fn expression_from_row(row: &Row<'_>) -> rusqlite::Result<Expression> {
    Ok(Expression {
        id: row.get(0)?,
        land_id: row.get(1)?,
        url: row.get(2)?,
        domain_id: row.get(3)?,
        http_status: row.get(4)?,
        lang: row.get(5)?,
        title: row.get(6)?,
        description: row.get(7)?,
        keywords: row.get(8)?,
        readable: row.get(9)?,
        created_at: from_column(row.get(10)?).unwrap_or_else(Utc::now),
        published_at: from_column(row.get(11)?),
        fetched_at: from_column(row.get(12)?),
        approved_at: from_column(row.get(13)?),
        readable_at: from_column(row.get(14)?),
        relevance: row.get(15)?,
        depth: row.get(16)?,
    })
}

/// Which pending population a crawl selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingFilter {
    /// Expressions never fetched.
    Unfetched,
    /// Refetch expressions recorded with this status.
    HttpStatus(String),
}

impl Store {
    pub fn expression_by_id(&self, id: i64) -> Result<Expression, StoreError> {
        let conn = self.lock();
        conn.query_row(
            &format!("SELECT {EXPRESSION_COLUMNS} FROM expression WHERE id = ?1"),
            [id],
            expression_from_row,
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found("expression", id.to_string()))
    }

    pub fn expression_by_url(
        &self,
        land_id: i64,
        url: &str,
    ) -> Result<Option<Expression>, StoreError> {
        let conn = self.lock();
        Ok(conn
            .query_row(
                &format!(
                    "SELECT {EXPRESSION_COLUMNS} FROM expression \
                     WHERE land_id = ?1 AND url = ?2"
                ),
                params![land_id, url],
                expression_from_row,
            )
            .optional()?)
    }

    /// Creates the pending expression for `(land, url)` unless one exists.
    /// Concurrent upserts race on the unique index; the loser reads the
    /// winner's row.
    pub fn get_or_create_expression(
        &self,
        land_id: i64,
        domain_id: i64,
        url: &str,
        depth: i64,
    ) -> Result<Expression, StoreError> {
        {
            let conn = self.lock();
            conn.execute(
                "INSERT OR IGNORE INTO expression (land_id, url, domain_id, depth, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![land_id, url, domain_id, depth, to_column(Utc::now())],
            )?;
        }
        self.expression_by_url(land_id, url)?
            .ok_or_else(|| StoreError::not_found("expression", url))
    }

    /// Writes back every mutable field of an expression.
    pub fn save_expression(&self, expression: &Expression) -> Result<(), StoreError> {
        let conn = self.lock();
        conn.execute(
            "UPDATE expression SET http_status = ?1, lang = ?2, title = ?3, description = ?4, \
                 keywords = ?5, readable = ?6, published_at = ?7, fetched_at = ?8, \
                 approved_at = ?9, readable_at = ?10, relevance = ?11, depth = ?12 \
             WHERE id = ?13",
            params![
                expression.http_status,
                expression.lang,
                expression.title,
                expression.description,
                expression.keywords,
                expression.readable,
                expression.published_at.map(to_column),
                expression.fetched_at.map(to_column),
                expression.approved_at.map(to_column),
                expression.readable_at.map(to_column),
                expression.relevance,
                expression.depth,
                expression.id,
            ],
        )?;
        Ok(())
    }

    /// Distinct depths, ascending, among expressions matching the filter.
    pub fn pending_depths(
        &self,
        land_id: i64,
        filter: &PendingFilter,
    ) -> Result<Vec<i64>, StoreError> {
        let conn = self.lock();
        let mut depths = Vec::new();
        match filter {
            PendingFilter::Unfetched => {
                let mut stmt = conn.prepare(
                    "SELECT DISTINCT depth FROM expression \
                     WHERE land_id = ?1 AND fetched_at IS NULL ORDER BY depth",
                )?;
                let rows = stmt.query_map([land_id], |row| row.get::<_, i64>(0))?;
                for depth in rows {
                    depths.push(depth?);
                }
            }
            PendingFilter::HttpStatus(status) => {
                let mut stmt = conn.prepare(
                    "SELECT DISTINCT depth FROM expression \
                     WHERE land_id = ?1 AND http_status = ?2 ORDER BY depth",
                )?;
                let rows = stmt.query_map(params![land_id, status], |row| row.get::<_, i64>(0))?;
                for depth in rows {
                    depths.push(depth?);
                }
            }
        }
        Ok(depths)
    }

    /// Candidate ids at one depth, in stable id order. The id snapshot is
    /// taken up front so batch windows do not shift as rows get fetched.
    pub fn pending_ids_at_depth(
        &self,
        land_id: i64,
        filter: &PendingFilter,
        depth: i64,
    ) -> Result<Vec<i64>, StoreError> {
        let conn = self.lock();
        let mut ids = Vec::new();
        match filter {
            PendingFilter::Unfetched => {
                let mut stmt = conn.prepare(
                    "SELECT id FROM expression \
                     WHERE land_id = ?1 AND fetched_at IS NULL AND depth = ?2 ORDER BY id",
                )?;
                let rows = stmt.query_map(params![land_id, depth], |row| row.get::<_, i64>(0))?;
                for id in rows {
                    ids.push(id?);
                }
            }
            PendingFilter::HttpStatus(status) => {
                let mut stmt = conn.prepare(
                    "SELECT id FROM expression \
                     WHERE land_id = ?1 AND http_status = ?2 AND depth = ?3 ORDER BY id",
                )?;
                let rows =
                    stmt.query_map(params![land_id, status, depth], |row| row.get::<_, i64>(0))?;
                for id in rows {
                    ids.push(id?);
                }
            }
        }
        Ok(ids)
    }

    /// Expressions carrying readable text, for relevance recomputation.
    pub fn expressions_with_readable(&self, land_id: i64) -> Result<Vec<Expression>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {EXPRESSION_COLUMNS} FROM expression \
             WHERE land_id = ?1 AND readable IS NOT NULL ORDER BY id"
        ))?;
        let rows = stmt.query_map([land_id], expression_from_row)?;
        let mut expressions = Vec::new();
        for expression in rows {
            expressions.push(expression?);
        }
        Ok(expressions)
    }

    /// Approved expressions for the readable-reprocess pipeline: the
    /// never-processed ones first, then by depth.
    pub fn approved_for_readable(
        &self,
        land_id: i64,
        depth: Option<i64>,
        limit: usize,
    ) -> Result<Vec<Expression>, StoreError> {
        let conn = self.lock();
        let mut expressions = Vec::new();
        match depth {
            Some(depth) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {EXPRESSION_COLUMNS} FROM expression \
                     WHERE land_id = ?1 AND approved_at IS NOT NULL AND depth = ?2 \
                     ORDER BY (readable_at IS NOT NULL), depth, id"
                ))?;
                let rows = stmt.query_map(params![land_id, depth], expression_from_row)?;
                for expression in rows {
                    expressions.push(expression?);
                }
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {EXPRESSION_COLUMNS} FROM expression \
                     WHERE land_id = ?1 AND approved_at IS NOT NULL \
                     ORDER BY (readable_at IS NOT NULL), depth, id"
                ))?;
                let rows = stmt.query_map([land_id], expression_from_row)?;
                for expression in rows {
                    expressions.push(expression?);
                }
            }
        }
        if limit > 0 {
            expressions.truncate(limit);
        }
        Ok(expressions)
    }

    /// Already-fetched expressions for consolidation.
    pub fn fetched_for_consolidation(
        &self,
        land_id: i64,
        depth: Option<i64>,
        limit: usize,
    ) -> Result<Vec<Expression>, StoreError> {
        let conn = self.lock();
        let mut expressions = Vec::new();
        match depth {
            Some(depth) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {EXPRESSION_COLUMNS} FROM expression \
                     WHERE land_id = ?1 AND fetched_at IS NOT NULL AND depth = ?2 \
                     ORDER BY depth, id"
                ))?;
                let rows = stmt.query_map(params![land_id, depth], expression_from_row)?;
                for expression in rows {
                    expressions.push(expression?);
                }
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {EXPRESSION_COLUMNS} FROM expression \
                     WHERE land_id = ?1 AND fetched_at IS NOT NULL ORDER BY depth, id"
                ))?;
                let rows = stmt.query_map([land_id], expression_from_row)?;
                for expression in rows {
                    expressions.push(expression?);
                }
            }
        }
        if limit > 0 {
            expressions.truncate(limit);
        }
        Ok(expressions)
    }

    /// Selective delete used by `land delete --maxrel`: fetched expressions
    /// scoring under the threshold.
    pub fn delete_expressions_below_relevance(
        &self,
        land_id: i64,
        maxrel: i64,
    ) -> Result<usize, StoreError> {
        let conn = self.lock();
        let deleted = conn.execute(
            "DELETE FROM expression \
             WHERE land_id = ?1 AND fetched_at IS NOT NULL \
               AND COALESCE(relevance, 0) < ?2",
            params![land_id, maxrel],
        )?;
        Ok(deleted)
    }

    /// Expressions of a land filtered for the media-analysis pass.
    pub fn expressions_for_media_analysis(
        &self,
        land_id: i64,
        max_depth: Option<i64>,
        min_relevance: Option<i64>,
    ) -> Result<Vec<Expression>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {EXPRESSION_COLUMNS} FROM expression \
             WHERE land_id = ?1 \
               AND (?2 IS NULL OR depth <= ?2) \
               AND (?3 IS NULL OR COALESCE(relevance, 0) >= ?3) \
             ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![land_id, max_depth, min_relevance], expression_from_row)?;
        let mut expressions = Vec::new();
        for expression in rows {
            expressions.push(expression?);
        }
        Ok(expressions)
    }

    /// `(id, url, domain_id)` triplets for the heuristics update.
    pub fn expression_domain_pairs(&self) -> Result<Vec<(i64, String, i64)>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT id, url, domain_id FROM expression ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?;
        let mut pairs = Vec::new();
        for pair in rows {
            pairs.push(pair?);
        }
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(store: &Store) -> (i64, i64) {
        let land = store.create_land("l", "", &[]).expect("land");
        let domain = store.get_or_create_domain("a.test").expect("domain");
        (land.id, domain.id)
    }

    #[test]
    fn upsert_is_unique_per_land_and_url() {
        let store = Store::open_in_memory().expect("open");
        let (land_id, domain_id) = seeded(&store);
        let first = store
            .get_or_create_expression(land_id, domain_id, "https://a.test/x", 0)
            .expect("create");
        let second = store
            .get_or_create_expression(land_id, domain_id, "https://a.test/x", 1)
            .expect("get");
        assert_eq!(first.id, second.id);
        // Depth of the existing row is untouched by the losing upsert.
        assert_eq!(second.depth, 0);
    }

    #[test]
    fn pending_selection_orders_depths() {
        let store = Store::open_in_memory().expect("open");
        let (land_id, domain_id) = seeded(&store);
        for (url, depth) in [("https://a.test/2", 2), ("https://a.test/0", 0)] {
            store
                .get_or_create_expression(land_id, domain_id, url, depth)
                .expect("create");
        }
        let depths = store
            .pending_depths(land_id, &PendingFilter::Unfetched)
            .expect("depths");
        assert_eq!(depths, vec![0, 2]);
        let ids = store
            .pending_ids_at_depth(land_id, &PendingFilter::Unfetched, 2)
            .expect("ids");
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn concurrent_upserts_yield_one_row() {
        use std::sync::Arc;

        let store = Arc::new(Store::open_in_memory().expect("open"));
        let land = store.create_land("l", "", &[]).expect("land");
        let domain = store.get_or_create_domain("a.test").expect("domain");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let (land_id, domain_id) = (land.id, domain.id);
                std::thread::spawn(move || {
                    store
                        .get_or_create_expression(land_id, domain_id, "https://a.test/race", 0)
                        .map(|expression| expression.id)
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.join().expect("thread").expect("upsert"));
        }
        ids.dedup();
        assert_eq!(ids.len(), 1, "all upserts must resolve to the same row");
    }

    #[test]
    fn save_round_trips_timestamps() {
        let store = Store::open_in_memory().expect("open");
        let (land_id, domain_id) = seeded(&store);
        let mut expression = store
            .get_or_create_expression(land_id, domain_id, "https://a.test/", 0)
            .expect("create");
        expression.http_status = Some("200".into());
        expression.fetched_at = Some(Utc::now());
        expression.relevance = Some(5);
        expression.approved_at = Some(Utc::now());
        expression.readable = Some("text".into());
        store.save_expression(&expression).expect("save");

        let loaded = store.expression_by_id(expression.id).expect("load");
        assert_eq!(loaded.http_status.as_deref(), Some("200"));
        assert!(loaded.fetched_at.is_some());
        assert!(loaded.is_approved());
    }

    #[test]
    fn relevance_threshold_delete_spares_pending() {
        let store = Store::open_in_memory().expect("open");
        let (land_id, domain_id) = seeded(&store);
        let mut fetched = store
            .get_or_create_expression(land_id, domain_id, "https://a.test/low", 0)
            .expect("create");
        fetched.fetched_at = Some(Utc::now());
        fetched.relevance = Some(1);
        store.save_expression(&fetched).expect("save");
        store
            .get_or_create_expression(land_id, domain_id, "https://a.test/pending", 0)
            .expect("create");

        let deleted = store
            .delete_expressions_below_relevance(land_id, 5)
            .expect("delete");
        assert_eq!(deleted, 1);
        assert!(store
            .expression_by_url(land_id, "https://a.test/pending")
            .expect("query")
            .is_some());
    }
}
