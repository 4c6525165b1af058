//! Domain rows: creation on first reference, metadata pass updates.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use weblands_types::Domain;

use crate::error::StoreError;
use crate::store::{from_column, to_column, Store};

const DOMAIN_COLUMNS: &str =
    "id, name, http_status, title, description, keywords, created_at, fetched_at";

fn domain_from_row(row: &Row<'_>) -> rusqlite::Result<Domain> {
    Ok(Domain {
        id: row.get(0)?,
        name: row.get(1)?,
        http_status: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        keywords: row.get(5)?,
        created_at: from_column(row.get(6)?).unwrap_or_else(Utc::now),
        fetched_at: from_column(row.get(7)?),
    })
}

impl Store {
    /// Fetches the domain row for a canonical name, creating it on first
    /// reference. Insert races resolve to the winner's row.
    pub fn get_or_create_domain(&self, name: &str) -> Result<Domain, StoreError> {
        let conn = self.lock();
        conn.execute(
            "INSERT OR IGNORE INTO domain (name, created_at) VALUES (?1, ?2)",
            params![name, to_column(Utc::now())],
        )?;
        conn.query_row(
            &format!("SELECT {DOMAIN_COLUMNS} FROM domain WHERE name = ?1"),
            [name],
            domain_from_row,
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found("domain", name))
    }

    pub fn domain_by_id(&self, id: i64) -> Result<Domain, StoreError> {
        let conn = self.lock();
        conn.query_row(
            &format!("SELECT {DOMAIN_COLUMNS} FROM domain WHERE id = ?1"),
            [id],
            domain_from_row,
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found("domain", id.to_string()))
    }

    /// Domains selected by the metadata crawl pass: unfetched ones, or
    /// those recorded with a given status when refetching.
    pub fn domains_to_crawl(
        &self,
        limit: usize,
        http_status: Option<&str>,
    ) -> Result<Vec<Domain>, StoreError> {
        let conn = self.lock();
        let mut domains = Vec::new();
        match http_status {
            Some(status) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {DOMAIN_COLUMNS} FROM domain WHERE http_status = ?1 ORDER BY id"
                ))?;
                let rows = stmt.query_map([status], domain_from_row)?;
                for domain in rows {
                    domains.push(domain?);
                }
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {DOMAIN_COLUMNS} FROM domain WHERE fetched_at IS NULL ORDER BY id"
                ))?;
                let rows = stmt.query_map([], domain_from_row)?;
                for domain in rows {
                    domains.push(domain?);
                }
            }
        }
        if limit > 0 {
            domains.truncate(limit);
        }
        Ok(domains)
    }

    /// Persists the result of one domain fetch attempt. `fetched_at` is
    /// always written, metadata only when the fetch produced it.
    pub fn save_domain_fetch(
        &self,
        domain_id: i64,
        http_status: Option<&str>,
        title: Option<&str>,
        description: Option<&str>,
        keywords: Option<&str>,
        fetched_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let conn = self.lock();
        conn.execute(
            "UPDATE domain SET http_status = ?1,
                 title = COALESCE(?2, title),
                 description = COALESCE(?3, description),
                 keywords = COALESCE(?4, keywords),
                 fetched_at = ?5
             WHERE id = ?6",
            params![
                http_status,
                title,
                description,
                keywords,
                to_column(fetched_at),
                domain_id
            ],
        )?;
        Ok(())
    }

    /// Reattaches an expression to another domain (heuristics update).
    pub fn reassign_expression_domain(
        &self,
        expression_id: i64,
        domain_id: i64,
    ) -> Result<(), StoreError> {
        let conn = self.lock();
        conn.execute(
            "UPDATE expression SET domain_id = ?1 WHERE id = ?2",
            params![domain_id, expression_id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_is_idempotent() {
        let store = Store::open_in_memory().expect("open");
        let first = store.get_or_create_domain("example.test").expect("create");
        let second = store.get_or_create_domain("example.test").expect("get");
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn domain_crawl_selection_and_save() {
        let store = Store::open_in_memory().expect("open");
        let domain = store.get_or_create_domain("a.test").expect("create");
        assert_eq!(store.domains_to_crawl(0, None).expect("select").len(), 1);

        store
            .save_domain_fetch(domain.id, Some("200"), Some("A"), None, None, Utc::now())
            .expect("save");
        assert!(store.domains_to_crawl(0, None).expect("select").is_empty());
        assert_eq!(
            store
                .domains_to_crawl(0, Some("200"))
                .expect("select")
                .len(),
            1
        );
    }
}
