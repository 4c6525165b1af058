//! Land CRUD and the listing summary.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use weblands_types::Land;

use crate::error::StoreError;
use crate::store::{from_column, to_column, Store};

/// Listing row: per-land counts and the HTTP-status histogram.
#[derive(Debug, Clone)]
pub struct LandSummary {
    pub land: Land,
    pub terms: Vec<String>,
    pub expression_count: i64,
    pub remaining_to_crawl: i64,
    /// `(http_status, count)` over fetched expressions, status-ordered.
    pub http_statuses: Vec<(String, i64)>,
}

fn land_from_row(row: &Row<'_>) -> rusqlite::Result<Land> {
    Ok(Land {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        lang: Land::parse_lang(&row.get::<_, String>(3)?),
        created_at: from_column(row.get(4)?).unwrap_or_else(Utc::now),
    })
}

const LAND_COLUMNS: &str = "id, name, description, lang, created_at";

impl Store {
    pub fn create_land(
        &self,
        name: &str,
        description: &str,
        langs: &[String],
    ) -> Result<Land, StoreError> {
        let conn = self.lock();
        let lang = if langs.is_empty() {
            "fr".to_string()
        } else {
            langs.join(",")
        };
        conn.execute(
            "INSERT INTO land (name, description, lang, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![name, description, lang, to_column(Utc::now())],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);
        self.land_by_id(id)
    }

    pub fn land_by_id(&self, id: i64) -> Result<Land, StoreError> {
        let conn = self.lock();
        conn.query_row(
            &format!("SELECT {LAND_COLUMNS} FROM land WHERE id = ?1"),
            [id],
            land_from_row,
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found("land", id.to_string()))
    }

    pub fn land_by_name(&self, name: &str) -> Result<Option<Land>, StoreError> {
        let conn = self.lock();
        Ok(conn
            .query_row(
                &format!("SELECT {LAND_COLUMNS} FROM land WHERE name = ?1"),
                [name],
                land_from_row,
            )
            .optional()?)
    }

    /// Cascade-deletes a land with everything it owns.
    pub fn delete_land(&self, land_id: i64) -> Result<(), StoreError> {
        let conn = self.lock();
        conn.execute("DELETE FROM land WHERE id = ?1", [land_id])?;
        Ok(())
    }

    /// Summaries for the `land list` command, name-ordered.
    pub fn list_lands(&self, name: Option<&str>) -> Result<Vec<LandSummary>, StoreError> {
        let lands: Vec<Land> = {
            let conn = self.lock();
            let mut rows = Vec::new();
            match name {
                Some(name) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {LAND_COLUMNS} FROM land WHERE name = ?1 ORDER BY name"
                    ))?;
                    let found = stmt.query_map([name], land_from_row)?;
                    for land in found {
                        rows.push(land?);
                    }
                }
                None => {
                    let mut stmt = conn
                        .prepare(&format!("SELECT {LAND_COLUMNS} FROM land ORDER BY name"))?;
                    let found = stmt.query_map([], land_from_row)?;
                    for land in found {
                        rows.push(land?);
                    }
                }
            }
            rows
        };

        let mut summaries = Vec::with_capacity(lands.len());
        for land in lands {
            let conn = self.lock();
            let terms = {
                let mut stmt = conn.prepare(
                    "SELECT w.term FROM word w
                     JOIN land_dictionary ld ON ld.word_id = w.id
                     WHERE ld.land_id = ?1 ORDER BY w.term",
                )?;
                let rows = stmt.query_map([land.id], |row| row.get::<_, String>(0))?;
                rows.collect::<Result<Vec<_>, _>>()?
            };
            let expression_count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM expression WHERE land_id = ?1",
                [land.id],
                |row| row.get(0),
            )?;
            let remaining_to_crawl: i64 = conn.query_row(
                "SELECT COUNT(*) FROM expression WHERE land_id = ?1 AND fetched_at IS NULL",
                [land.id],
                |row| row.get(0),
            )?;
            let http_statuses = {
                let mut stmt = conn.prepare(
                    "SELECT http_status, COUNT(*) FROM expression
                     WHERE land_id = ?1 AND fetched_at IS NOT NULL
                     GROUP BY http_status ORDER BY http_status",
                )?;
                let rows = stmt.query_map([land.id], |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                        row.get::<_, i64>(1)?,
                    ))
                })?;
                rows.collect::<Result<Vec<_>, _>>()?
            };
            drop(conn);
            summaries.push(LandSummary {
                land,
                terms,
                expression_count,
                remaining_to_crawl,
                http_statuses,
            });
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_fetch_land() {
        let store = Store::open_in_memory().expect("open");
        let land = store
            .create_land("asthma", "respiratory research", &["fr".into(), "en".into()])
            .expect("create");
        assert_eq!(land.lang, vec!["fr", "en"]);
        let found = store.land_by_name("asthma").expect("query").expect("some");
        assert_eq!(found.id, land.id);
        assert!(store.land_by_name("missing").expect("query").is_none());
    }

    #[test]
    fn duplicate_land_name_is_rejected() {
        let store = Store::open_in_memory().expect("open");
        store.create_land("dup", "", &[]).expect("first");
        let err = store.create_land("dup", "", &[]).expect_err("second");
        assert!(err.is_integrity_conflict());
    }

    #[test]
    fn empty_listing() {
        let store = Store::open_in_memory().expect("open");
        assert!(store.list_lands(None).expect("list").is_empty());
    }
}
