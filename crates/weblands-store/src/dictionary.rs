//! Global lexicon and per-land dictionary membership.

use rusqlite::{params, OptionalExtension};
use weblands_types::Word;

use crate::error::StoreError;
use crate::store::Store;

impl Store {
    /// Inserts the `(term, lemma)` pair and its land membership in one
    /// transaction. Idempotent per `(land, term)`: re-adding the same term
    /// does not duplicate memberships.
    pub fn add_dictionary_term(
        &self,
        land_id: i64,
        term: &str,
        lemma: &str,
    ) -> Result<Word, StoreError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO word (term, lemma) VALUES (?1, ?2)",
            params![term, lemma],
        )?;
        let word = tx
            .query_row(
                "SELECT id, term, lemma FROM word WHERE term = ?1 AND lemma = ?2",
                params![term, lemma],
                |row| {
                    Ok(Word {
                        id: row.get(0)?,
                        term: row.get(1)?,
                        lemma: row.get(2)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found("word", term))?;
        tx.execute(
            "INSERT OR IGNORE INTO land_dictionary (land_id, word_id) VALUES (?1, ?2)",
            params![land_id, word.id],
        )?;
        tx.commit()?;
        Ok(word)
    }

    /// Lemmas of a land's dictionary, term-ordered.
    pub fn land_lemmas(&self, land_id: i64) -> Result<Vec<String>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT w.lemma FROM word w
             JOIN land_dictionary ld ON ld.word_id = w.id
             WHERE ld.land_id = ?1 ORDER BY w.term",
        )?;
        let rows = stmt.query_map([land_id], |row| row.get::<_, String>(0))?;
        let mut lemmas = Vec::new();
        for lemma in rows {
            lemmas.push(lemma?);
        }
        Ok(lemmas)
    }

    /// Terms of a land's dictionary, term-ordered.
    pub fn land_terms(&self, land_id: i64) -> Result<Vec<String>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT w.term FROM word w
             JOIN land_dictionary ld ON ld.word_id = w.id
             WHERE ld.land_id = ?1 ORDER BY w.term",
        )?;
        let rows = stmt.query_map([land_id], |row| row.get::<_, String>(0))?;
        let mut terms = Vec::new();
        for term in rows {
            terms.push(term?);
        }
        Ok(terms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dictionary_insert_is_idempotent() {
        let store = Store::open_in_memory().expect("open");
        let land = store.create_land("l", "", &[]).expect("land");
        let first = store
            .add_dictionary_term(land.id, "chats", "chat")
            .expect("add");
        let second = store
            .add_dictionary_term(land.id, "chats", "chat")
            .expect("re-add");
        assert_eq!(first.id, second.id);
        assert_eq!(store.land_lemmas(land.id).expect("lemmas"), vec!["chat"]);
        assert_eq!(store.land_terms(land.id).expect("terms"), vec!["chats"]);
    }

    #[test]
    fn words_are_shared_across_lands() {
        let store = Store::open_in_memory().expect("open");
        let first = store.create_land("a", "", &[]).expect("land");
        let second = store.create_land("b", "", &[]).expect("land");
        let word_a = store
            .add_dictionary_term(first.id, "climat", "climat")
            .expect("add");
        let word_b = store
            .add_dictionary_term(second.id, "climat", "climat")
            .expect("add");
        assert_eq!(word_a.id, word_b.id);
    }
}
