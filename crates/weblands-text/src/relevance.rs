//! Weighted whole-lemma relevance scoring and the language gate.

use regex::Regex;
use tracing::debug;

use crate::lemmatizer::Lemmatizer;

/// Weight of a lemma occurrence in the normalized title.
pub const TITLE_WEIGHT: i64 = 10;

/// Compiled whole-word matchers for one land dictionary.
pub struct DictionaryMatcher {
    patterns: Vec<Regex>,
}

impl DictionaryMatcher {
    /// Compiles a `\b<lemma>\b` matcher per lemma. A lemma that fails to
    /// compile (or is empty) is skipped; it can only ever contribute zero.
    pub fn new<I, S>(lemmas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = lemmas
            .into_iter()
            .filter_map(|lemma| {
                let lemma = lemma.as_ref().trim();
                if lemma.is_empty() {
                    return None;
                }
                match Regex::new(&format!(r"\b{}\b", regex::escape(lemma))) {
                    Ok(pattern) => Some(pattern),
                    Err(err) => {
                        debug!(lemma, error = %err, "skipping uncompilable lemma");
                        None
                    }
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Sum of weighted whole-lemma occurrences over the normalized title
    /// and body. Never fails; missing fields contribute zero.
    pub fn score(
        &self,
        lemmatizer: &Lemmatizer,
        title: Option<&str>,
        readable: Option<&str>,
    ) -> i64 {
        if self.patterns.is_empty() {
            return 0;
        }
        let title = title.map(|text| lemmatizer.normalize(text));
        let body = readable.map(|text| lemmatizer.normalize(text));

        self.patterns
            .iter()
            .map(|pattern| {
                let in_title = title
                    .as_deref()
                    .map(|text| pattern.find_iter(text).count() as i64)
                    .unwrap_or(0);
                let in_body = body
                    .as_deref()
                    .map(|text| pattern.find_iter(text).count() as i64)
                    .unwrap_or(0);
                TITLE_WEIGHT * in_title + in_body
            })
            .sum()
    }
}

/// Language gate: a page declaring a language outside the land's configured
/// list scores zero. An absent or empty declaration passes.
pub fn passes_language_gate(page_lang: Option<&str>, land_langs: &[String]) -> bool {
    let Some(page_lang) = page_lang.map(str::trim).filter(|lang| !lang.is_empty()) else {
        return true;
    };
    if land_langs.is_empty() {
        return true;
    }
    // Compare on the primary subtag so "fr-FR" matches a land set to "fr".
    let primary = page_lang
        .split('-')
        .next()
        .unwrap_or(page_lang)
        .to_ascii_lowercase();
    land_langs
        .iter()
        .any(|lang| lang.trim().eq_ignore_ascii_case(&primary))
}
