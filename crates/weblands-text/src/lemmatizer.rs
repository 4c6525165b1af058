//! French Snowball stemming behind a small immutable handle.

use rust_stemmers::{Algorithm, Stemmer};
use unicode_segmentation::UnicodeSegmentation;

/// Stemmer handle, constructed once per process and shared read-only.
pub struct Lemmatizer {
    stemmer: Stemmer,
}

impl Lemmatizer {
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::French),
        }
    }

    /// Stems one lowercased token.
    pub fn stem(&self, word: &str) -> String {
        self.stemmer.stem(&word.to_lowercase()).into_owned()
    }

    /// Reduces a dictionary term to its lemma: whitespace-split tokens are
    /// stemmed and rejoined with single spaces, so multi-word terms keep
    /// their shape.
    pub fn lemmatize(&self, term: &str) -> String {
        term.split_whitespace()
            .map(|token| self.stem(token))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Normalizes free text for matching: Unicode-aware tokenization, each
    /// token stemmed, joined with single spaces.
    pub fn normalize(&self, text: &str) -> String {
        text.unicode_words()
            .map(|token| self.stem(token))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems_french_inflections_together() {
        let lemmatizer = Lemmatizer::new();
        assert_eq!(lemmatizer.stem("Chats"), lemmatizer.stem("chat"));
        assert_eq!(lemmatizer.stem("marchée"), lemmatizer.stem("marcher"));
    }

    #[test]
    fn multi_word_terms_keep_shape() {
        let lemmatizer = Lemmatizer::new();
        let lemma = lemmatizer.lemmatize("énergies renouvelables");
        assert_eq!(lemma.split(' ').count(), 2);
    }

    #[test]
    fn normalize_drops_punctuation() {
        let lemmatizer = Lemmatizer::new();
        let normalized = lemmatizer.normalize("Les chats, les chiens !");
        assert!(!normalized.contains(','));
        assert!(!normalized.contains('!'));
    }
}
