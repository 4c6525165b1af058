//! Lemmatization and relevance scoring.
//!
//! Terms and page text are reduced to lemmas with a French Snowball
//! stemmer; relevance is the weighted count of whole-lemma matches in the
//! normalized title (weight 10) and readable body (weight 1). Scoring is
//! infallible: any internal failure contributes zero.

mod lemmatizer;
mod relevance;

pub use lemmatizer::Lemmatizer;
pub use relevance::{passes_language_gate, DictionaryMatcher, TITLE_WEIGHT};
