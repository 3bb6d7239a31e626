//! Dictionary-driven pronunciation substitution.
//!
//! Technical terms get replaced with phonetic spellings before synthesis.
//! Matching is word-bounded and case-insensitive; one pattern is compiled
//! per term at load time.

use std::collections::BTreeMap;

use regex::{NoExpand, Regex};

use crate::error::{EnhanceError, Result};

/// A compiled pronunciation dictionary.
pub struct PronunciationDict {
    rules: Vec<(Regex, String)>,
    guides: BTreeMap<String, String>,
}

impl PronunciationDict {
    /// Build an empty dictionary.
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            guides: BTreeMap::new(),
        }
    }

    /// Compile a dictionary from term -> pronunciation pairs.
    pub fn from_terms(terms: BTreeMap<String, String>) -> Result<Self> {
        let mut rules = Vec::new();
        for (term, pronunciation) in &terms {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(term));
            let regex = Regex::new(&pattern).map_err(|e| EnhanceError::Pronunciation {
                term: term.clone(),
                source: e,
            })?;
            rules.push((regex, pronunciation.clone()));
        }

        Ok(Self {
            rules,
            guides: terms,
        })
    }

    /// Apply every substitution to the text.
    pub fn apply(&self, text: &str) -> String {
        let mut result = text.to_string();
        for (pattern, pronunciation) in &self.rules {
            result = pattern
                .replace_all(&result, NoExpand(pronunciation))
                .into_owned();
        }
        result
    }

    /// The term -> pronunciation map, for diagnostics.
    pub fn guides(&self) -> &BTreeMap<String, String> {
        &self.guides
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(pairs: &[(&str, &str)]) -> PronunciationDict {
        let terms = pairs
            .iter()
            .map(|(t, p)| (t.to_string(), p.to_string()))
            .collect();
        PronunciationDict::from_terms(terms).unwrap()
    }

    #[test]
    fn test_case_insensitive_substitution() {
        let d = dict(&[("naive", "nah-EVE")]);
        assert_eq!(d.apply("A Naive approach"), "A nah-EVE approach");
    }

    #[test]
    fn test_word_boundaries_respected() {
        let d = dict(&[("qubit", "cue-bit")]);
        assert_eq!(d.apply("qubits and qubit"), "qubits and cue-bit");
    }

    #[test]
    fn test_replacement_with_dollar_is_literal() {
        let d = dict(&[("cost", "co$t")]);
        assert_eq!(d.apply("the cost rises"), "the co$t rises");
    }

    #[test]
    fn test_empty_dict_is_identity() {
        let d = PronunciationDict::empty();
        assert!(d.is_empty());
        assert_eq!(d.apply("unchanged"), "unchanged");
    }

    #[test]
    fn test_guides_exposed() {
        let d = dict(&[("Lagrangian", "luh-GRAHN-jee-un")]);
        assert_eq!(d.len(), 1);
        assert_eq!(
            d.guides().get("Lagrangian").map(String::as_str),
            Some("luh-GRAHN-jee-un")
        );
    }
}
