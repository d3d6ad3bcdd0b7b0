use crate::model::InvertedIndex;
use lexmap_tokenizer::TokenKind;
use std::collections::HashSet;

/// Read-only view of the index: the tokens whose document frequency is
/// strictly below the threshold, keywords excluded.
///
/// A pure function of the index; never mutates it. Cheap to materialize
/// (one pass over the entries), recomputed whenever the index or the
/// threshold changes.
#[derive(Debug, Clone)]
pub struct RareTokenSet {
    threshold: u32,
    tokens: HashSet<String>,
}

impl RareTokenSet {
    pub fn compute(index: &InvertedIndex, threshold: u32) -> Self {
        let tokens = index
            .entries
            .iter()
            .filter(|(_, entry)| {
                entry.kind != TokenKind::Keyword && entry.doc_frequency < threshold
            })
            .map(|(text, _)| text.clone())
            .collect();
        Self { threshold, tokens }
    }

    pub fn contains(&self, token_text: &str) -> bool {
        self.tokens.contains(token_text)
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}
