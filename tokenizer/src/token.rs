use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Lexical class of a token.
///
/// `Keyword` is a tag, not an exclusion: keywords stay in the token stream
/// so positions remain complete, but rarity scoring skips them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Identifier,
    Literal,
    CommentWord,
    Keyword,
}

impl TokenKind {
    /// Merge two kind observations for the same token text.
    ///
    /// The index keys tokens by text alone, so the same text can be observed
    /// with different kinds across files (`type` is a keyword in TypeScript
    /// and a plain identifier in Python). The merged kind must not depend on
    /// processing order: `Keyword` dominates, then `Identifier`, `Literal`,
    /// `CommentWord`.
    pub fn merge(self, other: TokenKind) -> TokenKind {
        if self.rank() >= other.rank() { self } else { other }
    }

    fn rank(self) -> u8 {
        match self {
            TokenKind::Keyword => 3,
            TokenKind::Identifier => 2,
            TokenKind::Literal => 1,
            TokenKind::CommentWord => 0,
        }
    }
}

/// A single token. Equality and hashing are by exact text; the kind rides
/// along as a tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
}

impl Token {
    pub fn new(text: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

/// A token at its position in the source file. Lines are 1-based, columns
/// 0-based in characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenOccurrence {
    pub token: Token,
    pub line: u32,
    pub column: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn equality_ignores_kind() {
        let a = Token::new("value", TokenKind::Identifier);
        let b = Token::new("value", TokenKind::CommentWord);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn kind_merge_is_commutative() {
        let kinds = [
            TokenKind::Identifier,
            TokenKind::Literal,
            TokenKind::CommentWord,
            TokenKind::Keyword,
        ];
        for a in kinds {
            for b in kinds {
                assert_eq!(a.merge(b), b.merge(a));
            }
        }
    }

    #[test]
    fn keyword_dominates_merge() {
        assert_eq!(
            TokenKind::CommentWord.merge(TokenKind::Keyword),
            TokenKind::Keyword
        );
        assert_eq!(
            TokenKind::Literal.merge(TokenKind::Identifier),
            TokenKind::Identifier
        );
    }
}
