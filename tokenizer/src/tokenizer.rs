use crate::language::Language;
use crate::token::{Token, TokenKind, TokenOccurrence};
use std::path::Path;

/// Comment words shorter than this are dropped as noise.
const MIN_COMMENT_WORD_LEN: usize = 2;

/// Scanner mode, tracked per character. Only `BlockComment` survives a line
/// boundary; strings are treated as single-line on a best-effort basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Code,
    Str(char),
    LineComment,
    BlockComment,
}

/// Splits file content into positioned, kind-tagged tokens.
///
/// The scanner walks each line character by character, switching between
/// code, string, and comment modes using the language's delimiter table.
/// For `Language::Unknown` the table is empty, which degrades the scanner
/// into the generic splitter: every delimiter is treated uniformly and no
/// keyword tagging happens.
pub struct Tokenizer {
    language: Language,
}

impl Tokenizer {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    /// Tokenizer with the language mode selected by file extension.
    pub fn for_path(path: &Path) -> Self {
        Self::new(Language::from_path(path))
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Tokenize already-decoded content. Never fails; unrecognizable input
    /// simply yields fewer tokens.
    pub fn tokenize(&self, content: &str) -> Vec<TokenOccurrence> {
        let mut out = Vec::new();
        let mut mode = Mode::Code;

        for (line_idx, line) in content.lines().enumerate() {
            let line_no = (line_idx + 1) as u32;
            let chars: Vec<char> = line.chars().collect();
            let mut word = String::new();
            let mut word_start = 0u32;
            let mut i = 0usize;

            while i < chars.len() {
                let ch = chars[i];
                match mode {
                    Mode::Code => {
                        if let Some(open) = self.language.line_comment()
                            && matches_at(&chars, i, open)
                        {
                            self.flush(&mut out, &mut word, word_start, line_no, mode);
                            mode = Mode::LineComment;
                            i += open.chars().count();
                            continue;
                        }
                        if let Some((open, _)) = self.language.block_comment()
                            && matches_at(&chars, i, open)
                        {
                            self.flush(&mut out, &mut word, word_start, line_no, mode);
                            mode = Mode::BlockComment;
                            i += open.chars().count();
                            continue;
                        }
                        if self.language.string_quotes().contains(&ch) {
                            self.flush(&mut out, &mut word, word_start, line_no, mode);
                            mode = Mode::Str(ch);
                            i += 1;
                            continue;
                        }
                        if is_word_char(ch) {
                            if word.is_empty() {
                                word_start = i as u32;
                            }
                            word.push(ch);
                        } else {
                            self.flush(&mut out, &mut word, word_start, line_no, mode);
                        }
                        i += 1;
                    }
                    Mode::Str(quote) => {
                        if ch == '\\' {
                            self.flush(&mut out, &mut word, word_start, line_no, mode);
                            i += 2;
                            continue;
                        }
                        if ch == quote {
                            self.flush(&mut out, &mut word, word_start, line_no, mode);
                            mode = Mode::Code;
                            i += 1;
                            continue;
                        }
                        if is_word_char(ch) {
                            if word.is_empty() {
                                word_start = i as u32;
                            }
                            word.push(ch);
                        } else {
                            self.flush(&mut out, &mut word, word_start, line_no, mode);
                        }
                        i += 1;
                    }
                    Mode::LineComment => {
                        if is_word_char(ch) {
                            if word.is_empty() {
                                word_start = i as u32;
                            }
                            word.push(ch);
                        } else {
                            self.flush(&mut out, &mut word, word_start, line_no, mode);
                        }
                        i += 1;
                    }
                    Mode::BlockComment => {
                        if let Some((_, close)) = self.language.block_comment()
                            && matches_at(&chars, i, close)
                        {
                            self.flush(&mut out, &mut word, word_start, line_no, mode);
                            mode = Mode::Code;
                            i += close.chars().count();
                            continue;
                        }
                        if is_word_char(ch) {
                            if word.is_empty() {
                                word_start = i as u32;
                            }
                            word.push(ch);
                        } else {
                            self.flush(&mut out, &mut word, word_start, line_no, mode);
                        }
                        i += 1;
                    }
                }
            }

            self.flush(&mut out, &mut word, word_start, line_no, mode);
            // Line comments and unterminated strings do not span lines.
            if matches!(mode, Mode::LineComment | Mode::Str(_)) {
                mode = Mode::Code;
            }
        }

        out
    }

    fn flush(
        &self,
        out: &mut Vec<TokenOccurrence>,
        word: &mut String,
        word_start: u32,
        line: u32,
        mode: Mode,
    ) {
        if word.is_empty() {
            return;
        }
        let text = std::mem::take(word);
        let kind = match mode {
            Mode::Code => {
                if text.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                    TokenKind::Literal
                } else if self.language.is_keyword(&text) {
                    TokenKind::Keyword
                } else {
                    TokenKind::Identifier
                }
            }
            Mode::Str(_) => TokenKind::Literal,
            Mode::LineComment | Mode::BlockComment => {
                if text.chars().count() < MIN_COMMENT_WORD_LEN {
                    return;
                }
                TokenKind::CommentWord
            }
        };
        out.push(TokenOccurrence {
            token: Token::new(text, kind),
            line,
            column: word_start,
        });
    }
}

/// Tokenize content with the language mode implied by `path`'s extension.
pub fn tokenize(path: &Path, content: &str) -> Vec<TokenOccurrence> {
    Tokenizer::for_path(path).tokenize(content)
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn matches_at(chars: &[char], at: usize, pattern: &str) -> bool {
    let mut i = at;
    for pc in pattern.chars() {
        if chars.get(i) != Some(&pc) {
            return false;
        }
        i += 1;
    }
    true
}
