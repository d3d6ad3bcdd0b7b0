/*!
# Lexmap Tokenizer

Language-agnostic lexical tokenization for source files.

Splits a file into positioned tokens tagged as identifiers, literals,
comment words, or keywords. A best-effort language mode (selected by file
extension) uses per-language comment delimiters and keyword lists; files
with unrecognized extensions fall back to a generic splitter that treats
all delimiters uniformly.

Tokenization never fails: the tokenizer takes already-decoded text and
produces whatever tokens it can. Decoding and skip handling belong to the
caller.

## Example

```rust
use lexmap_tokenizer::{tokenize, TokenKind};
use std::path::Path;

let tokens = tokenize(Path::new("demo.rs"), "fn frobnicate() {} // helper");
assert!(tokens.iter().any(|t| t.token.text == "frobnicate"));
assert!(tokens.iter().any(|t| t.token.kind == TokenKind::Keyword));
```
*/

mod language;
mod token;
mod tokenizer;

pub use language::Language;
pub use token::{Token, TokenKind, TokenOccurrence};
pub use tokenizer::{Tokenizer, tokenize};
