use std::path::Path;

/// Languages the tokenizer has comment-delimiter and keyword tables for.
///
/// A closed set: each variant maps to a static delimiter configuration, and
/// `Unknown` is the generic fallback that treats all delimiters uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Go,
    Java,
    C,
    Cpp,
    Ruby,
    Shell,
    Unknown,
}

impl Language {
    /// Detect language from file extension
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Detect language from file extension string
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "rs" => Language::Rust,
            "py" | "pyw" | "pyi" => Language::Python,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "tsx" | "mts" | "cts" => Language::TypeScript,
            "go" => Language::Go,
            "java" => Language::Java,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hxx" | "hh" => Language::Cpp,
            "rb" => Language::Ruby,
            "sh" | "bash" => Language::Shell,
            _ => Language::Unknown,
        }
    }

    /// Get the language name as string
    pub fn name(self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Ruby => "ruby",
            Language::Shell => "shell",
            Language::Unknown => "unknown",
        }
    }

    /// Line comment opener, if the language has one.
    pub fn line_comment(self) -> Option<&'static str> {
        match self {
            Language::Rust
            | Language::JavaScript
            | Language::TypeScript
            | Language::Go
            | Language::Java
            | Language::C
            | Language::Cpp => Some("//"),
            Language::Python | Language::Ruby | Language::Shell => Some("#"),
            Language::Unknown => None,
        }
    }

    /// Block comment delimiter pair, if the language has one.
    pub fn block_comment(self) -> Option<(&'static str, &'static str)> {
        match self {
            Language::Rust
            | Language::JavaScript
            | Language::TypeScript
            | Language::Go
            | Language::Java
            | Language::C
            | Language::Cpp => Some(("/*", "*/")),
            Language::Python | Language::Ruby | Language::Shell | Language::Unknown => None,
        }
    }

    /// String delimiters recognized in this language. Rust omits `'`
    /// (lifetimes); Go and the C family omit char-literal quotes.
    pub fn string_quotes(self) -> &'static [char] {
        match self {
            Language::Rust | Language::Java | Language::C | Language::Cpp => &['"'],
            Language::Go => &['"', '`'],
            Language::JavaScript | Language::TypeScript => &['"', '\'', '`'],
            Language::Python | Language::Ruby | Language::Shell => &['"', '\''],
            Language::Unknown => &[],
        }
    }

    /// Reserved words tagged `Keyword` instead of `Identifier`.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Language::Rust => &[
                "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else",
                "enum", "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match",
                "mod", "move", "mut", "pub", "ref", "return", "self", "static", "struct", "super",
                "trait", "true", "type", "unsafe", "use", "where", "while",
            ],
            Language::Python => &[
                "and", "as", "assert", "async", "await", "break", "class", "continue", "def",
                "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
                "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
                "try", "while", "with", "yield", "False", "None", "True",
            ],
            Language::JavaScript | Language::TypeScript => &[
                "async", "await", "break", "case", "catch", "class", "const", "continue",
                "default", "delete", "do", "else", "export", "extends", "false", "finally", "for",
                "function", "if", "import", "in", "instanceof", "interface", "let", "new", "null",
                "of", "return", "static", "super", "switch", "this", "throw", "true", "try",
                "type", "typeof", "undefined", "var", "void", "while", "yield",
            ],
            Language::Go => &[
                "break", "case", "chan", "const", "continue", "default", "defer", "else",
                "fallthrough", "for", "func", "go", "goto", "if", "import", "interface", "map",
                "package", "range", "return", "select", "struct", "switch", "type", "var",
            ],
            Language::Java => &[
                "abstract", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
                "continue", "default", "do", "double", "else", "enum", "extends", "false", "final",
                "finally", "float", "for", "if", "implements", "import", "instanceof", "int",
                "interface", "long", "native", "new", "null", "package", "private", "protected",
                "public", "return", "short", "static", "super", "switch", "this", "throw",
                "throws", "true", "try", "void", "volatile", "while",
            ],
            Language::C => &[
                "auto", "break", "case", "char", "const", "continue", "default", "do", "double",
                "else", "enum", "extern", "float", "for", "goto", "if", "int", "long", "register",
                "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
                "union", "unsigned", "void", "volatile", "while",
            ],
            Language::Cpp => &[
                "auto", "bool", "break", "case", "catch", "char", "class", "const", "constexpr",
                "continue", "default", "delete", "do", "double", "else", "enum", "explicit",
                "extern", "false", "float", "for", "friend", "goto", "if", "inline", "int", "long",
                "namespace", "new", "nullptr", "operator", "private", "protected", "public",
                "return", "short", "signed", "sizeof", "static", "struct", "switch", "template",
                "this", "throw", "true", "try", "typedef", "typename", "union", "unsigned",
                "using", "virtual", "void", "volatile", "while",
            ],
            Language::Ruby => &[
                "alias", "and", "begin", "break", "case", "class", "def", "do", "else", "elsif",
                "end", "ensure", "false", "for", "if", "in", "module", "next", "nil", "not", "or",
                "raise", "redo", "rescue", "retry", "return", "self", "super", "then", "true",
                "unless", "until", "when", "while", "yield",
            ],
            Language::Shell => &[
                "case", "do", "done", "elif", "else", "esac", "fi", "for", "function", "if", "in",
                "then", "until", "while",
            ],
            Language::Unknown => &[],
        }
    }

    pub fn is_keyword(self, word: &str) -> bool {
        self.keywords().contains(&word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn detects_from_extension() {
        assert_eq!(Language::from_extension("rs"), Language::Rust);
        assert_eq!(Language::from_extension("py"), Language::Python);
        assert_eq!(Language::from_extension("tsx"), Language::TypeScript);
        assert_eq!(Language::from_extension("hh"), Language::Cpp);
        assert_eq!(Language::from_extension("dat"), Language::Unknown);
    }

    #[test]
    fn detects_from_path() {
        assert_eq!(Language::from_path(Path::new("src/main.rs")), Language::Rust);
        assert_eq!(Language::from_path(Path::new("Makefile")), Language::Unknown);
    }

    #[test]
    fn unknown_has_no_delimiters() {
        assert_eq!(Language::Unknown.line_comment(), None);
        assert_eq!(Language::Unknown.block_comment(), None);
        assert!(Language::Unknown.string_quotes().is_empty());
        assert!(Language::Unknown.keywords().is_empty());
    }

    #[test]
    fn keyword_lookup() {
        assert!(Language::Rust.is_keyword("fn"));
        assert!(!Language::Rust.is_keyword("frobnicate"));
        assert!(Language::Python.is_keyword("def"));
        assert!(!Language::Unknown.is_keyword("fn"));
    }
}
