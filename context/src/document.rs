use lexmap_tokenizer::Language;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A bounded line-range excerpt of a related file, surfaced because it
/// shares rare tokens with the target file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub source_file: String,
    /// 1-based, inclusive.
    pub start_line: u32,
    /// 1-based, inclusive.
    pub end_line: u32,
    pub text: String,
    /// Specificity score of the source file.
    pub score: f64,
}

/// Ordered context for one target file. Constructed fresh per query,
/// immutable once returned, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextDocument {
    pub target_file: String,
    pub snippets: Vec<Snippet>,
}

impl ContextDocument {
    pub fn empty(target_file: impl Into<String>) -> Self {
        Self {
            target_file: target_file.into(),
            snippets: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }

    /// Format the document for injection into a prompt payload.
    pub fn render(&self) -> String {
        if self.snippets.is_empty() {
            return String::new();
        }

        let mut out = format!("# Code related to `{}`\n\n", self.target_file);
        for (i, snippet) in self.snippets.iter().enumerate() {
            out.push_str(&format!(
                "## {}. `{}` (lines {}-{})\n",
                i + 1,
                snippet.source_file,
                snippet.start_line,
                snippet.end_line
            ));
            out.push_str(&format!("_Specificity: {:.3}_\n\n", snippet.score));

            let language = Language::from_path(Path::new(&snippet.source_file));
            out.push_str("```");
            if language != Language::Unknown {
                out.push_str(language.name());
            }
            out.push('\n');
            out.push_str(&snippet.text);
            if !snippet.text.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n\n");
        }
        out
    }
}
