use crate::document::{ContextDocument, Snippet};
use crate::error::{ContextError, Result};
use lexmap_indexer::{InvertedIndex, RareTokenSet};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Configuration for context aggregation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// How many related files contribute snippets
    #[serde(default = "default_max_related_files")]
    pub max_related_files: usize,

    /// Hard cap on a single snippet's line span
    #[serde(default = "default_max_snippet_span")]
    pub max_snippet_span: u32,

    /// Lines of context around each token occurrence
    #[serde(default = "default_context_lines")]
    pub context_lines: u32,
}

fn default_max_related_files() -> usize {
    8
}

fn default_max_snippet_span() -> u32 {
    24
}

fn default_context_lines() -> u32 {
    2
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_related_files: default_max_related_files(),
            max_snippet_span: default_max_snippet_span(),
            context_lines: default_context_lines(),
        }
    }
}

impl ContextConfig {
    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_related_files == 0 {
            return Err("max_related_files must be > 0".to_string());
        }

        if self.max_snippet_span == 0 {
            return Err("max_snippet_span must be > 0".to_string());
        }

        Ok(())
    }
}

/// Assembles the ranked snippet context for a target file.
///
/// Related files are found through the rare tokens they share with the
/// target; each is scored by summing inverse-document-frequency weights,
/// so a token shared with few files outweighs one shared with many.
pub struct ContextAggregator {
    root: PathBuf,
    config: ContextConfig,
}

impl ContextAggregator {
    pub fn new(root: PathBuf, config: ContextConfig) -> Self {
        Self { root, config }
    }

    /// Build the context document for `target` (a path relative to the scan
    /// root). Fails only when the target itself is not in the index; a
    /// target without rare tokens yields an empty document.
    pub fn build_context(
        &self,
        target: &str,
        index: &InvertedIndex,
        rare: &RareTokenSet,
    ) -> Result<ContextDocument> {
        if !index.contains_file(target) {
            return Err(ContextError::TargetNotIndexed(target.to_string()));
        }

        // Sorted so per-file score accumulation is order-independent.
        let mut target_tokens: Vec<&str> = index
            .tokens_in_file(target)
            .filter(|&(text, _)| rare.contains(text))
            .map(|(text, _)| text)
            .collect();
        target_tokens.sort_unstable();

        if target_tokens.is_empty() {
            debug!("no rare tokens in {target}; returning empty context");
            return Ok(ContextDocument::empty(target));
        }

        let mut scores: HashMap<&str, f64> = HashMap::new();
        let mut shared_tokens: HashMap<&str, Vec<&str>> = HashMap::new();
        for &text in &target_tokens {
            let Some(entry) = index.entry(text) else {
                continue;
            };
            if entry.doc_frequency < 2 {
                // Unique to the target; nothing to relate.
                continue;
            }
            let weight = 1.0 / (entry.doc_frequency as f64 - 1.0);
            for file in entry.files() {
                if file == target {
                    continue;
                }
                *scores.entry(file).or_default() += weight;
                shared_tokens.entry(file).or_default().push(text);
            }
        }

        let mut ranked: Vec<(&str, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        ranked.truncate(self.config.max_related_files);

        debug!(
            "{} rare tokens in {target}, {} related files selected",
            target_tokens.len(),
            ranked.len()
        );

        let mut reader = FileLineReader::new(self.root.clone());
        let mut snippets = Vec::new();
        for (file, score) in ranked {
            let Some(lines) = reader.get(file) else {
                continue;
            };
            let tokens = &shared_tokens[file];
            for (start, end) in self.snippet_ranges(index, tokens, file, lines.len() as u32) {
                snippets.push(Snippet {
                    source_file: file.to_string(),
                    start_line: start,
                    end_line: end,
                    text: lines[(start - 1) as usize..end as usize].join("\n"),
                    score,
                });
            }
        }

        snippets.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.source_file.cmp(&b.source_file))
                .then_with(|| a.start_line.cmp(&b.start_line))
        });

        Ok(ContextDocument {
            target_file: target.to_string(),
            snippets,
        })
    }

    /// Line windows around every occurrence of the shared tokens in `file`,
    /// overlapping windows merged while the merged span stays within
    /// `max_snippet_span`.
    fn snippet_ranges(
        &self,
        index: &InvertedIndex,
        tokens: &[&str],
        file: &str,
        file_lines: u32,
    ) -> Vec<(u32, u32)> {
        let mut occurrence_lines: Vec<u32> = tokens
            .iter()
            .filter_map(|&text| index.entry(text))
            .filter_map(|entry| entry.positions.get(file))
            .flatten()
            .map(|pos| pos.line)
            .collect();
        occurrence_lines.sort_unstable();
        occurrence_lines.dedup();

        let span = self.config.max_snippet_span.max(1);
        let ctx = self.config.context_lines;
        let mut ranges: Vec<(u32, u32)> = Vec::new();
        for line in occurrence_lines {
            if line > file_lines {
                // Index is ahead of the on-disk file; drop the window.
                continue;
            }
            let start = line.saturating_sub(ctx).max(1);
            let mut end = line.saturating_add(ctx).min(file_lines);
            if end - start + 1 > span {
                end = start + span - 1;
            }
            if let Some(last) = ranges.last_mut()
                && start <= last.1 + 1
                && end.max(last.1) - last.0 + 1 <= span
            {
                last.1 = last.1.max(end);
                continue;
            }
            // Never emit overlapping ranges: a window that cannot merge
            // starts after the previous one ends.
            let start = ranges.last().map_or(start, |last| start.max(last.1 + 1));
            if start <= end {
                ranges.push((start, end));
            }
        }
        ranges
    }
}

/// Per-call cache of file contents, split into lines. Files that fail to
/// read contribute no snippets.
struct FileLineReader {
    root: PathBuf,
    cache: HashMap<String, Option<Vec<String>>>,
}

impl FileLineReader {
    fn new(root: PathBuf) -> Self {
        Self {
            root,
            cache: HashMap::new(),
        }
    }

    fn get(&mut self, rel: &str) -> Option<&[String]> {
        if !self.cache.contains_key(rel) {
            let loaded = match fs::read_to_string(self.root.join(rel)) {
                Ok(content) => Some(content.lines().map(str::to_string).collect()),
                Err(err) => {
                    warn!("failed to read {rel} for snippet extraction: {err}");
                    None
                }
            };
            self.cache.insert(rel.to_string(), loaded);
        }
        self.cache.get(rel).and_then(|lines| lines.as_deref())
    }
}
