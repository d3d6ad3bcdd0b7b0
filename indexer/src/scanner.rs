use crate::config::IndexConfig;
use crate::error::{IndexerError, Result};
use crate::model::{FileFingerprint, FileRecord, InvertedIndex};
use ignore::WalkBuilder;
use log::{debug, warn};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Caller-supplied inclusion policy, typically derived from version-control
/// listings and ignore rules. The scanner applies it verbatim and does not
/// layer policy of its own on top (beyond the standard git filters of the
/// directory walk). Receives paths relative to the scan root.
pub type IncludePredicate = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// Predicate accepting every walked file.
pub fn include_all() -> IncludePredicate {
    Arc::new(|_| true)
}

/// Why a file was left out of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Larger than `max_file_bytes`.
    TooLarge,
    /// Content is not valid UTF-8.
    NonUtf8,
    /// Metadata or content could not be read.
    Unreadable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::TooLarge => "file too large",
            SkipReason::NonUtf8 => "not valid UTF-8",
            SkipReason::Unreadable => "unreadable",
        };
        f.write_str(reason)
    }
}

/// A file excluded from the scan, recorded for diagnostics. Skips never
/// abort the scan.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: String,
    pub reason: SkipReason,
}

/// Result of scanning the corpus against an optional previous index.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Files that are new or whose content changed; fully tokenized.
    pub changed: Vec<FileRecord>,
    /// Files whose fingerprint matches the previous index; not re-tokenized.
    pub unchanged: Vec<String>,
    /// Files excluded from the corpus, with reasons.
    pub skipped: Vec<SkippedFile>,
}

enum FileScan {
    Changed(Box<FileRecord>),
    Unchanged(String),
    Skipped(SkippedFile),
}

/// Enumerates eligible files and tokenizes the ones the previous index
/// cannot vouch for. Scanning and tokenization fan out over a worker pool
/// bounded by `max_workers`.
pub struct CorpusScanner {
    root: PathBuf,
    max_file_bytes: u64,
    max_workers: usize,
    cache_path: PathBuf,
    cache_tmp_path: PathBuf,
}

impl CorpusScanner {
    pub fn new(config: &IndexConfig) -> Self {
        Self {
            root: config.root_dir.clone(),
            max_file_bytes: config.max_file_bytes,
            max_workers: config.max_workers.max(1),
            cache_path: config.cache_path.clone(),
            cache_tmp_path: config.cache_tmp_path(),
        }
    }

    /// Scan the corpus. Files whose fingerprint matches `previous` are
    /// reported as unchanged and skip tokenization entirely.
    pub async fn scan(
        &self,
        include: &IncludePredicate,
        previous: Option<&InvertedIndex>,
    ) -> Result<ScanOutcome> {
        let paths = self.discover(include)?;
        debug!("scanning {} files under {:?}", paths.len(), self.root);

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut tasks = Vec::with_capacity(paths.len());

        for rel in paths {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| IndexerError::Join(format!("semaphore closed: {e}")))?;
            let abs = self.root.join(&rel);
            let prev_fingerprint = previous.and_then(|index| index.fingerprint(&rel)).cloned();
            let max_bytes = self.max_file_bytes;

            tasks.push(tokio::task::spawn_blocking(move || {
                let scan = scan_file(&abs, &rel, prev_fingerprint, max_bytes);
                drop(permit);
                scan
            }));
        }

        let mut outcome = ScanOutcome::default();
        for task in tasks {
            match task.await? {
                FileScan::Changed(record) => outcome.changed.push(*record),
                FileScan::Unchanged(path) => outcome.unchanged.push(path),
                FileScan::Skipped(skipped) => {
                    debug!("skipping {}: {}", skipped.path, skipped.reason);
                    outcome.skipped.push(skipped);
                }
            }
        }
        Ok(outcome)
    }

    /// Walk the root and collect included file paths, sorted for
    /// deterministic downstream ordering.
    fn discover(&self, include: &IncludePredicate) -> Result<Vec<String>> {
        let mut paths = Vec::new();
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .standard_filters(true)
            .require_git(false)
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    warn!("skipping walk entry: {err}");
                    continue;
                }
            };
            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }
            // The snapshot itself never joins the corpus.
            if entry.path() == self.cache_path || entry.path() == self.cache_tmp_path {
                continue;
            }
            let Some(rel) = relative_path(&self.root, entry.path()) else {
                continue;
            };
            if !include(Path::new(&rel)) {
                continue;
            }
            paths.push(rel);
        }

        paths.sort_unstable();
        Ok(paths)
    }
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

fn scan_file(
    abs: &Path,
    rel: &str,
    previous: Option<FileFingerprint>,
    max_bytes: u64,
) -> FileScan {
    let skipped = |reason| {
        FileScan::Skipped(SkippedFile {
            path: rel.to_string(),
            reason,
        })
    };

    let metadata = match fs::metadata(abs) {
        Ok(m) => m,
        Err(_) => return skipped(SkipReason::Unreadable),
    };
    if metadata.len() > max_bytes {
        return skipped(SkipReason::TooLarge);
    }
    let bytes = match fs::read(abs) {
        Ok(b) => b,
        Err(_) => return skipped(SkipReason::Unreadable),
    };

    let fingerprint = FileFingerprint::from_content(&metadata, &bytes);
    if let Some(prev) = previous
        && prev.matches(&fingerprint)
    {
        return FileScan::Unchanged(rel.to_string());
    }

    let Ok(content) = std::str::from_utf8(&bytes) else {
        return skipped(SkipReason::NonUtf8);
    };

    let occurrences = lexmap_tokenizer::tokenize(Path::new(rel), content);
    FileScan::Changed(Box::new(FileRecord {
        path: rel.to_string(),
        fingerprint,
        occurrences,
    }))
}
