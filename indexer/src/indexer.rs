use crate::builder::IndexBuilder;
use crate::config::IndexConfig;
use crate::error::{IndexerError, Result};
use crate::model::InvertedIndex;
use crate::scanner::{CorpusScanner, IncludePredicate, SkippedFile};
use crate::snapshot::{Snapshot, load_snapshot, save_snapshot};
use log::{debug, info};
use std::collections::HashSet;
use std::sync::Arc;

/// Statistics about one build
#[derive(Debug, Default, Clone)]
pub struct IndexStats {
    /// Files tokenized this run (new or changed).
    pub files_indexed: usize,
    /// Files whose postings were reused from the loaded snapshot.
    pub files_reused: usize,
    /// Files dropped from the index (deleted or newly excluded).
    pub files_removed: usize,
    /// Files excluded with a recorded skip reason.
    pub files_skipped: usize,
    /// Distinct token texts in the final index.
    pub distinct_tokens: usize,
}

/// Outcome of a build: the finished index plus diagnostics.
#[derive(Debug)]
pub struct BuildOutcome {
    pub index: Arc<InvertedIndex>,
    pub stats: IndexStats,
    pub skipped: Vec<SkippedFile>,
}

/// Orchestrates load-or-build with file-granularity reconciliation.
///
/// A build loads the previous snapshot (unless stale), scans the corpus
/// reusing postings for fingerprint-matched files, patches out stale and
/// deleted files, inserts the changed ones, and persists the result
/// atomically. The reconciled index is identical to one built from scratch
/// over the same tree.
pub struct CorpusIndexer {
    config: IndexConfig,
    scanner: CorpusScanner,
}

impl CorpusIndexer {
    /// Create a new indexer. Configuration failures surface here, before
    /// any filesystem work.
    pub fn new(config: IndexConfig) -> Result<Self> {
        config.validate().map_err(IndexerError::InvalidConfig)?;
        let scanner = CorpusScanner::new(&config);
        Ok(Self { config, scanner })
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Full or incremental build. Writes an updated snapshot on success;
    /// an abandoned or failed build leaves the previous snapshot intact.
    pub async fn build(&self, include: &IncludePredicate) -> Result<BuildOutcome> {
        let previous = self.load_previous()?;
        let scan = self.scanner.scan(include, previous.as_ref()).await?;

        let mut stats = IndexStats {
            files_indexed: scan.changed.len(),
            files_reused: scan.unchanged.len(),
            files_skipped: scan.skipped.len(),
            ..Default::default()
        };

        let index = match previous {
            Some(mut index) => {
                let keep: HashSet<&str> = scan
                    .unchanged
                    .iter()
                    .map(String::as_str)
                    .chain(scan.changed.iter().map(|record| record.path.as_str()))
                    .collect();
                let stale: Vec<String> = index
                    .files
                    .keys()
                    .filter(|path| !keep.contains(path.as_str()))
                    .cloned()
                    .collect();
                stats.files_removed = stale.len();
                for path in &stale {
                    index.remove_file(path);
                }
                for record in scan.changed {
                    index.insert_record(record);
                }
                debug!(
                    "reconciled index: {} reindexed, {} reused, {} removed",
                    stats.files_indexed, stats.files_reused, stats.files_removed
                );
                index
            }
            None => {
                IndexBuilder::new(self.config.max_workers)
                    .build_partitioned(scan.changed)
                    .await?
            }
        };

        stats.distinct_tokens = index.token_count();

        let snapshot = Snapshot::new(
            self.config.root_dir.clone(),
            self.config.rare_threshold,
            index,
        );
        save_snapshot(
            &self.config.cache_path,
            &self.config.cache_tmp_path(),
            &snapshot,
        )?;

        info!(
            "index ready: {} files, {} tokens ({} reindexed, {} reused)",
            snapshot.index.file_count(),
            stats.distinct_tokens,
            stats.files_indexed,
            stats.files_reused
        );

        Ok(BuildOutcome {
            index: Arc::new(snapshot.index),
            stats,
            skipped: scan.skipped,
        })
    }

    fn load_previous(&self) -> Result<Option<InvertedIndex>> {
        let Some(snapshot) = load_snapshot(&self.config.cache_path)? else {
            return Ok(None);
        };
        if snapshot.is_stale(&self.config.root_dir, self.config.rare_threshold) {
            info!("index snapshot is stale (root or threshold changed); rebuilding from scratch");
            return Ok(None);
        }
        Ok(Some(snapshot.index))
    }
}
