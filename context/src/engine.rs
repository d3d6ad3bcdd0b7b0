use crate::aggregator::{ContextAggregator, ContextConfig};
use crate::document::ContextDocument;
use crate::error::{ContextError, Result};
use lexmap_indexer::{
    CorpusIndexer, IncludePredicate, IndexConfig, IndexStats, InvertedIndex, RareTokenSet,
    SkippedFile,
};
use log::info;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Per-query overrides for the aggregation limits.
///
/// A `rare_threshold` override recomputes the rare-token view against the
/// current index for this query only; the build configuration and the
/// persisted snapshot are untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOverrides {
    pub max_related_files: Option<usize>,
    pub max_snippet_span: Option<u32>,
    pub rare_threshold: Option<u32>,
}

/// The index and its derived rare-token view, swapped as one unit so a
/// query never sees an index paired with a stale rare set.
struct EngineState {
    index: Arc<InvertedIndex>,
    rare: Arc<RareTokenSet>,
    stats: IndexStats,
    skipped: Vec<SkippedFile>,
}

/// The engine boundary consumed by surrounding tooling.
///
/// `build_index` performs the load-or-build (with incremental
/// reconciliation) and swaps the finished index in whole; `get_context` is
/// a pure query against the current in-memory index. Queries running
/// during a rebuild keep reading the previous index until the swap, so
/// they never observe a half-updated entry.
pub struct ContextEngine {
    indexer: CorpusIndexer,
    context_config: ContextConfig,
    state: RwLock<Option<EngineState>>,
}

impl ContextEngine {
    /// Create a new engine. Both configurations are validated here, before
    /// any filesystem work.
    pub fn new(index_config: IndexConfig, context_config: ContextConfig) -> Result<Self> {
        context_config
            .validate()
            .map_err(ContextError::InvalidConfig)?;
        let indexer = CorpusIndexer::new(index_config)?;
        Ok(Self {
            indexer,
            context_config,
            state: RwLock::new(None),
        })
    }

    pub fn index_config(&self) -> &IndexConfig {
        self.indexer.config()
    }

    pub fn context_config(&self) -> &ContextConfig {
        &self.context_config
    }

    /// Build or reconcile the index, persist the snapshot, and swap the
    /// result in for subsequent queries.
    pub async fn build_index(&self, include: &IncludePredicate) -> Result<IndexStats> {
        let outcome = self.indexer.build(include).await?;
        let rare = RareTokenSet::compute(&outcome.index, self.indexer.config().rare_threshold);
        info!(
            "context engine ready: {} files, {} rare tokens",
            outcome.index.file_count(),
            rare.len()
        );

        let stats = outcome.stats.clone();
        let mut guard = self.state.write().await;
        *guard = Some(EngineState {
            index: outcome.index,
            rare: Arc::new(rare),
            stats: outcome.stats,
            skipped: outcome.skipped,
        });
        Ok(stats)
    }

    /// Pure query: assemble the context document for `target` (relative to
    /// the scan root) against the current index.
    pub async fn get_context(&self, target: &str) -> Result<ContextDocument> {
        self.get_context_with(target, QueryOverrides::default()).await
    }

    /// Same as [`get_context`] with per-call limit overrides.
    ///
    /// [`get_context`]: ContextEngine::get_context
    pub async fn get_context_with(
        &self,
        target: &str,
        overrides: QueryOverrides,
    ) -> Result<ContextDocument> {
        let (index, mut rare) = {
            let guard = self.state.read().await;
            let state = guard.as_ref().ok_or(ContextError::IndexNotBuilt)?;
            (state.index.clone(), state.rare.clone())
        };

        if let Some(threshold) = overrides.rare_threshold {
            if threshold == 0 {
                return Err(ContextError::InvalidConfig(
                    "rare_threshold must be > 0".to_string(),
                ));
            }
            if threshold != rare.threshold() {
                rare = Arc::new(RareTokenSet::compute(&index, threshold));
            }
        }

        let mut config = self.context_config.clone();
        if let Some(max_related_files) = overrides.max_related_files {
            config.max_related_files = max_related_files;
        }
        if let Some(max_snippet_span) = overrides.max_snippet_span {
            config.max_snippet_span = max_snippet_span;
        }
        config.validate().map_err(ContextError::InvalidConfig)?;

        let aggregator =
            ContextAggregator::new(self.indexer.config().root_dir.clone(), config);
        aggregator.build_context(target, &index, &rare)
    }

    /// Stats from the most recent build, if any.
    pub async fn stats(&self) -> Option<IndexStats> {
        let guard = self.state.read().await;
        guard.as_ref().map(|state| state.stats.clone())
    }

    /// Files the most recent build skipped, with reasons.
    pub async fn skipped_files(&self) -> Vec<SkippedFile> {
        let guard = self.state.read().await;
        guard
            .as_ref()
            .map(|state| state.skipped.clone())
            .unwrap_or_default()
    }
}
