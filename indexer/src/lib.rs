/*!
# Lexmap Indexer

Token-level inverted indexing for source trees, with incremental rebuilds.

## Features

- **Inverted index**: token text -> files and positions, with cached
  document frequencies
- **Incremental builds**: per-file fingerprints decide what to retokenize;
  reconciliation produces the same index a full rebuild would
- **Commutative merge**: files are scanned and indexed in parallel and the
  partial results merged order-independently
- **Durable snapshots**: bincode snapshot written atomically; corruption
  falls back to a full build
- **Rarity filtering**: the `RareTokenSet` view of tokens below the
  document-frequency threshold

## Example

```rust,no_run
use lexmap_indexer::{CorpusIndexer, IndexConfig, RareTokenSet, include_all};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), lexmap_indexer::IndexerError> {
    let config = IndexConfig {
        root_dir: PathBuf::from("./my-project"),
        ..Default::default()
    };

    let indexer = CorpusIndexer::new(config)?;
    let outcome = indexer.build(&include_all()).await?;
    let rare = RareTokenSet::compute(&outcome.index, 10);

    println!(
        "indexed {} files, {} rare tokens",
        outcome.index.file_count(),
        rare.len()
    );
    Ok(())
}
```
*/

mod builder;
mod config;
mod error;
mod filter;
mod indexer;
mod model;
mod scanner;
mod snapshot;

pub use builder::IndexBuilder;
pub use config::IndexConfig;
pub use error::{IndexerError, Result};
pub use filter::RareTokenSet;
pub use indexer::{BuildOutcome, CorpusIndexer, IndexStats};
pub use model::{FileFingerprint, FileRecord, IndexEntry, InvertedIndex, LineCol};
pub use scanner::{
    CorpusScanner, IncludePredicate, ScanOutcome, SkipReason, SkippedFile, include_all,
};
pub use snapshot::{SNAPSHOT_VERSION, Snapshot, load_snapshot, save_snapshot};
