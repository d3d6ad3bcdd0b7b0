/*!
# Lexmap Context

Source-aware context construction: given an indexed source tree and a
target file, assembles a compact, ranked set of related code snippets
suitable for inclusion in a downstream prompt.

## Architecture

```text
ContextEngine::build_index
  └─> CorpusIndexer (scan + tokenize + reconcile against snapshot)
        └─> RareTokenSet (document-frequency filter)
              └─> swap (index, rare set) in as one unit

ContextEngine::get_context(target)
  └─> ContextAggregator
        ├─> rare tokens occurring in the target
        ├─> candidate files scored by inverse document frequency
        └─> snippet windows extracted, merged, ordered deterministically
```

## Example

```rust,no_run
use lexmap_context::{ContextConfig, ContextEngine};
use lexmap_indexer::{IndexConfig, include_all};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), lexmap_context::ContextError> {
    let index_config = IndexConfig {
        root_dir: PathBuf::from("./my-project"),
        ..Default::default()
    };

    let engine = ContextEngine::new(index_config, ContextConfig::default())?;
    engine.build_index(&include_all()).await?;

    let context = engine.get_context("src/main.rs").await?;
    println!("{}", context.render());
    Ok(())
}
```
*/

mod aggregator;
mod document;
mod engine;
mod error;

pub use aggregator::{ContextAggregator, ContextConfig};
pub use document::{ContextDocument, Snippet};
pub use engine::{ContextEngine, QueryOverrides};
pub use error::{ContextError, Result};
