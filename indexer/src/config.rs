use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for corpus indexing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Root directory to index
    pub root_dir: PathBuf,

    /// Snapshot file for the persisted index
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,

    /// Tokens occurring in fewer than this many files are rare
    #[serde(default = "default_rare_threshold")]
    pub rare_threshold: u32,

    /// Maximum concurrent file scanning workers
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Files larger than this are skipped
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

fn default_cache_path() -> PathBuf {
    PathBuf::from(".lexmap/index.bin")
}

fn default_rare_threshold() -> u32 {
    10
}

fn default_max_workers() -> usize {
    num_cpus::get()
}

fn default_max_file_bytes() -> u64 {
    2 * 1024 * 1024
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            cache_path: default_cache_path(),
            rare_threshold: default_rare_threshold(),
            max_workers: default_max_workers(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

impl IndexConfig {
    /// Validate configuration. Checked before any filesystem work begins.
    pub fn validate(&self) -> Result<(), String> {
        if !self.root_dir.exists() {
            return Err(format!("Root directory does not exist: {:?}", self.root_dir));
        }

        if !self.root_dir.is_dir() {
            return Err(format!("Root path is not a directory: {:?}", self.root_dir));
        }

        if self.rare_threshold == 0 {
            return Err("Rare threshold must be > 0".to_string());
        }

        if self.max_workers == 0 {
            return Err("Max workers must be > 0".to_string());
        }

        if self.max_file_bytes == 0 {
            return Err("Max file bytes must be > 0".to_string());
        }

        Ok(())
    }

    /// Scratch path the snapshot is written to before the atomic rename.
    pub fn cache_tmp_path(&self) -> PathBuf {
        let mut name = self
            .cache_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.cache_path.with_file_name(name)
    }
}
