use crate::error::Result;
use crate::model::InvertedIndex;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_VERSION: u32 = 1;

/// On-disk form of a built index: the scan root and rarity threshold it was
/// built with, plus the index itself (per-file fingerprints included in
/// `index.files`).
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub root: PathBuf,
    pub threshold: u32,
    pub index: InvertedIndex,
}

impl Snapshot {
    pub fn new(root: PathBuf, threshold: u32, index: InvertedIndex) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            root,
            threshold,
            index,
        }
    }

    /// A snapshot is stale when its format version, scan root, or threshold
    /// disagrees with the current run. Stale snapshots are ignored
    /// wholesale, never partially reused.
    pub fn is_stale(&self, root: &Path, threshold: u32) -> bool {
        self.version != SNAPSHOT_VERSION || self.root != root || self.threshold != threshold
    }
}

/// Load a snapshot. A missing file is a plain miss; an unreadable or
/// corrupt file is logged, removed best-effort, and also reported as a
/// miss so the caller falls back to a full build.
pub fn load_snapshot(path: &Path) -> Result<Option<Snapshot>> {
    if !path.exists() {
        return Ok(None);
    }
    let mut file = fs::File::open(path)?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    match bincode::deserialize(&buf) {
        Ok(snapshot) => Ok(Some(snapshot)),
        Err(err) => {
            warn!("index snapshot at {path:?} is unreadable ({err}); falling back to full build");
            if let Err(remove_err) = fs::remove_file(path) {
                warn!("failed to remove corrupted snapshot {path:?}: {remove_err}");
            }
            Ok(None)
        }
    }
}

/// Persist a snapshot: write to `tmp_path`, fsync, then atomically rename
/// into place. An interrupted save never clobbers the previous snapshot.
pub fn save_snapshot(path: &Path, tmp_path: &Path, snapshot: &Snapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = bincode::serialize(snapshot)?;
    {
        let mut file = fs::File::create(tmp_path)?;
        file.write_all(&data)?;
        file.sync_all()?;
    }
    fs::rename(tmp_path, path)?;
    info!("saved index snapshot to {path:?} ({} bytes)", data.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileFingerprint, FileRecord};
    use lexmap_tokenizer::{Token, TokenKind, TokenOccurrence};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample_index() -> InvertedIndex {
        let mut index = InvertedIndex::new();
        index.insert_record(FileRecord {
            path: "a.py".to_string(),
            fingerprint: FileFingerprint {
                mtime: Some(7),
                size: 42,
                digest: [3; 16],
            },
            occurrences: vec![TokenOccurrence {
                token: Token::new("frobnicate_widget", TokenKind::Identifier),
                line: 1,
                column: 4,
            }],
        });
        index
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("cache").join("index.bin");
        let tmp = dir.path().join("cache").join("index.bin.tmp");

        let snapshot = Snapshot::new(PathBuf::from("/repo"), 10, sample_index());
        save_snapshot(&path, &tmp, &snapshot).expect("save");
        assert!(!tmp.exists());

        let loaded = load_snapshot(&path).expect("load").expect("present");
        assert_eq!(loaded.version, SNAPSHOT_VERSION);
        assert_eq!(loaded.threshold, 10);
        assert_eq!(loaded.index, snapshot.index);
    }

    #[test]
    fn missing_snapshot_is_a_miss() {
        let dir = TempDir::new().expect("temp dir");
        let loaded = load_snapshot(&dir.path().join("absent.bin")).expect("load");
        assert!(loaded.is_none());
    }

    #[test]
    fn corrupt_snapshot_is_a_miss_not_an_error() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("index.bin");
        fs::write(&path, b"not a snapshot").expect("write");

        let loaded = load_snapshot(&path).expect("load");
        assert!(loaded.is_none());
        // Corrupt file is cleaned up so the next run starts fresh.
        assert!(!path.exists());
    }

    #[test]
    fn staleness_checks_root_and_threshold() {
        let snapshot = Snapshot::new(PathBuf::from("/repo"), 10, InvertedIndex::new());
        assert!(!snapshot.is_stale(Path::new("/repo"), 10));
        assert!(snapshot.is_stale(Path::new("/repo"), 5));
        assert!(snapshot.is_stale(Path::new("/elsewhere"), 10));
    }
}
