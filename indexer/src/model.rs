use lexmap_tokenizer::{Token, TokenKind, TokenOccurrence};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::SystemTime;

/// Change-detection fingerprint for one file.
///
/// Equality of `size` and `digest` decides reuse; `mtime` is advisory (a
/// touch without a content change does not invalidate the file).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFingerprint {
    pub mtime: Option<u64>,
    pub size: u64,
    pub digest: [u8; 16],
}

impl FileFingerprint {
    pub fn new(metadata: &std::fs::Metadata, digest: [u8; 16]) -> Self {
        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
            .map(|d| d.as_secs());
        Self {
            mtime,
            size: metadata.len(),
            digest,
        }
    }

    /// Fingerprint from file metadata plus content bytes.
    pub fn from_content(metadata: &std::fs::Metadata, bytes: &[u8]) -> Self {
        let digest = blake3::hash(bytes);
        let mut short = [0u8; 16];
        short.copy_from_slice(&digest.as_bytes()[..16]);
        Self::new(metadata, short)
    }

    /// Whether the file content is unchanged.
    pub fn matches(&self, other: &FileFingerprint) -> bool {
        self.size == other.size && self.digest == other.digest
    }
}

/// One scanned file: path relative to the scan root, fingerprint, and the
/// full positioned token stream. Produced by the scanner, consumed by the
/// index builder; the index owns the data afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub fingerprint: FileFingerprint,
    pub occurrences: Vec<TokenOccurrence>,
}

/// A position inside a file. Line 1-based, column 0-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineCol {
    pub line: u32,
    pub column: u32,
}

/// Postings for one token text.
///
/// Invariants: `doc_frequency == positions.len()` at all times; every
/// position list is non-empty and sorted by (line, column).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Merged kind observation across all files (see `TokenKind::merge`).
    pub kind: TokenKind,
    /// Cached document frequency, always equal to the file-set size.
    pub doc_frequency: u32,
    /// File path -> positions of this token in that file.
    pub positions: HashMap<String, Vec<LineCol>>,
}

impl IndexEntry {
    fn new(kind: TokenKind) -> Self {
        Self {
            kind,
            doc_frequency: 0,
            positions: HashMap::new(),
        }
    }

    /// Files this token occurs in.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.positions.keys().map(String::as_str)
    }
}

/// Token-text -> postings map plus the fingerprints of every indexed file.
///
/// Tokens are keyed by exact text; the kind tag lives on the entry and is
/// merged order-independently, so the index content never depends on which
/// worker processed which file first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub entries: HashMap<String, IndexEntry>,
    pub files: HashMap<String, FileFingerprint>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self, token_text: &str) -> Option<&IndexEntry> {
        self.entries.get(token_text)
    }

    pub fn contains_file(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn fingerprint(&self, path: &str) -> Option<&FileFingerprint> {
        self.files.get(path)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn token_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Insert one file's token stream. Replaces any previous postings for
    /// the same path, so insertion is idempotent per file.
    pub fn insert_record(&mut self, record: FileRecord) {
        if self.files.contains_key(&record.path) {
            self.remove_file(&record.path);
        }

        let FileRecord {
            path,
            fingerprint,
            occurrences,
        } = record;

        let mut grouped: HashMap<String, (TokenKind, Vec<LineCol>)> = HashMap::new();
        for occ in occurrences {
            let slot = grouped
                .entry(occ.token.text)
                .or_insert_with(|| (occ.token.kind, Vec::new()));
            slot.0 = slot.0.merge(occ.token.kind);
            slot.1.push(LineCol {
                line: occ.line,
                column: occ.column,
            });
        }

        for (text, (kind, mut positions)) in grouped {
            positions.sort_unstable();
            positions.dedup();
            let entry = self.entries.entry(text).or_insert_with(|| IndexEntry::new(kind));
            entry.kind = entry.kind.merge(kind);
            entry.positions.insert(path.clone(), positions);
            entry.doc_frequency = entry.positions.len() as u32;
        }

        self.files.insert(path, fingerprint);
    }

    /// Drop every association of `path`: the file is removed from each
    /// entry's file set, document frequencies are decremented, and entries
    /// left with no files are deleted.
    pub fn remove_file(&mut self, path: &str) -> bool {
        if self.files.remove(path).is_none() {
            return false;
        }
        self.entries.retain(|_, entry| {
            if entry.positions.remove(path).is_some() {
                entry.doc_frequency = entry.positions.len() as u32;
            }
            !entry.positions.is_empty()
        });
        true
    }

    /// Union another (partial) index into this one.
    ///
    /// Commutative and associative over disjoint file partitions: file sets
    /// are unioned, positions concatenated then sorted, and document
    /// frequency recomputed from the unioned file set, never by summing
    /// partial counts.
    pub fn merge(&mut self, other: InvertedIndex) {
        for (text, incoming) in other.entries {
            let entry = self
                .entries
                .entry(text)
                .or_insert_with(|| IndexEntry::new(incoming.kind));
            entry.kind = entry.kind.merge(incoming.kind);
            for (file, positions) in incoming.positions {
                let slot = entry.positions.entry(file).or_default();
                slot.extend(positions);
                slot.sort_unstable();
                slot.dedup();
            }
            entry.doc_frequency = entry.positions.len() as u32;
        }
        self.files.extend(other.files);
    }

    /// Tokens occurring in `path`, with their postings.
    pub fn tokens_in_file<'a>(
        &'a self,
        path: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a IndexEntry)> {
        self.entries
            .iter()
            .filter(move |(_, entry)| entry.positions.contains_key(path))
            .map(|(text, entry)| (text.as_str(), entry))
    }

    /// Reconstruct a file's positioned token stream from the postings.
    pub fn file_occurrences(&self, path: &str) -> Vec<TokenOccurrence> {
        let mut occurrences: Vec<TokenOccurrence> = Vec::new();
        for (text, entry) in self.tokens_in_file(path) {
            if let Some(positions) = entry.positions.get(path) {
                for pos in positions {
                    occurrences.push(TokenOccurrence {
                        token: Token::new(text, entry.kind),
                        line: pos.line,
                        column: pos.column,
                    });
                }
            }
        }
        occurrences.sort_unstable_by_key(|occ| (occ.line, occ.column));
        occurrences
    }
}
