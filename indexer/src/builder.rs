use crate::error::Result;
use crate::model::{FileRecord, InvertedIndex};
use log::debug;

/// Builds an inverted index from scanned file records.
///
/// Construction is associative and commutative over the record set: records
/// can be partitioned across workers and the partial indexes merged in any
/// order without changing the result.
pub struct IndexBuilder {
    partitions: usize,
}

impl IndexBuilder {
    pub fn new(partitions: usize) -> Self {
        Self {
            partitions: partitions.max(1),
        }
    }

    /// Build an index from records on the current thread.
    pub fn build(records: Vec<FileRecord>) -> InvertedIndex {
        let mut index = InvertedIndex::new();
        for record in records {
            index.insert_record(record);
        }
        index
    }

    /// Build by partitioning records across blocking workers and merging the
    /// partial indexes. Identical output to [`IndexBuilder::build`] for any
    /// partition count.
    pub async fn build_partitioned(&self, records: Vec<FileRecord>) -> Result<InvertedIndex> {
        if self.partitions == 1 || records.len() <= 1 {
            return Ok(Self::build(records));
        }

        let chunk = records.len().div_ceil(self.partitions);
        debug!(
            "building index from {} records across {} partitions",
            records.len(),
            self.partitions
        );

        let mut tasks = Vec::new();
        let mut records = records.into_iter().peekable();
        while records.peek().is_some() {
            let part: Vec<FileRecord> = records.by_ref().take(chunk).collect();
            tasks.push(tokio::task::spawn_blocking(move || Self::build(part)));
        }

        let mut index = InvertedIndex::new();
        for task in tasks {
            index.merge(task.await?);
        }
        Ok(index)
    }
}
