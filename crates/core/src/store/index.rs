//! In-memory hash → byte offset index over `torrents.tsv`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::StoreError;
use crate::metainfo::InfoHash;

/// Position of one record in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub hash: InfoHash,
    /// Byte offset of the start of the record's line.
    pub offset: u64,
}

/// Records sorted by hash, for binary search.
#[derive(Debug, Clone, Default)]
pub struct SortedIndex {
    entries: Vec<IndexEntry>,
}

impl SortedIndex {
    pub fn from_entries(mut entries: Vec<IndexEntry>) -> Self {
        entries.sort_by(|a, b| a.hash.cmp(&b.hash).then(a.offset.cmp(&b.offset)));
        Self { entries }
    }

    /// Scan a store line by line, collecting the offset of every record.
    ///
    /// Offsets count every byte read, newlines included. Only the hash
    /// column is inspected.
    pub fn scan<R: BufRead>(mut reader: R) -> Result<Self, StoreError> {
        let mut entries = Vec::new();
        let mut offset: u64 = 0;
        let mut line = Vec::new();

        loop {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .map_err(|e| StoreError::MalformedRecord(format!("read failed at offset {offset}: {e}")))?;
            if read == 0 {
                break;
            }

            let field = line
                .split(|&b| b == b'\t' || b == b'\n')
                .next()
                .unwrap_or_default();
            let hash = std::str::from_utf8(field)
                .ok()
                .and_then(|s| s.parse::<InfoHash>().ok())
                .ok_or_else(|| {
                    StoreError::MalformedRecord(format!(
                        "incorrect hash at offset {offset}: {:?}",
                        String::from_utf8_lossy(field)
                    ))
                })?;

            entries.push(IndexEntry { hash, offset });
            offset += read as u64;
        }

        Ok(Self::from_entries(entries))
    }

    /// Binary search for `hash`.
    ///
    /// Returns the record offset, or the position where the hash would be
    /// inserted to keep the index sorted.
    pub fn lookup(&self, hash: &InfoHash) -> Result<u64, usize> {
        self.entries
            .binary_search_by(|entry| entry.hash.cmp(hash))
            .map(|i| self.entries[i].offset)
    }

    pub fn get(&self, hash: &InfoHash) -> Option<u64> {
        self.lookup(hash).ok()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }
}

/// Source of the index used by an ingestion run.
///
/// The default implementation rebuilds it from a full scan; a persisted
/// index can be plugged in without touching ingestion.
pub trait IndexBuilder: Send + Sync {
    fn build(&self, store: &Path) -> Result<SortedIndex, StoreError>;
}

/// Builds the index by scanning `torrents.tsv` once.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanIndexBuilder;

impl IndexBuilder for ScanIndexBuilder {
    fn build(&self, store: &Path) -> Result<SortedIndex, StoreError> {
        let file = File::open(store).map_err(StoreError::io(store))?;
        let index = SortedIndex::scan(BufReader::new(file))?;
        tracing::debug!(records = index.len(), path = %store.display(), "Built store index");
        Ok(index)
    }
}
