//! Flat-file torrent store.
//!
//! A store is a directory holding:
//! - `torrents.tsv` - one fixed-width [`Record`] per info-hash, in append order
//! - `files.tsv` - append-only file listings, one block per new hash
//! - `stats.txt` - one summary row per ingestion run
//! - `error.log` - one line per rejected input file

mod error_log;
mod index;
mod ledger;
mod listing;
mod record;
mod torrents;

pub use error_log::{ErrorLog, ErrorSink};
pub use index::{IndexBuilder, IndexEntry, ScanIndexBuilder, SortedIndex};
pub use ledger::{StatsLedger, StatsRow};
pub use listing::{read_listings, FileListing, ListedFile, ListingWriter};
pub use record::{
    prefix_len, Record, DATE_WIDTH, FILES_WIDTH, HITS_WIDTH, MAX_HITS, PREFIX_LEN, SIZE_WIDTH,
};
pub use torrents::TorrentStore;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Value {value} for {field} does not fit in {width} characters")]
    FieldOverflow {
        field: &'static str,
        value: String,
        width: usize,
    },

    #[error("Malformed stats ledger: {0}")]
    MalformedLedger(String),

    #[error("Malformed file listing: {0}")]
    MalformedListing(String),
}

impl StoreError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
        move |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Locations of the files inside a store directory.
#[derive(Debug, Clone)]
pub struct StorePaths {
    dir: PathBuf,
}

impl StorePaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn torrents(&self) -> PathBuf {
        self.dir.join("torrents.tsv")
    }

    pub fn files(&self) -> PathBuf {
        self.dir.join("files.tsv")
    }

    pub fn stats(&self) -> PathBuf {
        self.dir.join("stats.txt")
    }

    pub fn error_log(&self) -> PathBuf {
        self.dir.join("error.log")
    }

    /// Create the directory and an empty `torrents.tsv` if missing.
    pub fn ensure(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(StoreError::io(&self.dir))?;
        let torrents = self.torrents();
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&torrents)
            .map_err(StoreError::io(&torrents))?;
        Ok(())
    }
}
