//! Types for the ingestion engine.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use super::GateDecision;
use crate::metainfo::{MetainfoError, ValidationError};
use crate::store::{StatsRow, StoreError};

/// Broad classes of ingestion failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The input could not be decoded as a valid metainfo file.
    Parse,
    /// The input decoded but carries names that cannot be stored.
    Validation,
    /// The store does not contain what the index says it does.
    Consistency,
    /// Filesystem failure.
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Parse => "parse",
            ErrorKind::Validation => "validation",
            ErrorKind::Consistency => "consistency",
            ErrorKind::Io => "io",
        }
    }
}

/// Errors raised while ingesting.
///
/// Parse and validation errors only reject the file at hand; every other
/// error aborts the run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Parse(#[from] MetainfoError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Store consistency error: {0}")]
    Consistency(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to read {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid input pattern {pattern:?}: {reason}")]
    Pattern { pattern: String, reason: String },
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::Parse(MetainfoError::InvalidPathTraversal(_)) => ErrorKind::Validation,
            IngestError::Parse(_) => ErrorKind::Parse,
            IngestError::Validation(_) => ErrorKind::Validation,
            IngestError::Consistency(_) => ErrorKind::Consistency,
            IngestError::Store(StoreError::Io { .. }) => ErrorKind::Io,
            IngestError::Store(_) => ErrorKind::Consistency,
            IngestError::Input { .. } | IngestError::Pattern { .. } => ErrorKind::Io,
        }
    }

    /// Whether the run can continue with the next file.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Parse | ErrorKind::Validation)
    }
}

/// What happened to one input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Outside the scan window; not read.
    Skipped(GateDecision),
    /// Failed to decode or validate.
    Rejected(ErrorKind),
    /// New hash; record buffered for append.
    Appended,
    /// New hash already appended earlier in this run.
    Duplicate,
    /// Known hash; record updated in place.
    Updated,
}

impl FileOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileOutcome::Skipped(_) => "skipped",
            FileOutcome::Rejected(_) => "rejected",
            FileOutcome::Appended => "appended",
            FileOutcome::Duplicate => "duplicate",
            FileOutcome::Updated => "updated",
        }
    }
}

/// Counters for one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Upper bound of the scan window, written as the ledger key.
    pub scan_time: i64,
    pub new: u64,
    pub updated: u64,
    pub rejected: u64,
    pub skipped: u64,
    pub duplicates: u64,
    /// Input files discovered for this run.
    pub files_seen: u64,
    /// Records in the store before the run.
    pub pre_existing_total: u64,
}

impl RunSummary {
    pub fn processed(&self) -> u64 {
        self.new + self.updated
    }

    pub fn total(&self) -> u64 {
        self.pre_existing_total + self.new
    }

    pub(crate) fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Skipped(_) => self.skipped += 1,
            FileOutcome::Rejected(_) => self.rejected += 1,
            FileOutcome::Appended => self.new += 1,
            FileOutcome::Duplicate => self.duplicates += 1,
            FileOutcome::Updated => self.updated += 1,
        }
    }

    pub fn stats_row(&self) -> StatsRow {
        StatsRow {
            scan_time: self.scan_time,
            new: self.new,
            updated: self.updated,
            rejected: self.rejected,
            files: self.files_seen,
            total: self.total(),
        }
    }
}
