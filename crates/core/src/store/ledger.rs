//! `stats.txt`: one summary row per ingestion run.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use super::StoreError;

const HEADER_START: &str = "scan unixtime";

/// Counters written for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsRow {
    /// Unix time the run's scan window ended at.
    pub scan_time: i64,
    pub new: u64,
    pub updated: u64,
    pub rejected: u64,
    /// Input files matched by the glob.
    pub files: u64,
    /// Records in the store after the run.
    pub total: u64,
}

impl StatsRow {
    pub fn processed(&self) -> u64 {
        self.new + self.updated
    }
}

/// Append-only run ledger.
#[derive(Debug, Clone)]
pub struct StatsLedger {
    path: PathBuf,
}

impl StatsLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Scan time of the last recorded run, or `None` if no run completed yet.
    pub fn last_scan_time(&self) -> Result<Option<i64>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&self.path)(e)),
        };

        let Some(last) = contents.lines().rev().find(|l| !l.trim().is_empty()) else {
            return Ok(None);
        };
        if last.starts_with(HEADER_START) {
            return Ok(None);
        }

        let field = last.split('\t').next().unwrap_or_default();
        field
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| StoreError::MalformedLedger(format!("invalid scan time {field:?}")))
    }

    /// Append a row, writing the header first if the ledger is new.
    pub fn append(&self, row: &StatsRow) -> Result<(), StoreError> {
        let is_new = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(StoreError::io(&self.path))?;

        let mut text = String::new();
        if is_new {
            text.push_str(&header());
        }
        text.push_str(&format_row(row));

        file.write_all(text.as_bytes())
            .map_err(StoreError::io(&self.path))
    }
}

fn header() -> String {
    format!(
        "{HEADER_START}\tscan datetime\t{:>18}\t{:>10}\t{:>10}\t{:>10}\t{:>10}\t{:>10}\n",
        "new", "updated", "rejected", "processed", "files", "db total"
    )
}

fn format_row(row: &StatsRow) -> String {
    let datetime = DateTime::from_timestamp(row.scan_time, 0)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();

    format!(
        "{}\t{}\t{:>10}\t{:>10}\t{:>10}\t{:>10}\t{:>10}\t{:>10}\n",
        row.scan_time,
        datetime,
        row.new,
        row.updated,
        row.rejected,
        row.processed(),
        row.files,
        row.total
    )
}
