//! Ingestion engine: decode input files and fold them into the store.
//!
//! Each input goes through
//! `discovered → decoded → validated → {known | new} → {updated | appended}`,
//! or stops at `rejected` when decoding or validation fails. Known torrents
//! are rewritten in place; new ones are buffered and appended at the end of
//! the run.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use chrono::{DateTime, Local, NaiveDate, Utc};
use tracing::{debug, info, warn};

use super::{FileOutcome, GateDecision, IngestError, RunSummary, ScanWindow};
use crate::config::Config;
use crate::metainfo::{decode_metainfo, validate_info, Info, InfoHash, ValidationError};
use crate::metrics;
use crate::store::{
    prefix_len, ErrorLog, ErrorSink, IndexBuilder, ListingWriter, Record, ScanIndexBuilder,
    SortedIndex, StatsLedger, StoreError, StorePaths, TorrentStore, MAX_HITS,
};

/// Runs ingestion against one store directory.
///
/// Only one ingestor may run against a store at a time; nothing here locks
/// the store files.
pub struct Ingestor {
    paths: StorePaths,
    torrent_dir: PathBuf,
    pattern: String,
    index_builder: Box<dyn IndexBuilder>,
}

impl Ingestor {
    pub fn new(paths: StorePaths, torrent_dir: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            paths,
            torrent_dir: torrent_dir.into(),
            pattern: pattern.into(),
            index_builder: Box::new(ScanIndexBuilder),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            StorePaths::new(&config.store.dir),
            &config.ingest.torrent_dir,
            &config.ingest.pattern,
        )
    }

    /// Replace the index source (defaults to a full scan of the store).
    pub fn with_index_builder(mut self, builder: impl IndexBuilder + 'static) -> Self {
        self.index_builder = Box::new(builder);
        self
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// List input files matching the configured glob, in glob order.
    pub fn discover(&self) -> Result<Vec<PathBuf>, IngestError> {
        let root = self.torrent_dir.to_string_lossy();
        let full = format!(
            "{}/{}",
            glob::Pattern::escape(root.trim_end_matches('/')),
            self.pattern
        );

        let entries = glob::glob(&full).map_err(|e| IngestError::Pattern {
            pattern: full.clone(),
            reason: e.to_string(),
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| IngestError::Input {
                path: e.path().to_path_buf(),
                source: e.into_error(),
            })?;
            files.push(path);
        }
        Ok(files)
    }

    /// One complete run: discover inputs, ingest those inside the window
    /// since the previous run, and append the run to the stats ledger.
    pub fn run(&self) -> Result<RunSummary, IngestError> {
        let started = Instant::now();
        self.paths.ensure()?;

        let ledger = StatsLedger::new(self.paths.stats());
        let last_scan = ledger.last_scan_time()?;
        match last_scan.and_then(|t| DateTime::from_timestamp(t, 0)) {
            Some(t) => info!("Last scan: {}", t.with_timezone(&Local).format("%Y-%m-%d %H:%M")),
            None => info!("No previous scan recorded"),
        }

        let cutoff = Utc::now().timestamp();
        info!("Finding torrent files in {:?}", self.torrent_dir);
        let inputs = self.discover()?;

        let mut errors = ErrorLog::new(self.paths.error_log());
        let summary = self.ingest(&inputs, ScanWindow::new(last_scan, cutoff), &mut errors)?;

        ledger.append(&summary.stats_row())?;

        metrics::STORE_RECORDS.set(i64::try_from(summary.total()).unwrap_or(i64::MAX));
        metrics::INGEST_DURATION.observe(started.elapsed().as_secs_f64());

        info!(
            new = summary.new,
            updated = summary.updated,
            rejected = summary.rejected,
            skipped = summary.skipped,
            duplicates = summary.duplicates,
            files = summary.files_seen,
            total = summary.total(),
            "Ingestion finished"
        );
        Ok(summary)
    }

    /// Ingest `inputs` whose modification time falls inside `window`.
    ///
    /// Rejected files are reported to `errors` and counted; any other error
    /// stops the run immediately. Buffered new records are only appended
    /// once every input was handled.
    pub fn ingest(
        &self,
        inputs: &[PathBuf],
        window: ScanWindow,
        errors: &mut dyn ErrorSink,
    ) -> Result<RunSummary, IngestError> {
        self.paths.ensure()?;

        info!("Loading store index");
        let index = self.index_builder.build(&self.paths.torrents())?;

        let mut run = Run {
            store: TorrentStore::open(&self.paths.torrents())?,
            listings: ListingWriter::open(&self.paths.files())?,
            index: &index,
            errors,
            pending: Vec::new(),
            pending_hashes: HashSet::new(),
            summary: RunSummary {
                scan_time: window.cutoff,
                files_seen: inputs.len() as u64,
                pre_existing_total: index.len() as u64,
                ..Default::default()
            },
        };

        info!(inputs = inputs.len(), known = index.len(), "Processing torrent files");
        for path in inputs {
            let outcome = run.process(path, &window)?;
            debug!(path = %path.display(), outcome = outcome.as_str(), "Processed file");
            metrics::INGEST_FILES
                .with_label_values(&[outcome.as_str()])
                .inc();
            run.summary.record(outcome);
        }

        run.flush()
    }
}

/// State of one ingestion run.
struct Run<'a> {
    store: TorrentStore,
    listings: ListingWriter,
    index: &'a SortedIndex,
    errors: &'a mut dyn ErrorSink,
    /// Encoded lines for new records, appended at the end of the run.
    pending: Vec<String>,
    /// Hashes of `pending`, to suppress duplicates within a run.
    pending_hashes: HashSet<InfoHash>,
    summary: RunSummary,
}

impl Run<'_> {
    fn process(&mut self, path: &Path, window: &ScanWindow) -> Result<FileOutcome, IngestError> {
        let input_error = |source| IngestError::Input {
            path: path.to_path_buf(),
            source,
        };

        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(input_error)?;

        let decision = window.admit(unix_seconds(modified));
        if decision != GateDecision::Admit {
            return Ok(FileOutcome::Skipped(decision));
        }

        let bytes = fs::read(path).map_err(input_error)?;

        let info = match decode_metainfo(&bytes) {
            Ok(info) => info,
            Err(e) => return self.reject(&path.display().to_string(), e.into()),
        };

        if let Err(e) = validate_info(&info) {
            return self.reject(&info.hash.to_hex(), e.into());
        }

        let seen = DateTime::<Local>::from(modified).date_naive();

        match self.index.get(&info.hash) {
            Some(offset) => {
                update_in_place(&mut self.store, offset, &info.hash, seen)?;
                Ok(FileOutcome::Updated)
            }
            None => self.stage_new(&info, seen),
        }
    }

    /// Buffer a record for a hash not yet in the store and write its listing.
    fn stage_new(&mut self, info: &Info, seen: NaiveDate) -> Result<FileOutcome, IngestError> {
        if self.pending_hashes.contains(&info.hash) {
            return Ok(FileOutcome::Duplicate);
        }

        let line = match Record::from_info(info, seen).encode() {
            Ok(line) => line,
            Err(StoreError::FieldOverflow {
                field,
                value,
                width,
            }) => {
                let error = ValidationError::FieldOverflow {
                    field,
                    value,
                    width,
                };
                return self.reject(&info.hash.to_hex(), error.into());
            }
            Err(e) => return Err(e.into()),
        };

        self.listings.write(info)?;
        self.pending.push(line);
        self.pending_hashes.insert(info.hash);
        Ok(FileOutcome::Appended)
    }

    fn reject(&mut self, source: &str, error: IngestError) -> Result<FileOutcome, IngestError> {
        if !error.is_recoverable() {
            return Err(error);
        }

        let kind = error.kind();
        warn!(source, kind = kind.as_str(), "Rejected torrent: {}", error);
        metrics::INGEST_REJECTIONS
            .with_label_values(&[kind.as_str()])
            .inc();

        self.errors.record(source, &error)?;
        Ok(FileOutcome::Rejected(kind))
    }

    fn flush(mut self) -> Result<RunSummary, IngestError> {
        if !self.pending.is_empty() {
            info!(records = self.pending.len(), "Appending new records");
            self.store.append(&self.pending)?;
        }
        Ok(self.summary)
    }
}

/// Count one more sighting of the record at `offset`.
///
/// Only the fixed-width prefix is rewritten. The line is read back after the
/// write and must decode to exactly the expected record; any mismatch means
/// the offset table no longer describes the file.
pub fn update_in_place(
    store: &mut TorrentStore,
    offset: u64,
    hash: &InfoHash,
    seen: NaiveDate,
) -> Result<Record, IngestError> {
    let current_line = read_record_line(store, offset)?;
    let current = decode_at(&current_line, offset)?;

    if current.hash != *hash {
        return Err(IngestError::Consistency(format!(
            "modifying incorrect hash at offset {offset}: expected {hash}, found {}",
            current.hash
        )));
    }

    let mut updated = current.clone();
    if updated.hits >= MAX_HITS {
        warn!(hash = %hash, "Hit count saturated at {}", MAX_HITS);
        updated.hits = MAX_HITS;
    } else {
        updated.hits += 1;
    }
    updated.last_seen = seen;

    let prefix = updated
        .encode_prefix()
        .map_err(|e| IngestError::Consistency(format!("record {hash} cannot be re-encoded: {e}")))?;

    if prefix_len(current_line.as_bytes()) != Some(prefix.len()) {
        return Err(IngestError::Consistency(format!(
            "record {hash} at offset {offset} does not use the fixed column widths"
        )));
    }

    store.overwrite_at(offset, prefix.as_bytes())?;

    let written = decode_at(&read_record_line(store, offset)?, offset)?;
    if written != updated {
        return Err(IngestError::Consistency(format!(
            "writing hash failed: {hash} at offset {offset}"
        )));
    }

    Ok(updated)
}

fn read_record_line(store: &mut TorrentStore, offset: u64) -> Result<String, IngestError> {
    String::from_utf8(store.read_line_at(offset)?).map_err(|_| {
        IngestError::Consistency(format!("record at offset {offset} is not valid UTF-8"))
    })
}

fn decode_at(line: &str, offset: u64) -> Result<Record, IngestError> {
    Record::decode(line).map_err(|e| {
        IngestError::Consistency(format!("unreadable record at offset {offset}: {e}"))
    })
}

fn unix_seconds(time: SystemTime) -> i64 {
    DateTime::<Utc>::from(time).timestamp()
}
