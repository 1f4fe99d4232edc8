//! Tracker scrape dumps.
//!
//! A scrape response is a bencoded dictionary
//! `files: { <info hash>: { complete, downloaded, incomplete } }`. Entries
//! are written to a text report and summarised as band statistics.

mod stats;

pub use stats::{BandStats, ScrapeStats};

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::metainfo::bencode::{self, Value};

const REPORT_SUFFIX: &str = ".decoded.txt";
const COUNT_WIDTH: usize = 8;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Malformed scrape: {0}")]
    Malformed(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Counters for one info-hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeEntry {
    /// Hex encoding of the dictionary key.
    pub hash: String,
    pub seeders: u64,
    pub downloaded: u64,
    pub leechers: u64,
}

impl ScrapeEntry {
    fn is_zero_hash(&self) -> bool {
        self.hash.bytes().all(|b| b == b'0')
    }
}

/// Minimum counters for an entry to appear in the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Thresholds {
    pub seeders: u64,
    pub downloaded: u64,
    pub leechers: u64,
}

impl Thresholds {
    fn accepts(&self, entry: &ScrapeEntry) -> bool {
        entry.seeders >= self.seeders
            && entry.downloaded >= self.downloaded
            && entry.leechers >= self.leechers
    }
}

/// Decode a scrape response, entries sorted by key.
pub fn decode_scrape(bytes: &[u8]) -> Result<Vec<ScrapeEntry>, ScrapeError> {
    let root = bencode::decode(bytes).map_err(|e| ScrapeError::Malformed(e.to_string()))?;
    let files = root
        .get(b"files")
        .and_then(Value::as_dict)
        .ok_or_else(|| ScrapeError::Malformed("no files dictionary".to_string()))?;

    let mut entries = files
        .iter()
        .map(|(key, item)| {
            Ok(ScrapeEntry {
                hash: hex::encode(key),
                seeders: counter(item, b"complete")?,
                downloaded: counter(item, b"downloaded")?,
                leechers: counter(item, b"incomplete")?,
            })
        })
        .collect::<Result<Vec<_>, ScrapeError>>()?;

    entries.sort_by(|a, b| a.hash.cmp(&b.hash));
    Ok(entries)
}

fn counter(item: &Value<'_>, key: &[u8]) -> Result<u64, ScrapeError> {
    let name = String::from_utf8_lossy(key);
    match item.get(key) {
        None => Ok(0),
        Some(value) => value
            .as_int()
            .and_then(|n| u64::try_from(n).ok())
            .ok_or_else(|| ScrapeError::Malformed(format!("{name} is not a non-negative integer"))),
    }
}

/// Write the report for `entries` to `out` and compute statistics over all
/// of them, including entries left out of the report.
pub fn write_report<W: Write>(
    entries: &[ScrapeEntry],
    thresholds: &Thresholds,
    terse: bool,
    mut out: W,
) -> io::Result<ScrapeStats> {
    if !terse {
        writeln!(out, "info hash\t\t\t\t\t seeders      downloaded\tleechers")?;
    }

    let mut stats = ScrapeStats::default();
    for entry in entries {
        stats.seeders.add(entry.seeders);
        stats.downloaded.add(entry.downloaded);
        stats.leechers.add(entry.leechers);
        stats.entries += 1;

        if !thresholds.accepts(entry) || entry.is_zero_hash() {
            continue;
        }

        if terse {
            writeln!(out, "{}", entry.hash)?;
        } else {
            writeln!(
                out,
                "{}\t{:>w$}\t{:>w$}\t{:>w$}",
                entry.hash,
                entry.seeders,
                entry.downloaded,
                entry.leechers,
                w = COUNT_WIDTH
            )?;
        }
    }

    out.flush()?;
    Ok(stats)
}

/// Where the report for `input` is written.
pub fn report_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(REPORT_SUFFIX);
    PathBuf::from(name)
}

/// Result of [`dump`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeDump {
    pub report: PathBuf,
    pub stats: ScrapeStats,
}

impl ScrapeDump {
    /// Summary row: current local time, then the band statistics.
    pub fn summary_row(&self) -> String {
        format!("{}\t{}", Local::now().format("%Y-%m-%d %H:%M"), self.stats.to_row())
    }
}

/// Decode the scrape in `input` and write its report next to it.
pub fn dump(input: &Path, thresholds: &Thresholds, terse: bool) -> Result<ScrapeDump, ScrapeError> {
    let bytes = fs::read(input).map_err(|source| ScrapeError::Io {
        path: input.to_path_buf(),
        source,
    })?;
    let entries = decode_scrape(&bytes)?;
    debug!(entries = entries.len(), "Decoded scrape");

    let report = report_path(input);
    let io_error = |source| ScrapeError::Io {
        path: report.clone(),
        source,
    };
    let file = File::create(&report).map_err(io_error)?;
    let stats = write_report(&entries, thresholds, terse, BufWriter::new(file)).map_err(io_error)?;

    Ok(ScrapeDump { report, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::BencodeValue;
    use tempfile::TempDir;

    fn item(complete: i64, downloaded: i64, incomplete: i64) -> BencodeValue {
        BencodeValue::dict([
            ("complete", BencodeValue::Int(complete)),
            ("downloaded", BencodeValue::Int(downloaded)),
            ("incomplete", BencodeValue::Int(incomplete)),
        ])
    }

    fn scrape(entries: Vec<([u8; 20], BencodeValue)>) -> Vec<u8> {
        BencodeValue::dict([(
            "files",
            BencodeValue::Dict(entries.into_iter().map(|(k, v)| (k.to_vec(), v)).collect()),
        )])
        .encode()
    }

    fn sample() -> Vec<u8> {
        scrape(vec![
            ([0xbb; 20], item(12, 3400, 0)),
            ([0x00; 20], item(5, 5, 5)),
            ([0xaa; 20], item(1, 20, 7)),
        ])
    }

    #[test]
    fn test_decode_sorted_by_key() {
        let entries = decode_scrape(&sample()).unwrap();
        let hashes: Vec<_> = entries.iter().map(|e| &e.hash[..2]).collect();
        assert_eq!(hashes, ["00", "aa", "bb"]);
        assert_eq!(
            entries[1],
            ScrapeEntry {
                hash: "aa".repeat(20),
                seeders: 1,
                downloaded: 20,
                leechers: 7,
            }
        );
    }

    #[test]
    fn test_missing_counters_are_zero() {
        let bytes = scrape(vec![([1; 20], BencodeValue::dict([("complete", BencodeValue::Int(4))]))]);
        let entries = decode_scrape(&bytes).unwrap();
        assert_eq!((entries[0].seeders, entries[0].downloaded, entries[0].leechers), (4, 0, 0));
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(decode_scrape(b"garbage"), Err(ScrapeError::Malformed(_))));
        assert!(matches!(decode_scrape(b"de"), Err(ScrapeError::Malformed(_))));
        let negative = scrape(vec![([1; 20], item(-1, 0, 0))]);
        assert!(matches!(decode_scrape(&negative), Err(ScrapeError::Malformed(_))));
    }

    #[test]
    fn test_report_skips_zero_hash_and_thresholds() {
        let entries = decode_scrape(&sample()).unwrap();
        let mut out = Vec::new();
        let thresholds = Thresholds {
            seeders: 2,
            ..Thresholds::default()
        };
        let stats = write_report(&entries, &thresholds, false, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("info hash\t"));
        assert_eq!(lines[1], format!("{}\t{:>8}\t{:>8}\t{:>8}", "bb".repeat(20), 12, 3400, 0));

        // Statistics cover every entry.
        assert_eq!(stats.entries, 3);
        assert_eq!(stats.seeders.sum, 18);
        assert_eq!(stats.downloaded.thousands, 1);
        assert_eq!(stats.leechers.zero, 1);
    }

    #[test]
    fn test_terse_report() {
        let entries = decode_scrape(&sample()).unwrap();
        let mut out = Vec::new();
        write_report(&entries, &Thresholds::default(), true, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{}\n{}\n", "aa".repeat(20), "bb".repeat(20))
        );
    }

    #[test]
    fn test_dump_writes_next_to_input() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("scrape.bin");
        fs::write(&input, sample()).unwrap();

        let result = dump(&input, &Thresholds::default(), false).unwrap();

        assert_eq!(result.report, temp.path().join("scrape.bin.decoded.txt"));
        assert_eq!(fs::read_to_string(&result.report).unwrap().lines().count(), 3);
        assert!(result.summary_row().ends_with("\t3"));
    }

    #[test]
    fn test_dump_missing_input() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            dump(&temp.path().join("missing"), &Thresholds::default(), false),
            Err(ScrapeError::Io { .. })
        ));
    }
}
