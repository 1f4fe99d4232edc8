//! Fixed-width store records.
//!
//! One record per line:
//!
//! ```text
//! <hash:40>\t<size:14>\t<files:11>\t<first seen:10>\t<last seen:10>\t<hits:5>\t<name>
//! ```
//!
//! Numbers are right-aligned and space-padded. Every column before the name
//! has a fixed width, so a record can be rewritten in place without moving
//! any other byte of the store.

use chrono::NaiveDate;
use serde::Serialize;

use super::StoreError;
use crate::metainfo::{Info, InfoHash};

pub const SIZE_WIDTH: usize = 14;
pub const FILES_WIDTH: usize = 11;
pub const DATE_WIDTH: usize = 10;
pub const HITS_WIDTH: usize = 5;

/// Byte length of the fixed-width columns including their trailing tabs.
pub const PREFIX_LEN: usize =
    InfoHash::HEX_LEN + SIZE_WIDTH + FILES_WIDTH + 2 * DATE_WIDTH + HITS_WIDTH + 6;

/// Largest hit count that fits its column.
pub const MAX_HITS: u64 = 99_999;

const DATE_FORMAT: &str = "%Y-%m-%d";
const FIELD_COUNT: usize = 7;

/// One torrent in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub hash: InfoHash,
    /// Total size in bytes.
    pub size: u64,
    /// Number of files.
    pub files: u64,
    pub first_seen: NaiveDate,
    pub last_seen: NaiveDate,
    /// Number of times the torrent has been ingested.
    pub hits: u64,
    pub name: String,
}

impl Record {
    /// A first sighting of `info`.
    pub fn from_info(info: &Info, seen: NaiveDate) -> Self {
        Self {
            hash: info.hash,
            size: info.length,
            files: info.files.len() as u64,
            first_seen: seen,
            last_seen: seen,
            hits: 1,
            name: info.name.clone(),
        }
    }

    /// Size in MiB, as shown by the query tool.
    pub fn size_mib(&self) -> u64 {
        self.size / (1024 * 1024)
    }

    /// Encode the fixed-width columns, including the tab before the name.
    ///
    /// Fails with [`StoreError::FieldOverflow`] when a value is wider than
    /// its column; the result is always exactly [`PREFIX_LEN`] bytes.
    pub fn encode_prefix(&self) -> Result<String, StoreError> {
        let size = fit("size", self.size.to_string(), SIZE_WIDTH)?;
        let files = fit("files", self.files.to_string(), FILES_WIDTH)?;
        let first_seen = fit(
            "first seen",
            self.first_seen.format(DATE_FORMAT).to_string(),
            DATE_WIDTH,
        )?;
        let last_seen = fit(
            "last seen",
            self.last_seen.format(DATE_FORMAT).to_string(),
            DATE_WIDTH,
        )?;
        let hits = fit("hits", self.hits.to_string(), HITS_WIDTH)?;

        Ok(format!(
            "{}\t{:>SIZE_WIDTH$}\t{:>FILES_WIDTH$}\t{:>DATE_WIDTH$}\t{:>DATE_WIDTH$}\t{:>HITS_WIDTH$}\t",
            self.hash, size, files, first_seen, last_seen, hits
        ))
    }

    /// Encode the full line, without the trailing newline.
    pub fn encode(&self) -> Result<String, StoreError> {
        let mut line = self.encode_prefix()?;
        line.push_str(&self.name);
        Ok(line)
    }

    /// Decode one line (without its newline).
    pub fn decode(line: &str) -> Result<Self, StoreError> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != FIELD_COUNT {
            return Err(StoreError::MalformedRecord(format!(
                "expected {FIELD_COUNT} fields, found {}: {line:?}",
                fields.len()
            )));
        }

        let hash = fields[0]
            .trim()
            .parse::<InfoHash>()
            .map_err(|e| StoreError::MalformedRecord(e.to_string()))?;

        Ok(Self {
            hash,
            size: parse_number("size", fields[1])?,
            files: parse_number("files", fields[2])?,
            first_seen: parse_date("first seen", fields[3])?,
            last_seen: parse_date("last seen", fields[4])?,
            hits: parse_number("hits", fields[5])?,
            name: fields[6].to_string(),
        })
    }
}

/// Length of the fixed-width part of an encoded line: everything up to and
/// including the tab that precedes the name.
pub fn prefix_len(line: &[u8]) -> Option<usize> {
    line.iter()
        .enumerate()
        .filter(|(_, &b)| b == b'\t')
        .nth(FIELD_COUNT - 2)
        .map(|(i, _)| i + 1)
}

fn fit(field: &'static str, value: String, width: usize) -> Result<String, StoreError> {
    if value.len() > width {
        return Err(StoreError::FieldOverflow {
            field,
            value,
            width,
        });
    }
    Ok(value)
}

fn parse_number(field: &str, raw: &str) -> Result<u64, StoreError> {
    raw.trim()
        .parse()
        .map_err(|_| StoreError::MalformedRecord(format!("invalid {field}: {raw:?}")))
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| StoreError::MalformedRecord(format!("invalid {field}: {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record() -> Record {
        Record {
            hash: "0123456789abcdef0123456789abcdef01234567".parse().unwrap(),
            size: 734_003_200,
            files: 3,
            first_seen: date(2019, 3, 1),
            last_seen: date(2019, 4, 2),
            hits: 7,
            name: "Some Linux ISO".to_string(),
        }
    }

    #[test]
    fn test_encode_layout() {
        let line = record().encode().unwrap();
        assert_eq!(
            line,
            "0123456789abcdef0123456789abcdef01234567\t     734003200\t          3\t2019-03-01\t2019-04-02\t    7\tSome Linux ISO"
        );
        assert_eq!(PREFIX_LEN, 96);
        assert_eq!(record().encode_prefix().unwrap().len(), PREFIX_LEN);
        assert_eq!(prefix_len(line.as_bytes()), Some(PREFIX_LEN));
    }

    #[test]
    fn test_decode_encode_preserves_line() {
        let line = record().encode().unwrap();
        let decoded = Record::decode(&line).unwrap();
        assert_eq!(decoded, record());
        assert_eq!(decoded.encode().unwrap(), line);
    }

    #[test]
    fn test_width_stable_for_extreme_values() {
        let mut r = record();
        r.size = 99_999_999_999_999;
        r.files = 0;
        r.hits = MAX_HITS;
        r.name = String::new();
        let line = r.encode().unwrap();
        assert_eq!(line.len(), PREFIX_LEN);
        assert_eq!(Record::decode(&line).unwrap().encode().unwrap(), line);
    }

    #[test]
    fn test_name_may_contain_spaces() {
        let mut r = record();
        r.name = "  padded  name ".to_string();
        let decoded = Record::decode(&r.encode().unwrap()).unwrap();
        assert_eq!(decoded.name, "  padded  name ");
    }

    #[test]
    fn test_overflow_rejected() {
        let mut r = record();
        r.hits = MAX_HITS + 1;
        assert!(matches!(
            r.encode(),
            Err(StoreError::FieldOverflow { field: "hits", width: HITS_WIDTH, .. })
        ));

        let mut r = record();
        r.size = 100_000_000_000_000;
        assert!(matches!(
            r.encode_prefix(),
            Err(StoreError::FieldOverflow { field: "size", .. })
        ));
    }

    #[test]
    fn test_decode_rejects_wrong_field_count() {
        assert!(matches!(
            Record::decode("abc\t1\t2"),
            Err(StoreError::MalformedRecord(_))
        ));
        let line = format!("{}\textra", record().encode().unwrap());
        assert!(matches!(
            Record::decode(&line),
            Err(StoreError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_decode_rejects_bad_numbers_and_dates() {
        let line = record().encode().unwrap();
        let bad_size = line.replacen("734003200", "73400x200", 1);
        assert!(matches!(
            Record::decode(&bad_size),
            Err(StoreError::MalformedRecord(_))
        ));
        let bad_date = line.replacen("2019-03-01", "2019-13-01", 1);
        assert!(matches!(
            Record::decode(&bad_date),
            Err(StoreError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_decode_accepts_unpadded_numbers() {
        let line = "0123456789abcdef0123456789abcdef01234567\t5\t1\t2020-01-01\t2020-01-02\t2\tx";
        let r = Record::decode(line).unwrap();
        assert_eq!((r.size, r.files, r.hits), (5, 1, 2));
    }

    #[test]
    fn test_size_mib() {
        assert_eq!(record().size_mib(), 700);
    }
}
