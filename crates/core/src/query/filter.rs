use std::ops::RangeInclusive;

use chrono::NaiveDate;

use crate::store::Record;

/// Inclusive numeric and date bounds on records.
///
/// Every range defaults to unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    /// Total size in MiB.
    pub size_mib: RangeInclusive<u64>,
    pub hits: RangeInclusive<u64>,
    pub files: RangeInclusive<u64>,
    pub first_seen: RangeInclusive<NaiveDate>,
    pub last_seen: RangeInclusive<NaiveDate>,
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self {
            size_mib: 0..=u64::MAX,
            hits: 0..=u64::MAX,
            files: 0..=u64::MAX,
            first_seen: NaiveDate::MIN..=NaiveDate::MAX,
            last_seen: NaiveDate::MIN..=NaiveDate::MAX,
        }
    }
}

impl RecordFilter {
    pub fn accepts(&self, record: &Record) -> bool {
        self.size_mib.contains(&record.size_mib())
            && self.hits.contains(&record.hits)
            && self.files.contains(&record.files)
            && self.first_seen.contains(&record.first_seen)
            && self.last_seen.contains(&record.last_seen)
    }
}
