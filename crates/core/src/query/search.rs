use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::{FilterPool, NameMatcher, QueryError, RecordFilter};
use crate::metainfo::InfoHash;
use crate::store::{read_listings, ListedFile, Record, StoreError, StorePaths};

/// What to look for.
#[derive(Debug, Clone)]
pub struct Query {
    pub matcher: NameMatcher,
    pub filter: RecordFilter,
    /// Also match against file paths in `files.tsv`.
    pub file_search: bool,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            matcher: NameMatcher::everything(),
            filter: RecordFilter::default(),
            file_search: false,
        }
    }
}

impl Query {
    fn accepts(&self, record: &Record) -> bool {
        self.matcher.matches(&record.name) && self.filter.accepts(record)
    }
}

/// One result: the record, plus its file list when it was found through a
/// file path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    #[serde(flatten)]
    pub record: Record,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<ListedFile>,
}

/// Result ordering. Every key sorts ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Hits,
    /// Case-insensitive.
    Name,
    Size,
    Files,
    FirstSeen,
    LastSeen,
}

pub fn sort_matches(matches: &mut [Match], key: SortKey) {
    match key {
        SortKey::Hits => matches.sort_by_key(|m| m.record.hits),
        SortKey::Name => matches.sort_by_cached_key(|m| m.record.name.to_lowercase()),
        SortKey::Size => matches.sort_by_key(|m| m.record.size),
        SortKey::Files => matches.sort_by_key(|m| m.record.files),
        SortKey::FirstSeen => matches.sort_by_key(|m| m.record.first_seen),
        SortKey::LastSeen => matches.sort_by_key(|m| m.record.last_seen),
    }
}

/// Read-only search over a store.
pub struct Searcher {
    paths: StorePaths,
    pool: FilterPool,
}

impl Searcher {
    pub fn new(paths: StorePaths, pool: FilterPool) -> Self {
        Self { paths, pool }
    }

    /// Run `query` and return matches in no particular order.
    pub async fn search(&self, query: Query) -> Result<Vec<Match>, QueryError> {
        let query = Arc::new(query);

        let mut by_file = if query.file_search {
            self.search_files(&query).await?
        } else {
            HashMap::new()
        };

        let path = self.paths.torrents();
        let file = File::open(&path).map_err(StoreError::io(&path))?;

        // Torrents found through a file path skip the name test.
        let mut direct = Vec::new();
        let records = BufReader::new(file).lines().filter_map(|line| {
            let record = line
                .map_err(|e| QueryError::from(StoreError::io(&path)(e)))
                .and_then(|line| Ok(Record::decode(&line)?));
            match record {
                Ok(record) if by_file.contains_key(&record.hash) => {
                    if query.filter.accepts(&record) {
                        direct.push(record);
                    }
                    None
                }
                other => Some(other),
            }
        });

        let predicate = {
            let query = Arc::clone(&query);
            move |record: &Record| query.accepts(record)
        };
        let mut matches: Vec<Match> = self
            .pool
            .filter(records, predicate)
            .await?
            .into_iter()
            .map(|record| Match {
                record,
                files: Vec::new(),
            })
            .collect();

        for record in direct {
            let files = by_file.remove(&record.hash).unwrap_or_default();
            matches.push(Match { record, files });
        }

        debug!(results = matches.len(), "Query finished");
        Ok(matches)
    }

    /// File listings with at least one path accepted by the name matcher.
    async fn search_files(
        &self,
        query: &Arc<Query>,
    ) -> Result<HashMap<InfoHash, Vec<ListedFile>>, QueryError> {
        let path = self.paths.files();
        let file = File::open(&path).map_err(StoreError::io(&path))?;
        let listings = read_listings(BufReader::new(file))?;

        let query = Arc::clone(query);
        let found = self
            .pool
            .filter(listings.into_iter().map(Ok), move |listing| {
                listing.files.iter().any(|f| query.matcher.matches(&f.path))
            })
            .await?;

        debug!(listings = found.len(), "File search finished");
        Ok(found.into_iter().map(|l| (l.hash, l.files)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{Ingestor, ScanWindow};
    use crate::query::MatchMode;
    use crate::testing::{fixtures, TorrentBuilder};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    const MIB: i64 = 1024 * 1024;

    struct Store {
        _temp: TempDir,
        searcher: Searcher,
    }

    fn store(torrents: &[TorrentBuilder]) -> Store {
        let temp = TempDir::new().unwrap();
        let paths = StorePaths::new(temp.path().join("db"));
        let input = temp.path().join("in");

        let files: Vec<_> = torrents
            .iter()
            .enumerate()
            .map(|(i, t)| {
                fixtures::write_torrent(
                    &input,
                    &format!("00/00/{i}.torrent"),
                    &t.build(),
                    fixtures::unix_time(1_600_000_000),
                )
                .unwrap()
            })
            .collect();

        let mut errors = Vec::new();
        Ingestor::new(paths.clone(), &input, "*/*/*.torrent")
            .ingest(&files, ScanWindow::unbounded(), &mut errors)
            .unwrap();
        assert!(errors.is_empty());

        Store {
            _temp: temp,
            searcher: Searcher::new(paths, FilterPool::new(3, 2)),
        }
    }

    fn names(matches: &[Match]) -> Vec<&str> {
        matches.iter().map(|m| m.record.name.as_str()).collect()
    }

    fn sample() -> Store {
        store(&[
            TorrentBuilder::single("Gentoo amd64 minimal", 500 * MIB),
            TorrentBuilder::single("Debian netinst", 400 * MIB),
            TorrentBuilder::multi("Music Collection")
                .file(&["gentoo-theme.ogg"], 3 * MIB)
                .file(&["other.ogg"], 4 * MIB),
            TorrentBuilder::single("gentoo stage3", 200 * MIB),
        ])
    }

    #[tokio::test]
    async fn test_name_search() {
        let s = sample();
        let query = Query {
            matcher: NameMatcher::new(MatchMode::Ordered, "gentoo").unwrap(),
            ..Query::default()
        };
        let mut matches = s.searcher.search(query).await.unwrap();
        sort_matches(&mut matches, SortKey::Name);
        assert_eq!(names(&matches), ["Gentoo amd64 minimal", "gentoo stage3"]);
        assert!(matches.iter().all(|m| m.files.is_empty()));
    }

    #[tokio::test]
    async fn test_numeric_filter_applies() {
        let s = sample();
        let query = Query {
            matcher: NameMatcher::new(MatchMode::Any, "gentoo debian").unwrap(),
            filter: RecordFilter {
                size_mib: 300..=450,
                ..RecordFilter::default()
            },
            ..Query::default()
        };
        let matches = s.searcher.search(query).await.unwrap();
        assert_eq!(names(&matches), ["Debian netinst"]);
    }

    #[tokio::test]
    async fn test_file_search_attaches_files() {
        let s = sample();
        let query = Query {
            matcher: NameMatcher::new(MatchMode::Ordered, "gentoo").unwrap(),
            file_search: true,
            ..Query::default()
        };
        let mut matches = s.searcher.search(query).await.unwrap();
        sort_matches(&mut matches, SortKey::Size);

        assert_eq!(
            names(&matches),
            ["Music Collection", "gentoo stage3", "Gentoo amd64 minimal"]
        );
        let files: Vec<_> = matches[0].files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            files,
            ["Music Collection/gentoo-theme.ogg", "Music Collection/other.ogg"]
        );
    }

    #[tokio::test]
    async fn test_file_search_still_filters() {
        let s = sample();
        let query = Query {
            matcher: NameMatcher::new(MatchMode::Ordered, "gentoo-theme").unwrap(),
            filter: RecordFilter {
                files: 5..=10,
                ..RecordFilter::default()
            },
            file_search: true,
        };
        assert!(s.searcher.search(query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_store() {
        let temp = TempDir::new().unwrap();
        let searcher = Searcher::new(StorePaths::new(temp.path()), FilterPool::new(1, 1));
        assert!(matches!(
            searcher.search(Query::default()).await,
            Err(QueryError::Store(StoreError::Io { .. }))
        ));
    }

    #[test]
    fn test_sort_keys() {
        let make = |name: &str, hits: u64, day: u32| Match {
            record: Record {
                hash: InfoHash([hits as u8; 20]),
                size: hits * 10,
                files: 4 - hits,
                first_seen: NaiveDate::from_ymd_opt(2020, 1, day).unwrap(),
                last_seen: NaiveDate::from_ymd_opt(2020, 2, 4 - day).unwrap(),
                hits,
                name: name.to_string(),
            },
            files: Vec::new(),
        };
        let mut matches = vec![make("b", 2, 2), make("C", 3, 1), make("a", 1, 3)];

        sort_matches(&mut matches, SortKey::Hits);
        assert_eq!(names(&matches), ["a", "b", "C"]);
        sort_matches(&mut matches, SortKey::Name);
        assert_eq!(names(&matches), ["a", "b", "C"]);
        sort_matches(&mut matches, SortKey::Files);
        assert_eq!(names(&matches), ["C", "b", "a"]);
        sort_matches(&mut matches, SortKey::FirstSeen);
        assert_eq!(names(&matches), ["C", "b", "a"]);
        sort_matches(&mut matches, SortKey::LastSeen);
        assert_eq!(names(&matches), ["a", "b", "C"]);
        sort_matches(&mut matches, SortKey::Size);
        assert_eq!(names(&matches), ["a", "b", "C"]);
    }
}
