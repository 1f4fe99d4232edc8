pub mod config;
pub mod ingest;
pub mod metainfo;
pub mod metrics;
pub mod query;
pub mod scrape;
pub mod store;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError,
};
pub use ingest::{ErrorKind, GateDecision, IngestError, Ingestor, RunSummary, ScanWindow};
pub use metainfo::{decode_info, decode_metainfo, Info, InfoHash, MetainfoError, ValidationError};
pub use query::{
    sort_matches, FilterPool, Match, MatchMode, NameMatcher, Query, QueryError, RecordFilter,
    Searcher, SortKey,
};
pub use scrape::{ScrapeDump, ScrapeError, ScrapeStats, Thresholds};
pub use store::{Record, SortedIndex, StoreError, StorePaths};
