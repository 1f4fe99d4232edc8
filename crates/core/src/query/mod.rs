//! Read-only queries over a store.
//!
//! Records are streamed from `torrents.tsv` through a [`FilterPool`];
//! optionally, file listings are searched first and the torrents they
//! belong to are included regardless of their name.

mod filter;
mod matcher;
mod pool;
mod search;

pub use filter::RecordFilter;
pub use matcher::{MatchMode, NameMatcher};
pub use pool::FilterPool;
pub use search::{sort_matches, Match, Query, Searcher, SortKey};

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Invalid search pattern: {0}")]
    InvalidPattern(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Query worker failed: {0}")]
    Worker(String),
}
