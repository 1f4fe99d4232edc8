use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use torrentdb_core::{MatchMode, RecordFilter, SortKey, Thresholds};

#[derive(Debug, Parser)]
#[command(name = "torrentdb", version, about = "Flat-file catalogue of torrent metainfo")]
pub struct Cli {
    /// Configuration file (defaults to ./torrentdb.toml when present)
    #[arg(long, global = true, env = "TORRENTDB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest new and modified .torrent files into the store
    Ingest(IngestArgs),
    /// Search the store
    Query(QueryArgs),
    /// Print the metadata of one .torrent file
    Parse(ParseArgs),
    /// Decode a tracker scrape response
    Scrape(ScrapeArgs),
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Directory with the two-level torrent file tree
    #[arg(short = 't', long = "torrents")]
    pub torrent_dir: Option<PathBuf>,

    /// Store directory
    #[arg(short = 'd', long = "db")]
    pub db_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Store directory (defaults to store.dir from the configuration)
    pub db: Option<PathBuf>,

    /// Words to search for in torrent names
    #[arg(short = 'n', long = "name", default_value = "")]
    pub search: String,

    /// Also search file paths
    #[arg(short = 'N', long)]
    pub files: bool,

    /// Words may appear in any order
    #[arg(short = 'u', long, conflicts_with_all = ["any", "regex"])]
    pub unordered: bool,

    /// Any one word is enough
    #[arg(short = 'a', long, conflicts_with = "regex")]
    pub any: bool,

    /// Search string is a case-sensitive regular expression
    #[arg(short = 'r', long)]
    pub regex: bool,

    /// Minimum size in MiB
    #[arg(short = 's', long)]
    pub min_size: Option<u64>,
    /// Maximum size in MiB
    #[arg(short = 'S', long)]
    pub max_size: Option<u64>,

    /// Minimum hits
    #[arg(short = 'p', long)]
    pub min_hits: Option<u64>,
    /// Maximum hits
    #[arg(short = 'P', long)]
    pub max_hits: Option<u64>,

    /// Minimum number of files
    #[arg(short = 'f', long)]
    pub min_files: Option<u64>,
    /// Maximum number of files
    #[arg(short = 'F', long)]
    pub max_files: Option<u64>,

    /// Earliest first-seen date (YYYY-MM-DD)
    #[arg(short = 'd', long)]
    pub first_seen_from: Option<NaiveDate>,
    /// Latest first-seen date (YYYY-MM-DD)
    #[arg(short = 'D', long)]
    pub first_seen_to: Option<NaiveDate>,

    /// Earliest last-seen date (YYYY-MM-DD)
    #[arg(short = 'l', long)]
    pub last_seen_from: Option<NaiveDate>,
    /// Latest last-seen date (YYYY-MM-DD)
    #[arg(short = 'L', long)]
    pub last_seen_to: Option<NaiveDate>,

    /// Result ordering
    #[arg(long, value_enum, default_value_t = SortArg::Hits)]
    pub sort: SortArg,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

impl QueryArgs {
    pub fn mode(&self) -> MatchMode {
        if self.unordered {
            MatchMode::Unordered
        } else if self.any {
            MatchMode::Any
        } else if self.regex {
            MatchMode::Regex
        } else {
            MatchMode::Ordered
        }
    }

    pub fn filter(&self) -> RecordFilter {
        let default = RecordFilter::default();
        RecordFilter {
            size_mib: self.min_size.unwrap_or(*default.size_mib.start())
                ..=self.max_size.unwrap_or(*default.size_mib.end()),
            hits: self.min_hits.unwrap_or(*default.hits.start())
                ..=self.max_hits.unwrap_or(*default.hits.end()),
            files: self.min_files.unwrap_or(*default.files.start())
                ..=self.max_files.unwrap_or(*default.files.end()),
            first_seen: self.first_seen_from.unwrap_or(*default.first_seen.start())
                ..=self.first_seen_to.unwrap_or(*default.first_seen.end()),
            last_seen: self.last_seen_from.unwrap_or(*default.last_seen.start())
                ..=self.last_seen_to.unwrap_or(*default.last_seen.end()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Hits,
    Name,
    Size,
    Files,
    FirstSeen,
    LastSeen,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Hits => SortKey::Hits,
            SortArg::Name => SortKey::Name,
            SortArg::Size => SortKey::Size,
            SortArg::Files => SortKey::Files,
            SortArg::FirstSeen => SortKey::FirstSeen,
            SortArg::LastSeen => SortKey::LastSeen,
        }
    }
}

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// The .torrent file
    pub file: PathBuf,

    /// Also print piece information and every file
    #[arg(short = 'v', long = "detail")]
    pub detail: bool,

    /// Print the decoded metadata as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ScrapeArgs {
    /// The scrape response file
    pub file: PathBuf,

    /// Minimum seeders for an entry to be written
    #[arg(short = 's', long, default_value_t = 0)]
    pub seeders: u64,

    /// Minimum downloads for an entry to be written
    #[arg(short = 'd', long, default_value_t = 0)]
    pub downloaded: u64,

    /// Minimum leechers for an entry to be written
    #[arg(short = 'l', long, default_value_t = 0)]
    pub leechers: u64,

    /// Write only the info hashes
    #[arg(short = 't', long)]
    pub terse: bool,
}

impl ScrapeArgs {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            seeders: self.seeders,
            downloaded: self.downloaded,
            leechers: self.leechers,
        }
    }
}
