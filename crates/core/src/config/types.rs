use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Store location
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Directory holding torrents.tsv, files.tsv, stats.txt and error.log
    #[serde(default = "default_store_dir")]
    pub dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
        }
    }
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("db")
}

/// Ingestion input discovery
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Root of the directory tree holding .torrent files
    #[serde(default = "default_torrent_dir")]
    pub torrent_dir: PathBuf,
    /// Glob, relative to `torrent_dir`, selecting input files
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            torrent_dir: default_torrent_dir(),
            pattern: default_pattern(),
        }
    }
}

fn default_torrent_dir() -> PathBuf {
    PathBuf::from("torrents")
}

fn default_pattern() -> String {
    "*/*/*.torrent".to_string()
}

/// Query worker pool
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryConfig {
    /// Number of concurrent filter workers
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Capacity of the bounded work queue
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_depth: default_queue_depth(),
        }
    }
}

fn default_workers() -> usize {
    32
}

fn default_queue_depth() -> usize {
    1024
}

/// Metrics output
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetricsConfig {
    /// Write Prometheus text metrics here after each ingestion run
    #[serde(default)]
    pub textfile: Option<PathBuf>,
}
