//! Prometheus metrics for ingestion.
//!
//! Counters live in a process-local registry; the ingest command can dump
//! them in the text exposition format for a textfile collector.

use std::path::Path;

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

/// Registry holding every metric of this crate.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Input files handled, by outcome.
pub static INGEST_FILES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("torrentdb_ingest_files_total", "Input files handled by ingestion"),
        &["outcome"], // "appended", "updated", "duplicate", "rejected", "skipped"
    )
    .unwrap()
});

/// Rejected input files, by error kind.
pub static INGEST_REJECTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "torrentdb_ingest_rejections_total",
            "Input files rejected by ingestion",
        ),
        &["kind"], // "parse", "validation"
    )
    .unwrap()
});

/// Records in the store after the last run.
pub static STORE_RECORDS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("torrentdb_store_records", "Records in torrents.tsv").unwrap()
});

/// Duration of a complete ingestion run.
pub static INGEST_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "torrentdb_ingest_duration_seconds",
            "Duration of an ingestion run",
        )
        .buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0]),
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    registry.register(Box::new(INGEST_FILES.clone())).unwrap();
    registry
        .register(Box::new(INGEST_REJECTIONS.clone()))
        .unwrap();
    registry.register(Box::new(STORE_RECORDS.clone())).unwrap();
    registry
        .register(Box::new(INGEST_DURATION.clone()))
        .unwrap();
}

/// Encode all metrics in the Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Write all metrics to `path`, replacing it atomically.
pub fn write_textfile(path: &Path) -> std::io::Result<()> {
    let tmp = path.with_extension("prom.tmp");
    std::fs::write(&tmp, encode_metrics())?;
    std::fs::rename(&tmp, path)
}
