use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use torrentdb_core::metrics;
use torrentdb_core::scrape;
use torrentdb_core::{
    decode_metainfo, sort_matches, Config, FilterPool, Info, Ingestor, Match, NameMatcher, Query,
    RunSummary, Searcher, StorePaths,
};

use crate::cli::{IngestArgs, ParseArgs, QueryArgs, ScrapeArgs};

const MIB: u64 = 1024 * 1024;

pub fn ingest(mut config: Config, args: IngestArgs) -> Result<RunSummary> {
    if let Some(dir) = args.torrent_dir {
        config.ingest.torrent_dir = dir;
    }
    if let Some(dir) = args.db_dir {
        config.store.dir = dir;
    }

    info!("Input directory: {:?}", config.ingest.torrent_dir);
    info!("Store directory: {:?}", config.store.dir);

    let summary = Ingestor::from_config(&config)
        .run()
        .context("Ingestion failed")?;

    if let Some(path) = &config.metrics.textfile {
        metrics::write_textfile(path)
            .with_context(|| format!("Failed to write metrics to {:?}", path))?;
    }

    Ok(summary)
}

pub async fn query(config: Config, args: QueryArgs) -> Result<String> {
    let dir: PathBuf = args.db.clone().unwrap_or(config.store.dir);
    let query = Query {
        matcher: NameMatcher::new(args.mode(), &args.search)?,
        filter: args.filter(),
        file_search: args.files,
    };

    let searcher = Searcher::new(StorePaths::new(dir), FilterPool::from_config(&config.query));
    let mut matches = searcher.search(query).await?;
    sort_matches(&mut matches, args.sort.into());

    if args.json {
        return Ok(serde_json::to_string_pretty(&matches)?);
    }
    Ok(format_matches(&matches))
}

fn format_matches(matches: &[Match]) -> String {
    let mut out = String::new();
    for m in matches {
        let r = &m.record;
        let _ = writeln!(
            out,
            "{}\t{:6}\t{:5}\t{}\t{}\t{:4}\t{}",
            r.hash,
            r.size_mib(),
            r.files,
            r.first_seen,
            r.last_seen,
            r.hits,
            r.name
        );
        for file in &m.files {
            let _ = writeln!(out, "{:8}   {}", file.length / MIB, file.path);
        }
    }
    let _ = write!(out, "Results: {}", matches.len());
    out
}

pub fn parse(args: ParseArgs) -> Result<String> {
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {:?}", args.file))?;
    let info = decode_metainfo(&bytes)
        .with_context(|| format!("Failed to decode {:?}", args.file))?;

    if args.json {
        return Ok(serde_json::to_string_pretty(&info)?);
    }
    Ok(format_info(&info, args.detail))
}

fn format_info(info: &Info, detail: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Name\t\t{}", info.name);
    let _ = writeln!(out, "Hash\t\t{}", info.hash);
    let _ = writeln!(out, "Files\t\t{}", info.files.len());
    let _ = write!(out, "Size(MiB)\t{}", info.length / MIB);

    if detail {
        let _ = write!(
            out,
            "\nPieces\t\t{}\nPieceLength\t{}\n",
            info.num_pieces, info.piece_length
        );
        for (i, file) in info.files.iter().enumerate() {
            let _ = write!(out, "\nFile{i}\t\t{}\nSize{i}(MiB)\t{}", file.path, file.length / MIB);
        }
    }
    out
}

pub fn scrape(args: ScrapeArgs) -> Result<String> {
    let dump = scrape::dump(&args.file, &args.thresholds(), args.terse)?;
    info!("Wrote {:?}", dump.report);
    Ok(dump.summary_row())
}
