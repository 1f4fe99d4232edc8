//! `error.log`: one line per rejected input.

use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use super::StoreError;

/// Destination for per-file rejections.
pub trait ErrorSink {
    /// Record that the input identified by `source` was rejected.
    fn record(&mut self, source: &str, error: &dyn Display) -> Result<(), StoreError>;
}

/// Appends `YYYY/MM/DD HH:MM:SS <source> <error>` lines to a file.
///
/// The file is only created once something is rejected.
pub struct ErrorLog {
    path: PathBuf,
    file: Option<File>,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ErrorSink for ErrorLog {
    fn record(&mut self, source: &str, error: &dyn Display) -> Result<(), StoreError> {
        let mut file = match self.file.take() {
            Some(file) => file,
            None => OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .map_err(StoreError::io(&self.path))?,
        };

        let line = format!(
            "{} {} {}\n",
            Local::now().format("%Y/%m/%d %H:%M:%S"),
            source,
            error
        );
        let written = file.write_all(line.as_bytes());
        self.file = Some(file);
        written.map_err(StoreError::io(&self.path))
    }
}

impl ErrorSink for Vec<(String, String)> {
    fn record(&mut self, source: &str, error: &dyn Display) -> Result<(), StoreError> {
        self.push((source.to_string(), error.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_error_log_appends_lines() {
        let temp = TempDir::new().unwrap();
        let mut log = ErrorLog::new(temp.path().join("error.log"));
        assert!(!log.path().exists());

        log.record("a/b/c.torrent", &"Torrent has zero pieces").unwrap();
        log.record("0123", &"bad name").unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" a/b/c.torrent Torrent has zero pieces"));
        assert!(lines[1].ends_with(" 0123 bad name"));
    }

    #[test]
    fn test_vec_sink_collects() {
        let mut sink: Vec<(String, String)> = Vec::new();
        sink.record("src", &42).unwrap();
        assert_eq!(sink, vec![("src".to_string(), "42".to_string())]);
    }
}
