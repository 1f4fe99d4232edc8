//! Testing utilities: metainfo builders and store fixtures.
//!
//! # Example
//!
//! ```rust,ignore
//! use torrentdb_core::testing::{fixtures, TorrentBuilder};
//!
//! let bytes = TorrentBuilder::multi("album")
//!     .file(&["01.flac"], 1024)
//!     .build();
//! fixtures::write_torrent(input_dir, "ab/cd/album.torrent", &bytes, mtime)?;
//! ```

mod torrent_builder;

pub use torrent_builder::{BencodeValue, TorrentBuilder};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::fs;
    use std::io;
    use std::path::{Path, PathBuf};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    /// Write `bytes` to `root/relative` and set its modification time.
    ///
    /// Parent directories are created as needed.
    pub fn write_torrent(
        root: &Path,
        relative: &str,
        bytes: &[u8],
        mtime: SystemTime,
    ) -> io::Result<PathBuf> {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        set_mtime(&path, mtime)?;
        Ok(path)
    }

    /// Set the modification time of an existing file.
    pub fn set_mtime(path: &Path, mtime: SystemTime) -> io::Result<()> {
        fs::File::options().write(true).open(path)?.set_modified(mtime)
    }

    /// A `SystemTime` from unix seconds.
    pub fn unix_time(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }
}
