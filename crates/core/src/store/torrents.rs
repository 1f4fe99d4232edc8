//! Offset-addressed access to `torrents.tsv`.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::StoreError;

/// Read/write handle on the record file.
///
/// Lines are addressed by the byte offsets collected in a
/// [`SortedIndex`](super::SortedIndex).
pub struct TorrentStore {
    path: PathBuf,
    file: File,
}

impl TorrentStore {
    /// Open the store for reading and writing, creating it if missing.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(StoreError::io(path))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the line starting at `offset`, without its newline.
    pub fn read_line_at(&mut self, offset: u64) -> Result<Vec<u8>, StoreError> {
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(StoreError::io(&self.path))?;

        let mut line = Vec::new();
        BufReader::new(&mut self.file)
            .read_until(b'\n', &mut line)
            .map_err(StoreError::io(&self.path))?;

        if line.last() == Some(&b'\n') {
            line.pop();
        }
        Ok(line)
    }

    /// Overwrite bytes starting at `offset`. Nothing is inserted or removed.
    pub fn overwrite_at(&mut self, offset: u64, bytes: &[u8]) -> Result<(), StoreError> {
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(StoreError::io(&self.path))?;
        self.file
            .write_all(bytes)
            .map_err(StoreError::io(&self.path))?;
        self.file.flush().map_err(StoreError::io(&self.path))
    }

    /// Append lines at the end of the store.
    ///
    /// A newline is inserted first if the store does not already end with
    /// one, so an unterminated last record is never extended.
    pub fn append<S: AsRef<str>>(&mut self, lines: &[S]) -> Result<(), StoreError> {
        if lines.is_empty() {
            return Ok(());
        }

        let end = self
            .file
            .seek(SeekFrom::End(0))
            .map_err(StoreError::io(&self.path))?;

        let needs_newline = if end > 0 {
            self.file
                .seek(SeekFrom::End(-1))
                .map_err(StoreError::io(&self.path))?;
            let mut last = [0u8; 1];
            self.file
                .read_exact(&mut last)
                .map_err(StoreError::io(&self.path))?;
            last[0] != b'\n'
        } else {
            false
        };

        let mut writer = BufWriter::new(&mut self.file);
        if needs_newline {
            writer.write_all(b"\n").map_err(StoreError::io(&self.path))?;
        }
        for line in lines {
            writer
                .write_all(line.as_ref().as_bytes())
                .and_then(|_| writer.write_all(b"\n"))
                .map_err(StoreError::io(&self.path))?;
        }
        writer.flush().map_err(StoreError::io(&self.path))?;
        drop(writer);

        self.file.sync_data().map_err(StoreError::io(&self.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_and_overwrite_at_offset() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("torrents.tsv");
        fs::write(&path, b"aaaa\nbbbb\ncccc\n").unwrap();

        let mut store = TorrentStore::open(&path).unwrap();
        assert_eq!(store.read_line_at(5).unwrap(), b"bbbb");

        store.overwrite_at(5, b"BB").unwrap();
        assert_eq!(store.read_line_at(5).unwrap(), b"BBbb");
        assert_eq!(fs::read(&path).unwrap(), b"aaaa\nBBbb\ncccc\n");
    }

    #[test]
    fn test_append_after_unterminated_line() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("torrents.tsv");
        fs::write(&path, b"aaaa").unwrap();

        let mut store = TorrentStore::open(&path).unwrap();
        store.append(&["bbbb", "cccc"]).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"aaaa\nbbbb\ncccc\n");
    }

    #[test]
    fn test_append_to_new_store() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("torrents.tsv");

        let mut store = TorrentStore::open(&path).unwrap();
        store.append(&[String::from("x")]).unwrap();
        store.append::<&str>(&[]).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"x\n");
    }
}
