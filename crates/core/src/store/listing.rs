//! `files.tsv`: per-torrent file listings.
//!
//! ```text
//! hash: <hex>
//! <length>\t<path>
//! ...
//! ---
//! ```

use std::fs::{File, OpenOptions};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::StoreError;
use crate::metainfo::{Info, InfoHash};

const HASH_PREFIX: &str = "hash: ";
const TERMINATOR: &str = "---";

/// One file line of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedFile {
    pub length: u64,
    pub path: String,
}

/// All files of one torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileListing {
    pub hash: InfoHash,
    pub files: Vec<ListedFile>,
}

/// Appends listings; each block is flushed as soon as it is written.
pub struct ListingWriter {
    path: PathBuf,
    file: File,
}

impl ListingWriter {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(StoreError::io(path))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn write(&mut self, info: &Info) -> Result<(), StoreError> {
        let mut block = format!("{HASH_PREFIX}{}\n", info.hash);
        for file in &info.files {
            block.push_str(&format!("{}\t{}\n", file.length, file.path));
        }
        block.push_str(TERMINATOR);
        block.push('\n');

        self.file
            .write_all(block.as_bytes())
            .and_then(|_| self.file.flush())
            .map_err(StoreError::io(&self.path))
    }
}

/// Parse every listing block from `reader`.
///
/// A trailing block without its terminator is ignored.
pub fn read_listings<R: BufRead>(reader: R) -> Result<Vec<FileListing>, StoreError> {
    let mut listings = Vec::new();
    let mut current: Option<FileListing> = None;

    for (n, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| StoreError::MalformedListing(format!("line {}: {e}", n + 1)))?;

        if line == TERMINATOR {
            let listing = current.take().ok_or_else(|| {
                StoreError::MalformedListing(format!("line {}: terminator without header", n + 1))
            })?;
            listings.push(listing);
        } else if let Some(hex) = line.strip_prefix(HASH_PREFIX) {
            let hash = hex.trim().parse::<InfoHash>().map_err(|e| {
                StoreError::MalformedListing(format!("line {}: {e}", n + 1))
            })?;
            current = Some(FileListing {
                hash,
                files: Vec::new(),
            });
        } else {
            let listing = current.as_mut().ok_or_else(|| {
                StoreError::MalformedListing(format!("line {}: file outside a block", n + 1))
            })?;
            let (length, path) = line
                .split_once('\t')
                .and_then(|(length, path)| Some((length.trim().parse::<u64>().ok()?, path)))
                .ok_or_else(|| StoreError::MalformedListing(format!("line {}: {line:?}", n + 1)))?;
            listing.files.push(ListedFile {
                length,
                path: path.to_string(),
            });
        }
    }

    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metainfo::decode_metainfo;
    use crate::testing::TorrentBuilder;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_write_block_format() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("files.tsv");
        let info = decode_metainfo(
            &TorrentBuilder::multi("album")
                .file(&["01.flac"], 10)
                .file(&["02.flac"], 20)
                .build(),
        )
        .unwrap();

        let mut writer = ListingWriter::open(&path).unwrap();
        writer.write(&info).unwrap();

        let expected = format!(
            "hash: {}\n10\talbum/01.flac\n20\talbum/02.flac\n---\n",
            info.hash
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), expected);
    }

    #[test]
    fn test_read_listings() {
        let a = InfoHash([0xaa; 20]);
        let b = InfoHash([0xbb; 20]);
        let text = format!(
            "hash: {a}\n1\tx/one\n2\tx/two words\n---\nhash: {b}\n3\ty\n---\nhash: {a}\n9\tpartial\n"
        );

        let listings = read_listings(text.as_bytes()).unwrap();

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].hash, a);
        assert_eq!(
            listings[0].files[1],
            ListedFile {
                length: 2,
                path: "x/two words".to_string()
            }
        );
        assert_eq!(listings[1].files.len(), 1);
    }

    #[test]
    fn test_read_listings_rejects_garbage() {
        assert!(read_listings(&b"---\n"[..]).is_err());
        assert!(read_listings(&b"1\tx\n"[..]).is_err());
        let bad = format!("hash: {}\nnot a number\tx\n---\n", InfoHash([1; 20]));
        assert!(read_listings(bad.as_bytes()).is_err());
    }
}
