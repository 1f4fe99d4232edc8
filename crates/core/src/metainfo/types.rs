//! Types produced by the metainfo decoder.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Display name used when the info dictionary carries an empty name.
pub const EMPTY_NAME_PLACEHOLDER: &str = "__empty_name_field_in_info_dict__";

/// SHA-1 digest of the raw info dictionary.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InfoHash(pub [u8; 20]);

impl InfoHash {
    /// Length of the hex representation.
    pub const HEX_LEN: usize = 40;

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InfoHash({})", self.to_hex())
    }
}

/// Error parsing a hex info-hash.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid info hash: {0:?}")]
pub struct InvalidInfoHash(pub String);

impl FromStr for InfoHash {
    type Err = InvalidInfoHash;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != Self::HEX_LEN {
            return Err(InvalidInfoHash(s.to_string()));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| InvalidInfoHash(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for InfoHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for InfoHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A file inside a torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct File {
    /// Cleaned path, prefixed with the torrent name in multi-file mode.
    pub path: String,
    /// File size in bytes.
    pub length: u64,
    /// The declared path bytes before cleaning, joined with `/`.
    #[serde(skip)]
    pub raw_path: Vec<u8>,
}

/// Validated contents of a metainfo info dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Info {
    /// Display name (cleaned, never empty).
    pub name: String,
    /// Name bytes exactly as declared.
    #[serde(skip)]
    pub raw_name: Vec<u8>,
    /// SHA-1 of the raw info dictionary bytes.
    pub hash: InfoHash,
    /// Total size in bytes.
    pub length: u64,
    pub files: Vec<File>,
    pub piece_length: u32,
    pub num_pieces: u32,
}

/// Errors returned by [`decode_metainfo`](super::decode_metainfo).
#[derive(Debug, Error)]
pub enum MetainfoError {
    #[error("Error when decoding metainfo dictionary: {0}")]
    MalformedContainer(String),

    #[error("No info dict in torrent file")]
    MissingInfoDict,

    #[error("Error when decoding info dictionary: {0}")]
    MalformedInfoDict(String),

    #[error("Torrent has zero piece length")]
    ZeroPieceLength,

    #[error("Invalid piece data: {0} bytes is not a multiple of 20")]
    InvalidPieceTable(usize),

    #[error("Torrent has zero pieces")]
    ZeroPieces,

    #[error(
        "Invalid piece length: {num_pieces} pieces of {piece_length} bytes cannot hold {length} bytes"
    )]
    InvalidPieceLengthAccounting {
        piece_length: u32,
        num_pieces: u32,
        length: u64,
    },

    #[error("Invalid file name: {0:?}")]
    InvalidPathTraversal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_hash_hex_roundtrip() {
        let hex = "0123456789abcdef0123456789abcdef01234567";
        let hash: InfoHash = hex.parse().unwrap();
        assert_eq!(hash.to_string(), hex);
        assert_eq!(hash.as_bytes()[0], 0x01);
    }

    #[test]
    fn test_info_hash_accepts_uppercase() {
        let hash: InfoHash = "ABCDEF0123456789ABCDEF0123456789ABCDEF01".parse().unwrap();
        assert_eq!(hash.to_string(), "abcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn test_info_hash_rejects_bad_input() {
        assert!("abc".parse::<InfoHash>().is_err());
        assert!("zz23456789abcdef0123456789abcdef01234567"
            .parse::<InfoHash>()
            .is_err());
    }

    #[test]
    fn test_info_hash_order_matches_hex_order() {
        let a: InfoHash = "0f00000000000000000000000000000000000000".parse().unwrap();
        let b: InfoHash = "a000000000000000000000000000000000000000".parse().unwrap();
        assert!(a < b);
        assert!(a.to_hex() < b.to_hex());
    }

    #[test]
    fn test_info_hash_serializes_as_hex() {
        let hash = InfoHash([0xab; 20]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(20)));
        let parsed: InfoHash = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, hash);
    }
}
