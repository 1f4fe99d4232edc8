//! Metainfo decoder - turns raw `.torrent` bytes into a validated [`Info`].

use sha1::{Digest, Sha1};

use super::bencode::{self, Value};
use super::sanitize::{check_traversal, clean_name, join_path};
use super::{File, Info, InfoHash, MetainfoError, EMPTY_NAME_PLACEHOLDER};

/// Size of one entry in the piece-hash table.
const PIECE_HASH_LEN: usize = 20;

/// Decode a metainfo container and validate its info dictionary.
///
/// The returned hash is computed over the info dictionary bytes exactly as
/// they appear in `bytes`.
pub fn decode_metainfo(bytes: &[u8]) -> Result<Info, MetainfoError> {
    let root =
        bencode::decode(bytes).map_err(|e| MetainfoError::MalformedContainer(e.to_string()))?;

    if root.as_dict().is_none() {
        return Err(MetainfoError::MalformedContainer(
            "top-level value is not a dictionary".to_string(),
        ));
    }

    let info = root.get(b"info").ok_or(MetainfoError::MissingInfoDict)?;
    info_from_value(info)
}

/// Decode and validate a bare info dictionary.
pub fn decode_info(raw: &[u8]) -> Result<Info, MetainfoError> {
    let info =
        bencode::decode(raw).map_err(|e| MetainfoError::MalformedInfoDict(e.to_string()))?;
    info_from_value(&info)
}

/// Fields of the info dictionary before validation.
struct RawInfo<'a> {
    piece_length: u32,
    pieces: &'a [u8],
    name: &'a [u8],
    length: u64,
    files: Vec<RawFile<'a>>,
}

struct RawFile<'a> {
    length: u64,
    path: Vec<&'a [u8]>,
}

fn info_from_value(value: &Value<'_>) -> Result<Info, MetainfoError> {
    let raw = read_info(value)?;

    if raw.piece_length == 0 {
        return Err(MetainfoError::ZeroPieceLength);
    }

    if raw.pieces.len() % PIECE_HASH_LEN != 0 {
        return Err(MetainfoError::InvalidPieceTable(raw.pieces.len()));
    }

    let num_pieces = raw.pieces.len() / PIECE_HASH_LEN;
    if num_pieces == 0 {
        return Err(MetainfoError::ZeroPieces);
    }
    let num_pieces = u32::try_from(num_pieces)
        .map_err(|_| malformed(format!("{num_pieces} pieces exceeds the supported maximum")))?;

    for file in &raw.files {
        check_traversal(&file.path)?;
    }

    let name = clean_name(raw.name);

    let (length, files) = if raw.files.is_empty() {
        let file = File {
            path: name.clone(),
            length: raw.length,
            raw_path: raw.name.to_vec(),
        };
        (raw.length, vec![file])
    } else {
        multi_file(&name, raw.name, &raw.files)?
    };

    let total = u64::from(raw.piece_length) * u64::from(num_pieces);
    if total < length || total - length >= u64::from(raw.piece_length) {
        return Err(MetainfoError::InvalidPieceLengthAccounting {
            piece_length: raw.piece_length,
            num_pieces,
            length,
        });
    }

    let mut hash = [0u8; 20];
    hash.copy_from_slice(&Sha1::digest(value.raw));
    let hash = InfoHash(hash);

    Ok(Info {
        name: if name.is_empty() {
            EMPTY_NAME_PLACEHOLDER.to_string()
        } else {
            name
        },
        raw_name: raw.name.to_vec(),
        hash,
        length,
        files,
        piece_length: raw.piece_length,
        num_pieces,
    })
}

fn multi_file(
    name: &str,
    raw_name: &[u8],
    files: &[RawFile<'_>],
) -> Result<(u64, Vec<File>), MetainfoError> {
    let mut length: u64 = 0;
    let mut out = Vec::with_capacity(files.len());

    for file in files {
        length = length
            .checked_add(file.length)
            .ok_or_else(|| malformed("total length overflows".to_string()))?;

        let cleaned: Vec<String> = file.path.iter().map(|p| clean_name(p)).collect();
        let path = join_path(std::iter::once(name).chain(cleaned.iter().map(String::as_str)));

        let mut raw_path = raw_name.to_vec();
        for part in &file.path {
            raw_path.push(b'/');
            raw_path.extend_from_slice(part);
        }

        out.push(File {
            path,
            length: file.length,
            raw_path,
        });
    }

    Ok((length, out))
}

fn read_info<'a>(info: &Value<'a>) -> Result<RawInfo<'a>, MetainfoError> {
    if info.as_dict().is_none() {
        return Err(malformed("info is not a dictionary".to_string()));
    }

    let piece_length = match int_field(info, b"piece length")? {
        Some(n) => u32::try_from(n).map_err(|_| malformed(format!("piece length {n} out of range")))?,
        None => 0,
    };

    let files = match info.get(b"files") {
        None => Vec::new(),
        Some(list) => list
            .as_list()
            .ok_or_else(|| malformed("files is not a list".to_string()))?
            .iter()
            .map(read_file)
            .collect::<Result<Vec<_>, _>>()?,
    };

    Ok(RawInfo {
        piece_length,
        pieces: bytes_field(info, b"pieces")?.unwrap_or_default(),
        name: bytes_field(info, b"name")?.unwrap_or_default(),
        length: length_field(info, b"length")?,
        files,
    })
}

fn read_file<'a>(file: &Value<'a>) -> Result<RawFile<'a>, MetainfoError> {
    if file.as_dict().is_none() {
        return Err(malformed("file entry is not a dictionary".to_string()));
    }

    let path = match file.get(b"path") {
        None => Vec::new(),
        Some(parts) => parts
            .as_list()
            .ok_or_else(|| malformed("file path is not a list".to_string()))?
            .iter()
            .map(|part| {
                part.as_bytes()
                    .ok_or_else(|| malformed("file path component is not a string".to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?,
    };

    Ok(RawFile {
        length: length_field(file, b"length")?,
        path,
    })
}

fn int_field(dict: &Value<'_>, key: &[u8]) -> Result<Option<i64>, MetainfoError> {
    dict.get(key)
        .map(|v| {
            v.as_int()
                .ok_or_else(|| malformed(format!("{} is not an integer", key_name(key))))
        })
        .transpose()
}

fn length_field(dict: &Value<'_>, key: &[u8]) -> Result<u64, MetainfoError> {
    match int_field(dict, key)? {
        Some(n) => u64::try_from(n).map_err(|_| malformed(format!("negative length {n}"))),
        None => Ok(0),
    }
}

fn bytes_field<'a>(dict: &Value<'a>, key: &[u8]) -> Result<Option<&'a [u8]>, MetainfoError> {
    dict.get(key)
        .map(|v| {
            v.as_bytes()
                .ok_or_else(|| malformed(format!("{} is not a string", key_name(key))))
        })
        .transpose()
}

fn key_name(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}

fn malformed(reason: String) -> MetainfoError {
    MetainfoError::MalformedInfoDict(reason)
}
