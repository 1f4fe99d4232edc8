//! Builder producing bencoded metainfo files for tests.

use std::collections::BTreeMap;

/// An owned bencode value with a canonical (sorted-key) encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BencodeValue {
    Int(i64),
    Bytes(Vec<u8>),
    List(Vec<BencodeValue>),
    Dict(BTreeMap<Vec<u8>, BencodeValue>),
}

impl BencodeValue {
    pub fn bytes(b: impl AsRef<[u8]>) -> Self {
        BencodeValue::Bytes(b.as_ref().to_vec())
    }

    pub fn dict<K: AsRef<[u8]>>(entries: impl IntoIterator<Item = (K, BencodeValue)>) -> Self {
        BencodeValue::Dict(
            entries
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_vec(), v))
                .collect(),
        )
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            BencodeValue::Int(i) => out.extend_from_slice(format!("i{i}e").as_bytes()),
            BencodeValue::Bytes(b) => {
                out.extend_from_slice(format!("{}:", b.len()).as_bytes());
                out.extend_from_slice(b);
            }
            BencodeValue::List(items) => {
                out.push(b'l');
                for item in items {
                    item.encode_into(out);
                }
                out.push(b'e');
            }
            BencodeValue::Dict(entries) => {
                out.push(b'd');
                for (k, v) in entries {
                    BencodeValue::Bytes(k.clone()).encode_into(out);
                    v.encode_into(out);
                }
                out.push(b'e');
            }
        }
    }
}

/// Builds single- or multi-file torrents with consistent piece accounting.
///
/// Unless overridden, the piece count is derived from the total length so
/// the result always decodes successfully.
#[derive(Debug, Clone)]
pub struct TorrentBuilder {
    name: Vec<u8>,
    length: Option<i64>,
    files: Vec<(Vec<Vec<u8>>, i64)>,
    piece_length: i64,
    pieces: Option<usize>,
    raw_pieces: Option<Vec<u8>>,
    extra: BTreeMap<Vec<u8>, BencodeValue>,
}

impl TorrentBuilder {
    /// A single-file torrent.
    pub fn single(name: &str, length: i64) -> Self {
        Self {
            name: name.as_bytes().to_vec(),
            length: Some(length),
            files: Vec::new(),
            piece_length: 16384,
            pieces: None,
            raw_pieces: None,
            extra: BTreeMap::new(),
        }
    }

    /// A multi-file torrent; add members with [`file`](Self::file).
    pub fn multi(name: &str) -> Self {
        Self {
            length: None,
            ..Self::single(name, 0)
        }
    }

    pub fn file(self, path: &[&str], length: i64) -> Self {
        let path = path.iter().map(|p| p.as_bytes().to_vec()).collect();
        self.raw_file(path, length)
    }

    pub fn raw_file(mut self, path: Vec<Vec<u8>>, length: i64) -> Self {
        self.files.push((path, length));
        self
    }

    pub fn raw_name(mut self, name: Vec<u8>) -> Self {
        self.name = name;
        self
    }

    pub fn piece_length(mut self, piece_length: i64) -> Self {
        self.piece_length = piece_length;
        self
    }

    /// Force the number of entries in the piece table.
    pub fn pieces(mut self, count: usize) -> Self {
        self.pieces = Some(count);
        self
    }

    /// Use `pieces` verbatim as the piece table.
    pub fn raw_pieces(mut self, pieces: Vec<u8>) -> Self {
        self.raw_pieces = Some(pieces);
        self
    }

    /// Set an arbitrary info dictionary field, e.g. to make otherwise
    /// identical torrents hash differently.
    pub fn info_field(mut self, key: &str, value: BencodeValue) -> Self {
        self.extra.insert(key.as_bytes().to_vec(), value);
        self
    }

    fn total_length(&self) -> i64 {
        match self.length {
            Some(length) => length,
            None => self.files.iter().map(|(_, l)| l).sum(),
        }
    }

    fn piece_table(&self) -> Vec<u8> {
        if let Some(raw) = &self.raw_pieces {
            return raw.clone();
        }
        let count = self.pieces.unwrap_or_else(|| {
            let total = self.total_length().max(0) as usize;
            let piece = self.piece_length.max(1) as usize;
            total.div_ceil(piece).max(1)
        });
        (0..count * 20).map(|i| (i % 251) as u8).collect()
    }

    pub fn info_value(&self) -> BencodeValue {
        let mut info = self.extra.clone();
        info.insert(b"name".to_vec(), BencodeValue::Bytes(self.name.clone()));
        info.insert(b"piece length".to_vec(), BencodeValue::Int(self.piece_length));
        info.insert(b"pieces".to_vec(), BencodeValue::Bytes(self.piece_table()));

        match self.length {
            Some(length) => {
                info.entry(b"length".to_vec())
                    .or_insert(BencodeValue::Int(length));
            }
            None => {
                let files = self
                    .files
                    .iter()
                    .map(|(path, length)| {
                        BencodeValue::dict([
                            ("length", BencodeValue::Int(*length)),
                            (
                                "path",
                                BencodeValue::List(
                                    path.iter().map(BencodeValue::bytes).collect(),
                                ),
                            ),
                        ])
                    })
                    .collect();
                info.insert(b"files".to_vec(), BencodeValue::List(files));
            }
        }

        BencodeValue::Dict(info)
    }

    /// The encoded info dictionary, as it appears inside [`build`](Self::build).
    pub fn info_bytes(&self) -> Vec<u8> {
        self.info_value().encode()
    }

    /// The complete metainfo file.
    pub fn build(&self) -> Vec<u8> {
        BencodeValue::dict([
            (
                "announce",
                BencodeValue::bytes("udp://tracker.example.org:1337/announce"),
            ),
            ("creation date", BencodeValue::Int(1_700_000_000)),
            ("info", self.info_value()),
        ])
        .encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_sorts_dict_keys() {
        let value = BencodeValue::dict([
            ("zeta", BencodeValue::Int(1)),
            ("alpha", BencodeValue::bytes("x")),
        ]);
        assert_eq!(value.encode(), b"d5:alpha1:x4:zetai1ee");
    }

    #[test]
    fn test_build_embeds_info_bytes() {
        let builder = TorrentBuilder::single("a", 1);
        let bytes = builder.build();
        let info = builder.info_bytes();
        assert!(bytes.windows(info.len()).any(|w| w == info.as_slice()));
    }
}
