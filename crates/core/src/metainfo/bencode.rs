//! Minimal bencode reader that keeps the raw byte span of every value.
//!
//! Torrent identity is the SHA-1 of the `info` dictionary exactly as it
//! appears in the file, so values are never re-encoded: each decoded node
//! borrows the slice of input it was read from.

use thiserror::Error;

/// Maximum nesting of lists and dictionaries.
const MAX_DEPTH: usize = 64;

/// Errors produced while reading bencoded data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BencodeError {
    #[error("Unexpected end of input at byte {0}")]
    UnexpectedEof(usize),

    #[error("Unexpected byte 0x{byte:02x} at byte {pos}")]
    UnexpectedByte { pos: usize, byte: u8 },

    #[error("Invalid integer at byte {0}")]
    InvalidInteger(usize),

    #[error("Invalid string length at byte {0}")]
    InvalidLength(usize),

    #[error("Nesting deeper than {MAX_DEPTH} levels at byte {0}")]
    TooDeep(usize),
}

/// A decoded bencode value together with the bytes it was decoded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value<'a> {
    pub raw: &'a [u8],
    pub kind: Kind<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind<'a> {
    Int(i64),
    Bytes(&'a [u8]),
    List(Vec<Value<'a>>),
    Dict(Vec<(&'a [u8], Value<'a>)>),
}

impl<'a> Value<'a> {
    /// Look up a key if this value is a dictionary.
    pub fn get(&self, key: &[u8]) -> Option<&Value<'a>> {
        self.as_dict()?
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.kind {
            Kind::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        match self.kind {
            Kind::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value<'a>]> {
        match &self.kind {
            Kind::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&[(&'a [u8], Value<'a>)]> {
        match &self.kind {
            Kind::Dict(entries) => Some(entries),
            _ => None,
        }
    }
}

/// Decode the first bencoded value in `input`.
///
/// Bytes following the value are ignored; many metainfo files in the wild
/// carry trailing padding.
pub fn decode(input: &[u8]) -> Result<Value<'_>, BencodeError> {
    Reader { input, pos: 0 }.value(0)
}

struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn peek(&self) -> Result<u8, BencodeError> {
        self.input
            .get(self.pos)
            .copied()
            .ok_or(BencodeError::UnexpectedEof(self.pos))
    }

    fn value(&mut self, depth: usize) -> Result<Value<'a>, BencodeError> {
        if depth > MAX_DEPTH {
            return Err(BencodeError::TooDeep(self.pos));
        }

        let start = self.pos;
        let kind = match self.peek()? {
            b'i' => {
                self.pos += 1;
                Kind::Int(self.integer(b'e')?)
            }
            b'l' => {
                self.pos += 1;
                let mut items = Vec::new();
                while self.peek()? != b'e' {
                    items.push(self.value(depth + 1)?);
                }
                self.pos += 1;
                Kind::List(items)
            }
            b'd' => {
                self.pos += 1;
                let mut entries = Vec::new();
                while self.peek()? != b'e' {
                    let key = match self.peek()? {
                        b'0'..=b'9' => self.bytes()?,
                        byte => {
                            return Err(BencodeError::UnexpectedByte {
                                pos: self.pos,
                                byte,
                            })
                        }
                    };
                    let value = self.value(depth + 1)?;
                    entries.push((key, value));
                }
                self.pos += 1;
                Kind::Dict(entries)
            }
            b'0'..=b'9' => Kind::Bytes(self.bytes()?),
            byte => {
                return Err(BencodeError::UnexpectedByte {
                    pos: self.pos,
                    byte,
                })
            }
        };

        Ok(Value {
            raw: &self.input[start..self.pos],
            kind,
        })
    }

    /// Read a signed decimal integer terminated by `end`.
    fn integer(&mut self, end: u8) -> Result<i64, BencodeError> {
        let start = self.pos;
        let rest = &self.input[start..];
        let len = rest
            .iter()
            .position(|&b| b == end)
            .ok_or(BencodeError::UnexpectedEof(self.input.len()))?;

        let digits = std::str::from_utf8(&rest[..len])
            .map_err(|_| BencodeError::InvalidInteger(start))?;
        if digits.is_empty() || digits.starts_with('+') {
            return Err(BencodeError::InvalidInteger(start));
        }
        let value = digits
            .parse::<i64>()
            .map_err(|_| BencodeError::InvalidInteger(start))?;

        self.pos = start + len + 1;
        Ok(value)
    }

    fn bytes(&mut self) -> Result<&'a [u8], BencodeError> {
        let start = self.pos;
        let len = self.integer(b':')?;
        let len = usize::try_from(len).map_err(|_| BencodeError::InvalidLength(start))?;

        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.input.len())
            .ok_or(BencodeError::UnexpectedEof(self.input.len()))?;

        let bytes = &self.input[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }
}
