//! Path cleaning and text validation for names found in metainfo files.

use std::fmt;

use thiserror::Error;

use super::{File, Info, MetainfoError};

/// Which part of a torrent a rejected string came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Name,
    FileName,
}

impl fmt::Display for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextField::Name => f.write_str("name"),
            TextField::FileName => f.write_str("filename"),
        }
    }
}

/// Errors from the strict ingestion-time checks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("non UTF-8 byte {index}: 0x{byte:02x}; in {field}: {value}")]
    InvalidEncoding {
        field: TextField,
        /// 1-based character position of the first invalid byte.
        index: usize,
        byte: u8,
        value: String,
    },

    #[error("not allowed char {index}: U+{code_point:04X}; in {field}: {value}")]
    ControlCharacter {
        field: TextField,
        /// 1-based character position.
        index: usize,
        code_point: u32,
        value: String,
    },

    #[error("{field} {value} does not fit in {width} characters")]
    FieldOverflow {
        field: &'static str,
        value: String,
        width: usize,
    },
}

/// Remove byte sequences that are not valid UTF-8.
///
/// Invalid bytes are deleted rather than replaced, so the result is the
/// valid text of `bytes` with nothing added.
pub fn clean_name(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

/// Reject `..` components anywhere in a declared multi-file path.
///
/// Components are compared after trimming surrounding whitespace.
pub fn check_traversal(components: &[&[u8]]) -> Result<(), MetainfoError> {
    let is_parent = |part: &[u8]| clean_name(part).trim() == "..";

    let traverses = components
        .iter()
        .any(|c| is_parent(*c) || c.split(|&b| b == b'/').any(is_parent));

    if traverses {
        let joined = components
            .iter()
            .map(|c| String::from_utf8_lossy(c))
            .collect::<Vec<_>>()
            .join("/");
        return Err(MetainfoError::InvalidPathTraversal(joined));
    }
    Ok(())
}

/// Join cleaned path components with `/`, dropping empty and `.` segments.
pub fn join_path<'a, I>(components: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    components
        .into_iter()
        .flat_map(|c| c.split('/'))
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Strict check applied before a torrent is stored.
///
/// The name and every file path must be valid UTF-8 and free of control
/// characters, since records are tab-separated and newline-delimited.
pub fn validate_info(info: &Info) -> Result<(), ValidationError> {
    check_text(TextField::Name, &info.raw_name)?;
    for File { raw_path, .. } in &info.files {
        check_text(TextField::FileName, raw_path)?;
    }
    Ok(())
}

fn check_text(field: TextField, raw: &[u8]) -> Result<(), ValidationError> {
    let text = match std::str::from_utf8(raw) {
        Ok(text) => text,
        Err(e) => {
            let valid = &raw[..e.valid_up_to()];
            let index = String::from_utf8_lossy(valid).chars().count() + 1;
            return Err(ValidationError::InvalidEncoding {
                field,
                index,
                byte: raw[e.valid_up_to()],
                value: String::from_utf8_lossy(raw).into_owned(),
            });
        }
    };

    if let Some((i, c)) = text.chars().enumerate().find(|(_, c)| c.is_control()) {
        return Err(ValidationError::ControlCharacter {
            field,
            index: i + 1,
            code_point: c as u32,
            value: text.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metainfo::InfoHash;

    fn info(raw_name: &[u8], paths: &[&[u8]]) -> Info {
        Info {
            name: clean_name(raw_name),
            raw_name: raw_name.to_vec(),
            hash: InfoHash([0; 20]),
            length: 0,
            files: paths
                .iter()
                .map(|p| File {
                    path: clean_name(p),
                    length: 0,
                    raw_path: p.to_vec(),
                })
                .collect(),
            piece_length: 1,
            num_pieces: 1,
        }
    }

    #[test]
    fn test_clean_name_deletes_invalid_bytes() {
        assert_eq!(clean_name(b"hello"), "hello");
        assert_eq!(clean_name(b"he\xffllo"), "hello");
        assert_eq!(clean_name(b"\xc3\x28abc"), "(abc");
        assert_eq!(clean_name("Motörhead".as_bytes()), "Motörhead");
        assert_eq!(clean_name(b"\xfe\xff"), "");
    }

    #[test]
    fn test_traversal_rejected_in_any_position() {
        let cases: [&[&[u8]]; 4] = [
            &[b"..", b"etc", b"passwd"],
            &[b"dir", b" .. ", b"file"],
            &[b"dir", b"sub", b".."],
            &[b"dir/../../escape"],
        ];
        for components in cases {
            assert!(
                matches!(
                    check_traversal(components),
                    Err(MetainfoError::InvalidPathTraversal(_))
                ),
                "{:?}",
                components
            );
        }
    }

    #[test]
    fn test_traversal_reports_joined_path() {
        let err = check_traversal(&[b"a", b"..", b"b"]).unwrap_err();
        match err {
            MetainfoError::InvalidPathTraversal(path) => assert_eq!(path, "a/../b"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_dotted_names_are_not_traversal() {
        assert!(check_traversal(&[b"...", b"..hidden", b"a..b"]).is_ok());
    }

    #[test]
    fn test_join_path_drops_empty_and_dot_segments() {
        assert_eq!(join_path(["root", "a", "b.txt"]), "root/a/b.txt");
        assert_eq!(join_path(["root", "", "./x", "y/"]), "root/x/y");
    }

    #[test]
    fn test_validate_accepts_clean_torrent() {
        assert!(validate_info(&info(b"ok name", &[b"ok name/file.txt"])).is_ok());
    }

    #[test]
    fn test_validate_rejects_control_character_in_name() {
        let err = validate_info(&info(b"ab\tc", &[])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::ControlCharacter {
                field: TextField::Name,
                index: 3,
                code_point: 0x09,
                value: "ab\tc".to_string(),
            }
        );
        assert_eq!(err.to_string(), "not allowed char 3: U+0009; in name: ab\tc");
    }

    #[test]
    fn test_validate_counts_characters_not_bytes() {
        let err = validate_info(&info("öö\n".as_bytes(), &[])).unwrap_err();
        assert!(matches!(err, ValidationError::ControlCharacter { index: 3, .. }));
    }

    #[test]
    fn test_validate_rejects_invalid_encoding() {
        let err = validate_info(&info(b"ok", &[b"ok/\xffbad"])).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidEncoding {
                field: TextField::FileName,
                index: 4,
                byte: 0xff,
                ..
            }
        ));
    }
}
