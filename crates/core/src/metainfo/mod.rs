//! Metainfo decoding.
//!
//! Turns the bytes of a `.torrent` file into a validated [`Info`] whose
//! [`InfoHash`] identifies the torrent's content, and provides the path
//! cleaning and strict text checks applied to names before storage.

pub mod bencode;
mod decoder;
mod sanitize;
mod types;

pub use decoder::{decode_info, decode_metainfo};
pub use sanitize::{check_traversal, clean_name, join_path, validate_info, TextField, ValidationError};
pub use types::*;
