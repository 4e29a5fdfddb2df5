//! Pluggable file formats for the file source.
//!
//! A codec converts between a file on disk and a structural value tree
//! ([`serde_json::Value`] is the interchange type regardless of format). The
//! file source walks that tree by field path, so adding a format is just a
//! decode/encode pair — no per-field knowledge needed.

use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use thiserror::Error;

/// Errors from reading, writing, or converting a config file.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}

/// A structured file format the file source can read and write.
pub trait FileCodec {
    /// Conventional file extension, without the dot.
    fn ext(&self) -> &'static str;

    /// Decode the whole file into a value tree.
    fn decode(&self, path: &Path) -> Result<serde_json::Value, CodecError>;

    /// Encode a value tree into the file, replacing its contents.
    fn encode(&self, path: &Path, value: &serde_json::Value) -> Result<(), CodecError>;
}

/// The default codec: JSON objects mirroring the field path hierarchy.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl FileCodec for JsonCodec {
    fn ext(&self) -> &'static str {
        "json"
    }

    fn decode(&self, path: &Path) -> Result<serde_json::Value, CodecError> {
        let file = fs::File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    fn encode(&self, path: &Path, value: &serde_json::Value) -> Result<(), CodecError> {
        let file = fs::File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), value)?;
        Ok(())
    }
}

/// TOML support: tables map to path segments the same way JSON objects do.
#[derive(Debug, Default, Clone, Copy)]
pub struct TomlCodec;

impl FileCodec for TomlCodec {
    fn ext(&self) -> &'static str {
        "toml"
    }

    fn decode(&self, path: &Path) -> Result<serde_json::Value, CodecError> {
        let content = fs::read_to_string(path)?;
        let table: toml::Value = toml::from_str(&content)?;
        Ok(serde_json::to_value(table)?)
    }

    fn encode(&self, path: &Path, value: &serde_json::Value) -> Result<(), CodecError> {
        let content = toml::to_string_pretty(value)?;
        fs::write(path, content)?;
        Ok(())
    }
}
