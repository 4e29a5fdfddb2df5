use std::path::PathBuf;

use thiserror::Error;

use crate::sources::CodecError;
use crate::value::ParseError;

/// All errors produced by this crate.
///
/// Two broad families, matching when they surface:
///
/// - **Registration errors** ([`DuplicatePrefix`](FigsetError::DuplicatePrefix),
///   [`InvalidPrefix`](FigsetError::InvalidPrefix),
///   [`DuplicateField`](FigsetError::DuplicateField),
///   [`FieldShadows`](FigsetError::FieldShadows),
///   [`BadDefault`](FigsetError::BadDefault)) indicate a defect in the calling
///   code or its declared schema. They are reported immediately by
///   `register_value`/`register_callback`, before any external input is read.
/// - **Parse errors** (everything source-related) indicate bad external input —
///   a malformed flag value, env var, or config file — and are returned from
///   `Set::parse` wrapped with enough context (flag name, env key, file path)
///   to diagnose without a stack trace.
///
/// [`Help`](FigsetError::Help) is neither: it is the sentinel for `-h`/`--help`.
/// Callers should print the contained text and exit successfully rather than
/// treating it as a failure. [`Set::parse_or_exit`](crate::Set::parse_or_exit)
/// does exactly that.
#[derive(Debug, Error)]
pub enum FigsetError {
    #[error("a config is already registered under prefix '{0}'")]
    DuplicatePrefix(String),

    #[error("invalid registration prefix {0:?}: must be a non-empty, dot-free name")]
    InvalidPrefix(String),

    #[error("duplicate field path '{0}'")]
    DuplicateField(String),

    #[error("field '{leaf}' is also a section prefix of '{branch}': a value and a section may not share a path")]
    FieldShadows { leaf: String, branch: String },

    #[error("can't parse default value {literal:?} for field '{path}': {source}")]
    BadDefault {
        path: String,
        literal: String,
        source: ParseError,
    },

    #[error("source '{name}' is misconfigured: {reason}")]
    SourceConfig { name: &'static str, reason: String },

    #[error("flag --{flag}: {source}")]
    Flag { flag: String, source: ParseError },

    #[error("env {key}={value:?}: {source}")]
    Env {
        key: String,
        value: String,
        source: ParseError,
    },

    #[error("config file {path}: {source}")]
    File { path: PathBuf, source: CodecError },

    #[error("config file {path}, field '{field}': {source}")]
    FileField {
        path: PathBuf,
        field: String,
        source: ParseError,
    },

    #[error("unknown keys in {path}: {}", keys.join(", "))]
    UnknownKeys { path: PathBuf, keys: Vec<String> },

    #[error("{0}")]
    Args(clap::Error),

    /// Help was requested (`-h`/`--help`). Carries the rendered usage text.
    /// Not a failure — print it and exit 0.
    #[error("help requested")]
    Help(String),

    #[error("can't encode field '{path}': {source}")]
    Encode { path: String, source: ParseError },

    #[error("config '{prefix}' callback failed: {error}")]
    Callback {
        prefix: String,
        error: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("parse may only run once per set")]
    AlreadyParsed,
}
