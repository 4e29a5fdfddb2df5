//! The file source: a config file whose path is itself taken from a flag.

use std::path::PathBuf;

use clap::{Arg, ArgMatches, Command};

use crate::error::FigsetError;
use crate::field::{Field, FieldSet};
use crate::sources::codec::{FileCodec, JsonCodec};
use crate::sources::Source;

/// Reads registered fields from a structured config file.
///
/// The file path comes from its own flag (`--config` by default, optionally
/// with a default path), so the file source registers that one flag and reads
/// nothing else from the command line. The file is decoded through a
/// [`FileCodec`] into a key tree whose nesting mirrors field paths; each
/// registered field is looked up by walking its path and only present keys
/// are written.
///
/// No path flag and no default path means no file, which is not an error.
/// In strict mode, keys in the file that match no registered field fail the
/// parse instead of being silently ignored.
pub struct FileSource {
    codec: Box<dyn FileCodec>,
    flag_name: String,
    default_path: String,
    strict: bool,
    misconfig: Option<String>,
}

impl FileSource {
    pub fn new() -> Self {
        Self {
            codec: Box::new(JsonCodec),
            flag_name: "config".to_string(),
            default_path: String::new(),
            strict: false,
            misconfig: None,
        }
    }

    /// Swap the file format, e.g. [`TomlCodec`](crate::sources::TomlCodec).
    pub fn codec(mut self, codec: impl FileCodec + 'static) -> Self {
        self.codec = Box::new(codec);
        self
    }

    /// Rename the path flag and give it a default path. An empty default
    /// means the file is only read when the flag is passed. An empty flag
    /// name is a configuration error, reported from `register` and `apply`.
    pub fn path_flag(mut self, name: &str, default_path: &str) -> Self {
        if name.is_empty() {
            self.misconfig = Some("invalid path flag: must be a non-empty name".to_string());
        } else {
            self.flag_name = name.to_string();
            self.default_path = default_path.to_string();
        }
        self
    }

    /// Reject file keys that match no registered field.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    fn check(&self) -> Result<(), FigsetError> {
        match &self.misconfig {
            Some(reason) => Err(FigsetError::SourceConfig {
                name: self.name(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Default for FileSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for FileSource {
    fn name(&self) -> &'static str {
        "file"
    }

    fn register(&mut self, cmd: Command, _fields: &[Field]) -> Result<Command, FigsetError> {
        self.check()?;

        let mut arg = Arg::new(self.flag_name.clone())
            .long(self.flag_name.clone())
            .value_name("PATH")
            .num_args(1)
            .help("the path of the config file");
        if !self.default_path.is_empty() {
            arg = arg.default_value(self.default_path.clone());
        }
        Ok(cmd.arg(arg))
    }

    fn apply(
        &mut self,
        matches: &ArgMatches,
        fields: &mut FieldSet<'_>,
    ) -> Result<(), FigsetError> {
        self.check()?;

        let path = matches
            .get_one::<String>(&self.flag_name)
            .cloned()
            .unwrap_or_default();
        if path.is_empty() {
            return Ok(());
        }
        let path = PathBuf::from(path);

        let tree = self.codec.decode(&path).map_err(|e| FigsetError::File {
            path: path.clone(),
            source: e,
        })?;

        if self.strict {
            let known: Vec<&Field> = fields.iter().collect();
            let mut unknown = Vec::new();
            collect_unknown(&tree, &[], &known, &mut unknown);
            if !unknown.is_empty() {
                return Err(FigsetError::UnknownKeys {
                    path,
                    keys: unknown,
                });
            }
        }

        for index in 0..fields.len() {
            let field = fields.field(index);
            let Some(value) = lookup(&tree, field.path()) else {
                continue;
            };
            let (value, dotted) = (value.clone(), field.dotted());
            fields.assign(index, value).map_err(|e| FigsetError::FileField {
                path: path.clone(),
                field: dotted,
                source: e,
            })?;
        }
        Ok(())
    }
}

/// Walks the decoded tree along a field path. `None` when any segment is
/// missing or a non-object shows up mid-path.
fn lookup<'v>(tree: &'v serde_json::Value, path: &[String]) -> Option<&'v serde_json::Value> {
    let mut node = tree;
    for segment in path {
        node = node.as_object()?.get(segment)?;
    }
    Some(node)
}

/// Collects dotted keys in the tree that neither are a registered field nor
/// lead to one.
fn collect_unknown(
    node: &serde_json::Value,
    at: &[String],
    known: &[&Field],
    out: &mut Vec<String>,
) {
    let Some(map) = node.as_object() else {
        return;
    };
    for (key, child) in map {
        let mut path = at.to_vec();
        path.push(key.clone());
        if known.iter().any(|f| f.path() == path.as_slice()) {
            continue;
        }
        if known.iter().any(|f| f.path().starts_with(&path)) {
            collect_unknown(child, &path, known, out);
        } else {
            out.push(path.join("."));
        }
    }
}
