//! The set: registration and the one-shot parse pass.
//!
//! A [`Set`] collects configuration structs under named prefixes, builds one
//! shared `clap` command out of every source's flags, parses the argument
//! list once, and lets each source write its values into the registered
//! structs. Sources were declared highest-priority first, so apply runs in
//! reverse declaration order and the most important source writes last.
//!
//! ```ignore
//! let mut set = Set::new("server");
//! let db = set.register_value("database", DbConfig::default())?;
//! let rest = set.parse(std::env::args().skip(1))?;
//! let db: DbConfig = set.take(db);
//! ```

use std::any::Any;
use std::error::Error;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use clap::error::ErrorKind;
use clap::{Arg, Command};

use crate::error::FigsetError;
use crate::field::{Field, FieldSet};
use crate::schema::{Schema, extract};
use crate::sources::{FileCodec, Source, default_sources};

/// Proof of registration, redeemable for the populated value after
/// [`Set::parse`].
pub struct Handle<C> {
    root: usize,
    _config: PhantomData<C>,
}

impl<C> fmt::Debug for Handle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle").field("root", &self.root).finish()
    }
}

type CallbackFn = Box<dyn Fn(&dyn Any) -> Result<(), Box<dyn Error + Send + Sync>>>;

struct Registration {
    prefix: String,
    root: usize,
    callback: Option<CallbackFn>,
}

/// A group of configuration structs populated together from a shared list of
/// sources.
pub struct Set {
    app_name: String,
    sources: Vec<Box<dyn Source>>,
    fields: Vec<Field>,
    roots: Vec<Box<dyn Any>>,
    registrations: Vec<Registration>,
    parsed: bool,
}

impl Set {
    /// A set with the default sources: flag over file over env, each of them
    /// losing to the one before.
    pub fn new(app_name: &str) -> Self {
        Self::with_sources(app_name, default_sources())
    }

    /// A set with a caller-chosen source list, declared highest-priority
    /// first.
    pub fn with_sources(app_name: &str, sources: Vec<Box<dyn Source>>) -> Self {
        Self {
            app_name: app_name.to_string(),
            sources,
            fields: Vec::new(),
            roots: Vec::new(),
            registrations: Vec::new(),
            parsed: false,
        }
    }

    /// Register `value` under `prefix`. Declared defaults are applied into it
    /// immediately; the sources overwrite during [`parse`](Set::parse).
    ///
    /// A failed registration leaves the set exactly as it was.
    pub fn register_value<C: Schema>(
        &mut self,
        prefix: &str,
        value: C,
    ) -> Result<Handle<C>, FigsetError> {
        self.register_inner(prefix, Box::new(value), None)
    }

    /// Register a fresh `C::default()` under `prefix` and call `callback`
    /// with the populated value once every source has applied. Callbacks run
    /// in registration order; the first error aborts the rest.
    pub fn register_callback<C, F>(
        &mut self,
        prefix: &str,
        callback: F,
    ) -> Result<Handle<C>, FigsetError>
    where
        C: Schema + Default,
        F: Fn(&C) -> Result<(), Box<dyn Error + Send + Sync>> + 'static,
    {
        let erased: CallbackFn = Box::new(move |any| {
            let config = any
                .downcast_ref::<C>()
                .expect("registration root type mismatch");
            callback(config)
        });
        self.register_inner(prefix, Box::new(C::default()), Some(erased))
    }

    fn register_inner<C: Schema>(
        &mut self,
        prefix: &str,
        mut value: Box<C>,
        callback: Option<CallbackFn>,
    ) -> Result<Handle<C>, FigsetError> {
        if prefix.is_empty() || prefix.contains('.') || prefix.contains(char::is_whitespace) {
            return Err(FigsetError::InvalidPrefix(prefix.to_string()));
        }
        if self
            .registrations
            .iter()
            .any(|r| r.prefix.eq_ignore_ascii_case(prefix))
        {
            return Err(FigsetError::DuplicatePrefix(prefix.to_string()));
        }

        let new_fields = extract::<C>(prefix, value.as_mut())?;
        check_conflicts(&self.fields, &new_fields)?;

        // all checks passed, commit
        let root = self.roots.len();
        self.roots.push(value as Box<dyn Any>);
        for mut field in new_fields {
            field.root = root;
            self.fields.push(field);
        }
        self.registrations.push(Registration {
            prefix: prefix.to_string(),
            root,
            callback,
        });
        Ok(Handle {
            root,
            _config: PhantomData,
        })
    }

    /// Borrow the value behind a handle. Before `parse` this is the
    /// post-default state.
    pub fn value_of<C: Schema>(&self, handle: &Handle<C>) -> &C {
        self.roots[handle.root]
            .downcast_ref()
            .expect("handle belongs to this set")
    }

    /// Move the value behind a handle out of the set. Meant for after
    /// `parse`; the slot is dead afterwards.
    pub fn take<C: Schema>(&mut self, handle: Handle<C>) -> C {
        let slot = std::mem::replace(&mut self.roots[handle.root], Box::new(()));
        *slot.downcast::<C>().expect("handle belongs to this set")
    }

    /// Run the pass: build the shared command from every source, consume
    /// `args` (without the program name), apply sources lowest-priority
    /// first, then run callbacks. Returns the trailing non-flag arguments.
    ///
    /// `-h`/`--help` short-circuits as [`FigsetError::Help`] before any
    /// source applies. A set parses once; later calls return
    /// [`FigsetError::AlreadyParsed`].
    pub fn parse<I, S>(&mut self, args: I) -> Result<Vec<String>, FigsetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.parsed {
            return Err(FigsetError::AlreadyParsed);
        }
        self.parsed = true;

        let mut cmd = Command::new(self.app_name.clone())
            .disable_version_flag(true)
            .arg(
                Arg::new("rest")
                    .value_name("ARGS")
                    .num_args(0..)
                    .hide(true),
            );
        for source in &mut self.sources {
            cmd = source.register(cmd, &self.fields)?;
        }

        let argv = std::iter::once(self.app_name.clone()).chain(args.into_iter().map(Into::into));
        let matches = match cmd.try_get_matches_from(argv) {
            Ok(matches) => matches,
            Err(e) if e.kind() == ErrorKind::DisplayHelp => {
                return Err(FigsetError::Help(e.render().to_string()));
            }
            Err(e) => return Err(FigsetError::Args(e)),
        };

        let rest: Vec<String> = matches
            .get_many::<String>("rest")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();

        let mut view = FieldSet::new(&self.fields, &mut self.roots);
        for source in self.sources.iter_mut().rev() {
            source.apply(&matches, &mut view)?;
        }

        for registration in &self.registrations {
            if let Some(callback) = &registration.callback {
                callback(self.roots[registration.root].as_ref()).map_err(|error| {
                    FigsetError::Callback {
                        prefix: registration.prefix.clone(),
                        error,
                    }
                })?;
            }
        }

        Ok(rest)
    }

    /// [`parse`](Set::parse) for `main`: prints help and exits 0 when it was
    /// requested, prints any other error to stderr and exits 125.
    pub fn parse_or_exit<I, S>(&mut self, args: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.parse(args) {
            Ok(rest) => rest,
            Err(FigsetError::Help(text)) => {
                print!("{text}");
                std::process::exit(0);
            }
            Err(err) => {
                eprintln!("{}: {err}", self.app_name);
                std::process::exit(125);
            }
        }
    }

    /// A tree of the current values, nested like the field paths. Before
    /// `parse` this is the post-default state, which makes it a usable config
    /// file template.
    pub fn template_value(&mut self) -> Result<serde_json::Value, FigsetError> {
        let mut tree = serde_json::Map::new();
        let mut view = FieldSet::new(&self.fields, &mut self.roots);
        for index in 0..view.len() {
            let path = view.field(index).path().to_vec();
            let value = view.snapshot(index).map_err(|e| FigsetError::Encode {
                path: path.join("."),
                source: e,
            })?;
            insert_at(&mut tree, &path, value);
        }
        Ok(serde_json::Value::Object(tree))
    }

    /// Write [`template_value`](Set::template_value) to `path` with `codec`.
    pub fn write_template(
        &mut self,
        path: &Path,
        codec: &dyn FileCodec,
    ) -> Result<(), FigsetError> {
        let tree = self.template_value()?;
        codec.encode(path, &tree).map_err(|e| FigsetError::File {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Segment-wise, case-insensitive prefix test.
fn is_path_prefix(shorter: &[String], longer: &[String]) -> bool {
    shorter.len() < longer.len()
        && shorter
            .iter()
            .zip(longer)
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
}

/// Rejects a candidate field list that collides with itself or with already
/// registered fields. Exact duplicates and leaf/section overlaps are both
/// errors; the comparison ignores case because flag names are lowercased.
fn check_conflicts(existing: &[Field], new: &[Field]) -> Result<(), FigsetError> {
    for (i, field) in new.iter().enumerate() {
        let earlier = existing.iter().chain(&new[..i]);
        for other in earlier {
            if field.path.len() == other.path.len()
                && field
                    .path
                    .iter()
                    .zip(&other.path)
                    .all(|(a, b)| a.eq_ignore_ascii_case(b))
            {
                return Err(FigsetError::DuplicateField(field.dotted()));
            }
            if is_path_prefix(&field.path, &other.path) {
                return Err(FigsetError::FieldShadows {
                    leaf: field.dotted(),
                    branch: other.dotted(),
                });
            }
            if is_path_prefix(&other.path, &field.path) {
                return Err(FigsetError::FieldShadows {
                    leaf: other.dotted(),
                    branch: field.dotted(),
                });
            }
        }
    }
    Ok(())
}

fn insert_at(tree: &mut serde_json::Map<String, serde_json::Value>, path: &[String], value: serde_json::Value) {
    let (leaf, branches) = path.split_last().expect("field paths are non-empty");
    let mut node = tree;
    for segment in branches {
        node = node
            .entry(segment.clone())
            .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()))
            .as_object_mut()
            .expect("section nodes are objects");
    }
    node.insert(leaf.clone(), value);
}
