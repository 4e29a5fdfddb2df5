//! The unit of configuration: a named, typed, defaulted leaf binding.
//!
//! A [`Field`] pairs metadata (hierarchical path, default text, help string)
//! with type-erased closures bound to the exact storage slot inside one
//! registered configuration struct. All sources mutate through these closures,
//! so every write lands in the caller's original structure and later sources
//! overwrite earlier ones in place — there is no copy-then-merge step.
//!
//! Sources never hold fields directly. During the apply phase the
//! [`Set`](crate::Set) hands each source a [`FieldSet`]: an indexed, mutable
//! view over all fields and the registration roots they point into.

use std::any::Any;

use crate::value::ParseError;

pub(crate) type ApplyFn = Box<dyn Fn(&mut dyn Any, &str) -> Result<(), ParseError>>;
pub(crate) type AssignFn = Box<dyn Fn(&mut dyn Any, serde_json::Value) -> Result<(), ParseError>>;
pub(crate) type SnapshotFn = Box<dyn Fn(&mut dyn Any) -> Result<serde_json::Value, ParseError>>;

/// One leaf configuration item.
///
/// Identity is the full path (registration prefix + nesting + declared name);
/// it is stable for the lifetime of one configuration pass and is the join key
/// every source maps onto its own medium (flag name, env key, file tree path).
pub struct Field {
    pub(crate) path: Vec<String>,
    pub(crate) default_text: Option<String>,
    pub(crate) help: String,
    /// Index of the owning registration root inside the set.
    pub(crate) root: usize,
    pub(crate) apply: ApplyFn,
    pub(crate) assign: AssignFn,
    pub(crate) snapshot: SnapshotFn,
}

impl Field {
    /// The hierarchical name, one segment per nesting level.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// The declared textual default, if any. Empty means "zero value".
    pub fn default_text(&self) -> Option<&str> {
        self.default_text.as_deref()
    }

    /// The help string shown in flag usage output.
    pub fn help(&self) -> &str {
        &self.help
    }

    /// The path joined with `.`, for diagnostics.
    pub fn dotted(&self) -> String {
        self.path.join(".")
    }
}

impl std::fmt::Debug for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("path", &self.path)
            .field("default_text", &self.default_text)
            .field("help", &self.help)
            .finish_non_exhaustive()
    }
}

/// The mutable view a [`Source`](crate::Source) receives during apply.
///
/// Fields are addressed by index (`0..len()`); writes go straight through the
/// field's bound closure into the owning registration's storage.
pub struct FieldSet<'a> {
    fields: &'a [Field],
    roots: &'a mut [Box<dyn Any>],
}

impl<'a> FieldSet<'a> {
    pub(crate) fn new(fields: &'a [Field], roots: &'a mut [Box<dyn Any>]) -> Self {
        Self { fields, roots }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, index: usize) -> &Field {
        &self.fields[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Parse `text` with the field's parser and store the result in its slot.
    pub fn set_text(&mut self, index: usize, text: &str) -> Result<(), ParseError> {
        let field = &self.fields[index];
        (field.apply)(self.roots[field.root].as_mut(), text)
    }

    /// Store a structurally decoded value in the field's slot directly.
    pub fn assign(&mut self, index: usize, value: serde_json::Value) -> Result<(), ParseError> {
        let field = &self.fields[index];
        (field.assign)(self.roots[field.root].as_mut(), value)
    }

    /// Render the field's current value as a structural value.
    pub fn snapshot(&mut self, index: usize) -> Result<serde_json::Value, ParseError> {
        let field = &self.fields[index];
        (field.snapshot)(self.roots[field.root].as_mut())
    }
}
