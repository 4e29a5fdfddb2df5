//! Schema declaration: how a config struct describes its fields.
//!
//! A config type implements [`Schema`] and declares each leaf through a
//! [`StructBuilder`], attaching the name, default, and help metadata inline:
//!
//! ```ignore
//! impl Schema for DbConfig {
//!     fn schema(b: &mut StructBuilder<'_, Self>) {
//!         b.field("driver", |c| &mut c.driver)
//!             .default_text("sqlite3")
//!             .help("database driver name");
//!         b.nested("pool", |c| &mut c.pool);
//!     }
//! }
//! ```
//!
//! Extraction walks the declarations depth-first in declaration order and
//! produces a flat list of [`Field`]s whose paths concatenate every ancestor
//! segment. Leaf vs. nested is decided at the call site and checked at compile
//! time: `field` requires [`FieldValue`], `nested`/`flatten` require [`Schema`].
//!
//! Accessors are plain `fn(&mut C) -> &mut T` pointers. Extraction composes
//! them from the registration root down to each leaf, so a field's bound slot
//! is always reached through the caller's original structure — no copies.
//!
//! Non-empty defaults are applied immediately during extraction; a default
//! that fails its own parser is a registration-time error, not a runtime one.

use std::any::Any;
use std::rc::Rc;

use crate::error::FigsetError;
use crate::field::{ApplyFn, AssignFn, Field, SnapshotFn};
use crate::value::FieldValue;

/// A configuration struct that can declare its fields.
pub trait Schema: Sized + 'static {
    fn schema(b: &mut StructBuilder<'_, Self>);
}

/// Projection from a type-erased registration root to a nested struct.
type Project<C> = Rc<dyn Fn(&mut dyn Any) -> &mut C>;

/// Collects field declarations for one struct level.
///
/// Created by the extraction machinery; user code only calls its methods from
/// inside [`Schema::schema`].
pub struct StructBuilder<'a, C> {
    prefix: Vec<String>,
    out: &'a mut Vec<Field>,
    project: Project<C>,
}

impl<'a, C: 'static> StructBuilder<'a, C> {
    /// Declare a leaf field. Returns a [`FieldRef`] for chaining
    /// `.default_text(..)` and `.help(..)`.
    pub fn field<T: FieldValue>(
        &mut self,
        name: &str,
        access: fn(&mut C) -> &mut T,
    ) -> FieldRef<'_> {
        let mut path = self.prefix.clone();
        path.push(name.to_string());

        let apply: ApplyFn = {
            let project = Rc::clone(&self.project);
            Box::new(move |root, text| {
                *access(project(root)) = T::parse_text(text)?;
                Ok(())
            })
        };
        let assign: AssignFn = {
            let project = Rc::clone(&self.project);
            Box::new(move |root, value| access(project(root)).assign_value(value))
        };
        let snapshot: SnapshotFn = {
            let project = Rc::clone(&self.project);
            Box::new(move |root| access(project(root)).to_value())
        };

        self.out.push(Field {
            path,
            default_text: None,
            help: String::new(),
            root: 0,
            apply,
            assign,
            snapshot,
        });
        FieldRef {
            field: self.out.last_mut().expect("field was just pushed"),
        }
    }

    /// Declare a nested struct under `name`; its fields get `name` appended to
    /// their path prefix.
    pub fn nested<T: Schema>(&mut self, name: &str, access: fn(&mut C) -> &mut T) {
        let mut prefix = self.prefix.clone();
        prefix.push(name.to_string());
        self.descend(prefix, access);
    }

    /// Splice another struct's fields in at the current level, without adding
    /// a path segment — promoted fields, like an embedded struct.
    pub fn flatten<T: Schema>(&mut self, access: fn(&mut C) -> &mut T) {
        self.descend(self.prefix.clone(), access);
    }

    fn descend<T: Schema>(&mut self, prefix: Vec<String>, access: fn(&mut C) -> &mut T) {
        let parent = Rc::clone(&self.project);
        let project: Project<T> = Rc::new(move |root| access(parent(root)));
        let mut child = StructBuilder {
            prefix,
            out: &mut *self.out,
            project,
        };
        T::schema(&mut child);
    }
}

/// Chaining handle for the field just declared.
pub struct FieldRef<'a> {
    field: &'a mut Field,
}

impl FieldRef<'_> {
    /// Set the textual default, applied through the field's own parser at
    /// registration time. Empty text means "keep the zero value".
    pub fn default_text(self, text: &str) -> Self {
        self.field.default_text = Some(text.to_string());
        self
    }

    /// Set the help string shown in flag usage output.
    pub fn help(self, text: &str) -> Self {
        self.field.help = text.to_string();
        self
    }
}

/// Extract the flat field list for `C`, rooted under `prefix`, applying
/// declared defaults into `root` as it goes.
///
/// `root` must be the erased `C` this extraction was started for; the set
/// guarantees that.
pub(crate) fn extract<C: Schema>(
    prefix: &str,
    root: &mut dyn Any,
) -> Result<Vec<Field>, FigsetError> {
    let mut fields = Vec::new();
    let project: Project<C> = Rc::new(|any| {
        any.downcast_mut::<C>()
            .expect("registration root type mismatch")
    });
    let mut builder = StructBuilder {
        prefix: vec![prefix.to_string()],
        out: &mut fields,
        project,
    };
    C::schema(&mut builder);

    for field in &fields {
        if let Some(default) = &field.default_text
            && !default.is_empty()
        {
            (field.apply)(root, default).map_err(|e| FigsetError::BadDefault {
                path: field.dotted(),
                literal: default.clone(),
                source: e,
            })?;
        }
    }

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{DbConfig, ServerConfig};

    fn paths(fields: &[Field]) -> Vec<String> {
        fields.iter().map(|f| f.dotted()).collect()
    }

    #[test]
    fn flat_list_covers_every_leaf_in_declaration_order() {
        let mut config = DbConfig::default();
        let fields = extract::<DbConfig>("database", &mut config).unwrap();
        assert_eq!(
            paths(&fields),
            vec![
                "database.driver",
                "database.url",
                "database.pool.size",
                "database.pool.idle_timeout",
            ]
        );
    }

    #[test]
    fn defaults_are_applied_at_extraction() {
        let mut config = DbConfig::default();
        extract::<DbConfig>("database", &mut config).unwrap();
        assert_eq!(config.driver, "sqlite3");
        assert_eq!(config.url, "./db");
        assert_eq!(config.pool.size, 5);
        assert_eq!(config.pool.idle_timeout, std::time::Duration::from_secs(90));
    }

    #[test]
    fn field_without_default_keeps_existing_value() {
        let mut config = ServerConfig {
            host: "preset".into(),
            ..ServerConfig::default()
        };
        extract::<ServerConfig>("server", &mut config).unwrap();
        // host declares no default, port does
        assert_eq!(config.host, "preset");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn metadata_carries_through() {
        let mut config = DbConfig::default();
        let fields = extract::<DbConfig>("database", &mut config).unwrap();
        let driver = &fields[0];
        assert_eq!(driver.default_text(), Some("sqlite3"));
        assert_eq!(driver.help(), "database driver name");
    }

    #[test]
    fn bad_default_fails_extraction() {
        struct Broken {
            port: u16,
        }
        impl Default for Broken {
            fn default() -> Self {
                Self { port: 0 }
            }
        }
        impl Schema for Broken {
            fn schema(b: &mut StructBuilder<'_, Self>) {
                b.field("port", |c| &mut c.port).default_text("not-a-port");
            }
        }

        let mut config = Broken::default();
        let err = extract::<Broken>("app", &mut config).unwrap_err();
        match err {
            FigsetError::BadDefault { path, literal, .. } => {
                assert_eq!(path, "app.port");
                assert_eq!(literal, "not-a-port");
            }
            other => panic!("expected BadDefault, got {other:?}"),
        }
    }

    #[test]
    fn flatten_promotes_fields_without_a_segment() {
        #[derive(Default)]
        struct Common {
            verbose: bool,
        }
        impl Schema for Common {
            fn schema(b: &mut StructBuilder<'_, Self>) {
                b.field("verbose", |c| &mut c.verbose).default_text("false");
            }
        }
        #[derive(Default)]
        struct App {
            common: Common,
            name: String,
        }
        impl Schema for App {
            fn schema(b: &mut StructBuilder<'_, Self>) {
                b.flatten(|c| &mut c.common);
                b.field("name", |c| &mut c.name);
            }
        }

        let mut config = App::default();
        let fields = extract::<App>("app", &mut config).unwrap();
        assert_eq!(paths(&fields), vec!["app.verbose", "app.name"]);
    }

    #[test]
    fn apply_writes_through_to_the_original_struct() {
        let mut config = DbConfig::default();
        let fields = extract::<DbConfig>("database", &mut config).unwrap();
        (fields[1].apply)(&mut config, "postgres://db").unwrap();
        assert_eq!(config.url, "postgres://db");
    }
}
