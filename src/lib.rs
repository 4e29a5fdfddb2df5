//! Layered, declarative configuration for command-line programs. Declare a
//! struct's fields once, and flags, environment variables, and config files
//! all fill it in.
//!
//! Figset populates plain Rust structs from multiple sources in a fixed
//! priority order. A struct describes its own fields — name, default, help
//! text, nesting — through the [`Schema`] trait; a [`Set`] registers one or
//! more such structs under named prefixes and runs a single parse pass over
//! every source. Flag parsing is built on [clap](https://docs.rs/clap).
//!
//! ```ignore
//! #[derive(Default)]
//! struct DbConfig {
//!     driver: String,
//!     url: String,
//! }
//!
//! impl Schema for DbConfig {
//!     fn schema(b: &mut StructBuilder<'_, Self>) {
//!         b.field("driver", |c| &mut c.driver)
//!             .default_text("sqlite3")
//!             .help("database driver name");
//!         b.field("url", |c| &mut c.url)
//!             .default_text("./db")
//!             .help("database connection url");
//!     }
//! }
//!
//! let mut set = Set::new("server");
//! let db = set.register_value("database", DbConfig::default())?;
//! let rest = set.parse(std::env::args().skip(1))?;
//! let db = set.take(db);
//! ```
//!
//! That pass gives the user three ways to set the driver, checked highest
//! priority first: `--database.driver`, the `database.driver` key of the file
//! named by `--config`, and `DATABASE_DRIVER`. Unset fields keep their
//! declared defaults.
//!
//! # Priority
//!
//! ```text
//! Declared defaults     .default_text("sqlite3")
//!        ↑ overridden by
//! Environment vars      DATABASE_DRIVER
//!        ↑ overridden by
//! Config file           --config path, JSON or TOML
//!        ↑ overridden by
//! Flags                 --database.driver
//! ```
//!
//! Every source is sparse: it writes only the fields it actually has a value
//! for, so unset keys fall through to the source below. The order is the
//! declaration order of the source list ([`Set::with_sources`] accepts any
//! mix of [`Source`] implementations, highest priority first); the default
//! list is flag over file over env.
//!
//! # One declaration, every surface
//!
//! The schema declaration is the only description of a field. From it figset
//! derives the flag name and `--help` entry, the env key, the config-file
//! path, and the template written by [`Set::write_template`]. Adding a field
//! to the struct updates all of them at once.
//!
//! # Values
//!
//! Leaf types implement [`FieldValue`]: strings, the integer families (with
//! `0x`/`0o`/`0b` radix prefixes), floats, bools, and `Duration` in
//! human-readable form (`90s`, `2m30s`) ship with the crate. Nested structs
//! implement [`Schema`] and contribute their fields under a path segment, or
//! spliced in flat via [`StructBuilder::flatten`].

pub mod error;
pub mod sources;

mod field;
mod schema;
mod set;
mod value;

#[cfg(test)]
mod fixtures;

pub use error::FigsetError;
pub use field::{Field, FieldSet};
pub use schema::{FieldRef, Schema, StructBuilder};
pub use set::{Handle, Set};
pub use value::{FieldValue, ParseError};
