//! Configuration sources: flags, environment variables, and config files.
//!
//! A source maps the set's fields onto one medium. The lifecycle has two
//! steps, both driven by the [`Set`](crate::Set):
//!
//! 1. [`register`](Source::register) — once, in declared order, with the
//!    complete field list and the shared [`clap::Command`] (sources that
//!    expose flags add them here; registration order drives help-text order).
//! 2. [`apply`](Source::apply) — once, in **reverse** declared order, after
//!    the argument list has been parsed. Each source supplies values for the
//!    fields it can locate and silently skips the rest, so the
//!    highest-declared-priority source writes last and wins, and a source
//!    with no value for a field never clobbers another source's value.
//!
//! A source misconfigured at construction (empty splitter, empty flag name)
//! stores that error and returns it from both steps rather than panicking or
//! attempting partial work.

mod codec;
mod env;
mod file;
mod flag;

pub use codec::{CodecError, FileCodec, JsonCodec, TomlCodec};
pub use env::EnvSource;
pub use file::FileSource;
pub use flag::FlagSource;

use crate::error::FigsetError;
use crate::field::{Field, FieldSet};

/// A priority-ordered participant supplying values for fields from one medium.
pub trait Source {
    /// Short name used in configuration diagnostics.
    fn name(&self) -> &'static str;

    /// Register interest in the fields; sources that expose flags add them to
    /// `cmd` and return the extended command.
    fn register(&mut self, cmd: clap::Command, fields: &[Field])
    -> Result<clap::Command, FigsetError>;

    /// Supply values for as many fields as this source can locate, writing
    /// them through the [`FieldSet`]. Fields with no value here are left
    /// untouched.
    fn apply(
        &mut self,
        matches: &clap::ArgMatches,
        fields: &mut FieldSet<'_>,
    ) -> Result<(), FigsetError>;
}

/// The shipped source list, declared highest-priority first:
/// flags beat the config file, the config file beats the environment.
pub fn default_sources() -> Vec<Box<dyn Source>> {
    vec![
        Box::new(FlagSource::new()),
        Box::new(FileSource::new()),
        Box::new(EnvSource::new()),
    ]
}
