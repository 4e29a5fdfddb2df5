//! The env source: one environment variable per field.

use clap::{ArgMatches, Command};

use crate::error::FigsetError;
use crate::field::{Field, FieldSet};
use crate::sources::Source;

/// Maps each field to an environment variable named by joining its path with
/// a splitter (default `_`) and uppercasing: field `["database", "url"]`
/// becomes `DATABASE_URL`.
///
/// Absent variables are skipped, so values written by lower-priority sources
/// survive. A variable that is present but empty counts as set and writes the
/// empty string through the field parser.
pub struct EnvSource {
    prefix: Option<String>,
    splitter: String,
    /// Test seam: when set, lookups read this list instead of the process
    /// environment. Later entries win, mirroring `std::env::set_var`.
    vars: Option<Vec<(String, String)>>,
    misconfig: Option<String>,
}

impl EnvSource {
    pub fn new() -> Self {
        Self {
            prefix: None,
            splitter: "_".to_string(),
            vars: None,
            misconfig: None,
        }
    }

    /// Change the path-segment separator (default `_`). An empty splitter is
    /// a configuration error, reported from `register` and `apply`.
    pub fn splitter(mut self, splitter: &str) -> Self {
        if splitter.is_empty() {
            self.misconfig = Some(format!("invalid env splitter: {splitter:?}"));
        } else {
            self.splitter = splitter.to_string();
        }
        self
    }

    /// Prepend a fixed segment to every variable name, e.g. the app name.
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    /// Read from the given list instead of the process environment. Meant for
    /// tests, where mutating the process environment races between threads.
    pub fn vars(mut self, vars: Vec<(String, String)>) -> Self {
        self.vars = Some(vars);
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

    fn env_key(&self, field: &Field) -> String {
        let mut segments: Vec<&str> = Vec::with_capacity(field.path().len() + 1);
        if let Some(prefix) = &self.prefix {
            segments.push(prefix);
        }
        segments.extend(field.path().iter().map(String::as_str));
        segments.join(&self.splitter).to_uppercase()
    }

    fn lookup(&self, key: &str) -> Option<String> {
        match &self.vars {
            Some(vars) => vars
                .iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone()),
            None => std::env::var(key).ok(),
        }
    }
}

impl Default for EnvSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for EnvSource {
    fn name(&self) -> &'static str {
        "env"
    }

    fn register(&mut self, cmd: Command, _fields: &[Field]) -> Result<Command, FigsetError> {
        self.check()?;
        Ok(cmd)
    }

    fn apply(
        &mut self,
        _matches: &ArgMatches,
        fields: &mut FieldSet<'_>,
    ) -> Result<(), FigsetError> {
        self.check()?;

        for index in 0..fields.len() {
            let key = self.env_key(fields.field(index));
            let Some(value) = self.lookup(&key) else {
                continue;
            };
            fields.set_text(index, &value).map_err(|e| FigsetError::Env {
                key,
                value: value.clone(),
                source: e,
            })?;
        }
        Ok(())
    }
}
