//! The flag source: one long flag per field on the shared command line.

use clap::parser::ValueSource;
use clap::{Arg, ArgMatches, Command};

use crate::error::FigsetError;
use crate::field::{Field, FieldSet};
use crate::sources::Source;

/// Maps each field to a long flag named by joining its path with a splitter
/// (default `.`) and lowercasing: field `["database", "url"]` becomes
/// `--database.url`.
///
/// During apply, only flags the user actually passed are written through the
/// field's text parser; declared defaults and values from other sources are
/// left alone. The declared default and help string are shown in `--help`
/// output.
pub struct FlagSource {
    prefix: Option<String>,
    splitter: String,
    /// Flag name per field index, filled during register.
    names: Vec<String>,
    misconfig: Option<String>,
}

impl FlagSource {
    pub fn new() -> Self {
        Self {
            prefix: None,
            splitter: ".".to_string(),
            names: Vec::new(),
            misconfig: None,
        }
    }

    /// Change the path-segment separator (default `.`). An empty splitter is
    /// a configuration error, reported from `register` and `apply`.
    pub fn splitter(mut self, splitter: &str) -> Self {
        if splitter.is_empty() {
            self.misconfig = Some(format!("invalid flag splitter: {splitter:?}"));
        } else {
            self.splitter = splitter.to_string();
        }
        self
    }

    /// Prepend a fixed segment to every flag name.
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
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

    fn flag_name(&self, field: &Field) -> String {
        let mut segments: Vec<&str> = Vec::with_capacity(field.path().len() + 1);
        if let Some(prefix) = &self.prefix {
            segments.push(prefix);
        }
        segments.extend(field.path().iter().map(String::as_str));
        segments.join(&self.splitter).to_lowercase()
    }
}

impl Default for FlagSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for FlagSource {
    fn name(&self) -> &'static str {
        "flag"
    }

    fn register(&mut self, mut cmd: Command, fields: &[Field]) -> Result<Command, FigsetError> {
        self.check()?;

        self.names = fields.iter().map(|f| self.flag_name(f)).collect();
        for (field, name) in fields.iter().zip(&self.names) {
            let mut arg = Arg::new(name.clone())
                .long(name.clone())
                .value_name("VALUE")
                .num_args(1);
            if !field.help().is_empty() {
                arg = arg.help(field.help().to_string());
            }
            if let Some(default) = field.default_text()
                && !default.is_empty()
            {
                arg = arg.default_value(default.to_string());
            }
            cmd = cmd.arg(arg);
        }
        Ok(cmd)
    }

    fn apply(
        &mut self,
        matches: &ArgMatches,
        fields: &mut FieldSet<'_>,
    ) -> Result<(), FigsetError> {
        self.check()?;

        for index in 0..fields.len() {
            let name = &self.names[index];
            if matches.value_source(name) != Some(ValueSource::CommandLine) {
                continue;
            }
            let Some(text) = matches.get_one::<String>(name) else {
                continue;
            };
            fields.set_text(index, text).map_err(|e| FigsetError::Flag {
                flag: name.clone(),
                source: e,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{DbConfig, extracted};

    #[test]
    fn register_names_flags_by_joined_lowercased_path() {
        let (fields, _roots) = extracted();
        let mut source = FlagSource::new();
        let cmd = source.register(Command::new("test"), &fields).unwrap();

        let names: Vec<_> = cmd
            .get_arguments()
            .filter_map(|a| a.get_long())
            .collect();
        assert_eq!(
            names,
            vec![
                "database.driver",
                "database.url",
                "database.pool.size",
                "database.pool.idle_timeout",
            ]
        );
    }

    #[test]
    fn register_carries_help_and_default() {
        let (fields, _roots) = extracted();
        let mut source = FlagSource::new();
        let cmd = source.register(Command::new("test"), &fields).unwrap();

        let driver = cmd
            .get_arguments()
            .find(|a| a.get_long() == Some("database.driver"))
            .unwrap();
        assert_eq!(driver.get_help().unwrap().to_string(), "database driver name");
        let defaults: Vec<_> = driver
            .get_default_values()
            .iter()
            .map(|v| v.to_string_lossy())
            .collect();
        assert_eq!(defaults, ["sqlite3"]);
    }

    #[test]
    fn custom_splitter_and_prefix() {
        let (fields, _roots) = extracted();
        let mut source = FlagSource::new().prefix("app").splitter("-");
        let cmd = source.register(Command::new("test"), &fields).unwrap();
        assert!(
            cmd.get_arguments()
                .any(|a| a.get_long() == Some("app-database-driver"))
        );
    }

    #[test]
    fn apply_writes_passed_flags_only() {
        let (fields, mut roots) = extracted();
        let mut source = FlagSource::new();
        let cmd = source.register(Command::new("test"), &fields).unwrap();
        let matches = cmd
            .try_get_matches_from(["test", "--database.driver", "mysql"])
            .unwrap();

        let mut view = FieldSet::new(&fields, &mut roots);
        source.apply(&matches, &mut view).unwrap();

        let config = roots[0].downcast_ref::<DbConfig>().unwrap();
        assert_eq!(config.driver, "mysql");
        // not passed — declared default stands
        assert_eq!(config.url, "./db");
        assert_eq!(config.pool.size, 5);
    }

    #[test]
    fn apply_parses_through_the_field_parser() {
        let (fields, mut roots) = extracted();
        let mut source = FlagSource::new();
        let cmd = source.register(Command::new("test"), &fields).unwrap();
        let matches = cmd
            .try_get_matches_from(["test", "--database.pool.size", "0x20"])
            .unwrap();

        let mut view = FieldSet::new(&fields, &mut roots);
        source.apply(&matches, &mut view).unwrap();

        let config = roots[0].downcast_ref::<DbConfig>().unwrap();
        assert_eq!(config.pool.size, 32);
    }

    #[test]
    fn bad_value_names_the_flag() {
        let (fields, mut roots) = extracted();
        let mut source = FlagSource::new();
        let cmd = source.register(Command::new("test"), &fields).unwrap();
        let matches = cmd
            .try_get_matches_from(["test", "--database.pool.size", "many"])
            .unwrap();

        let mut view = FieldSet::new(&fields, &mut roots);
        let err = source.apply(&matches, &mut view).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("--database.pool.size"));
        assert!(msg.contains("many"));
    }

    #[test]
    fn empty_splitter_is_a_deferred_error() {
        let (fields, mut roots) = extracted();
        let mut source = FlagSource::new().splitter("");

        let err = source.register(Command::new("test"), &fields).unwrap_err();
        assert!(matches!(err, FigsetError::SourceConfig { name: "flag", .. }));

        // the same error again from apply, never a panic
        let matches = Command::new("test").try_get_matches_from(["test"]).unwrap();
        let mut view = FieldSet::new(&fields, &mut roots);
        let err = source.apply(&matches, &mut view).unwrap_err();
        assert!(matches!(err, FigsetError::SourceConfig { name: "flag", .. }));
    }
}
