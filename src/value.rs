//! Leaf value parsing: the text-to-value layer every source funnels through.
//!
//! A type that implements [`FieldValue`] can be declared as a leaf field in a
//! [`Schema`](crate::Schema). Flag and env sources hand the raw text to
//! [`parse_text`](FieldValue::parse_text); the file source hands the decoded
//! structural value to [`assign_value`](FieldValue::assign_value) (no second
//! text-parse there — the codec already did the conversion).
//!
//! Shipped implementations: `String`, all signed and unsigned integer widths,
//! `f32`/`f64`, `bool`, and `std::time::Duration` (humantime grammar, e.g.
//! `2h 45m` or `300ms`). User types opt in by implementing the trait.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// A failed text-to-value (or value-to-slot) conversion.
///
/// Carries the offending literal and the target kind so the caller can report
/// the problem without any further context.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("can't parse {literal:?} to {kind}: {reason}")]
pub struct ParseError {
    pub literal: String,
    pub kind: &'static str,
    pub reason: String,
}

impl ParseError {
    pub fn new(literal: impl Into<String>, kind: &'static str, reason: impl ToString) -> Self {
        Self {
            literal: literal.into(),
            kind,
            reason: reason.to_string(),
        }
    }
}

/// A type usable as a leaf configuration field.
///
/// `parse_text`/`format_text` must round-trip: for any value produced by
/// `parse_text` of a canonical literal, formatting it and parsing again yields
/// the same value.
pub trait FieldValue: Serialize + DeserializeOwned + 'static {
    /// Convert a text token (flag value, env var, declared default) into a value.
    fn parse_text(text: &str) -> Result<Self, ParseError>;

    /// Render the value back to its canonical text form.
    fn format_text(&self) -> String;

    /// Overwrite `self` with a structurally decoded value (from a config file).
    ///
    /// The default implementation deserializes with serde. `Duration` overrides
    /// it to accept the humantime string grammar or integer nanoseconds.
    fn assign_value(&mut self, value: serde_json::Value) -> Result<(), ParseError> {
        let literal = value.to_string();
        *self = serde_json::from_value(value)
            .map_err(|e| ParseError::new(literal, std::any::type_name::<Self>(), e))?;
        Ok(())
    }

    /// Render the value as a structural value (for template generation).
    fn to_value(&self) -> Result<serde_json::Value, ParseError> {
        serde_json::to_value(self)
            .map_err(|e| ParseError::new(self.format_text(), std::any::type_name::<Self>(), e))
    }
}

impl FieldValue for String {
    fn parse_text(text: &str) -> Result<Self, ParseError> {
        Ok(text.to_owned())
    }

    fn format_text(&self) -> String {
        self.clone()
    }
}

macro_rules! impl_signed {
    ($($ty:ty),*) => {$(
        impl FieldValue for $ty {
            fn parse_text(text: &str) -> Result<Self, ParseError> {
                text.parse::<$ty>().map_err(|e| {
                    ParseError::new(text, concat!("a signed integer (", stringify!($ty), ")"), e)
                })
            }

            fn format_text(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

impl_signed!(i8, i16, i32, i64, isize);

/// Split off a radix prefix: `0x`/`0X` hex, `0o`/`0O` octal, `0b`/`0B` binary,
/// and the legacy C convention that a leading zero means octal.
fn split_radix(text: &str) -> (&str, u32) {
    if let Some(rest) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        (rest, 16)
    } else if let Some(rest) = text.strip_prefix("0o").or_else(|| text.strip_prefix("0O")) {
        (rest, 8)
    } else if let Some(rest) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        (rest, 2)
    } else if text.len() > 1 && text.starts_with('0') {
        (&text[1..], 8)
    } else {
        (text, 10)
    }
}

macro_rules! impl_unsigned {
    ($($ty:ty),*) => {$(
        impl FieldValue for $ty {
            fn parse_text(text: &str) -> Result<Self, ParseError> {
                let kind = concat!("an unsigned integer (", stringify!($ty), ")");
                let (digits, radix) = split_radix(text);
                <$ty>::from_str_radix(digits, radix)
                    .map_err(|e| ParseError::new(text, kind, e))
            }

            fn format_text(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

impl_unsigned!(u8, u16, u32, u64, usize);

macro_rules! impl_float {
    ($($ty:ty),*) => {$(
        impl FieldValue for $ty {
            fn parse_text(text: &str) -> Result<Self, ParseError> {
                text.parse::<$ty>().map_err(|e| {
                    ParseError::new(text, concat!("a float (", stringify!($ty), ")"), e)
                })
            }

            fn format_text(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

impl_float!(f32, f64);

impl FieldValue for bool {
    /// Only the canonical literal set is accepted — not arbitrary casing.
    fn parse_text(text: &str) -> Result<Self, ParseError> {
        match text {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            _ => Err(ParseError::new(
                text,
                "a bool",
                "unrecognized boolean literal",
            )),
        }
    }

    fn format_text(&self) -> String {
        self.to_string()
    }
}

impl FieldValue for Duration {
    fn parse_text(text: &str) -> Result<Self, ParseError> {
        humantime::parse_duration(text).map_err(|e| ParseError::new(text, "a duration", e))
    }

    fn format_text(&self) -> String {
        humantime::format_duration(*self).to_string()
    }

    /// Accepts a string in the duration grammar, or an integer nanosecond count.
    fn assign_value(&mut self, value: serde_json::Value) -> Result<(), ParseError> {
        match value {
            serde_json::Value::String(text) => {
                *self = Self::parse_text(&text)?;
                Ok(())
            }
            serde_json::Value::Number(n) => {
                let nanos = n.as_u64().ok_or_else(|| {
                    ParseError::new(n.to_string(), "a duration", "expected unsigned nanoseconds")
                })?;
                *self = Duration::from_nanos(nanos);
                Ok(())
            }
            other => Err(ParseError::new(
                other.to_string(),
                "a duration",
                "expected a string or an integer nanosecond count",
            )),
        }
    }

    fn to_value(&self) -> Result<serde_json::Value, ParseError> {
        Ok(serde_json::Value::String(self.format_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_is_identity() {
        assert_eq!(String::parse_text("hello world").unwrap(), "hello world");
        assert_eq!("hello world".to_string().format_text(), "hello world");
    }

    #[test]
    fn signed_base_ten() {
        assert_eq!(i32::parse_text("123").unwrap(), 123);
        assert_eq!(i32::parse_text("-45").unwrap(), -45);
        assert_eq!(i8::parse_text("-128").unwrap(), -128);
    }

    #[test]
    fn signed_rejects_malformed_and_overflow() {
        assert!(i32::parse_text("12a").is_err());
        assert!(i8::parse_text("128").is_err());
        let err = i16::parse_text("99999").unwrap_err();
        assert!(err.to_string().contains("99999"));
        assert!(err.to_string().contains("i16"));
    }

    #[test]
    fn signed_rejects_hex() {
        assert!(i32::parse_text("0x10").is_err());
    }

    #[test]
    fn unsigned_radix_prefixes() {
        assert_eq!(u32::parse_text("0xFF").unwrap(), 255);
        assert_eq!(u32::parse_text("0o17").unwrap(), 15);
        assert_eq!(u32::parse_text("0b101").unwrap(), 5);
        assert_eq!(u32::parse_text("017").unwrap(), 15);
        assert_eq!(u32::parse_text("0").unwrap(), 0);
        assert_eq!(u32::parse_text("42").unwrap(), 42);
    }

    #[test]
    fn unsigned_rejects_negative() {
        assert!(u32::parse_text("-5").is_err());
        assert!(u8::parse_text("-0").is_err());
    }

    #[test]
    fn unsigned_rejects_overflow() {
        assert!(u8::parse_text("256").is_err());
        assert!(u8::parse_text("0x100").is_err());
    }

    #[test]
    fn floats_parse_standard_grammar() {
        assert_eq!(f64::parse_text("1.5").unwrap(), 1.5);
        assert_eq!(f64::parse_text("-2e3").unwrap(), -2000.0);
        assert_eq!(f32::parse_text("0.25").unwrap(), 0.25);
        assert!(f64::parse_text("one").is_err());
    }

    #[test]
    fn bool_canonical_set() {
        for text in ["1", "t", "T", "TRUE", "true", "True"] {
            assert!(bool::parse_text(text).unwrap(), "{text}");
        }
        for text in ["0", "f", "F", "FALSE", "false", "False"] {
            assert!(!bool::parse_text(text).unwrap(), "{text}");
        }
    }

    #[test]
    fn bool_rejects_arbitrary_case() {
        assert!(bool::parse_text("tRuE").is_err());
        assert!(bool::parse_text("yes").is_err());
        assert!(bool::parse_text("").is_err());
    }

    #[test]
    fn duration_unit_suffix_grammar() {
        assert_eq!(
            Duration::parse_text("2h 45m").unwrap(),
            Duration::from_secs(2 * 3600 + 45 * 60)
        );
        assert_eq!(
            Duration::parse_text("2h45m").unwrap(),
            Duration::from_secs(2 * 3600 + 45 * 60)
        );
        assert_eq!(Duration::parse_text("300ms").unwrap(), Duration::from_millis(300));
        assert!(Duration::parse_text("fast").is_err());
    }

    #[test]
    fn round_trips() {
        fn check<T: FieldValue + PartialEq + std::fmt::Debug>(literal: &str) {
            let value = T::parse_text(literal).unwrap();
            let reparsed = T::parse_text(&value.format_text()).unwrap();
            assert_eq!(value, reparsed, "{literal}");
        }
        check::<i64>("123");
        check::<i64>("-123");
        check::<u64>("0xFF");
        check::<f64>("1.5");
        check::<bool>("true");
        check::<String>("plain");
        check::<Duration>("2h 45m");
        check::<Duration>("90s");
    }

    #[test]
    fn assign_value_deserializes() {
        let mut port: u16 = 0;
        port.assign_value(json!(8080)).unwrap();
        assert_eq!(port, 8080);

        let mut name = String::new();
        name.assign_value(json!("db")).unwrap();
        assert_eq!(name, "db");
    }

    #[test]
    fn assign_value_rejects_wrong_shape() {
        let mut port: u16 = 0;
        assert!(port.assign_value(json!("8080")).is_err());
        assert!(port.assign_value(json!(-1)).is_err());
    }

    #[test]
    fn duration_assign_accepts_string_and_nanos() {
        let mut d = Duration::ZERO;
        d.assign_value(json!("1h")).unwrap();
        assert_eq!(d, Duration::from_secs(3600));

        d.assign_value(json!(1_500_000_000u64)).unwrap();
        assert_eq!(d, Duration::from_millis(1500));

        assert!(d.assign_value(json!(true)).is_err());
        assert!(d.assign_value(json!(-1)).is_err());
    }

    #[test]
    fn duration_to_value_is_text() {
        let d = Duration::from_secs(9900);
        assert_eq!(d.to_value().unwrap(), json!("2h 45m"));
    }
}
