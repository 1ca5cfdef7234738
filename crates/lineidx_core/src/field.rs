//! Typed fields and records.
//!
//! A record is rendered as its fields joined by a single tab and terminated
//! by `\n`. Each field variant has exactly one textual form, so rendering
//! never inspects values at runtime beyond the text-safety check.

use crate::error::{TableError, TableResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::fmt;

/// Field separator inside a line.
pub const FIELD_SEPARATOR: char = '\t';

/// Line terminator.
pub const LINE_TERMINATOR: char = '\n';

/// A single value in a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Plain text. Must not contain tab, newline or carriage return.
    Text(String),
    /// Signed integer, rendered in decimal.
    Int(i64),
    /// Floating point number. Integral values keep a trailing `.0`.
    Float(f64),
    /// Binary payload already rendered as standard base64.
    Binary(String),
}

impl Field {
    /// Creates a text field.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Creates a binary field by base64-encoding `bytes`.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::Binary(STANDARD.encode(bytes))
    }

    /// Creates an integer field from a row number or other count.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidInput`] if `value` does not fit an `i64`.
    pub fn count(value: usize) -> TableResult<Self> {
        i64::try_from(value)
            .map(Self::Int)
            .map_err(|_| TableError::invalid_input(format!("{value} does not fit an i64 field")))
    }

    /// Checks that the rendered field cannot break line framing.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidInput`] for text containing `\t`, `\n`
    /// or `\r`.
    pub fn validate(&self) -> TableResult<()> {
        if let Self::Text(text) = self {
            if let Some(bad) = text.chars().find(|c| matches!(c, '\t' | '\n' | '\r')) {
                return Err(TableError::invalid_input(format!(
                    "text field contains {bad:?}"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) | Self::Binary(text) => f.write_str(text),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{v:.1}")
            }
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Field {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Field {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Field {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Field {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// An ordered, fixed-arity sequence of fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<Field>,
}

impl Record {
    /// Creates a record from its fields.
    #[must_use]
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    /// Returns the fields in order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Renders the record as one line including the trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidInput`] for an empty record or a field
    /// that fails [`Field::validate`].
    pub fn encode_line(&self) -> TableResult<String> {
        if self.fields.is_empty() {
            return Err(TableError::invalid_input("record has no fields"));
        }

        let mut line = String::new();
        for (i, field) in self.fields.iter().enumerate() {
            field.validate()?;
            if i > 0 {
                line.push(FIELD_SEPARATOR);
            }
            line.push_str(&field.to_string());
        }
        line.push(LINE_TERMINATOR);
        Ok(line)
    }
}

impl From<Vec<Field>> for Record {
    fn from(fields: Vec<Field>) -> Self {
        Self::new(fields)
    }
}

impl FromIterator<Field> for Record {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Tracks the arity shared by every record of one table.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ArityGuard {
    arity: Option<usize>,
}

impl ArityGuard {
    pub(crate) fn with_arity(arity: Option<usize>) -> Self {
        Self { arity }
    }

    pub(crate) fn arity(&self) -> Option<usize> {
        self.arity
    }

    /// Fixes the arity on the first record and rejects any later mismatch.
    pub(crate) fn check(&mut self, record: &Record) -> TableResult<()> {
        match self.arity {
            None => {
                self.arity = Some(record.arity());
                Ok(())
            }
            Some(expected) if expected == record.arity() => Ok(()),
            Some(expected) => Err(TableError::invalid_input(format!(
                "record has {} fields, table has {expected}",
                record.arity()
            ))),
        }
    }
}
