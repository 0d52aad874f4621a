// SPDX-License-Identifier: MIT OR Apache-2.0
//! Values that flow across wires.

use crate::error::ValueError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag of a [`Value`], used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// Whole number
    Integer,
    /// Floating point number
    Decimal,
    /// Free text
    Text,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Text => "text",
        };
        f.write_str(name)
    }
}

/// A value produced by a source socket.
///
/// Values are never mutated after they are emitted; a node that receives a new
/// value replaces whatever it cached before.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Integer
    Integer(i32),
    /// Decimal
    Decimal(f32),
    /// Text
    Text(String),
}

impl Value {
    /// Get the tag of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Integer(_) => ValueKind::Integer,
            Self::Decimal(_) => ValueKind::Decimal,
            Self::Text(_) => ValueKind::Text,
        }
    }

    /// Narrow this value to a decimal.
    ///
    /// Integers promote, text is parsed. Empty text yields `Ok(None)`: it means
    /// "no value supplied" rather than an error.
    pub fn to_decimal(&self) -> Result<Option<f32>, ValueError> {
        match self {
            Self::Integer(x) => Ok(Some(*x as f32)),
            Self::Decimal(x) => Ok(Some(*x)),
            Self::Text(text) => parse_decimal(text),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(x) => write!(f, "{x}"),
            Self::Decimal(x) => write!(f, "{x}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<i32> for Value {
    fn from(x: i32) -> Self {
        Self::Integer(x)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Self::Decimal(x)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Parse user-entered text as a decimal, independent of locale.
///
/// Blank text is `Ok(None)`. Text that parses to infinity without spelling it
/// out is reported as an overflow.
pub fn parse_decimal(text: &str) -> Result<Option<f32>, ValueError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let parsed: f32 = trimmed.parse().map_err(|_| ValueError::Format {
        text: trimmed.to_string(),
    })?;

    if parsed.is_infinite() && !spells_infinity(trimmed) {
        return Err(ValueError::Overflow {
            text: trimmed.to_string(),
        });
    }

    Ok(Some(parsed))
}

fn spells_infinity(text: &str) -> bool {
    let unsigned = text.trim_start_matches(['+', '-']);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}
