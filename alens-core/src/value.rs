// SPDX-License-Identifier: AGPL-3.0-or-later
//! Attribute values
//!
//! [`AttributeValue`] is the runtime representation of every attribute,
//! well-known or custom. Reads never coerce between variants: asking a
//! `U32` value for `as_u64()` yields `None`.

use bytes::Bytes;
use serde::Serialize;
use std::fmt;

use crate::error::{AlensError, AlensResult};

/// Expected value type of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AttributeKind {
    Bool,
    I32,
    U32,
    I64,
    U64,
    F64,
    String,
    Bytes,
    StringList,
}

impl AttributeKind {
    /// Zero value of this kind, used as the declared default
    pub fn zero(self) -> AttributeValue {
        match self {
            AttributeKind::Bool => AttributeValue::Bool(false),
            AttributeKind::I32 => AttributeValue::I32(0),
            AttributeKind::U32 => AttributeValue::U32(0),
            AttributeKind::I64 => AttributeValue::I64(0),
            AttributeKind::U64 => AttributeValue::U64(0),
            AttributeKind::F64 => AttributeValue::F64(0.0),
            AttributeKind::String => AttributeValue::String(String::new()),
            AttributeKind::Bytes => AttributeValue::Bytes(Bytes::new()),
            AttributeKind::StringList => AttributeValue::StringList(Vec::new()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttributeKind::Bool => "bool",
            AttributeKind::I32 => "i32",
            AttributeKind::U32 => "u32",
            AttributeKind::I64 => "i64",
            AttributeKind::U64 => "u64",
            AttributeKind::F64 => "f64",
            AttributeKind::String => "string",
            AttributeKind::Bytes => "bytes",
            AttributeKind::StringList => "stringv",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime representation of an attribute value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    /// No value: an unresolved custom attribute, or a failed resolution
    #[default]
    Invalid,
    Bool(bool),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F64(f64),
    String(String),
    Bytes(Bytes),
    StringList(Vec<String>),
}

impl AttributeValue {
    pub fn is_valid(&self) -> bool {
        !matches!(self, AttributeValue::Invalid)
    }

    /// Kind of this value, `None` for [`AttributeValue::Invalid`]
    pub fn kind(&self) -> Option<AttributeKind> {
        Some(match self {
            AttributeValue::Invalid => return None,
            AttributeValue::Bool(_) => AttributeKind::Bool,
            AttributeValue::I32(_) => AttributeKind::I32,
            AttributeValue::U32(_) => AttributeKind::U32,
            AttributeValue::I64(_) => AttributeKind::I64,
            AttributeValue::U64(_) => AttributeKind::U64,
            AttributeValue::F64(_) => AttributeKind::F64,
            AttributeValue::String(_) => AttributeKind::String,
            AttributeValue::Bytes(_) => AttributeKind::Bytes,
            AttributeValue::StringList(_) => AttributeKind::StringList,
        })
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            AttributeValue::I32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            AttributeValue::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            AttributeValue::U64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AttributeValue::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_string_list(&self) -> Option<&[String]> {
        match self {
            AttributeValue::StringList(v) => Some(v),
            _ => None,
        }
    }

    /// Parse user-supplied text into a value of `kind`
    ///
    /// Unsigned integers accept `0x`/`0o` prefixes, and a leading zero means
    /// octal so that `0644` reads as a file mode. String lists are
    /// comma-separated.
    pub fn parse(kind: AttributeKind, text: &str) -> AlensResult<Self> {
        let invalid = |message: String| AlensError::InvalidValue {
            attribute: kind.to_string(),
            message,
        };
        let text = text.trim();

        let value = match kind {
            AttributeKind::Bool => match text.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => AttributeValue::Bool(true),
                "false" | "no" | "0" => AttributeValue::Bool(false),
                other => return Err(invalid(format!("not a boolean: {other}"))),
            },
            AttributeKind::I32 => AttributeValue::I32(
                text.parse().map_err(|e| invalid(format!("{e}: {text}")))?,
            ),
            AttributeKind::I64 => AttributeValue::I64(
                text.parse().map_err(|e| invalid(format!("{e}: {text}")))?,
            ),
            AttributeKind::U32 => {
                let v = parse_unsigned(text).map_err(invalid)?;
                let v = u32::try_from(v).map_err(|e| invalid(format!("{e}: {text}")))?;
                AttributeValue::U32(v)
            }
            AttributeKind::U64 => AttributeValue::U64(parse_unsigned(text).map_err(invalid)?),
            AttributeKind::F64 => AttributeValue::F64(
                text.parse().map_err(|e| invalid(format!("{e}: {text}")))?,
            ),
            AttributeKind::String => AttributeValue::String(text.to_string()),
            AttributeKind::Bytes => AttributeValue::Bytes(Bytes::copy_from_slice(text.as_bytes())),
            AttributeKind::StringList => AttributeValue::StringList(
                text.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
            ),
        };
        Ok(value)
    }
}

fn parse_unsigned(text: &str) -> Result<u64, String> {
    let (digits, radix) = if let Some(hex) = text.strip_prefix("0x") {
        (hex, 16)
    } else if let Some(oct) = text.strip_prefix("0o") {
        (oct, 8)
    } else if text.len() > 1 && text.starts_with('0') {
        (&text[1..], 8)
    } else {
        (text, 10)
    };
    u64::from_str_radix(digits, radix).map_err(|e| format!("{e}: {text}"))
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Invalid => f.write_str("(invalid)"),
            AttributeValue::Bool(v) => write!(f, "{v}"),
            AttributeValue::I32(v) => write!(f, "{v}"),
            AttributeValue::U32(v) => write!(f, "{v}"),
            AttributeValue::I64(v) => write!(f, "{v}"),
            AttributeValue::U64(v) => write!(f, "{v}"),
            AttributeValue::F64(v) => write!(f, "{v}"),
            AttributeValue::String(v) => f.write_str(v),
            AttributeValue::Bytes(v) => write!(f, "{}", String::from_utf8_lossy(v)),
            AttributeValue::StringList(v) => f.write_str(&v.join(", ")),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

impl From<i32> for AttributeValue {
    fn from(v: i32) -> Self {
        AttributeValue::I32(v)
    }
}

impl From<u32> for AttributeValue {
    fn from(v: u32) -> Self {
        AttributeValue::U32(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::I64(v)
    }
}

impl From<u64> for AttributeValue {
    fn from(v: u64) -> Self {
        AttributeValue::U64(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::F64(v)
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::String(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::String(v.to_string())
    }
}

impl From<Bytes> for AttributeValue {
    fn from(v: Bytes) -> Self {
        AttributeValue::Bytes(v)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(v: Vec<String>) -> Self {
        AttributeValue::StringList(v)
    }
}
