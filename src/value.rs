//! Cell values, rows and the canonical forms shared by every engine component

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Canonical form of a missing or NULL cell. Tokens start with a single NUL
/// byte; text starting with NUL gets a second one in its canonical form, so
/// no text value canonicalizes to a token.
pub const NULL_TOKEN: &str = "\u{0}NULL";

/// Canonical form of a binary cell.
pub const BINARY_TOKEN: &str = "\u{0}BINARY";

/// Display form of a binary cell
pub const BINARY_MARKER: &str = "[binary]";

/// A single row: column name to value, in column order
pub type Row = IndexMap<String, CellValue>;

static NULL_CELL: CellValue = CellValue::Null;

/// One cell as delivered by the data provider
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    /// Opaque marker for binary content; only the length is kept
    Binary { len: usize },
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// String form used for equality, signatures and joins.
    pub fn canonical(&self) -> Cow<'_, str> {
        match self {
            Self::Null => Cow::Borrowed(NULL_TOKEN),
            Self::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            Self::Number(n) => Cow::Owned(canonical_number(n)),
            Self::Text(s) if s.starts_with('\u{0}') => Cow::Owned(format!("\u{0}{}", s)),
            Self::Text(s) => Cow::Borrowed(s.as_str()),
            Self::Binary { .. } => Cow::Borrowed(BINARY_TOKEN),
        }
    }

    /// Numeric coercion used by the sorter and by tolerant comparison.
    /// Empty or whitespace-only text is not numeric.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            Self::Number(n) => n.as_f64()?,
            Self::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok()?
            }
            Self::Null | Self::Binary { .. } => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Milliseconds since the Unix epoch when the cell is a recognisable,
    /// non-epoch-zero date. Only text cells are date candidates.
    pub fn as_timestamp(&self) -> Option<i64> {
        match self {
            Self::Text(s) => parse_timestamp(s.trim()).filter(|ts| *ts != 0),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Binary { .. } => write!(f, "{}", BINARY_MARKER),
            Self::Text(s) => write!(f, "{}", s),
            other => write!(f, "{}", other.canonical()),
        }
    }
}

impl From<serde_json::Value> for CellValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::Text(s),
            Value::Object(map) => match map.get("binary").and_then(Value::as_u64) {
                Some(len) if map.len() == 1 => Self::Binary { len: len as usize },
                _ => Self::Text(Value::Object(map).to_string()),
            },
            Value::Array(items) => Self::Text(Value::Array(items).to_string()),
        }
    }
}

impl From<CellValue> for serde_json::Value {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Null => serde_json::Value::Null,
            CellValue::Bool(b) => serde_json::Value::Bool(b),
            CellValue::Number(n) => serde_json::Value::Number(n),
            CellValue::Text(s) => serde_json::Value::String(s),
            CellValue::Binary { len } => serde_json::json!({ "binary": len }),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n)
            .map(Self::Number)
            .unwrap_or(Self::Null)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Look up a cell, treating a missing key as NULL
pub fn cell<'a>(row: &'a Row, column: &str) -> &'a CellValue {
    row.get(column).unwrap_or(&NULL_CELL)
}

/// Build rows from a JSON array of objects. Non-object entries become empty rows.
pub fn rows_from_json(value: serde_json::Value) -> Vec<Row> {
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::Object(map) => map
                    .into_iter()
                    .map(|(k, v)| (k, CellValue::from(v)))
                    .collect(),
                _ => Row::new(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Integral floats print without a fractional part so that `1.0` and `1`
/// canonicalize identically.
fn canonical_number(n: &serde_json::Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                return format!("{}", f as i64);
            }
        }
    }
    n.to_string()
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

fn parse_timestamp(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp_millis());
        }
    }

    None
}
