//! Virtual "combined" columns built by concatenating real columns

use crate::value::{cell, CellValue, Row, BINARY_MARKER};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Separator placed between source values of a combined column
pub const COMBINED_SEPARATOR: &str = " ";

/// Which table of a comparison a definition or row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// Whether a column is native to its table or derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Real,
    Combined,
}

/// A column name tagged with its kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn real(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Real,
        }
    }

    pub fn combined(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Combined,
        }
    }
}

/// Definition of a virtual column for one side of a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedColumnDef {
    pub id: String,
    pub name: String,
    pub source_columns: Vec<String>,
    pub side: Side,
}

impl CombinedColumnDef {
    /// Create a definition with a freshly generated id
    pub fn new(name: impl Into<String>, source_columns: Vec<String>, side: Side) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            source_columns,
            side,
        }
    }

    /// Parse `NAME=col1+col2+...` as used on the command line
    pub fn parse(spec: &str, side: Side) -> Result<Self, String> {
        let (name, sources) = spec
            .split_once('=')
            .ok_or_else(|| format!("Invalid combined column '{}': expected NAME=col1+col2", spec))?;

        let name = name.trim();
        if name.is_empty() {
            return Err(format!("Invalid combined column '{}': name is empty", spec));
        }

        let source_columns: Vec<String> = sources
            .split('+')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if source_columns.is_empty() {
            return Err(format!("Invalid combined column '{}': no source columns", spec));
        }

        Ok(Self::new(name, source_columns, side))
    }

    pub fn is_valid_for(&self, available_columns: &[String]) -> bool {
        self.source_columns
            .iter()
            .all(|source| available_columns.iter().any(|c| c == source))
    }

    /// Whether the definition can produce a value for `row`: every source is
    /// present and the name does not shadow a real cell
    pub fn applies_to(&self, row: &Row) -> bool {
        !row.contains_key(&self.name)
            && self
                .source_columns
                .iter()
                .all(|source| row.contains_key(source))
    }

    /// Join the non-null source values in declared order
    pub fn combine(&self, row: &Row) -> CellValue {
        let parts: Vec<String> = self
            .source_columns
            .iter()
            .map(|source| cell(row, source))
            .filter(|value| !value.is_null())
            .map(|value| match value {
                CellValue::Binary { .. } => BINARY_MARKER.to_string(),
                other => other.to_string(),
            })
            .collect();

        if parts.is_empty() {
            CellValue::Null
        } else {
            CellValue::Text(parts.join(COMBINED_SEPARATOR))
        }
    }
}

/// Definitions split by whether their sources exist
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    pub valid: Vec<CombinedColumnDef>,
    pub invalid: Vec<CombinedColumnDef>,
}

/// Split `defs` into usable and unusable definitions. A definition is
/// unusable when a source column is unavailable, when its name is already a
/// real column, or when an earlier definition on the same side took the name.
/// Never fails.
pub fn validate(defs: &[CombinedColumnDef], available_columns: &[String]) -> Validation {
    let mut validation = Validation::default();
    let mut taken: HashSet<(Side, &str)> = HashSet::new();

    for def in defs {
        let problem = if !def.is_valid_for(available_columns) {
            Some("missing source column")
        } else if available_columns.iter().any(|c| *c == def.name) {
            Some("name is already a real column")
        } else if !taken.insert((def.side, def.name.as_str())) {
            Some("name is already a combined column")
        } else {
            None
        };

        match problem {
            None => validation.valid.push(def.clone()),
            Some(reason) => {
                log::debug!(
                    "Dropping combined column '{}' ({}): {} among {:?}",
                    def.name,
                    def.side,
                    reason,
                    def.source_columns
                );
                validation.invalid.push(def.clone());
            }
        }
    }

    validation
}

/// Validate only the definitions that belong to `side`
pub fn validate_for_side(
    defs: &[CombinedColumnDef],
    side: Side,
    available_columns: &[String],
) -> Validation {
    let side_defs: Vec<CombinedColumnDef> =
        defs.iter().filter(|d| d.side == side).cloned().collect();
    validate(&side_defs, available_columns)
}

/// Value of `column_name` for a row on `side`. Combined names resolve to the
/// joined source values; any other name, or a definition that does not apply
/// to the row, passes through to the real cell unchanged.
pub fn resolve_value(
    row: &Row,
    side: Side,
    column_name: &str,
    defs: &[CombinedColumnDef],
) -> CellValue {
    match defs
        .iter()
        .find(|d| d.side == side && d.name == column_name && d.applies_to(row))
    {
        Some(def) => def.combine(row),
        None => cell(row, column_name).clone(),
    }
}

/// Append the value of every valid definition for `side` to each row.
/// Definitions referencing columns outside `real_columns` are skipped.
pub fn resolve_rows(
    rows: &[Row],
    side: Side,
    real_columns: &[String],
    defs: &[CombinedColumnDef],
) -> Vec<Row> {
    let valid = validate_for_side(defs, side, real_columns).valid;
    if valid.is_empty() {
        return rows.to_vec();
    }

    rows.iter()
        .map(|row| {
            let mut resolved = row.clone();
            for def in &valid {
                let value = def.combine(row);
                resolved.insert(def.name.clone(), value);
            }
            resolved
        })
        .collect()
}

/// Real columns followed by the names of valid combined columns for `side`
pub fn column_list(
    real_columns: &[String],
    side: Side,
    defs: &[CombinedColumnDef],
) -> Vec<Column> {
    let mut columns: Vec<Column> = real_columns.iter().map(Column::real).collect();
    for def in validate_for_side(defs, side, real_columns).valid {
        columns.push(Column::combined(def.name));
    }
    columns
}
