//! Duplicate and redundancy detection within one side of a comparison

use crate::value::{cell, Row};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Separator between canonical values in a signature
pub const SIGNATURE_SEPARATOR: char = '\u{1F}';

/// Caller-supplied analysis parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeOptions {
    /// Identity-like subset of columns used for name duplicate detection
    pub name_columns: Vec<String>,
}

impl AnalyzeOptions {
    pub fn with_name_columns(name_columns: Vec<String>) -> Self {
        Self { name_columns }
    }
}

/// Rows sharing an identical signature; always more than one index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub signature: String,
    pub indices: Vec<usize>,
}

/// Everything the analyzer reports for a row set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub duplicate_index_set: BTreeSet<usize>,
    pub redundant_columns: Vec<String>,
    pub name_duplicate_groups: Vec<DuplicateGroup>,
    pub name_duplicate_index_set: BTreeSet<usize>,
    /// Columns holding one canonical value (possibly NULL) across every row
    pub constant_columns: Vec<String>,
}

impl QualityReport {
    pub fn has_findings(&self) -> bool {
        !self.duplicate_groups.is_empty()
            || !self.redundant_columns.is_empty()
            || !self.name_duplicate_groups.is_empty()
            || !self.constant_columns.is_empty()
    }

    /// Rows that are not part of any full-row duplicate group, plus the
    /// first row of each group
    pub fn distinct_row_count(&self, total_rows: usize) -> usize {
        let redundant: usize = self
            .duplicate_groups
            .iter()
            .map(|g| g.indices.len() - 1)
            .sum();
        total_rows - redundant
    }
}

/// Signature of a row over `columns`, in the given order
pub fn row_signature(row: &Row, columns: &[String]) -> String {
    let mut signature = String::new();
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            signature.push(SIGNATURE_SEPARATOR);
        }
        let canonical = cell(row, column).canonical();
        if canonical.contains(SIGNATURE_SEPARATOR) || canonical.contains('\\') {
            signature.push_str(&escape_separator(&canonical));
        } else {
            signature.push_str(&canonical);
        }
    }
    signature
}

fn escape_separator(value: &str) -> String {
    value.replace('\\', "\\\\").replace(SIGNATURE_SEPARATOR, "\\u001f")
}

/// Analyze `rows` restricted to `columns`
pub fn analyze(rows: &[Row], columns: &[String], options: &AnalyzeOptions) -> QualityReport {
    if rows.is_empty() || columns.is_empty() {
        return QualityReport::default();
    }

    let duplicate_groups = duplicate_groups(rows, columns);
    let duplicate_index_set = flatten(&duplicate_groups);

    let (name_duplicate_groups, name_duplicate_index_set) = if options.name_columns.is_empty() {
        (Vec::new(), BTreeSet::new())
    } else {
        let groups = duplicate_groups_for(rows, &options.name_columns);
        let set = flatten(&groups);
        (groups, set)
    };

    let redundant_columns = redundant_columns(rows, columns);
    let constant_columns = constant_columns(rows, columns);

    log::debug!(
        "Analyzed {} rows x {} columns: {} duplicate groups, {} name groups, {} redundant, {} constant",
        rows.len(),
        columns.len(),
        duplicate_groups.len(),
        name_duplicate_groups.len(),
        redundant_columns.len(),
        constant_columns.len()
    );

    QualityReport {
        duplicate_groups,
        duplicate_index_set,
        redundant_columns,
        name_duplicate_groups,
        name_duplicate_index_set,
        constant_columns,
    }
}

/// Group row indices by their full signature over `columns`
pub fn duplicate_groups(rows: &[Row], columns: &[String]) -> Vec<DuplicateGroup> {
    if columns.is_empty() {
        return Vec::new();
    }
    duplicate_groups_for(rows, columns)
}

fn duplicate_groups_for(rows: &[Row], columns: &[String]) -> Vec<DuplicateGroup> {
    let signatures: Vec<String> = rows
        .par_iter()
        .map(|row| row_signature(row, columns))
        .collect();

    // IndexMap keeps groups ordered by first occurrence
    let mut by_signature: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (idx, signature) in signatures.into_iter().enumerate() {
        by_signature.entry(signature).or_default().push(idx);
    }

    by_signature
        .into_iter()
        .filter(|(_, indices)| indices.len() > 1)
        .map(|(signature, indices)| DuplicateGroup { signature, indices })
        .collect()
}

fn flatten(groups: &[DuplicateGroup]) -> BTreeSet<usize> {
    groups
        .iter()
        .flat_map(|g| g.indices.iter().copied())
        .collect()
}

/// Columns whose canonical values match an earlier column on every row.
/// Each redundant column is reported once, in input order.
pub fn redundant_columns(rows: &[Row], columns: &[String]) -> Vec<String> {
    if rows.is_empty() {
        return Vec::new();
    }

    let redundant: Vec<bool> = (0..columns.len())
        .into_par_iter()
        .map(|later| {
            (0..later).any(|earlier| {
                rows.iter().all(|row| {
                    cell(row, &columns[earlier]).canonical()
                        == cell(row, &columns[later]).canonical()
                })
            })
        })
        .collect();

    columns
        .iter()
        .zip(redundant)
        .filter(|(_, is_redundant)| *is_redundant)
        .map(|(column, _)| column.clone())
        .collect()
}

/// Columns that carry a single canonical value over all rows
pub fn constant_columns(rows: &[Row], columns: &[String]) -> Vec<String> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };

    columns
        .par_iter()
        .filter(|column| {
            let expected = cell(first, column).canonical();
            rows.iter().all(|row| cell(row, column).canonical() == expected)
        })
        .cloned()
        .collect()
}
