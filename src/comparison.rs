//! Positional row-for-row comparison of two tables

use crate::value::{cell, CellValue, Row};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Verdict for one row position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComparisonStatus {
    Same,
    Different,
    LeftOnly,
    RightOnly,
}

/// Result for one row position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonEntry {
    pub status: ComparisonStatus,
    pub diff_columns: Vec<String>,
}

impl ComparisonEntry {
    fn only(status: ComparisonStatus) -> Self {
        Self {
            status,
            diff_columns: Vec::new(),
        }
    }
}

/// Row position to verdict; always holds `max(left, right)` entries
pub type ComparisonResult = BTreeMap<usize, ComparisonEntry>;

/// How two cell values are judged equal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareOptions {
    /// Ignore leading and trailing whitespace
    pub trim_whitespace: bool,
    /// Compare text case-insensitively
    pub case_insensitive: bool,
    /// When set, numeric values within this absolute distance are equal
    pub numeric_tolerance: Option<f64>,
}

impl CompareOptions {
    /// Whether `a` and `b` count as the same value
    pub fn values_equal(&self, a: &CellValue, b: &CellValue) -> bool {
        if let Some(tolerance) = self.numeric_tolerance {
            if let (Some(na), Some(nb)) = (a.as_number(), b.as_number()) {
                return (na - nb).abs() <= tolerance;
            }
        }

        let ca = a.canonical();
        let cb = b.canonical();
        if ca == cb {
            return true;
        }
        // NULL never matches a non-null value after normalisation
        if a.is_null() || b.is_null() {
            return false;
        }

        let mut na: &str = &ca;
        let mut nb: &str = &cb;
        if self.trim_whitespace {
            na = na.trim();
            nb = nb.trim();
        }
        if self.case_insensitive {
            na.to_lowercase() == nb.to_lowercase()
        } else {
            na == nb
        }
    }
}

/// Per-status and per-column counts of a comparison
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub same: usize,
    pub different: usize,
    pub left_only: usize,
    pub right_only: usize,
    /// Number of differing rows per column, in compared-column order
    pub column_differences: IndexMap<String, usize>,
}

impl ComparisonSummary {
    pub fn from_result(result: &ComparisonResult, columns: &[String]) -> Self {
        let mut summary = Self {
            column_differences: columns.iter().map(|c| (c.clone(), 0)).collect(),
            ..Default::default()
        };

        for entry in result.values() {
            match entry.status {
                ComparisonStatus::Same => summary.same += 1,
                ComparisonStatus::Different => summary.different += 1,
                ComparisonStatus::LeftOnly => summary.left_only += 1,
                ComparisonStatus::RightOnly => summary.right_only += 1,
            }
            for column in &entry.diff_columns {
                *summary.column_differences.entry(column.clone()).or_insert(0) += 1;
            }
        }

        summary
    }

    pub fn total(&self) -> usize {
        self.same + self.different + self.left_only + self.right_only
    }

    pub fn has_changes(&self) -> bool {
        self.different + self.left_only + self.right_only > 0
    }
}

/// Compare with default (exact canonical) equality
pub fn compare(left: &[Row], right: &[Row], columns: &[String]) -> ComparisonResult {
    compare_with(left, right, columns, &CompareOptions::default())
}

/// Compare position `i` of `left` against position `i` of `right`.
/// Both sides must be in the same (unsorted or identically sorted) order.
pub fn compare_with(
    left: &[Row],
    right: &[Row],
    columns: &[String],
    options: &CompareOptions,
) -> ComparisonResult {
    let common = left.len().min(right.len());
    let total = left.len().max(right.len());

    let paired: Vec<(usize, ComparisonEntry)> = (0..common)
        .into_par_iter()
        .map(|i| (i, compare_pair(&left[i], &right[i], columns, options)))
        .collect();

    let mut result: ComparisonResult = paired.into_iter().collect();
    for i in common..total {
        let status = if i < left.len() {
            ComparisonStatus::LeftOnly
        } else {
            ComparisonStatus::RightOnly
        };
        result.insert(i, ComparisonEntry::only(status));
    }

    log::debug!(
        "Compared {} left rows with {} right rows over {} columns",
        left.len(),
        right.len(),
        columns.len()
    );

    result
}

fn compare_pair(
    left: &Row,
    right: &Row,
    columns: &[String],
    options: &CompareOptions,
) -> ComparisonEntry {
    let diff_columns: Vec<String> = columns
        .iter()
        .filter(|column| !options.values_equal(cell(left, column), cell(right, column)))
        .cloned()
        .collect();

    let status = if diff_columns.is_empty() {
        ComparisonStatus::Same
    } else {
        ComparisonStatus::Different
    };

    ComparisonEntry {
        status,
        diff_columns,
    }
}
