//! Stable, type-inferring, multi-key row sorting

use crate::value::{cell, CellValue, Row};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Direction of one sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Alphabetical,
    Reverse,
    Newest,
    Oldest,
}

impl SortOrder {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "alphabetical" | "asc" => Ok(Self::Alphabetical),
            "reverse" | "desc" => Ok(Self::Reverse),
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            _ => Err(format!(
                "Invalid sort order: {}. Use 'alphabetical', 'reverse', 'newest' or 'oldest'",
                s
            )),
        }
    }

    pub fn is_descending(self) -> bool {
        matches!(self, Self::Reverse | Self::Newest)
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Alphabetical => "alphabetical",
            Self::Reverse => "reverse",
            Self::Newest => "newest",
            Self::Oldest => "oldest",
        };
        write!(f, "{}", name)
    }
}

/// One key of a multi-column sort; earlier keys take precedence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(column: impl Into<String>, order: SortOrder) -> Self {
        Self {
            column: column.into(),
            order,
        }
    }

    /// Parse `column[:order]`, defaulting to alphabetical
    pub fn parse(s: &str) -> Result<Self, String> {
        let (column, order) = match s.rsplit_once(':') {
            Some((column, order)) => (column, SortOrder::parse(order)?),
            None => (s, SortOrder::Alphabetical),
        };
        if column.is_empty() {
            return Err(format!("Invalid sort spec '{}': column is empty", s));
        }
        Ok(Self::new(column, order))
    }
}

/// Result of a sort: reordered rows plus the permutation in both directions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortOutcome {
    pub sorted_rows: Vec<Row>,
    /// `original_to_sorted[i]` is the post-sort position of input row `i`
    pub original_to_sorted: Vec<usize>,
    /// `sorted_to_original[j]` is the input position of output row `j`
    pub sorted_to_original: Vec<usize>,
}

impl SortOutcome {
    fn identity(rows: &[Row]) -> Self {
        let identity: Vec<usize> = (0..rows.len()).collect();
        Self {
            sorted_rows: rows.to_vec(),
            original_to_sorted: identity.clone(),
            sorted_to_original: identity,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.sorted_to_original
            .iter()
            .enumerate()
            .all(|(pos, &orig)| pos == orig)
    }
}

/// Sort `rows` by `specs`. Ties on every key keep input order.
pub fn sort(rows: &[Row], specs: &[SortSpec]) -> SortOutcome {
    if specs.is_empty() || rows.len() < 2 {
        return SortOutcome::identity(rows);
    }

    let order = merge_sort_indices(rows.len(), |a, b| compare_rows(&rows[a], &rows[b], specs));

    let mut original_to_sorted = vec![0; rows.len()];
    for (sorted_pos, &orig) in order.iter().enumerate() {
        original_to_sorted[orig] = sorted_pos;
    }

    SortOutcome {
        sorted_rows: order.iter().map(|&i| rows[i].clone()).collect(),
        original_to_sorted,
        sorted_to_original: order,
    }
}

/// Stable bottom-up merge sort over `0..len`. Tolerates comparators that are not
/// a total order, which pairwise type inference yields on mixed columns.
fn merge_sort_indices<F>(len: usize, cmp: F) -> Vec<usize>
where
    F: Fn(usize, usize) -> Ordering,
{
    let mut order: Vec<usize> = (0..len).collect();
    let mut buffer = Vec::with_capacity(len);
    let mut width = 1;

    while width < len {
        buffer.clear();
        let mut start = 0;
        while start < len {
            let mid = (start + width).min(len);
            let end = (start + 2 * width).min(len);
            let (mut i, mut j) = (start, mid);
            while i < mid && j < end {
                if cmp(order[j], order[i]) == Ordering::Less {
                    buffer.push(order[j]);
                    j += 1;
                } else {
                    buffer.push(order[i]);
                    i += 1;
                }
            }
            buffer.extend_from_slice(&order[i..mid]);
            buffer.extend_from_slice(&order[j..end]);
            start = end;
        }
        std::mem::swap(&mut order, &mut buffer);
        width *= 2;
    }

    order
}

/// Compare two rows key by key until one key decides
pub fn compare_rows(a: &Row, b: &Row, specs: &[SortSpec]) -> Ordering {
    for spec in specs {
        let ordering = compare_values(cell(a, &spec.column), cell(b, &spec.column), spec.order);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Compare two cells for one key. NULL sorts last in either direction.
pub fn compare_values(a: &CellValue, b: &CellValue, order: SortOrder) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }

    let ascending = compare_inferred(a, b);
    if order.is_descending() {
        ascending.reverse()
    } else {
        ascending
    }
}

/// Dates, then numbers, then natural string collation
fn compare_inferred(a: &CellValue, b: &CellValue) -> Ordering {
    if let (Some(ta), Some(tb)) = (a.as_timestamp(), b.as_timestamp()) {
        return ta.cmp(&tb);
    }

    if let (Some(na), Some(nb)) = (a.as_number(), b.as_number()) {
        return na.partial_cmp(&nb).unwrap_or(Ordering::Equal);
    }

    natural_cmp(&a.to_string(), &b.to_string())
}

/// Case- and accent-insensitive comparison where runs of ASCII digits compare
/// by value, so "file2" < "file10" and "école" < "zebra".
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a = collation_key(a);
    let b = collation_key(b);
    let mut a_chars = a.chars().peekable();
    let mut b_chars = b.chars().peekable();

    loop {
        match (a_chars.peek().copied(), b_chars.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) if ca.is_ascii_digit() && cb.is_ascii_digit() => {
                let run_a = take_digits(&mut a_chars);
                let run_b = take_digits(&mut b_chars);
                let ordering = compare_digit_runs(&run_a, &run_b);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(ca), Some(cb)) => {
                let ordering = ca.cmp(&cb);
                if ordering != Ordering::Equal {
                    return ordering;
                }
                a_chars.next();
                b_chars.next();
            }
        }
    }
}

/// Lowercased canonical decomposition with combining marks removed, so
/// accented letters fold onto their base letter
fn collation_key(s: &str) -> String {
    s.nfd()
        .flat_map(char::to_lowercase)
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
