//! Comparison session: the user's ephemeral choices passed into every engine call

use crate::combined::{self, Column, CombinedColumnDef, Side};
use crate::comparison::{self, CompareOptions, ComparisonResult, ComparisonSummary};
use crate::quality::{self, AnalyzeOptions, QualityReport};
use crate::sort::{self, SortOutcome, SortSpec};
use crate::value::Row;

/// Rows of one side after combined columns have been resolved
#[derive(Debug, Clone)]
pub struct PreparedSide {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl PreparedSide {
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Output of a positional comparison run
#[derive(Debug, Clone)]
pub struct ComparisonRun {
    pub result: ComparisonResult,
    pub summary: ComparisonSummary,
    /// Compared columns that survived validation against both sides
    pub columns: Vec<String>,
}

/// State held for the lifetime of one side-by-side session. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct ComparisonSession {
    combined: Vec<CombinedColumnDef>,
    left_sort: Vec<SortSpec>,
    right_sort: Vec<SortSpec>,
    compared_columns: Vec<String>,
    comparing: bool,
    pub name_columns: Vec<String>,
    pub compare_options: CompareOptions,
}

impl ComparisonSession {
    pub fn new(compare_options: CompareOptions) -> Self {
        Self {
            compare_options,
            ..Default::default()
        }
    }

    pub fn add_combined(&mut self, def: CombinedColumnDef) {
        self.combined.push(def);
    }

    /// Remove a definition by id, returning it if present
    pub fn remove_combined(&mut self, id: &str) -> Option<CombinedColumnDef> {
        let pos = self.combined.iter().position(|d| d.id == id)?;
        Some(self.combined.remove(pos))
    }

    pub fn combined(&self) -> &[CombinedColumnDef] {
        &self.combined
    }

    pub fn set_sort(&mut self, side: Side, specs: Vec<SortSpec>) {
        match side {
            Side::Left => self.left_sort = specs,
            Side::Right => self.right_sort = specs,
        }
    }

    /// Enter row-for-row comparison over `columns`
    pub fn start_comparison(&mut self, columns: Vec<String>) {
        self.compared_columns = columns;
        self.comparing = true;
    }

    pub fn stop_comparison(&mut self) {
        self.comparing = false;
    }

    pub fn is_comparing(&self) -> bool {
        self.comparing
    }

    pub fn compared_columns(&self) -> &[String] {
        &self.compared_columns
    }

    /// Sort keys in force for `side`. While comparing, positional alignment
    /// must hold, so no side is sorted.
    pub fn effective_sort(&self, side: Side) -> &[SortSpec] {
        if self.comparing {
            return &[];
        }
        match side {
            Side::Left => &self.left_sort,
            Side::Right => &self.right_sort,
        }
    }

    /// Resolve combined columns for one side
    pub fn prepare(&self, side: Side, rows: &[Row], real_columns: &[String]) -> PreparedSide {
        PreparedSide {
            columns: combined::column_list(real_columns, side, &self.combined),
            rows: combined::resolve_rows(rows, side, real_columns, &self.combined),
        }
    }

    /// Compare both sides over the session's compared columns. Columns absent
    /// from either prepared side are left out of the comparison.
    pub fn run_comparison(
        &self,
        left_rows: &[Row],
        left_columns: &[String],
        right_rows: &[Row],
        right_columns: &[String],
    ) -> ComparisonRun {
        let left = self.prepare(Side::Left, left_rows, left_columns);
        let right = self.prepare(Side::Right, right_rows, right_columns);
        let left_names = left.column_names();
        let right_names = right.column_names();

        let columns: Vec<String> = self
            .compared_columns
            .iter()
            .filter(|c| left_names.contains(c) && right_names.contains(c))
            .cloned()
            .collect();
        if columns.len() < self.compared_columns.len() {
            log::warn!(
                "Ignoring {} compared column(s) missing from one side",
                self.compared_columns.len() - columns.len()
            );
        }

        let result = comparison::compare_with(&left.rows, &right.rows, &columns, &self.compare_options);
        let summary = ComparisonSummary::from_result(&result, &columns);

        ComparisonRun {
            result,
            summary,
            columns,
        }
    }

    /// Data-quality analysis of one side over all of its columns
    pub fn run_analysis(&self, side: Side, rows: &[Row], real_columns: &[String]) -> QualityReport {
        let prepared = self.prepare(side, rows, real_columns);
        let options = AnalyzeOptions::with_name_columns(self.name_columns.clone());
        quality::analyze(&prepared.rows, &prepared.column_names(), &options)
    }

    /// Sort one side with its effective sort keys
    pub fn run_sort(&self, side: Side, rows: &[Row], real_columns: &[String]) -> SortOutcome {
        let prepared = self.prepare(side, rows, real_columns);
        let specs = self.effective_sort(side);
        if self.comparing {
            log::debug!("Sorting of {} side suppressed while comparing", side);
        }
        sort::sort(&prepared.rows, specs)
    }
}
