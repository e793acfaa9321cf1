//! Output formatting utilities

use crate::commands::{AnalyzeReport, CompareReport, SortReport};
use crate::comparison::ComparisonStatus;
use crate::error::Result;
use crate::provider::{ForeignKey, TableRef};
use crate::quality::DuplicateGroup;
use crate::value::{cell, Row};

/// Maximum number of rows listed in pretty output
const MAX_LISTED_ROWS: usize = 20;

/// Pretty printer for tabrecon output
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Print a positional comparison
    pub fn print_compare_report(report: &CompareReport) {
        let summary = &report.summary;
        println!("🔍 Compare: {} ↔ {}", report.left, report.right);
        println!("├─ Columns: {}", report.columns.join(", "));
        println!("├─ ✅ Same: {}", summary.same);
        println!("├─ ❌ Different: {}", summary.different);
        println!("├─ ◀ Left only: {}", summary.left_only);
        println!("├─ ▶ Right only: {}", summary.right_only);

        let changed: Vec<_> = summary
            .column_differences
            .iter()
            .filter(|(_, count)| **count > 0)
            .collect();
        if !changed.is_empty() {
            println!("├─ Differences per column:");
            for (column, count) in &changed {
                println!("│  ├─ {}: {}", column, count);
            }
        }

        let listed: Vec<_> = report
            .entries
            .iter()
            .filter(|(_, entry)| entry.status != ComparisonStatus::Same)
            .collect();
        if listed.is_empty() {
            println!("└─ Rows: all {} positions match", summary.total());
            return;
        }

        println!("└─ Rows:");
        for (i, (position, entry)) in listed.iter().take(MAX_LISTED_ROWS).enumerate() {
            let is_last = i == listed.len().min(MAX_LISTED_ROWS) - 1;
            let prefix = if is_last { "   └─" } else { "   ├─" };
            match entry.status {
                ComparisonStatus::Different => println!(
                    "{} Row {}: different ({})",
                    prefix,
                    position,
                    entry.diff_columns.join(", ")
                ),
                ComparisonStatus::LeftOnly => println!("{} Row {}: left only", prefix, position),
                ComparisonStatus::RightOnly => println!("{} Row {}: right only", prefix, position),
                ComparisonStatus::Same => {}
            }
        }
        if listed.len() > MAX_LISTED_ROWS {
            println!("   ... and {} more", listed.len() - MAX_LISTED_ROWS);
        }
    }

    /// Print a data-quality analysis
    pub fn print_analyze_report(report: &AnalyzeReport) {
        let quality = &report.quality;
        println!("🧪 Data quality: {}", report.table);
        println!("├─ Rows: {}", report.row_count);
        println!("├─ Columns: {}", report.columns.len());

        Self::print_groups("Duplicate rows", &quality.duplicate_groups);
        Self::print_groups("Name duplicates", &quality.name_duplicate_groups);

        if quality.redundant_columns.is_empty() {
            println!("├─ ✅ Redundant columns: none");
        } else {
            println!("├─ ❌ Redundant columns: {}", quality.redundant_columns.join(", "));
        }

        if quality.constant_columns.is_empty() {
            println!("└─ ✅ Constant columns: none");
        } else {
            println!("└─ ⚠️ Constant columns: {}", quality.constant_columns.join(", "));
        }
    }

    fn print_groups(label: &str, groups: &[DuplicateGroup]) {
        if groups.is_empty() {
            println!("├─ ✅ {}: none", label);
            return;
        }

        println!("├─ ❌ {}: {} group(s)", label, groups.len());
        for (i, group) in groups.iter().take(MAX_LISTED_ROWS).enumerate() {
            let is_last = i == groups.len().min(MAX_LISTED_ROWS) - 1;
            let prefix = if is_last { "│  └─" } else { "│  ├─" };
            let indices: Vec<String> = group.indices.iter().map(|i| i.to_string()).collect();
            println!("{} Rows {}", prefix, indices.join(", "));
        }
    }

    /// Print sorted rows
    pub fn print_sort_report(report: &SortReport) {
        let keys: Vec<String> = report
            .sort
            .iter()
            .map(|s| format!("{} ({})", s.column, s.order))
            .collect();
        println!("↕️ Sorted {} by {}", report.table, keys.join(", "));
        println!("{}", format_row_header(&report.columns));

        let rows = &report.outcome.sorted_rows;
        for (pos, row) in rows.iter().take(MAX_LISTED_ROWS).enumerate() {
            let original = report.outcome.sorted_to_original[pos];
            println!("{:>5} │ {}", original, format_row(row, &report.columns));
        }
        if rows.len() > MAX_LISTED_ROWS {
            println!("... and {} more rows", rows.len() - MAX_LISTED_ROWS);
        }
    }

    /// Print foreign keys of a table
    pub fn print_relations(table: &TableRef, keys: &[ForeignKey]) {
        if keys.is_empty() {
            println!("No foreign keys found on {}.", table);
            return;
        }

        println!("🔗 Foreign keys of {}:", table);
        for (i, key) in keys.iter().enumerate() {
            let prefix = if i == keys.len() - 1 { "└─" } else { "├─" };
            println!(
                "{} {}: {}.{}.{} → {}.{}.{}",
                prefix,
                key.fk_name,
                key.fk_schema,
                key.fk_table,
                key.fk_column,
                key.pk_schema,
                key.pk_table,
                key.pk_column
            );
        }
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format any serializable data as JSON
    pub fn format<T: serde::Serialize + ?Sized>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }
}

fn format_row_header(columns: &[String]) -> String {
    format!("{:>5} │ {}", "#", columns.join(" │ "))
}

fn format_row(row: &Row, columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| truncate(&cell(row, c).to_string(), 32))
        .collect::<Vec<_>>()
        .join(" │ ")
}

/// Shorten a value for display, counting characters rather than bytes
fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let kept: String = value.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}
