//! Edge case tests for the engine components

use crate::common::cols;
use serde_json::json;
use tabrecon::combined::{resolve_rows, validate};
use tabrecon::comparison::CompareOptions;
use tabrecon::quality::QualityReport;
use tabrecon::value::{cell, rows_from_json};
use tabrecon::{
    analyze, compare, sort, AnalyzeOptions, CellValue, CombinedColumnDef, ComparisonStatus, Side,
    SortOrder, SortSpec,
};

#[test]
fn test_empty_inputs_give_empty_results() {
    assert!(compare(&[], &[], &cols(&["A"])).is_empty());
    assert_eq!(
        analyze(&[], &cols(&["A"]), &AnalyzeOptions::default()),
        QualityReport::default()
    );

    let outcome = sort(&[], &[]);
    assert!(outcome.sorted_rows.is_empty());
    assert!(outcome.original_to_sorted.is_empty());

    let validation = validate(&[], &cols(&["A"]));
    assert!(validation.valid.is_empty() && validation.invalid.is_empty());
}

#[test]
fn test_compare_with_no_columns_is_all_same() {
    let left = rows_from_json(json!([{"A": 1}, {"A": 2}]));
    let right = rows_from_json(json!([{"A": 9}]));
    let result = compare(&left, &right, &[]);

    assert_eq!(result[&0].status, ComparisonStatus::Same);
    assert_eq!(result[&1].status, ComparisonStatus::LeftOnly);
}

#[test]
fn test_one_side_empty() {
    let rows = rows_from_json(json!([{"A": 1}, {"A": 2}]));

    let result = compare(&[], &rows, &cols(&["A"]));
    assert!(result.values().all(|e| e.status == ComparisonStatus::RightOnly));

    let result = compare(&rows, &[], &cols(&["A"]));
    assert!(result.values().all(|e| e.status == ComparisonStatus::LeftOnly));
}

#[test]
fn test_binary_cells() {
    let left = rows_from_json(json!([{"B": {"binary": 4}}, {"B": {"binary": 4}}]));
    let right = rows_from_json(json!([{"B": {"binary": 8}}, {"B": null}]));
    let result = compare(&left, &right, &cols(&["B"]));

    // Binary content is opaque: any two binary cells compare equal
    assert_eq!(result[&0].status, ComparisonStatus::Same);
    assert_eq!(result[&1].status, ComparisonStatus::Different);

    let report = analyze(&left, &cols(&["B"]), &AnalyzeOptions::default());
    assert_eq!(report.duplicate_groups.len(), 1);

    let def = CombinedColumnDef::new("Tagged", cols(&["B"]), Side::Left);
    assert_eq!(def.combine(&left[0]), CellValue::from("[binary]"));
}

#[test]
fn test_null_token_does_not_collide_with_text() {
    let rows = rows_from_json(json!([
        {"A": null},
        {"A": "null"},
        {"A": "NULL"},
        {"A": "\u{0}NULL"}
    ]));
    let report = analyze(&rows, &cols(&["A"]), &AnalyzeOptions::default());
    assert!(report.duplicate_groups.is_empty());

    let result = compare(&rows[..1], &rows[2..3], &cols(&["A"]));
    assert_eq!(result[&0].status, ComparisonStatus::Different);

    let result = compare(&rows[..1], &rows[3..], &cols(&["A"]));
    assert_eq!(result[&0].status, ComparisonStatus::Different);
}

#[test]
fn test_mixed_type_sort_falls_back_to_text() {
    let rows = rows_from_json(json!([
        {"v": "banana"},
        {"v": 10},
        {"v": "2024-05-01"},
        {"v": "Apple"}
    ]));
    let outcome = sort(&rows, &[SortSpec::new("v", SortOrder::Alphabetical)]);
    let values: Vec<String> = outcome
        .sorted_rows
        .iter()
        .map(|r| cell(r, "v").to_string())
        .collect();

    // No pair is both dates or both numbers, so text collation decides
    assert_eq!(values, vec!["10", "2024-05-01", "Apple", "banana"]);
}

#[test]
fn test_epoch_zero_is_not_a_date() {
    let rows = rows_from_json(json!([{"d": "1970-01-01"}, {"d": "1969-12-31"}]));
    let outcome = sort(&rows, &[SortSpec::new("d", SortOrder::Newest)]);
    // Compared as text, descending
    assert_eq!(outcome.sorted_to_original, vec![0, 1]);
}

#[test]
fn test_redundant_columns_with_nulls() {
    let rows = rows_from_json(json!([
        {"A": null, "B": null, "C": 1},
        {"A": "x", "B": "x", "C": null}
    ]));
    let report = analyze(&rows, &cols(&["A", "B", "C"]), &AnalyzeOptions::default());
    assert_eq!(report.redundant_columns, cols(&["B"]));
    assert!(report.constant_columns.is_empty());
}

#[test]
fn test_three_identical_columns_report_each_later_once() {
    let rows = rows_from_json(json!([{"A": 1, "B": 1, "C": 1}, {"A": 2, "B": 2, "C": 2}]));
    let report = analyze(&rows, &cols(&["C", "B", "A"]), &AnalyzeOptions::default());
    assert_eq!(report.redundant_columns, cols(&["B", "A"]));
}

#[test]
fn test_combined_column_across_sides_only_resolves_own_side() {
    let rows = rows_from_json(json!([{"A": "x", "B": "y"}]));
    let defs = vec![CombinedColumnDef::new("AB", cols(&["A", "B"]), Side::Right)];

    let left = resolve_rows(&rows, Side::Left, &cols(&["A", "B"]), &defs);
    assert!(!left[0].contains_key("AB"));

    let right = resolve_rows(&rows, Side::Right, &cols(&["A", "B"]), &defs);
    assert_eq!(cell(&right[0], "AB"), &CellValue::from("x y"));
}

#[test]
fn test_numeric_tolerance_ignores_non_numbers() {
    let options = CompareOptions {
        numeric_tolerance: Some(0.5),
        ..Default::default()
    };
    assert!(options.values_equal(&CellValue::from("10"), &CellValue::from(10.4)));
    assert!(!options.values_equal(&CellValue::from("ten"), &CellValue::from(10i64)));
    assert!(options.values_equal(&CellValue::from("ten"), &CellValue::from("ten")));
}
