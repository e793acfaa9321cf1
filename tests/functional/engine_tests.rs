//! Behaviour and invariants of the engine components

use crate::common::cols;
use serde_json::json;
use std::collections::{BTreeSet, HashSet};
use tabrecon::combined::{resolve_value, validate};
use tabrecon::quality::row_signature;
use tabrecon::value::{cell, rows_from_json};
use tabrecon::{
    analyze, compare, sort, AnalyzeOptions, CellValue, CombinedColumnDef, ComparisonStatus, Row,
    Side, SortOrder, SortSpec,
};

/// Deterministic pseudo-random rows (xorshift)
fn generated_rows(count: usize) -> Vec<Row> {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    (0..count)
        .map(|_| {
            let a = next() % 7;
            let b = next() % 3;
            let mut row = Row::new();
            row.insert("num".to_string(), CellValue::from(a as i64));
            row.insert("label".to_string(), CellValue::from(format!("item{}", b)));
            if a == 0 {
                row.insert("opt".to_string(), CellValue::Null);
            } else {
                row.insert("opt".to_string(), CellValue::from(format!("2024-01-{:02}", a)));
            }
            row
        })
        .collect()
}

#[test]
fn test_positional_rows_are_same_or_different() {
    let left = rows_from_json(json!([{"Id": 1, "Name": "A"}, {"Id": 2, "Name": "B"}]));
    let right = rows_from_json(json!([{"Id": 1, "Name": "A"}, {"Id": 2, "Name": "X"}]));

    let result = compare(&left, &right, &cols(&["Name"]));
    assert_eq!(result.len(), 2);
    assert_eq!(result[&0].status, ComparisonStatus::Same);
    assert!(result[&0].diff_columns.is_empty());
    assert_eq!(result[&1].status, ComparisonStatus::Different);
    assert_eq!(result[&1].diff_columns, cols(&["Name"]));
}

#[test]
fn test_extra_left_rows_are_left_only() {
    let left = rows_from_json(json!([{"A": 1}, {"A": 2}, {"A": 3}]));
    let right = rows_from_json(json!([{"A": 1}, {"A": 2}]));

    let result = compare(&left, &right, &cols(&["A"]));
    assert_eq!(result[&2].status, ComparisonStatus::LeftOnly);
}

#[test]
fn test_identical_rows_form_one_duplicate_group() {
    let rows = rows_from_json(json!([
        {"A": "x", "B": "y"},
        {"A": "x", "B": "y"},
        {"A": "z", "B": "w"}
    ]));
    let report = analyze(&rows, &cols(&["A", "B"]), &AnalyzeOptions::default());

    assert_eq!(report.duplicate_groups.len(), 1);
    assert_eq!(report.duplicate_groups[0].indices, vec![0, 1]);
    assert_eq!(report.duplicate_index_set, BTreeSet::from([0, 1]));
}

#[test]
fn test_numeric_text_sorts_by_value() {
    let rows = rows_from_json(json!([{"n": "10"}, {"n": "2"}, {"n": "1"}]));
    let outcome = sort(&rows, &[SortSpec::new("n", SortOrder::Alphabetical)]);

    let values: Vec<String> = outcome
        .sorted_rows
        .iter()
        .map(|r| cell(r, "n").to_string())
        .collect();
    assert_eq!(values, vec!["1", "2", "10"]);
}

#[test]
fn test_comparison_size_and_status_invariants() {
    let rows = generated_rows(40);
    for (l, r) in [(0, 0), (0, 5), (7, 0), (12, 30), (40, 40)] {
        let left = &rows[..l];
        let right = &rows[40 - r..];
        let result = compare(left, right, &cols(&["num", "label", "opt"]));

        assert_eq!(result.len(), l.max(r));
        for (&i, entry) in &result {
            match entry.status {
                ComparisonStatus::Same => assert!(entry.diff_columns.is_empty()),
                ComparisonStatus::Different => assert!(!entry.diff_columns.is_empty()),
                ComparisonStatus::LeftOnly => assert!(i < l && i >= r),
                ComparisonStatus::RightOnly => assert!(i < r && i >= l),
            }
            if i < l.min(r) {
                assert!(matches!(
                    entry.status,
                    ComparisonStatus::Same | ComparisonStatus::Different
                ));
            }
        }
    }
}

#[test]
fn test_duplicate_groups_share_signatures() {
    let rows = generated_rows(60);
    let columns = cols(&["num", "label"]);
    let options = AnalyzeOptions::with_name_columns(cols(&["label"]));
    let report = analyze(&rows, &columns, &options);

    let mut seen = HashSet::new();
    for group in &report.duplicate_groups {
        assert!(group.indices.len() > 1);
        let signature = row_signature(&rows[group.indices[0]], &columns);
        assert_eq!(group.signature, signature);
        for &i in &group.indices {
            assert_eq!(row_signature(&rows[i], &columns), signature);
            assert!(seen.insert(i), "row {} belongs to two groups", i);
        }
    }

    let flattened: BTreeSet<usize> = report
        .duplicate_groups
        .iter()
        .flat_map(|g| g.indices.iter().copied())
        .collect();
    assert_eq!(flattened, report.duplicate_index_set);

    // A row is a name duplicate exactly when its label occurs more than once
    for (i, row) in rows.iter().enumerate() {
        let occurrences = rows
            .iter()
            .filter(|other| cell(other, "label") == cell(row, "label"))
            .count();
        assert_eq!(report.name_duplicate_index_set.contains(&i), occurrences > 1);
    }
}

#[test]
fn test_sort_is_a_stable_bijection() {
    let rows = generated_rows(50);
    let specs = vec![
        SortSpec::new("opt", SortOrder::Newest),
        SortSpec::new("label", SortOrder::Alphabetical),
    ];

    let first = sort(&rows, &specs);
    let second = sort(&rows, &specs);
    assert_eq!(first, second);

    let mut targets = first.original_to_sorted.clone();
    targets.sort_unstable();
    assert_eq!(targets, (0..rows.len()).collect::<Vec<_>>());

    for (orig, &pos) in first.original_to_sorted.iter().enumerate() {
        assert_eq!(first.sorted_to_original[pos], orig);
        assert_eq!(first.sorted_rows[pos], rows[orig]);
    }

    // NULL dates sink to the end even though the order is descending
    let trailing_nulls = first
        .sorted_rows
        .iter()
        .rev()
        .take_while(|r| cell(r, "opt").is_null())
        .count();
    let total_nulls = rows.iter().filter(|r| cell(r, "opt").is_null()).count();
    assert_eq!(trailing_nulls, total_nulls);

    // Equal keys keep their input order
    for pair in first.sorted_to_original.windows(2) {
        let (a, b) = (&rows[pair[0]], &rows[pair[1]]);
        if cell(a, "opt") == cell(b, "opt") && cell(a, "label") == cell(b, "label") {
            assert!(pair[0] < pair[1]);
        }
    }
}

#[test]
fn test_resolve_value_passes_through_real_columns() {
    let rows = generated_rows(5);
    let defs = vec![CombinedColumnDef::new("both", cols(&["num", "label"]), Side::Left)];

    for row in &rows {
        for column in ["num", "label", "opt", "absent"] {
            assert_eq!(&resolve_value(row, Side::Left, column, &defs), cell(row, column));
        }
        let combined = resolve_value(row, Side::Left, "both", &defs);
        assert_eq!(
            combined.to_string(),
            format!("{} {}", cell(row, "num"), cell(row, "label"))
        );
    }
}

#[test]
fn test_validate_is_silent_about_dangling_sources() {
    let defs = vec![
        CombinedColumnDef::new("ok", cols(&["num"]), Side::Left),
        CombinedColumnDef::new("dangling", cols(&["nope"]), Side::Right),
    ];
    let validation = validate(&defs, &cols(&["num", "label"]));
    assert_eq!(validation.valid.len(), 1);
    assert_eq!(validation.invalid.len(), 1);
}
