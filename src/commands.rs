//! Command implementations for tabrecon CLI

use crate::cli::{Commands, OutputFormat};
use crate::combined::{CombinedColumnDef, Side};
use crate::comparison::{ComparisonEntry, ComparisonSummary};
use crate::config::TabreconConfig;
use crate::error::{Result, TabreconError};
use crate::output::{JsonFormatter, PrettyPrinter};
use crate::provider::{
    ForeignKey, PageRequest, RelationshipProvider, RowFilter, TableDataProvider, TablePage,
    TableRef,
};
use crate::quality::QualityReport;
use crate::session::ComparisonSession;
use crate::sort::{SortOutcome, SortSpec};
use crate::source::DuckDbSource;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Result of the `compare` command
#[derive(Debug, Clone, Serialize)]
pub struct CompareReport {
    pub left: TableRef,
    pub right: TableRef,
    pub columns: Vec<String>,
    pub summary: ComparisonSummary,
    pub entries: BTreeMap<usize, ComparisonEntry>,
}

/// Result of the `analyze` command
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeReport {
    pub table: TableRef,
    pub row_count: usize,
    pub columns: Vec<String>,
    pub quality: QualityReport,
}

/// Result of the `sort` command
#[derive(Debug, Clone, Serialize)]
pub struct SortReport {
    pub table: TableRef,
    pub columns: Vec<String>,
    pub sort: Vec<SortSpec>,
    pub outcome: SortOutcome,
}

/// Page-level options shared by the data commands
#[derive(Debug, Clone, Default)]
pub struct PageOptions {
    pub filters: Vec<String>,
    pub limit: Option<usize>,
    pub offset: usize,
}

/// Execute a command
pub fn execute_command(command: Commands, config_path: Option<&Path>) -> Result<()> {
    let config = TabreconConfig::load(config_path)?;
    let source = DuckDbSource::from_config(&config)?;

    match command {
        Commands::Compare {
            left,
            right,
            columns,
            left_combined,
            right_combined,
            filters,
            limit,
            offset,
            format,
        } => {
            let format = parse_format(&format)?;
            let page = PageOptions {
                filters,
                limit,
                offset,
            };
            let report = compare_tables(
                &source,
                &config,
                &left,
                &right,
                columns,
                &left_combined,
                &right_combined,
                &page,
            )?;
            match format {
                OutputFormat::Pretty => PrettyPrinter::print_compare_report(&report),
                OutputFormat::Json => println!("{}", JsonFormatter::format(&report)?),
            }
            Ok(())
        }
        Commands::Analyze {
            input,
            name_columns,
            combined,
            filters,
            limit,
            offset,
            format,
        } => {
            let format = parse_format(&format)?;
            let page = PageOptions {
                filters,
                limit,
                offset,
            };
            let report = analyze_table(&source, &config, &input, name_columns, &combined, &page)?;
            match format {
                OutputFormat::Pretty => PrettyPrinter::print_analyze_report(&report),
                OutputFormat::Json => println!("{}", JsonFormatter::format(&report)?),
            }
            Ok(())
        }
        Commands::Sort {
            input,
            by,
            combined,
            filters,
            limit,
            offset,
            format,
        } => {
            let format = parse_format(&format)?;
            let page = PageOptions {
                filters,
                limit,
                offset,
            };
            let report = sort_table(&source, &config, &input, &by, &combined, &page)?;
            match format {
                OutputFormat::Pretty => PrettyPrinter::print_sort_report(&report),
                OutputFormat::Json => println!("{}", JsonFormatter::format(&report)?),
            }
            Ok(())
        }
        Commands::Relations { table, format } => {
            let format = parse_format(&format)?;
            let table = TableRef::parse(&table)?;
            let keys = list_relations(&source, &table)?;
            match format {
                OutputFormat::Pretty => PrettyPrinter::print_relations(&table, &keys),
                OutputFormat::Json => println!("{}", JsonFormatter::format(&keys)?),
            }
            Ok(())
        }
    }
}

/// Fetch a page from both inputs and compare them position by position
#[allow(clippy::too_many_arguments)]
pub fn compare_tables(
    source: &DuckDbSource,
    config: &TabreconConfig,
    left: &str,
    right: &str,
    columns: Vec<String>,
    left_combined: &[String],
    right_combined: &[String],
    page: &PageOptions,
) -> Result<CompareReport> {
    let mut session = ComparisonSession::new(config.compare.clone());
    for spec in left_combined {
        session.add_combined(parse_combined(spec, Side::Left)?);
    }
    for spec in right_combined {
        session.add_combined(parse_combined(spec, Side::Right)?);
    }

    let left_ref = source.resolve_input(left)?;
    let right_ref = source.resolve_input(right)?;
    let left_page = fetch_page(source, config, &left_ref, page)?;
    let right_page = fetch_page(source, config, &right_ref, page)?;

    let columns = if columns.is_empty() {
        shared_columns(&session, &left_page, &right_page)
    } else {
        columns
    };
    if columns.is_empty() {
        log::warn!("{} and {} have no columns in common", left_ref, right_ref);
    }

    session.start_comparison(columns);
    let run = session.run_comparison(
        &left_page.rows,
        &left_page.columns,
        &right_page.rows,
        &right_page.columns,
    );
    session.stop_comparison();

    log::info!(
        "Compared {} with {}: {} same, {} different, {} left-only, {} right-only",
        left_ref,
        right_ref,
        run.summary.same,
        run.summary.different,
        run.summary.left_only,
        run.summary.right_only
    );

    Ok(CompareReport {
        left: left_ref,
        right: right_ref,
        columns: run.columns,
        summary: run.summary,
        entries: run.result,
    })
}

/// Fetch a page from one input and run the data-quality analysis on it
pub fn analyze_table(
    source: &DuckDbSource,
    config: &TabreconConfig,
    input: &str,
    name_columns: Vec<String>,
    combined: &[String],
    page: &PageOptions,
) -> Result<AnalyzeReport> {
    let mut session = ComparisonSession::new(config.compare.clone());
    for spec in combined {
        session.add_combined(parse_combined(spec, Side::Left)?);
    }
    session.name_columns = name_columns;

    let table = source.resolve_input(input)?;
    let table_page = fetch_page(source, config, &table, page)?;
    let prepared = session.prepare(Side::Left, &table_page.rows, &table_page.columns);
    let quality = session.run_analysis(Side::Left, &table_page.rows, &table_page.columns);

    Ok(AnalyzeReport {
        table,
        row_count: table_page.rows.len(),
        columns: prepared.column_names(),
        quality,
    })
}

/// Fetch a page from one input and sort it by the given keys
pub fn sort_table(
    source: &DuckDbSource,
    config: &TabreconConfig,
    input: &str,
    by: &[String],
    combined: &[String],
    page: &PageOptions,
) -> Result<SortReport> {
    let specs = by
        .iter()
        .map(|s| SortSpec::parse(s).map_err(TabreconError::invalid_input))
        .collect::<Result<Vec<_>>>()?;

    let mut session = ComparisonSession::new(config.compare.clone());
    for spec in combined {
        session.add_combined(parse_combined(spec, Side::Left)?);
    }
    session.set_sort(Side::Left, specs.clone());

    let table = source.resolve_input(input)?;
    let table_page = fetch_page(source, config, &table, page)?;
    let columns = session
        .prepare(Side::Left, &table_page.rows, &table_page.columns)
        .column_names();

    for spec in &specs {
        if !columns.contains(&spec.column) {
            return Err(TabreconError::invalid_input(format!(
                "Unknown sort column '{}' in {}",
                spec.column, table
            )));
        }
    }

    let outcome = session.run_sort(Side::Left, &table_page.rows, &table_page.columns);
    Ok(SortReport {
        table,
        columns,
        sort: specs,
        outcome,
    })
}

/// Foreign keys declared on a table
pub fn list_relations(source: &DuckDbSource, table: &TableRef) -> Result<Vec<ForeignKey>> {
    source.describe(table)?;
    source.fetch_foreign_keys(table)
}

fn fetch_page(
    source: &DuckDbSource,
    config: &TabreconConfig,
    table: &TableRef,
    page: &PageOptions,
) -> Result<TablePage> {
    let filters = page
        .filters
        .iter()
        .map(|f| RowFilter::parse(f))
        .collect::<Result<Vec<_>>>()?;

    let request = PageRequest::new(table.clone(), page.limit.unwrap_or(config.page_size))
        .with_offset(page.offset)
        .with_filters(filters);
    let table_page = source.fetch_rows(&request)?;

    if table_page.has_more {
        log::info!(
            "{}: showing {} of {} rows",
            table,
            table_page.rows.len(),
            table_page.filtered_row_count.unwrap_or(table_page.total_rows)
        );
    }
    Ok(table_page)
}

/// Columns (real and combined) present on both sides, in left order
fn shared_columns(session: &ComparisonSession, left: &TablePage, right: &TablePage) -> Vec<String> {
    let left_names = combined_names(session, Side::Left, &left.columns);
    let right_names = combined_names(session, Side::Right, &right.columns);
    left_names
        .into_iter()
        .filter(|c| right_names.contains(c))
        .collect()
}

fn combined_names(session: &ComparisonSession, side: Side, real_columns: &[String]) -> Vec<String> {
    crate::combined::column_list(real_columns, side, session.combined())
        .into_iter()
        .map(|c| c.name)
        .collect()
}

fn parse_combined(spec: &str, side: Side) -> Result<CombinedColumnDef> {
    CombinedColumnDef::parse(spec, side).map_err(TabreconError::invalid_input)
}

fn parse_format(format: &str) -> Result<OutputFormat> {
    OutputFormat::parse(format).map_err(TabreconError::invalid_input)
}
