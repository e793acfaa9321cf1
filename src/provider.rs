//! Boundary types for the external table data and relationship providers

use crate::error::{Result, TabreconError};
use crate::value::Row;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on rows fetched in one page
pub const MAX_PAGE_SIZE: usize = 10_000;

/// Fully qualified table reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub database: String,
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(
        database: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Parse `database.schema.table`
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('.').collect();
        match parts.as_slice() {
            [database, schema, table]
                if !database.is_empty() && !schema.is_empty() && !table.is_empty() =>
            {
                Ok(Self::new(*database, *schema, *table))
            }
            _ => Err(TabreconError::invalid_input(format!(
                "Invalid table reference '{}': expected database.schema.table",
                s
            ))),
        }
    }

    /// Quoted SQL identifier for this table
    pub fn sql_identifier(&self) -> String {
        format!(
            "{}.{}.{}",
            quote_identifier(&self.database),
            quote_identifier(&self.schema),
            quote_identifier(&self.table)
        )
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.database, self.schema, self.table)
    }
}

/// Double-quote an identifier, escaping embedded quotes
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Comparison applied by a row filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    Contains,
    StartsWith,
    GreaterThan,
    LessThan,
    IsNull,
    IsNotNull,
}

impl FilterOperator {
    pub fn takes_value(self) -> bool {
        !matches!(self, Self::IsNull | Self::IsNotNull)
    }
}

/// One predicate of a page request; filters are AND-ed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowFilter {
    pub column: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: Option<String>,
}

impl RowFilter {
    pub fn new(column: impl Into<String>, operator: FilterOperator, value: Option<String>) -> Self {
        Self {
            column: column.into(),
            operator,
            value,
        }
    }

    /// Parse `column=value`, `column!=value`, `column~value` (contains),
    /// `column^value` (starts with), `column>value`, `column<value`,
    /// `column:null` and `column:notnull`
    pub fn parse(s: &str) -> Result<Self> {
        if let Some(column) = s.strip_suffix(":null") {
            return Ok(Self::new(column, FilterOperator::IsNull, None));
        }
        if let Some(column) = s.strip_suffix(":notnull") {
            return Ok(Self::new(column, FilterOperator::IsNotNull, None));
        }

        const OPERATORS: &[(&str, FilterOperator)] = &[
            ("!=", FilterOperator::NotEquals),
            ("=", FilterOperator::Equals),
            ("~", FilterOperator::Contains),
            ("^", FilterOperator::StartsWith),
            (">", FilterOperator::GreaterThan),
            ("<", FilterOperator::LessThan),
        ];

        let found = OPERATORS
            .iter()
            .filter_map(|(token, op)| s.find(token).map(|pos| (pos, *token, *op)))
            .min_by_key(|(pos, token, _)| (*pos, std::cmp::Reverse(token.len())));

        match found {
            Some((pos, token, op)) if pos > 0 => Ok(Self::new(
                &s[..pos],
                op,
                Some(s[pos + token.len()..].to_string()),
            )),
            _ => Err(TabreconError::invalid_input(format!(
                "Invalid filter '{}': expected column<op>value",
                s
            ))),
        }
    }

    /// SQL predicate with `?` placeholders and the values to bind
    pub fn to_sql(&self) -> Result<(String, Vec<String>)> {
        let column = quote_identifier(&self.column);
        let value = match (self.operator.takes_value(), &self.value) {
            (true, Some(v)) => v.clone(),
            (true, None) => {
                return Err(TabreconError::invalid_input(format!(
                    "Filter on '{}' requires a value",
                    self.column
                )))
            }
            (false, _) => String::new(),
        };

        let clause = match self.operator {
            FilterOperator::Equals => (format!("CAST({} AS VARCHAR) = ?", column), vec![value]),
            FilterOperator::NotEquals => (format!("CAST({} AS VARCHAR) <> ?", column), vec![value]),
            FilterOperator::Contains => (
                format!("contains(lower(CAST({} AS VARCHAR)), lower(?))", column),
                vec![value],
            ),
            FilterOperator::StartsWith => (
                format!("starts_with(CAST({} AS VARCHAR), ?)", column),
                vec![value],
            ),
            FilterOperator::GreaterThan => (format!("{} > ?", column), vec![value]),
            FilterOperator::LessThan => (format!("{} < ?", column), vec![value]),
            FilterOperator::IsNull => (format!("{} IS NULL", column), Vec::new()),
            FilterOperator::IsNotNull => (format!("{} IS NOT NULL", column), Vec::new()),
        };
        Ok(clause)
    }
}

/// A request for one page of a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRequest {
    pub table: TableRef,
    pub limit: usize,
    pub offset: usize,
    pub include_references: bool,
    pub filters: Vec<RowFilter>,
}

impl PageRequest {
    pub fn new(table: TableRef, limit: usize) -> Self {
        Self {
            table,
            limit: limit.min(MAX_PAGE_SIZE),
            offset: 0,
            include_references: false,
            filters: Vec::new(),
        }
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_filters(mut self, filters: Vec<RowFilter>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_references(mut self, include: bool) -> Self {
        self.include_references = include;
        self
    }
}

/// Foreign key column pair as reported by the relationship provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ForeignKey {
    pub fk_name: String,
    pub fk_schema: String,
    pub fk_table: String,
    pub fk_column: String,
    pub pk_schema: String,
    pub pk_table: String,
    pub pk_column: String,
}

/// One fetched page. Row order is whatever the underlying query produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablePage {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub total_rows: u64,
    pub filtered_row_count: Option<u64>,
    pub has_more: bool,
    pub relationships: Option<Vec<ForeignKey>>,
}

/// Source of table pages
pub trait TableDataProvider {
    fn fetch_rows(&self, request: &PageRequest) -> Result<TablePage>;
}

/// Source of foreign key metadata
pub trait RelationshipProvider {
    fn fetch_foreign_keys(&self, table: &TableRef) -> Result<Vec<ForeignKey>>;
}
