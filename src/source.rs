//! DuckDB-backed table data and relationship provider

use crate::config::TabreconConfig;
use crate::error::{Result, TabreconError};
use crate::provider::{
    quote_identifier, ForeignKey, PageRequest, RelationshipProvider, TableDataProvider, TablePage,
    TableRef, MAX_PAGE_SIZE,
};
use crate::value::{CellValue, Row};
use duckdb::types::ValueRef;
use duckdb::Connection;
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::Path;

/// Column types read natively; everything else is read as text
const NATIVE_TYPES: &[&str] = &[
    "BOOLEAN", "TINYINT", "SMALLINT", "INTEGER", "BIGINT", "HUGEINT", "UTINYINT", "USMALLINT",
    "UINTEGER", "UBIGINT", "FLOAT", "REAL", "DOUBLE", "BLOB",
];

/// Table source over an in-memory DuckDB connection. Files are exposed as
/// views and configured databases are attached read-only.
pub struct DuckDbSource {
    connection: Connection,
    catalog: String,
    registered: RefCell<HashSet<String>>,
}

impl DuckDbSource {
    /// Create a source with no attached databases
    pub fn new() -> Result<Self> {
        let connection = Connection::open_in_memory()?;
        connection.execute("SET enable_progress_bar=false", [])?;

        let catalog: String = connection
            .prepare("SELECT current_database()")?
            .query_row([], |row| row.get(0))?;

        Ok(Self {
            connection,
            catalog,
            registered: RefCell::new(HashSet::new()),
        })
    }

    /// Create a source and attach every database named in the config
    pub fn from_config(config: &TabreconConfig) -> Result<Self> {
        let source = Self::new()?;
        for (name, path) in &config.databases {
            source.attach(name, path)?;
        }
        Ok(source)
    }

    /// Attach a database file under `name`
    pub fn attach(&self, name: &str, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(TabreconError::config(format!(
                "Database '{}' not found at {}",
                name,
                path.display()
            )));
        }

        let sql = format!(
            "ATTACH {} AS {} (READ_ONLY)",
            quote_literal(&path.to_string_lossy()),
            quote_identifier(name)
        );
        self.connection.execute(&sql, []).map_err(|e| {
            TabreconError::data_processing(format!(
                "Failed to attach database '{}' ({}): {}",
                name,
                path.display(),
                e
            ))
        })?;

        log::info!("Attached database '{}' from {}", name, path.display());
        Ok(())
    }

    /// Expose a CSV, Parquet or JSON file as a view and return its reference
    pub fn register_file(&self, file_path: &Path) -> Result<TableRef> {
        if !file_path.is_file() {
            return Err(TabreconError::invalid_input(format!(
                "File not found: {}",
                file_path.display()
            )));
        }

        let stem = file_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "data".to_string());
        let view_name = self.unique_view_name(&stem);
        let table = TableRef::new(self.catalog.clone(), "main", view_name);

        let sql = format!(
            "CREATE VIEW {} AS SELECT * FROM {}",
            table.sql_identifier(),
            quote_literal(&file_path.to_string_lossy())
        );
        self.connection
            .execute(&sql, [])
            .map_err(|e| convert_load_error(e, file_path))?;

        log::debug!("Registered {} as {}", file_path.display(), table);
        Ok(table)
    }

    /// An existing file path is registered as a view; anything else must be
    /// a `database.schema.table` reference
    pub fn resolve_input(&self, input: &str) -> Result<TableRef> {
        let path = Path::new(input);
        if path.is_file() {
            self.register_file(path)
        } else {
            TableRef::parse(input)
        }
    }

    fn unique_view_name(&self, stem: &str) -> String {
        let mut registered = self.registered.borrow_mut();
        let mut name = stem.to_string();
        let mut suffix = 2;
        while registered.contains(&name) {
            name = format!("{}_{}", stem, suffix);
            suffix += 1;
        }
        registered.insert(name.clone());
        name
    }

    /// Column names and DuckDB types, in table order
    pub fn describe(&self, table: &TableRef) -> Result<Vec<(String, String)>> {
        let sql = format!("DESCRIBE {}", table.sql_identifier());
        let mut stmt = self
            .connection
            .prepare(&sql)
            .map_err(|_| TabreconError::table_not_found(table.to_string()))?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(|e| {
                TabreconError::data_processing(format!("Failed to describe {}: {}", table, e))
            })?;

        let mut columns = Vec::new();
        for row in rows {
            columns.push(row?);
        }
        Ok(columns)
    }

    fn count(&self, table: &TableRef, where_clause: &str, params: &[String]) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}{}", table.sql_identifier(), where_clause);
        let count: i64 = self
            .connection
            .prepare(&sql)?
            .query_row(duckdb::params_from_iter(params.iter()), |row| row.get(0))
            .map_err(|e| {
                TabreconError::data_processing(format!("Failed to count rows of {}: {}", table, e))
            })?;
        Ok(count.max(0) as u64)
    }
}

impl TableDataProvider for DuckDbSource {
    fn fetch_rows(&self, request: &PageRequest) -> Result<TablePage> {
        let table = &request.table;
        let described = self.describe(table)?;
        let columns: Vec<String> = described.iter().map(|(name, _)| name.clone()).collect();

        let mut predicates = Vec::new();
        let mut params = Vec::new();
        for filter in &request.filters {
            let (predicate, values) = filter.to_sql()?;
            predicates.push(predicate);
            params.extend(values);
        }
        let where_clause = if predicates.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", predicates.join(" AND "))
        };

        let total_rows = self.count(table, "", &[])?;
        let filtered_row_count = if predicates.is_empty() {
            None
        } else {
            Some(self.count(table, &where_clause, &params)?)
        };

        let select_list = if described.is_empty() {
            "*".to_string()
        } else {
            described
                .iter()
                .map(|(name, data_type)| projection(name, data_type))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let limit = request.limit.min(MAX_PAGE_SIZE);
        let sql = format!(
            "SELECT {} FROM {}{} LIMIT {} OFFSET {}",
            select_list,
            table.sql_identifier(),
            where_clause,
            limit,
            request.offset
        );

        let mut stmt = self.connection.prepare(&sql).map_err(|e| {
            TabreconError::data_processing(format!("Failed to prepare page query: {}", e))
        })?;
        let column_count = columns.len();
        let mapped = stmt
            .query_map(duckdb::params_from_iter(params.iter()), |row| {
                let mut values = Vec::with_capacity(column_count);
                for i in 0..column_count {
                    values.push(cell_from_ref(row.get_ref(i)?));
                }
                Ok(values)
            })
            .map_err(|e| {
                TabreconError::data_processing(format!("Failed to read rows of {}: {}", table, e))
            })?;

        let mut rows = Vec::new();
        for values in mapped {
            let values = values.map_err(|e| {
                TabreconError::data_processing(format!("Failed to process row: {}", e))
            })?;
            let row: Row = columns.iter().cloned().zip(values).collect();
            rows.push(row);
        }

        let available = filtered_row_count.unwrap_or(total_rows);
        let has_more = ((request.offset + rows.len()) as u64) < available;

        let relationships = if request.include_references {
            Some(self.fetch_foreign_keys(table)?)
        } else {
            None
        };

        log::debug!(
            "Fetched {} rows from {} (offset {}, total {})",
            rows.len(),
            table,
            request.offset,
            total_rows
        );

        Ok(TablePage {
            columns,
            rows,
            total_rows,
            filtered_row_count,
            has_more,
            relationships,
        })
    }
}

impl RelationshipProvider for DuckDbSource {
    fn fetch_foreign_keys(&self, table: &TableRef) -> Result<Vec<ForeignKey>> {
        // Parallel unnest pairs each referencing column with its referenced column.
        // duckdb_constraints() has no referenced schema column; it is read from
        // the constraint text when the reference is qualified.
        let sql = "SELECT COALESCE(constraint_name, ''), schema_name, table_name, \
                   unnest(constraint_column_names), referenced_table, \
                   unnest(referenced_column_names), COALESCE(constraint_text, '') \
                   FROM duckdb_constraints() \
                   WHERE constraint_type = 'FOREIGN KEY' \
                   AND database_name = ? AND schema_name = ? AND table_name = ?";

        let mut stmt = self.connection.prepare(sql).map_err(|e| {
            TabreconError::data_processing(format!("Failed to prepare foreign key query: {}", e))
        })?;
        let rows = stmt
            .query_map(
                duckdb::params![table.database, table.schema, table.table],
                |row| {
                    let schema: String = row.get(1)?;
                    let constraint_text: String = row.get(6)?;
                    let pk_schema =
                        referenced_schema(&constraint_text).unwrap_or_else(|| schema.clone());
                    Ok(ForeignKey {
                        fk_name: row.get(0)?,
                        fk_schema: schema,
                        fk_table: row.get(2)?,
                        fk_column: row.get(3)?,
                        pk_schema,
                        pk_table: row.get(4)?,
                        pk_column: row.get(5)?,
                    })
                },
            )
            .map_err(|e| {
                TabreconError::data_processing(format!(
                    "Failed to read foreign keys of {}: {}",
                    table, e
                ))
            })?;

        let mut keys = Vec::new();
        for key in rows {
            keys.push(key?);
        }
        Ok(keys)
    }
}

fn projection(name: &str, data_type: &str) -> String {
    let quoted = quote_identifier(name);
    if NATIVE_TYPES.contains(&data_type.to_uppercase().as_str()) {
        quoted
    } else {
        format!("CAST({} AS VARCHAR) AS {}", quoted, quoted)
    }
}

fn cell_from_ref(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Boolean(b) => CellValue::Bool(b),
        ValueRef::TinyInt(i) => CellValue::from(i as i64),
        ValueRef::SmallInt(i) => CellValue::from(i as i64),
        ValueRef::Int(i) => CellValue::from(i as i64),
        ValueRef::BigInt(i) => CellValue::from(i),
        ValueRef::HugeInt(i) => match i64::try_from(i) {
            Ok(n) => CellValue::from(n),
            Err(_) => CellValue::Text(i.to_string()),
        },
        ValueRef::UTinyInt(i) => CellValue::from(i as i64),
        ValueRef::USmallInt(i) => CellValue::from(i as i64),
        ValueRef::UInt(i) => CellValue::from(i as i64),
        ValueRef::UBigInt(i) => CellValue::Number(i.into()),
        ValueRef::Float(f) => CellValue::from(f as f64),
        ValueRef::Double(f) => CellValue::from(f),
        ValueRef::Text(s) => CellValue::Text(String::from_utf8_lossy(s).to_string()),
        ValueRef::Blob(b) => CellValue::Binary { len: b.len() },
        other => CellValue::Text(format!("{:?}", other)),
    }
}

/// Schema qualifier of the table named after `REFERENCES`, if any
fn referenced_schema(constraint_text: &str) -> Option<String> {
    let upper = constraint_text.to_ascii_uppercase();
    let start = upper.find("REFERENCES")? + "REFERENCES".len();
    let target = constraint_text.get(start..)?;
    let target = target.split('(').next()?.trim();

    let parts = split_qualified(target);
    if parts.len() >= 2 {
        Some(parts[parts.len() - 2].clone())
    } else {
        None
    }
}

/// Split a dotted name, honouring double-quoted parts
fn split_qualified(name: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = name.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            '.' if !quoted => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn convert_load_error(error: duckdb::Error, file_path: &Path) -> TabreconError {
    let message = error.to_string();
    if message.contains("CSV Error") || message.contains("Invalid CSV") {
        TabreconError::invalid_input(format!(
            "Malformed CSV file '{}': {}",
            file_path.display(),
            message
        ))
    } else if message.contains("JSON") {
        TabreconError::invalid_input(format!(
            "Malformed JSON file '{}': {}",
            file_path.display(),
            message
        ))
    } else {
        TabreconError::DuckDb(error)
    }
}
