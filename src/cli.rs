//! Command-line interface for tabrecon

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tabrecon")]
#[command(about = "Reconcile two tables side by side: row diffs, duplicates and sorting")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a tabrecon.json config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare two tables row for row
    Compare {
        /// Left input: file path or database.schema.table
        left: String,

        /// Right input: file path or database.schema.table
        right: String,

        /// Columns to compare (defaults to columns present on both sides)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Combined column on the left side, as NAME=col1+col2
        #[arg(long = "left-combined")]
        left_combined: Vec<String>,

        /// Combined column on the right side, as NAME=col1+col2
        #[arg(long = "right-combined")]
        right_combined: Vec<String>,

        /// Row filter applied to both sides, e.g. "Status=active"
        #[arg(long = "filter")]
        filters: Vec<String>,

        /// Rows to fetch per side (defaults to the configured page size)
        #[arg(long, value_parser = validate_limit)]
        limit: Option<usize>,

        /// Rows to skip on each side
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Report duplicate rows and redundant columns of one table
    Analyze {
        /// Input: file path or database.schema.table
        input: String,

        /// Identity columns used for name duplicate detection
        #[arg(long = "name-columns", value_delimiter = ',')]
        name_columns: Vec<String>,

        /// Combined column, as NAME=col1+col2
        #[arg(long)]
        combined: Vec<String>,

        /// Row filter, e.g. "Status=active"
        #[arg(long = "filter")]
        filters: Vec<String>,

        /// Rows to fetch (defaults to the configured page size)
        #[arg(long, value_parser = validate_limit)]
        limit: Option<usize>,

        /// Rows to skip
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Sort one table by one or more columns
    Sort {
        /// Input: file path or database.schema.table
        input: String,

        /// Sort key as column[:order], order one of alphabetical, reverse, newest, oldest
        #[arg(long = "by", required = true)]
        by: Vec<String>,

        /// Combined column, as NAME=col1+col2
        #[arg(long)]
        combined: Vec<String>,

        /// Row filter, e.g. "Status=active"
        #[arg(long = "filter")]
        filters: Vec<String>,

        /// Rows to fetch (defaults to the configured page size)
        #[arg(long, value_parser = validate_limit)]
        limit: Option<usize>,

        /// Rows to skip
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// List foreign keys of a table
    Relations {
        /// Table reference: database.schema.table
        table: String,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },
}

/// Parse output format string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {}. Use 'pretty' or 'json'", s)),
        }
    }
}

/// Validate that a page limit is greater than 0
fn validate_limit(s: &str) -> Result<usize, String> {
    let limit: usize = s
        .parse()
        .map_err(|_| format!("Invalid limit: '{}'. Must be a positive integer.", s))?;

    if limit == 0 {
        return Err("Limit must be greater than 0".to_string());
    }

    Ok(limit)
}
