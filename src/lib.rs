//! # tabrecon
//!
//! Reconciliation engine for browsing two tables side by side: positional
//! row comparison, duplicate and redundant-column detection, virtual combined
//! columns and type-aware multi-key sorting.

pub mod cli;
pub mod combined;
pub mod commands;
pub mod comparison;
pub mod config;
pub mod error;
pub mod output;
pub mod provider;
pub mod quality;
pub mod session;
pub mod sort;
pub mod source;
pub mod value;

pub use combined::{CombinedColumnDef, Side};
pub use comparison::{compare, ComparisonEntry, ComparisonStatus};
pub use error::{Result, TabreconError};
pub use quality::{analyze, AnalyzeOptions, DuplicateGroup, QualityReport};
pub use session::ComparisonSession;
pub use sort::{sort, SortOrder, SortSpec};
pub use value::{CellValue, Row};
