//! Configuration loading for tabrecon

use crate::comparison::CompareOptions;
use crate::error::{Result, TabreconError};
use crate::provider::MAX_PAGE_SIZE;
use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File looked up in the working directory when no config is given
pub const DEFAULT_CONFIG_FILE: &str = "tabrecon.json";

/// Environment variable naming a config file
pub const CONFIG_ENV_VAR: &str = "TABRECON_CONFIG";

/// Default number of rows fetched per side
pub const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabreconConfig {
    /// Database name to DuckDB database file, attached read-only
    pub databases: IndexMap<String, PathBuf>,
    pub page_size: usize,
    pub compare: CompareOptions,
}

impl Default for TabreconConfig {
    fn default() -> Self {
        Self {
            databases: IndexMap::new(),
            page_size: DEFAULT_PAGE_SIZE,
            compare: CompareOptions::default(),
        }
    }
}

impl TabreconConfig {
    /// Load from an explicit path, then `$TABRECON_CONFIG`, then
    /// `./tabrecon.json`, falling back to defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::from_file(Path::new(&path));
        }

        let default_path = std::env::current_dir()?.join(DEFAULT_CONFIG_FILE);
        if default_path.is_file() {
            return Self::from_file(&default_path);
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read and validate a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(TabreconError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        let mut config: Self = serde_json::from_str(&content).map_err(|e| {
            TabreconError::config(format!("Invalid config file '{}': {}", path.display(), e))
        })?;

        // Relative database paths are relative to the config file
        if let Some(base) = path.parent() {
            for db_path in config.databases.values_mut() {
                if db_path.is_relative() {
                    *db_path = base.join(&*db_path);
                }
            }
        }

        config.validate()?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&mut self) -> Result<()> {
        if self.page_size == 0 {
            return Err(TabreconError::config("page_size must be greater than 0"));
        }
        if self.page_size > MAX_PAGE_SIZE {
            log::warn!(
                "page_size {} exceeds the maximum of {}, clamping",
                self.page_size,
                MAX_PAGE_SIZE
            );
            self.page_size = MAX_PAGE_SIZE;
        }
        if let Some(tolerance) = self.compare.numeric_tolerance {
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err(TabreconError::config(
                    "compare.numeric_tolerance must be a non-negative number",
                ));
            }
        }
        Ok(())
    }
}
