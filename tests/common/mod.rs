//! Common test utilities and helpers

use std::fs;
use std::path::{Path, PathBuf};
use tabrecon::config::TabreconConfig;
use tabrecon::source::DuckDbSource;
use tabrecon::Result;
use tempfile::TempDir;

/// Test fixture manager for creating temporary test environments
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub config_path: PathBuf,
}

impl TestFixture {
    /// Create a new fixture with an empty config file
    pub fn new() -> Result<Self> {
        Self::with_config("{}")
    }

    /// Create a new fixture with the given config file content
    pub fn with_config(config: &str) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("tabrecon.json");
        fs::write(&config_path, config)?;

        Ok(Self {
            temp_dir,
            config_path,
        })
    }

    /// Get the root path of the test fixture
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config(&self) -> Result<TabreconConfig> {
        TabreconConfig::from_file(&self.config_path)
    }

    pub fn source(&self) -> Result<DuckDbSource> {
        DuckDbSource::from_config(&self.config()?)
    }

    /// Create a test CSV file with sample data
    pub fn create_csv(&self, name: &str, data: &[Vec<&str>]) -> Result<PathBuf> {
        let path = self.root().join(name);
        let mut content = String::new();

        for row in data {
            content.push_str(&row.join(","));
            content.push('\n');
        }

        fs::write(&path, content)?;
        Ok(path)
    }

    /// Create a DuckDB database with a customers/orders foreign key and
    /// point the config at it under the name `shop`
    pub fn create_shop_database(&mut self) -> Result<PathBuf> {
        let path = self.root().join("shop.duckdb");
        {
            let conn = duckdb::Connection::open(&path)?;
            conn.execute_batch(
                "CREATE TABLE customers (id INTEGER PRIMARY KEY, name VARCHAR, city VARCHAR);
                 CREATE TABLE orders (
                     id INTEGER PRIMARY KEY,
                     customer_id INTEGER REFERENCES customers(id),
                     total DOUBLE,
                     placed DATE
                 );
                 INSERT INTO customers VALUES (1, 'Ann', 'Oslo'), (2, 'Bob', 'Rome'), (3, 'Ann', 'Lima');
                 INSERT INTO orders VALUES
                     (10, 1, 9.5, '2024-01-03'),
                     (11, 2, 3.0, '2023-12-30'),
                     (12, 1, 9.5, '2024-02-11');",
            )?;
        }

        fs::write(&self.config_path, r#"{"databases": {"shop": "shop.duckdb"}}"#)?;
        Ok(path)
    }
}

/// Helper for running CLI commands in tests
pub struct CliTestRunner {
    fixture: TestFixture,
}

impl CliTestRunner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            fixture: TestFixture::new()?,
        })
    }

    pub fn fixture(&self) -> &TestFixture {
        &self.fixture
    }

    pub fn fixture_mut(&mut self) -> &mut TestFixture {
        &mut self.fixture
    }

    /// Run a tabrecon command and return the result
    pub fn run_command(&self, args: &[&str]) -> Result<()> {
        use clap::Parser;
        use tabrecon::cli::Cli;
        use tabrecon::commands::execute_command;

        let mut cmd_args = vec!["tabrecon"];
        cmd_args.extend(args);

        let cli = Cli::try_parse_from(cmd_args)
            .map_err(|e| tabrecon::TabreconError::invalid_input(e.to_string()))?;

        // Fall back to the fixture's config when no --config flag was given
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| self.fixture.config_path.clone());
        execute_command(cli.command, Some(config_path.as_path()))
    }

    /// Run a command and expect it to succeed
    pub fn expect_success(&self, args: &[&str]) {
        self.run_command(args).expect("Command should succeed");
    }

    /// Run a command and expect it to fail
    pub fn expect_failure(&self, args: &[&str]) -> tabrecon::TabreconError {
        self.run_command(args).expect_err("Command should fail")
    }
}

/// Sample data generators for testing
pub mod sample_data {
    pub fn people_left() -> Vec<Vec<&'static str>> {
        vec![
            vec!["Id", "First", "Last", "City"],
            vec!["1", "Ada", "Lovelace", "London"],
            vec!["2", "Alan", "Turing", "Wilmslow"],
            vec!["3", "Grace", "Hopper", "Arlington"],
            vec!["4", "Ada", "Lovelace", "London"],
        ]
    }

    pub fn people_right() -> Vec<Vec<&'static str>> {
        vec![
            vec!["Id", "FullName", "City"],
            vec!["1", "Ada Lovelace", "London"],
            vec!["2", "Alan Turing", "Manchester"],
            vec!["3", "Grace Hopper", "Arlington"],
        ]
    }

    pub fn versions() -> Vec<Vec<&'static str>> {
        vec![
            vec!["name", "released"],
            vec!["file10", "2021-06-01"],
            vec!["file2", "2023-02-14"],
            vec!["File1", "2019-11-30"],
        ]
    }
}

/// Build a string column list
pub fn cols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
