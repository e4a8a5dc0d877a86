//! Centralized configuration management for jobtrack

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::table::PAGE_SIZE_OPTIONS;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database file
    pub database_path: PathBuf,
    /// Log file written by the subscriber in `main`
    pub log_file: PathBuf,
    /// Table behaviour shared by every screen
    pub table: TableConfig,
}

/// Data table settings
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Initial rows per page
    pub page_size: usize,
    /// Characters shown before long text is truncated
    pub long_text_max: usize,
    /// Cells the pointer must travel before a drag starts
    pub drag_distance: u16,
    /// Maximum gap between the clicks of a double click
    pub double_click_ms: u64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            long_text_max: 20,
            drag_distance: 1,
            double_click_ms: 400,
        }
    }
}

impl TableConfig {
    pub fn double_click_window(&self) -> Duration {
        Duration::from_millis(self.double_click_ms)
    }
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let database_path = std::env::var("JOBTRACK_DB_PATH")
            .unwrap_or_else(|_| "./jobtrack.db".to_string())
            .into();

        let log_file = std::env::var("JOBTRACK_LOG_FILE")
            .unwrap_or_else(|_| "jobtrack.log".to_string())
            .into();

        let defaults = TableConfig::default();
        let table = TableConfig {
            page_size: parse_env_var("JOBTRACK_PAGE_SIZE")?.unwrap_or(defaults.page_size),
            long_text_max: parse_env_var("JOBTRACK_LONG_TEXT_MAX")?.unwrap_or(defaults.long_text_max),
            drag_distance: parse_env_var("JOBTRACK_DRAG_DISTANCE")?.unwrap_or(defaults.drag_distance),
            double_click_ms: parse_env_var("JOBTRACK_DOUBLE_CLICK_MS")?.unwrap_or(defaults.double_click_ms),
        };

        Ok(Config {
            database_path,
            log_file,
            table,
        })
    }

    /// Get database path as string
    pub fn database_path_str(&self) -> &str {
        self.database_path.to_str().unwrap_or("./jobtrack.db")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(parent) = self.database_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(anyhow::anyhow!(
                    "Database parent directory does not exist: {}",
                    parent.display()
                ));
            }
        }

        if !PAGE_SIZE_OPTIONS.contains(&self.table.page_size) {
            return Err(anyhow::anyhow!(
                "JOBTRACK_PAGE_SIZE must be one of {:?}, got {}",
                PAGE_SIZE_OPTIONS,
                self.table.page_size
            ));
        }

        if self.table.long_text_max == 0 {
            return Err(anyhow::anyhow!("JOBTRACK_LONG_TEXT_MAX must be greater than 0"));
        }

        Ok(())
    }
}

/// Helper function to parse environment variable as a specific type
fn parse_env_var<T>(var_name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match std::env::var(var_name) {
        Ok(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            database_path: "./jobtrack.db".into(),
            log_file: "jobtrack.log".into(),
            table: TableConfig::default(),
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = config();
        assert_eq!(config.database_path_str(), "./jobtrack.db");
        assert_eq!(config.table.page_size, 10);
        assert_eq!(config.table.long_text_max, 20);
        assert_eq!(config.table.double_click_window(), Duration::from_millis(400));
    }

    #[test]
    fn test_config_validation() {
        config().validate().unwrap();

        let mut bad = config();
        bad.table.page_size = 7;
        assert!(bad.validate().is_err());

        let mut bad = config();
        bad.table.long_text_max = 0;
        assert!(bad.validate().is_err());

        let mut bad = config();
        bad.database_path = "/definitely/missing/dir/jobtrack.db".into();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_parse_env_var() {
        std::env::set_var("JOBTRACK_TEST_PARSE_OK", "25");
        std::env::set_var("JOBTRACK_TEST_PARSE_BAD", "many");
        assert_eq!(parse_env_var::<usize>("JOBTRACK_TEST_PARSE_OK").unwrap(), Some(25));
        assert!(parse_env_var::<usize>("JOBTRACK_TEST_PARSE_BAD").is_err());
        assert_eq!(parse_env_var::<usize>("JOBTRACK_TEST_PARSE_UNSET").unwrap(), None);
    }
}
