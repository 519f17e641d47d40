//! Configuration validation.
//!
//! Checks the storage and logging sections before the store is opened.

use crate::domain::error::TradebookError;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_POOL_SIZE: i64 = 4;
pub const MAX_POOL_SIZE: i64 = 64;
const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

pub fn validate_app_config(config: &dyn ConfigPort) -> Result<(), TradebookError> {
    validate_storage_path(config)?;
    validate_pool_size(config)?;
    validate_log_level(config)?;
    Ok(())
}

fn validate_storage_path(config: &dyn ConfigPort) -> Result<(), TradebookError> {
    match config.get_string("storage", "path") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(TradebookError::ConfigMissing {
            section: "storage".to_string(),
            key: "path".to_string(),
        }),
    }
}

fn validate_pool_size(config: &dyn ConfigPort) -> Result<(), TradebookError> {
    let value = config.get_int("storage", "pool_size", DEFAULT_POOL_SIZE);
    if !(1..=MAX_POOL_SIZE).contains(&value) {
        return Err(TradebookError::ConfigInvalid {
            section: "storage".to_string(),
            key: "pool_size".to_string(),
            reason: format!("pool_size must be between 1 and {MAX_POOL_SIZE}"),
        });
    }
    Ok(())
}

fn validate_log_level(config: &dyn ConfigPort) -> Result<(), TradebookError> {
    match config.get_string("logging", "level") {
        None => Ok(()),
        Some(level) if LOG_LEVELS.contains(&level.trim().to_lowercase().as_str()) => Ok(()),
        Some(level) => Err(TradebookError::ConfigInvalid {
            section: "logging".to_string(),
            key: "level".to_string(),
            reason: format!("unknown log level '{level}'"),
        }),
    }
}
