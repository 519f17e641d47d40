//! Concrete adapter implementations for ports.

pub mod file_config_adapter;
pub mod record_upgrade;
pub mod sqlite_adapter;
pub mod system_clock;
