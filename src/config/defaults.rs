//! Configuration default values
//!
//! This module contains all the default values for configuration options,
//! making them easily changeable in one central location.

use std::time::Duration;

// Database defaults
pub const DEFAULT_DATABASE_URL: &str = "sqlite://./sales.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(30);

// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

// Source defaults
pub const DEFAULT_CSV_PATH: &str = "./data/sales_data.csv";

// Ingestion defaults
pub const DEFAULT_PROGRESS_UPDATE_INTERVAL: usize = 1000;
pub const DEFAULT_ROW_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_REFRESH_ON_STARTUP: bool = true;

// Environment overrides, e.g. SALES_LOADER__DATABASE__URL
pub const ENV_PREFIX: &str = "SALES_LOADER";
pub const ENV_SEPARATOR: &str = "__";
