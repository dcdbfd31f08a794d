//! Configuration management for the circulation core

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    /// Number of hash buckets in the catalog index
    pub bucket_count: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CirculationConfig {
    /// Loan length used when the requested day offset is missing or not a number
    pub default_loan_days: i64,
    /// Fine charged per day late, in integer currency units
    pub fine_per_day: i64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub circulation: CirculationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // e.g. LIBRARY__CIRCULATION__FINE_PER_DAY=10
            .add_source(
                Environment::with_prefix("LIBRARY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { bucket_count: 20 }
    }
}

impl Default for CirculationConfig {
    fn default() -> Self {
        Self {
            default_loan_days: 14,
            fine_per_day: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
