//! Runtime configuration.
//!
//! Layered, lowest priority first:
//! 1. Built-in defaults
//! 2. `stockpilot.toml` in the working directory, or the file named by `STOCKPILOT_CONFIG`
//! 3. Environment overrides, e.g. `STOCKPILOT__LEDGER__MAX_ATTEMPTS=8`

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use stockpilot_inventory::CostPolicy;
use stockpilot_observability::LogFormat;

use crate::retry::{DEFAULT_MAX_ATTEMPTS, RetryPolicy};
use crate::service::DEFAULT_LOW_STOCK_LIMIT;

pub const CONFIG_PATH_VAR: &str = "STOCKPILOT_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "stockpilot";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StockpilotConfig {
    pub ledger: LedgerSettings,
    pub reports: ReportSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LedgerSettings {
    /// Attempts per business event before giving up on version conflicts.
    pub max_attempts: u32,
    pub cost_policy: CostPolicy,
}

impl LedgerSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReportSettings {
    /// Row cap of the low-stock report when the caller passes none.
    pub low_stock_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingSettings {
    pub format: LogFormat,
    /// `EnvFilter` directive, e.g. `info` or `stockpilot_infra=debug`.
    pub level: String,
}

impl Default for StockpilotConfig {
    fn default() -> Self {
        Self {
            ledger: LedgerSettings {
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                cost_policy: CostPolicy::Latest,
            },
            reports: ReportSettings {
                low_stock_limit: DEFAULT_LOW_STOCK_LIMIT,
            },
            logging: LoggingSettings {
                format: LogFormat::Json,
                level: "info".to_string(),
            },
        }
    }
}

impl StockpilotConfig {
    /// Load from the default file location and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path)
    }

    /// Load from `path` (extension optional, missing file allowed) and the process environment.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("STOCKPILOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Defaults overlaid with an inline TOML document. No environment lookup.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        config::Config::builder()
            .set_default("ledger.max_attempts", i64::from(DEFAULT_MAX_ATTEMPTS))?
            .set_default("ledger.cost_policy", "latest")?
            .set_default(
                "reports.low_stock_limit",
                i64::try_from(DEFAULT_LOW_STOCK_LIMIT).unwrap_or(i64::MAX),
            )?
            .set_default("logging.format", "json")?
            .set_default("logging.level", "info")
    }
}
