//! # Ledger Configuration
//!
//! Settings for the database, order settlement and the analytics worker.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     KHATA_DATABASE_PATH=/var/lib/khata/khata.db                        │
//! │     KHATA_DELIVERY_CHARGE_PAISE=4000                                   │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/khata/khata.toml (Linux)                                 │
//! │     ~/Library/Application Support/in.khata.khata/khata.toml (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     ./khata.db, ₹30 delivery, 30 minute pickup estimate                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "./khata.db"
//! max_connections = 5
//!
//! [orders]
//! delivery_charge_paise = 3000
//! pickup_eta_minutes = 30
//!
//! [analytics]
//! queue_capacity = 1024
//! max_retries = 3
//! initial_backoff_ms = 50
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use khata_core::Money;
use khata_db::DbConfig;

use crate::error::{LedgerError, LedgerResult};

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file path, or ":memory:".
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./khata.db")
}

fn default_max_connections() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

// =============================================================================
// Order Settings
// =============================================================================

/// Pricing and scheduling knobs for online orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSettings {
    /// Flat delivery fee added to DELIVERY orders that contain at least one
    /// priced catalog line.
    #[serde(default = "default_delivery_charge")]
    pub delivery_charge_paise: i64,

    /// Minutes from creation until a PICKUP order is expected to be ready.
    #[serde(default = "default_pickup_eta")]
    pub pickup_eta_minutes: i64,
}

fn default_delivery_charge() -> i64 {
    3_000
}

fn default_pickup_eta() -> i64 {
    30
}

impl Default for OrderSettings {
    fn default() -> Self {
        OrderSettings {
            delivery_charge_paise: default_delivery_charge(),
            pickup_eta_minutes: default_pickup_eta(),
        }
    }
}

impl OrderSettings {
    pub fn delivery_charge(&self) -> Money {
        Money::from_paise(self.delivery_charge_paise)
    }
}

// =============================================================================
// Analytics Settings
// =============================================================================

/// Analytics worker queue and retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSettings {
    /// Deltas buffered before new ones are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Attempts after the first failure before a delta is dropped.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff before the first retry; doubles on each attempt.
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff() -> u64 {
    50
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        AnalyticsSettings {
            queue_capacity: default_queue_capacity(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
        }
    }
}

impl AnalyticsSettings {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete ledger configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub orders: OrderSettings,

    #[serde(default)]
    pub analytics: AnalyticsSettings,
}

impl LedgerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (khata.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> LedgerResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading ledger config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load ledger config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> LedgerResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| LedgerError::Config("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Ledger config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(LedgerError::Config("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(LedgerError::Config(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.orders.delivery_charge_paise < 0 {
            return Err(LedgerError::Config(
                "orders.delivery_charge_paise must not be negative".into(),
            ));
        }

        if self.orders.pickup_eta_minutes < 0 {
            return Err(LedgerError::Config(
                "orders.pickup_eta_minutes must not be negative".into(),
            ));
        }

        if self.analytics.queue_capacity == 0 {
            return Err(LedgerError::Config(
                "analytics.queue_capacity must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("KHATA_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(max) = std::env::var("KHATA_DATABASE_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid KHATA_DATABASE_MAX_CONNECTIONS"),
            }
        }

        if let Ok(charge) = std::env::var("KHATA_DELIVERY_CHARGE_PAISE") {
            match charge.parse::<i64>() {
                Ok(paise) => {
                    debug!(paise, "Overriding delivery charge from environment");
                    self.orders.delivery_charge_paise = paise;
                }
                Err(_) => warn!(value = %charge, "Ignoring invalid KHATA_DELIVERY_CHARGE_PAISE"),
            }
        }

        if let Ok(eta) = std::env::var("KHATA_PICKUP_ETA_MINUTES") {
            match eta.parse::<i64>() {
                Ok(minutes) => self.orders.pickup_eta_minutes = minutes,
                Err(_) => warn!(value = %eta, "Ignoring invalid KHATA_PICKUP_ETA_MINUTES"),
            }
        }

        if let Ok(capacity) = std::env::var("KHATA_ANALYTICS_QUEUE_CAPACITY") {
            if let Ok(n) = capacity.parse::<usize>() {
                self.analytics.queue_capacity = n;
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("in", "khata", "khata")
            .map(|dirs| dirs.config_dir().join("khata.toml"))
    }

    /// Pool settings derived from the `[database]` section.
    pub fn db_config(&self) -> DbConfig {
        let path = self.database.path.to_string_lossy();
        if path == ":memory:" {
            return DbConfig::in_memory();
        }

        DbConfig::new(self.database.path.clone())
            .max_connections(self.database.max_connections)
            .connect_timeout(Duration::from_secs(self.database.connect_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.orders.delivery_charge(), Money::from_rupees(30));
        assert_eq!(config.orders.pickup_eta_minutes, 30);
        assert_eq!(config.analytics.queue_capacity, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = LedgerConfig::default();

        config.orders.delivery_charge_paise = -1;
        assert!(config.validate().is_err());

        config.orders.delivery_charge_paise = 0;
        assert!(config.validate().is_ok());

        config.analytics.queue_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: LedgerConfig = toml::from_str(
            r#"
            [orders]
            delivery_charge_paise = 4500
            "#,
        )
        .unwrap();

        assert_eq!(config.orders.delivery_charge_paise, 4500);
        assert_eq!(config.orders.pickup_eta_minutes, 30);
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_toml_serialization() {
        let config = LedgerConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[database]"));
        assert!(toml_str.contains("[orders]"));
        assert!(toml_str.contains("[analytics]"));
    }

    #[test]
    fn test_memory_path_maps_to_in_memory_pool() {
        let mut config = LedgerConfig::default();
        config.database.path = PathBuf::from(":memory:");
        assert!(config.db_config().is_in_memory());
    }
}
