//! Runtime configuration for CareDesk.
//!
//! Every setting has a default and can be overridden through a `CAREDESK_*`
//! environment variable.

use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "CareDesk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_DB_PATH: &str = "caredesk.db";
const DEFAULT_LOG_PATH: &str = "caredesk.log";
const DEFAULT_LOG_FILTER: &str = "caredesk=info";
const DEFAULT_TICK_MS: u64 = 33;

/// Work factor bounds accepted by bcrypt.
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

/// Settings resolved at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Path of the SQLite file backing the key-value store.
    pub db_path: PathBuf,
    /// File that receives tracing output (the terminal belongs to the UI).
    pub log_path: PathBuf,
    /// `EnvFilter` directive string.
    pub log_filter: String,
    /// bcrypt work factor used when storing new passwords.
    pub bcrypt_cost: u32,
    /// How long the UI waits for input before emitting a tick.
    pub tick_rate: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            tick_rate: Duration::from_millis(DEFAULT_TICK_MS),
        }
    }
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// Values that fail to parse keep their default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("CAREDESK_DB").filter(|v| !v.trim().is_empty()) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("CAREDESK_LOG").filter(|v| !v.trim().is_empty()) {
            config.log_path = PathBuf::from(path);
        }
        if let Some(filter) = lookup("CAREDESK_LOG_FILTER").or_else(|| lookup("RUST_LOG")) {
            if !filter.trim().is_empty() {
                config.log_filter = filter;
            }
        }
        if let Some(cost) =
            lookup("CAREDESK_BCRYPT_COST").and_then(|v| v.trim().parse::<u32>().ok())
        {
            config.bcrypt_cost = cost.clamp(MIN_BCRYPT_COST, MAX_BCRYPT_COST);
        }
        if let Some(ms) = lookup("CAREDESK_TICK_MS").and_then(|v| v.trim().parse::<u64>().ok()) {
            if ms > 0 {
                config.tick_rate = Duration::from_millis(ms);
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.db_path, PathBuf::from("caredesk.db"));
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("CAREDESK_DB", "/tmp/ward.db"),
            ("CAREDESK_LOG", "/tmp/ward.log"),
            ("CAREDESK_LOG_FILTER", "caredesk=debug"),
            ("CAREDESK_BCRYPT_COST", "6"),
            ("CAREDESK_TICK_MS", "100"),
        ]));
        assert_eq!(config.db_path, PathBuf::from("/tmp/ward.db"));
        assert_eq!(config.log_path, PathBuf::from("/tmp/ward.log"));
        assert_eq!(config.log_filter, "caredesk=debug");
        assert_eq!(config.bcrypt_cost, 6);
        assert_eq!(config.tick_rate, Duration::from_millis(100));
    }

    #[test]
    fn rust_log_is_a_fallback_filter() {
        let config = AppConfig::from_lookup(lookup_from(&[("RUST_LOG", "trace")]));
        assert_eq!(config.log_filter, "trace");
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("CAREDESK_BCRYPT_COST", "cheap"),
            ("CAREDESK_TICK_MS", "0"),
            ("CAREDESK_DB", "   "),
        ]));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn bcrypt_cost_is_clamped() {
        let low = AppConfig::from_lookup(lookup_from(&[("CAREDESK_BCRYPT_COST", "1")]));
        assert_eq!(low.bcrypt_cost, MIN_BCRYPT_COST);
        let high = AppConfig::from_lookup(lookup_from(&[("CAREDESK_BCRYPT_COST", "99")]));
        assert_eq!(high.bcrypt_cost, MAX_BCRYPT_COST);
    }

    #[test]
    fn app_name_is_caredesk() {
        assert_eq!(APP_NAME, "CareDesk");
    }
}
