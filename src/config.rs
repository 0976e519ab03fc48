//! Runtime configuration, read from the environment.

use std::env;
use std::path::PathBuf;

use log::LevelFilter;

#[derive(Clone, Debug)]
pub struct Config {
    /// Path of the SQLite database (default: `mess_ledger.db`).
    pub database_path: PathBuf,

    /// When set, logs go to a rolling file in this directory instead of stderr.
    pub log_dir: Option<PathBuf>,

    pub log_level: LevelFilter,

    /// Whether new people may be created with a non-zero starting balance.
    pub allow_starting_balance: bool,

    /// Whether only expenses dated today can be edited or deleted.
    pub restrict_changes_to_today: bool,
}

impl Config {
    pub fn new() -> Self {
        Config {
            database_path: PathBuf::from("mess_ledger.db"),
            log_dir: None,
            log_level: LevelFilter::Info,
            allow_starting_balance: true,
            restrict_changes_to_today: false,
        }
    }

    /// Load config from environment variables
    ///
    /// Environment variables:
    /// - `MESS_LEDGER_DB`: path of the database file
    /// - `MESS_LEDGER_LOG_DIR`: directory of the rolling log file
    /// - `MESS_LEDGER_LOG_LEVEL`: "error", "warn", "info", "debug" or "trace"
    /// - `MESS_LEDGER_ALLOW_STARTING_BALANCE`: "true" or "false"
    /// - `MESS_LEDGER_RESTRICT_CHANGES_TO_TODAY`: "true" or "false"
    ///
    /// Values that cannot be parsed are ignored and the default is kept.
    pub fn from_env() -> Self {
        Config::from_vars(|key| env::var(key).ok())
    }

    fn from_vars<F: Fn(&str) -> Option<String>>(var: F) -> Self {
        let mut config = Config::new();

        if let Some(path) = var("MESS_LEDGER_DB") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(dir) = var("MESS_LEDGER_LOG_DIR") {
            config.log_dir = Some(PathBuf::from(dir));
        }

        if let Some(level) = var("MESS_LEDGER_LOG_LEVEL").and_then(|l| l.parse().ok()) {
            config.log_level = level;
        }

        if let Some(flag) = var("MESS_LEDGER_ALLOW_STARTING_BALANCE").and_then(|f| parse_flag(&f)) {
            config.allow_starting_balance = flag;
        }

        if let Some(flag) =
            var("MESS_LEDGER_RESTRICT_CHANGES_TO_TODAY").and_then(|f| parse_flag(&f))
        {
            config.restrict_changes_to_today = flag;
        }

        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(|_| None);
        assert_eq!(config.database_path, PathBuf::from("mess_ledger.db"));
        assert!(config.log_dir.is_none());
        assert_eq!(config.log_level, LevelFilter::Info);
        assert!(config.allow_starting_balance);
        assert!(!config.restrict_changes_to_today);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("MESS_LEDGER_DB", "/tmp/mess.db"),
            ("MESS_LEDGER_LOG_DIR", "log"),
            ("MESS_LEDGER_LOG_LEVEL", "debug"),
            ("MESS_LEDGER_ALLOW_STARTING_BALANCE", "no"),
            ("MESS_LEDGER_RESTRICT_CHANGES_TO_TODAY", "TRUE"),
        ]
        .into_iter()
        .collect();

        let config = Config::from_vars(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.database_path, PathBuf::from("/tmp/mess.db"));
        assert_eq!(config.log_dir, Some(PathBuf::from("log")));
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert!(!config.allow_starting_balance);
        assert!(config.restrict_changes_to_today);
    }

    #[test]
    fn test_unparsable_values_are_ignored() {
        let config = Config::from_vars(|key| match key {
            "MESS_LEDGER_LOG_LEVEL" => Some("loud".to_string()),
            "MESS_LEDGER_RESTRICT_CHANGES_TO_TODAY" => Some("maybe".to_string()),
            _ => None,
        });
        assert_eq!(config.log_level, LevelFilter::Info);
        assert!(!config.restrict_changes_to_today);
    }
}
