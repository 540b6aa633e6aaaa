//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables
//! (optionally seeded from a `.env` file).

use crate::secret::Secret;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const LEFT_CONNECTION_VAR: &str = "RECON_LEFT_CONNECTION";
pub const RIGHT_CONNECTION_VAR: &str = "RECON_RIGHT_CONNECTION";
pub const ENCRYPTION_KEY_VAR: &str = "RECON_ENCRYPTION_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Reconciliation tuning
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Concurrent row-count queries allowed per engine
    pub max_concurrency: usize,
    /// Upper bound for a single row-count query
    pub query_timeout: Duration,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            query_timeout: Duration::from_secs(60),
        }
    }
}

/// Complete application settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base64 encrypted descriptor for the left (T-SQL) engine
    pub left_connection: String,
    /// Base64 encrypted descriptor for the right (PL/SQL) engine
    pub right_connection: String,
    pub encryption_key: Secret,
    pub log_dir: PathBuf,
    pub reconcile: ReconcileConfig,
    /// Where to write the JSON copy of the report, if anywhere
    pub report_json: Option<PathBuf>,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingVar(key.to_string()))
        };

        let left_connection = required(LEFT_CONNECTION_VAR)?;
        let right_connection = required(RIGHT_CONNECTION_VAR)?;
        let encryption_key = Secret::new(required(ENCRYPTION_KEY_VAR)?);

        let log_dir = lookup("RECON_LOG_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("logs"));

        let defaults = ReconcileConfig::default();
        let max_concurrency = match lookup("RECON_MAX_CONCURRENCY") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue(format!(
                        "RECON_MAX_CONCURRENCY must be a positive integer, got {:?}",
                        raw
                    )))
                }
            },
            None => defaults.max_concurrency,
        };

        let query_timeout = match lookup("RECON_QUERY_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue(format!(
                        "RECON_QUERY_TIMEOUT_SECS must be a positive integer, got {:?}",
                        raw
                    )))
                }
            },
            None => defaults.query_timeout,
        };

        let report_json = lookup("RECON_REPORT_JSON")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            left_connection,
            right_connection,
            encryption_key,
            log_dir,
            reconcile: ReconcileConfig {
                max_concurrency,
                query_timeout,
            },
            report_json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![
            (LEFT_CONNECTION_VAR, "bGVmdA=="),
            (RIGHT_CONNECTION_VAR, "cmlnaHQ="),
            (ENCRYPTION_KEY_VAR, "s3cret"),
        ]
    }

    #[test]
    fn test_defaults() {
        let vars = env(&base());
        let settings = Settings::from_lookup(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(settings.left_connection, "bGVmdA==");
        assert_eq!(settings.log_dir, PathBuf::from("logs"));
        assert_eq!(settings.reconcile.max_concurrency, 4);
        assert_eq!(settings.reconcile.query_timeout, Duration::from_secs(60));
        assert!(settings.report_json.is_none());
    }

    #[test]
    fn test_overrides() {
        let mut pairs = base();
        pairs.push(("RECON_LOG_DIR", "/var/log/recon"));
        pairs.push(("RECON_MAX_CONCURRENCY", "8"));
        pairs.push(("RECON_QUERY_TIMEOUT_SECS", "5"));
        pairs.push(("RECON_REPORT_JSON", "out/report.json"));
        let vars = env(&pairs);
        let settings = Settings::from_lookup(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(settings.log_dir, PathBuf::from("/var/log/recon"));
        assert_eq!(settings.reconcile.max_concurrency, 8);
        assert_eq!(settings.reconcile.query_timeout, Duration::from_secs(5));
        assert_eq!(settings.report_json, Some(PathBuf::from("out/report.json")));
    }

    #[test]
    fn test_missing_descriptor() {
        let vars = env(&base()[1..]);
        let err = Settings::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref v) if v == LEFT_CONNECTION_VAR));
    }

    #[test]
    fn test_blank_key_is_missing() {
        let mut pairs = base();
        pairs[2] = (ENCRYPTION_KEY_VAR, "   ");
        let vars = env(&pairs);
        assert!(matches!(
            Settings::from_lookup(|k| vars.get(k).cloned()),
            Err(ConfigError::MissingVar(_))
        ));
    }

    #[test]
    fn test_invalid_concurrency() {
        let mut pairs = base();
        pairs.push(("RECON_MAX_CONCURRENCY", "0"));
        let vars = env(&pairs);
        assert!(matches!(
            Settings::from_lookup(|k| vars.get(k).cloned()),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_key_not_in_debug_output() {
        let vars = env(&base());
        let settings = Settings::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert!(!format!("{:?}", settings).contains("s3cret"));
    }
}
