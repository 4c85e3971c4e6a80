//! Process configuration read from environment variables.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `BANK_LISTEN_ADDR` | `0.0.0.0:8080` | HTTP bind address |
//! | `BANK_ASK_TIMEOUT_MS` | `5000` | how long a request waits for its reply |
//! | `BANK_STORE` | `memory` | `memory` or `postgres` |
//! | `DATABASE_URL` | none | required when `BANK_STORE=postgres` |
//! | `BANK_LOG_FORMAT` | `json` | `json` or `pretty` |

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use bankes_infra::DEFAULT_ASK_TIMEOUT;
use bankes_observability::LogFormat;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankConfig {
    pub listen_addr: SocketAddr,
    pub ask_timeout: Duration,
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var}: invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set")]
    Missing(&'static str),
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl BankConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let listen_addr = match var("BANK_LISTEN_ADDR") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid("BANK_LISTEN_ADDR", &raw, e))?,
            None => DEFAULT_LISTEN_ADDR
                .parse()
                .map_err(|e| ConfigError::invalid("BANK_LISTEN_ADDR", DEFAULT_LISTEN_ADDR, e))?,
        };

        let ask_timeout = match var("BANK_ASK_TIMEOUT_MS") {
            Some(raw) => {
                let ms: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|e| ConfigError::invalid("BANK_ASK_TIMEOUT_MS", &raw, e))?;
                if ms == 0 {
                    return Err(ConfigError::invalid("BANK_ASK_TIMEOUT_MS", &raw, "must be positive"));
                }
                Duration::from_millis(ms)
            }
            None => DEFAULT_ASK_TIMEOUT,
        };

        let store = match var("BANK_STORE").map(|s| s.trim().to_ascii_lowercase()) {
            None => StoreKind::Memory,
            Some(s) if s == "memory" => StoreKind::Memory,
            Some(s) if s == "postgres" => StoreKind::Postgres,
            Some(other) => {
                return Err(ConfigError::invalid(
                    "BANK_STORE",
                    &other,
                    "expected 'memory' or 'postgres'",
                ));
            }
        };

        let database_url = var("DATABASE_URL");
        if store == StoreKind::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let log_format = match var("BANK_LOG_FORMAT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| ConfigError::invalid("BANK_LOG_FORMAT", &raw, e))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            listen_addr,
            ask_timeout,
            store,
            database_url,
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<BankConfig, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        BankConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.listen_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(cfg.ask_timeout, Duration::from_secs(5));
        assert_eq!(cfg.store, StoreKind::Memory);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let cfg = config(&[
            ("BANK_LISTEN_ADDR", "127.0.0.1:9000"),
            ("BANK_ASK_TIMEOUT_MS", "250"),
            ("BANK_LOG_FORMAT", "pretty"),
        ])
        .unwrap();
        assert_eq!(cfg.listen_addr.port(), 9000);
        assert_eq!(cfg.ask_timeout, Duration::from_millis(250));
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn postgres_requires_a_database_url() {
        assert_eq!(
            config(&[("BANK_STORE", "postgres")]).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
        let cfg = config(&[("BANK_STORE", "Postgres"), ("DATABASE_URL", "postgres://localhost/bank")]).unwrap();
        assert_eq!(cfg.store, StoreKind::Postgres);
    }

    #[test]
    fn bad_values_name_the_variable() {
        for (var, value) in [
            ("BANK_ASK_TIMEOUT_MS", "soon"),
            ("BANK_ASK_TIMEOUT_MS", "0"),
            ("BANK_LISTEN_ADDR", "nowhere"),
            ("BANK_STORE", "redis"),
            ("BANK_LOG_FORMAT", "xml"),
        ] {
            let err = config(&[(var, value)]).unwrap_err();
            assert!(err.to_string().starts_with(var), "{err}");
        }
    }
}
