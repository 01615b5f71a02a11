//! Gateway configuration read from the environment.

use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use eventgate_ingest::pipeline::persist::RetryPolicy;
use eventgate_ingest::pipeline::worker::ShutdownMode;
use eventgate_store::connection::ConnectPolicy;

use crate::error::AppError;

/// Everything the gateway needs to start.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// PostgreSQL connection URL (`DATABASE_URL`).
    pub database_url: String,
    /// Bind host (`HOST`).
    pub host: String,
    /// Bind port (`PORT`).
    pub port: u16,
    /// Persistence worker count (`WORKER_COUNT`).
    pub workers: usize,
    /// Startup connection policy (`DB_MAX_CONNECTIONS`, `DB_CONNECT_ATTEMPTS`,
    /// `DB_CONNECT_RETRY_DELAY_MS`).
    pub connect: ConnectPolicy,
    /// Per-event persist retry policy (`PERSIST_MAX_ATTEMPTS`,
    /// `PERSIST_RETRY_BASE_MS`).
    pub retry: RetryPolicy,
    /// What happens to queued events on shutdown (`SHUTDOWN_MODE`).
    pub shutdown_mode: ShutdownMode,
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid: {e}"))),
    }
}

fn parse_shutdown_mode(raw: Option<String>) -> Result<ShutdownMode, AppError> {
    match raw.as_deref().map(str::trim) {
        None | Some("drain") => Ok(ShutdownMode::Drain),
        Some("immediate") => Ok(ShutdownMode::Immediate),
        Some(other) => Err(AppError::Config(format!(
            "SHUTDOWN_MODE must be \"drain\" or \"immediate\", got {other:?}"
        ))),
    }
}

impl GatewayConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is missing or malformed.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is missing or malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config("DATABASE_URL environment variable must be set".into())
            })?;

        let workers: usize = parse_or(&lookup, "WORKER_COUNT", 4)?;
        if workers == 0 {
            return Err(AppError::Config("WORKER_COUNT must be at least 1".into()));
        }

        let connect_defaults = ConnectPolicy::default();
        let connect = ConnectPolicy {
            max_connections: parse_or(
                &lookup,
                "DB_MAX_CONNECTIONS",
                connect_defaults.max_connections,
            )?,
            attempts: parse_or(&lookup, "DB_CONNECT_ATTEMPTS", connect_defaults.attempts)?,
            retry_delay: Duration::from_millis(parse_or(
                &lookup,
                "DB_CONNECT_RETRY_DELAY_MS",
                2000,
            )?),
            acquire_timeout: connect_defaults.acquire_timeout,
        };

        let retry_defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: parse_or(&lookup, "PERSIST_MAX_ATTEMPTS", retry_defaults.max_attempts)?,
            base_delay: Duration::from_millis(parse_or(&lookup, "PERSIST_RETRY_BASE_MS", 50)?),
            max_delay: retry_defaults.max_delay,
        };

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            workers,
            connect,
            retry,
            shutdown_mode: parse_shutdown_mode(lookup("SHUTDOWN_MODE"))?,
        })
    }

    /// The socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `host:port` is not a valid address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}
