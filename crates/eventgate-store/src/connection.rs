//! Startup connection with bounded retry.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info, warn};

/// How the gateway connects to PostgreSQL at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectPolicy {
    /// Size of the shared connection pool.
    pub max_connections: u32,
    /// Connection attempts before giving up. Treated as at least one.
    pub attempts: u32,
    /// Pause between failed attempts.
    pub retry_delay: Duration,
    /// How long a single attempt may wait for a connection.
    pub acquire_timeout: Duration,
}

impl Default for ConnectPolicy {
    fn default() -> Self {
        Self {
            max_connections: 10,
            attempts: 5,
            retry_delay: Duration::from_secs(2),
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Opens a connection pool, retrying up to `policy.attempts` times.
///
/// # Errors
///
/// Returns the last `sqlx::Error` once every attempt has failed. Callers treat
/// this as fatal: the process must not start against an unreachable store.
pub async fn connect_with_retry(
    database_url: &str,
    policy: &ConnectPolicy,
) -> Result<PgPool, sqlx::Error> {
    let max_attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        let result = PgPoolOptions::new()
            .max_connections(policy.max_connections)
            .acquire_timeout(policy.acquire_timeout)
            .connect(database_url)
            .await;

        match result {
            Ok(pool) => {
                info!(attempt, "connected to database");
                return Ok(pool);
            }
            Err(err) if attempt < max_attempts => {
                warn!(
                    attempt,
                    max_attempts,
                    retry_in_ms = u64::try_from(policy.retry_delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "database connection failed, retrying"
                );
                tokio::time::sleep(policy.retry_delay).await;
                attempt += 1;
            }
            Err(err) => {
                error!(max_attempts, error = %err, "database unreachable, giving up");
                return Err(err);
            }
        }
    }
}
