//! `PostgreSQL` implementation of the `EventStore` trait.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool, Row};
use tracing::debug;

use eventgate_core::counters::{Counter, CounterSnapshot, InsertOutcome};
use eventgate_core::error::DomainError;
use eventgate_core::event::StoredRecord;
use eventgate_core::store::{EventQuery, EventStore};

/// PostgreSQL-backed event store.
///
/// Deduplication relies on the `UNIQUE` constraint on
/// `processed_events.event_id`.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Creates a new `PgEventStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns the migration error if the schema cannot be brought up to date.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        crate::MIGRATOR.run(&self.pool).await
    }

    /// Closes the underlying connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Maps a driver error onto the domain taxonomy.
///
/// SQLSTATE class 22 (data exception) and class 23 (integrity constraint
/// violation) mean the row itself is unacceptable, so they are `Rejected`.
/// The `event_id` conflict never gets here: `ON CONFLICT` absorbs it.
/// Everything else is treated as transient.
fn store_error(err: sqlx::Error) -> DomainError {
    let rejected = match &err {
        sqlx::Error::Database(db) => db
            .code()
            .is_some_and(|code| code.starts_with("22") || code.starts_with("23")),
        _ => false,
    };

    if rejected {
        DomainError::Rejected(err.to_string())
    } else {
        DomainError::Infrastructure(err.to_string())
    }
}

fn increment_statement(counter: Counter) -> &'static str {
    match counter {
        Counter::Received => "UPDATE stats SET received = received + 1 WHERE id = 1",
        Counter::UniqueProcessed => {
            "UPDATE stats SET unique_processed = unique_processed + 1 WHERE id = 1"
        }
        Counter::DuplicateDropped => {
            "UPDATE stats SET duplicate_dropped = duplicate_dropped + 1 WHERE id = 1"
        }
    }
}

async fn run_increment<'e, E>(executor: E, counter: Counter) -> Result<(), DomainError>
where
    E: PgExecutor<'e>,
{
    let updated = sqlx::query(increment_statement(counter))
        .execute(executor)
        .await
        .map_err(store_error)?
        .rows_affected();

    if updated == 1 {
        Ok(())
    } else {
        Err(DomainError::Infrastructure(format!(
            "counters row missing while incrementing {}",
            counter.column()
        )))
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn insert_event(&self, record: &StoredRecord) -> Result<InsertOutcome, DomainError> {
        // Dropping `tx` on any early return rolls the transaction back.
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let inserted = sqlx::query(
            r"
            INSERT INTO processed_events (event_id, topic, timestamp, source, payload, received_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (event_id) DO NOTHING
            ",
        )
        .bind(&record.event_id)
        .bind(&record.topic)
        .bind(record.timestamp)
        .bind(&record.source)
        .bind(Json(&record.payload))
        .bind(record.received_at)
        .execute(&mut *tx)
        .await
        .map_err(store_error)?
        .rows_affected();

        let outcome = if inserted == 1 {
            InsertOutcome::Created
        } else {
            InsertOutcome::Duplicate
        };

        run_increment(&mut *tx, outcome.counter()).await?;
        tx.commit().await.map_err(store_error)?;

        debug!(event_id = %record.event_id, ?outcome, "insert committed");
        Ok(outcome)
    }

    async fn increment(&self, counter: Counter) -> Result<(), DomainError> {
        run_increment(&self.pool, counter).await
    }

    async fn list_events(&self, query: &EventQuery) -> Result<Vec<StoredRecord>, DomainError> {
        let rows = sqlx::query(
            r"
            SELECT id, event_id, topic, timestamp, source, payload, received_at
            FROM processed_events
            WHERE ($1::TEXT IS NULL OR topic = $1::TEXT)
            ORDER BY received_at DESC, id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(query.topic.as_deref())
        .bind(i64::from(query.limit))
        .bind(i64::from(query.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        rows.iter()
            .map(|row| {
                let payload: Option<Json<serde_json::Value>> =
                    row.try_get("payload").map_err(store_error)?;
                Ok(StoredRecord {
                    id: row.try_get("id").map_err(store_error)?,
                    event_id: row.try_get("event_id").map_err(store_error)?,
                    topic: row.try_get("topic").map_err(store_error)?,
                    timestamp: row.try_get("timestamp").map_err(store_error)?,
                    source: row.try_get("source").map_err(store_error)?,
                    payload: payload.map_or(serde_json::Value::Null, |p| p.0),
                    received_at: row.try_get("received_at").map_err(store_error)?,
                })
            })
            .collect()
    }

    async fn stats(&self) -> Result<CounterSnapshot, DomainError> {
        let counters = sqlx::query(
            "SELECT received, unique_processed, duplicate_dropped FROM stats WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?
        .ok_or_else(|| DomainError::Infrastructure("counters row missing".into()))?;

        let topic_rows = sqlx::query(
            "SELECT topic, COUNT(*) AS count FROM processed_events GROUP BY topic",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        let mut topics = BTreeMap::new();
        for row in &topic_rows {
            topics.insert(
                row.try_get::<String, _>("topic").map_err(store_error)?,
                row.try_get::<i64, _>("count").map_err(store_error)?,
            );
        }

        Ok(CounterSnapshot {
            received: counters.try_get("received").map_err(store_error)?,
            unique_processed: counters.try_get("unique_processed").map_err(store_error)?,
            duplicate_dropped: counters.try_get("duplicate_dropped").map_err(store_error)?,
            topics,
        })
    }
}
