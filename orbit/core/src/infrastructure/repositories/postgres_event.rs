// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

//! PostgreSQL implementation of EventRepository
//!
//! Persists every published event into the `events` table so that the bus can
//! replay history after a restart.

use crate::domain::events::{EventId, EventRecord, SemanticTier};
use crate::domain::repository::{EventPage, EventQuery, EventRepository, PageRequest, RepositoryError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{PgPool, Row};
use tracing::debug;

pub struct PostgresEventRepository {
    pool: PgPool,
}

impl PostgresEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Helper to deserialize database row into EventRecord
    fn deserialize_row(row: &sqlx::postgres::PgRow) -> Result<EventRecord, RepositoryError> {
        let id: i64 = row.try_get("id")
            .map_err(|e| RepositoryError::Database(format!("Missing id: {}", e)))?;
        let occurred_at: DateTime<Utc> = row.try_get("occurred_at")
            .map_err(|e| RepositoryError::Database(format!("Missing occurred_at: {}", e)))?;
        let event_type: String = row.try_get("event_type")
            .map_err(|e| RepositoryError::Database(format!("Missing event_type: {}", e)))?;
        let source: String = row.try_get("source")
            .map_err(|e| RepositoryError::Database(format!("Missing source: {}", e)))?;
        let tier: String = row.try_get("semantic_tier")
            .map_err(|e| RepositoryError::Database(format!("Missing semantic_tier: {}", e)))?;
        let trace_id: Option<String> = row.try_get("trace_id")
            .map_err(|e| RepositoryError::Database(format!("Missing trace_id: {}", e)))?;
        let cause_id: Option<String> = row.try_get("cause_id")
            .map_err(|e| RepositoryError::Database(format!("Missing cause_id: {}", e)))?;
        let payload: Value = row.try_get("payload")
            .map_err(|e| RepositoryError::Database(format!("Missing payload: {}", e)))?;

        let semantic_tier = tier
            .parse::<SemanticTier>()
            .map_err(RepositoryError::Serialization)?;

        let payload = match payload {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(RepositoryError::Serialization(format!(
                    "Event {} payload is not an object: {}",
                    id, other
                )))
            }
        };

        Ok(EventRecord {
            id: Some(EventId(id)),
            occurred_at,
            event_type,
            source,
            semantic_tier,
            trace_id,
            cause_id,
            payload,
        })
    }
}

#[async_trait]
impl EventRepository for PostgresEventRepository {
    async fn save(&self, event: &EventRecord) -> Result<EventRecord, RepositoryError> {
        let row = sqlx::query(
            r#"
            INSERT INTO events (occurred_at, event_type, source, semantic_tier, trace_id, cause_id, payload)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(event.occurred_at)
        .bind(&event.event_type)
        .bind(&event.source)
        .bind(event.semantic_tier.as_db_str())
        .bind(&event.trace_id)
        .bind(&event.cause_id)
        .bind(Value::Object(event.payload.clone()))
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = row.try_get("id")?;
        debug!("Persisted event {} ({})", id, event.event_type);

        let mut saved = event.clone();
        saved.id = Some(EventId(id));
        Ok(saved)
    }

    async fn find_page(&self, query: &EventQuery, page: PageRequest) -> Result<EventPage, RepositoryError> {
        // One extra row tells us whether another page exists
        let rows = sqlx::query(
            r#"
            SELECT id, occurred_at, event_type, source, semantic_tier, trace_id, cause_id, payload
            FROM events
            WHERE ($1::BIGINT IS NULL OR id >= $1)
              AND ($2::TIMESTAMPTZ IS NULL OR occurred_at >= $2)
            ORDER BY id ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(query.from_event_id.map(|id| id.0))
        .bind(query.from_time)
        .bind(i64::try_from(page.fetch_limit()).unwrap_or(i64::MAX))
        .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let mut events = rows
            .iter()
            .map(Self::deserialize_row)
            .collect::<Result<Vec<_>, _>>()?;
        let has_next = events.len() > page.size;
        events.truncate(page.size);

        Ok(EventPage { events, has_next })
    }

    async fn find_by_id(&self, id: EventId) -> Result<Option<EventRecord>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, occurred_at, event_type, source, semantic_tier, trace_id, cause_id, payload
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::deserialize_row).transpose()
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM events")
            .fetch_one(&self.pool)
            .await?;
        let total: i64 = row.try_get("total")?;
        Ok(total.max(0) as u64)
    }
}
