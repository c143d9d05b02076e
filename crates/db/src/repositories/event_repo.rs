//! Repository for the `events` table.

use sqlx::PgPool;

use rehome_core::types::DbId;

use crate::models::event::Event;

const COLUMNS: &str =
    "id, event_type, entity_type, entity_id, actor_user_id, recipient_user_id, payload, created_at";

/// Append-only persistence for domain events.
pub struct EventRepo;

impl EventRepo {
    /// Append one event row.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        pool: &PgPool,
        event_type: &str,
        entity_type: Option<&str>,
        entity_id: Option<DbId>,
        actor_user_id: Option<DbId>,
        recipient_user_id: Option<DbId>,
        payload: serde_json::Value,
    ) -> Result<Event, sqlx::Error> {
        let query = format!(
            "INSERT INTO events (event_type, entity_type, entity_id, actor_user_id, \
             recipient_user_id, payload)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(event_type)
            .bind(entity_type)
            .bind(entity_id)
            .bind(actor_user_id)
            .bind(recipient_user_id)
            .bind(payload)
            .fetch_one(pool)
            .await
    }

    /// List recent events for an entity, newest first.
    pub async fn list_for_entity(
        pool: &PgPool,
        entity_type: &str,
        entity_id: DbId,
        limit: i64,
    ) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events
             WHERE entity_type = $1 AND entity_id = $2
             ORDER BY created_at DESC
             LIMIT $3"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(entity_type)
            .bind(entity_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
