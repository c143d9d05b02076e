//! Event entity model.

use serde::Serialize;
use sqlx::FromRow;

use rehome_core::types::{DbId, Timestamp};

/// A row from the `events` table: the durable emission log of the bus.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: DbId,
    pub event_type: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
    pub actor_user_id: Option<DbId>,
    pub recipient_user_id: Option<DbId>,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
}
