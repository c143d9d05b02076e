//! Custody relationship entity model.

use serde::Serialize;
use sqlx::FromRow;

use rehome_core::types::{DbId, Timestamp};

/// A row from the `pet_relationships` ledger.
///
/// `ended_at = NULL` means the relationship is active. Rows are ended,
/// never deleted, so the table doubles as the custody history.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PetRelationship {
    pub id: DbId,
    pub pet_id: DbId,
    pub user_id: DbId,
    /// One of the `rehome_core::relationship` kind strings.
    pub kind: String,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    pub created_by_id: DbId,
    pub created_at: Timestamp,
}
