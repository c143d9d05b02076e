//! Pet entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use rehome_core::types::{DbId, Timestamp};

/// A row from the `pets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Pet {
    pub id: DbId,
    pub name: String,
    pub species: String,
    pub created_by_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a pet. The creator becomes the first owner.
#[derive(Debug, Deserialize)]
pub struct CreatePet {
    pub name: String,
    pub species: String,
}
