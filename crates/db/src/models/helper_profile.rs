//! Helper profile entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use rehome_core::types::{DbId, Timestamp};

/// A row from the `helper_profiles` table.
///
/// One per user who has opted in to taking pets; response submission
/// requires an active profile.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct HelperProfile {
    pub id: DbId,
    pub user_id: DbId,
    pub is_active: bool,
    pub bio: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a helper profile.
#[derive(Debug, Deserialize)]
pub struct CreateHelperProfile {
    pub bio: Option<String>,
}
