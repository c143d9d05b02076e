//! Repository for the `helper_profiles` table.

use sqlx::PgPool;

use rehome_core::types::DbId;

use crate::models::helper_profile::{CreateHelperProfile, HelperProfile};

/// Column list for helper_profiles queries.
const COLUMNS: &str = "id, user_id, is_active, bio, created_at, updated_at";

/// Provides CRUD operations for helper profiles.
pub struct HelperProfileRepo;

impl HelperProfileRepo {
    /// Insert a new helper profile for a user, returning the created row.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateHelperProfile,
    ) -> Result<HelperProfile, sqlx::Error> {
        let query = format!(
            "INSERT INTO helper_profiles (user_id, bio)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, HelperProfile>(&query)
            .bind(user_id)
            .bind(&input.bio)
            .fetch_one(pool)
            .await
    }

    /// Find a profile by its primary key.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<HelperProfile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM helper_profiles WHERE id = $1");
        sqlx::query_as::<_, HelperProfile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the active profile of a user, if any.
    pub async fn find_active_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<HelperProfile>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM helper_profiles
             WHERE user_id = $1 AND is_active = true"
        );
        sqlx::query_as::<_, HelperProfile>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }
}
