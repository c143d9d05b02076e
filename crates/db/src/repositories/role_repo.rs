//! Repository for the `roles` table.

use sqlx::PgPool;

use rehome_core::types::DbId;

/// Provides read operations for roles.
pub struct RoleRepo;

impl RoleRepo {
    /// Resolve a role id to its name. Errors if the role does not exist,
    /// which indicates missing seed data.
    pub async fn resolve_name(pool: &PgPool, role_id: DbId) -> Result<String, sqlx::Error> {
        let row: (String,) = sqlx::query_as("SELECT name FROM roles WHERE id = $1")
            .bind(role_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Find a role id by name.
    pub async fn find_id_by_name(pool: &PgPool, name: &str) -> Result<Option<DbId>, sqlx::Error> {
        let row: Option<(DbId,)> = sqlx::query_as("SELECT id FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|r| r.0))
    }
}
