//! Repository for the `pets` table.

use sqlx::PgPool;

use rehome_core::relationship::RelationshipKind;
use rehome_core::types::DbId;

use crate::models::pet::{CreatePet, Pet};
use crate::repositories::RelationshipRepo;
use crate::DbError;

/// Column list for pets queries.
const COLUMNS: &str = "id, name, species, created_by_id, created_at, updated_at";

/// Provides CRUD operations for pets.
pub struct PetRepo;

impl PetRepo {
    /// Insert a new pet and grant the creator the owner relationship in
    /// the same transaction, so the pet is never observable ownerless.
    pub async fn create(
        pool: &PgPool,
        input: &CreatePet,
        created_by_id: DbId,
    ) -> Result<Pet, DbError> {
        let mut tx = pool.begin().await.map_err(DbError::Sqlx)?;

        let query = format!(
            "INSERT INTO pets (name, species, created_by_id)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        let pet = sqlx::query_as::<_, Pet>(&query)
            .bind(&input.name)
            .bind(&input.species)
            .bind(created_by_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::Sqlx)?;

        RelationshipRepo::grant_in_tx(
            &mut tx,
            pet.id,
            created_by_id,
            RelationshipKind::Owner,
            created_by_id,
            chrono::Utc::now(),
        )
        .await?;

        tx.commit().await.map_err(DbError::Sqlx)?;

        tracing::info!(pet_id = pet.id, created_by_id, "Pet created");
        Ok(pet)
    }

    /// Find a pet by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Pet>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pets WHERE id = $1");
        sqlx::query_as::<_, Pet>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
