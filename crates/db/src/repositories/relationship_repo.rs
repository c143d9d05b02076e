//! Repository for the `pet_relationships` custody ledger.
//!
//! All mutations run inside transactions that first lock the pet row
//! (`SELECT ... FOR UPDATE`), so concurrent grants, revokes, and ownership
//! transfers on the same pet serialize. Operations on different pets are
//! independent.

use sqlx::{PgPool, Postgres, Transaction};

use rehome_core::error::CoreError;
use rehome_core::relationship::{self, RelationshipKind};
use rehome_core::types::{DbId, Timestamp};

use crate::models::relationship::PetRelationship;
use crate::DbError;

/// Column list for pet_relationships queries.
const COLUMNS: &str = "id, pet_id, user_id, kind, started_at, ended_at, created_by_id, created_at";

/// Provides ledger operations for custody relationships.
pub struct RelationshipRepo;

impl RelationshipRepo {
    /// Whether the user holds an active owner relationship on the pet.
    pub async fn is_owner(pool: &PgPool, pet_id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(
                SELECT 1 FROM pet_relationships
                WHERE pet_id = $1 AND user_id = $2 AND kind = 'owner' AND ended_at IS NULL
             )",
        )
        .bind(pet_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// List all active relationships on a pet, highest started first.
    pub async fn list_active_for_pet(
        pool: &PgPool,
        pet_id: DbId,
    ) -> Result<Vec<PetRelationship>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM pet_relationships
             WHERE pet_id = $1 AND ended_at IS NULL
             ORDER BY started_at DESC"
        );
        sqlx::query_as::<_, PetRelationship>(&query)
            .bind(pet_id)
            .fetch_all(pool)
            .await
    }

    /// Lock the pet row for the duration of the transaction.
    ///
    /// Every relationship mutation takes this lock first so that
    /// interleaved operations on the same pet serialize.
    pub(crate) async fn lock_pet(
        tx: &mut Transaction<'_, Postgres>,
        pet_id: DbId,
    ) -> Result<(), DbError> {
        let row: Option<(DbId,)> = sqlx::query_as("SELECT id FROM pets WHERE id = $1 FOR UPDATE")
            .bind(pet_id)
            .fetch_optional(&mut **tx)
            .await?;
        if row.is_none() {
            return Err(CoreError::NotFound {
                entity: "Pet",
                id: pet_id,
            }
            .into());
        }
        Ok(())
    }

    /// Grant a relationship inside an existing transaction.
    ///
    /// Ends any active lower-privilege relationship the user holds on the
    /// pet at the same timestamp (upgrade-ends-downgrade), then inserts
    /// the new active row. If the user already holds an active
    /// relationship of the same kind, that row is returned unchanged so
    /// callers stay idempotent.
    pub(crate) async fn grant_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        pet_id: DbId,
        user_id: DbId,
        kind: RelationshipKind,
        created_by_id: DbId,
        at: Timestamp,
    ) -> Result<PetRelationship, DbError> {
        let existing_query = format!(
            "SELECT {COLUMNS} FROM pet_relationships
             WHERE pet_id = $1 AND user_id = $2 AND kind = $3 AND ended_at IS NULL"
        );
        let existing = sqlx::query_as::<_, PetRelationship>(&existing_query)
            .bind(pet_id)
            .bind(user_id)
            .bind(kind.as_str())
            .fetch_optional(&mut **tx)
            .await?;
        if let Some(active) = existing {
            return Ok(active);
        }

        let subsumed: Vec<String> = kind
            .subsumed_kinds()
            .into_iter()
            .map(String::from)
            .collect();
        if !subsumed.is_empty() {
            sqlx::query(
                "UPDATE pet_relationships SET ended_at = $4
                 WHERE pet_id = $1 AND user_id = $2 AND kind = ANY($3) AND ended_at IS NULL",
            )
            .bind(pet_id)
            .bind(user_id)
            .bind(&subsumed)
            .bind(at)
            .execute(&mut **tx)
            .await?;
        }

        let insert_query = format!(
            "INSERT INTO pet_relationships (pet_id, user_id, kind, started_at, created_by_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        let created = sqlx::query_as::<_, PetRelationship>(&insert_query)
            .bind(pet_id)
            .bind(user_id)
            .bind(kind.as_str())
            .bind(at)
            .bind(created_by_id)
            .fetch_one(&mut **tx)
            .await?;
        Ok(created)
    }

    /// End an active relationship inside an existing transaction.
    ///
    /// Returns `true` if a row was ended. Ending a relationship that is
    /// not active is a no-op, keeping callers idempotent.
    pub(crate) async fn end_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        pet_id: DbId,
        user_id: DbId,
        kind: RelationshipKind,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE pet_relationships SET ended_at = $4
             WHERE pet_id = $1 AND user_id = $2 AND kind = $3 AND ended_at IS NULL",
        )
        .bind(pet_id)
        .bind(user_id)
        .bind(kind.as_str())
        .bind(at)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Drop a user's active relationship of `kind`, guarded by the
    /// last-owner check.
    ///
    /// The pet row is locked first, so the owner count read here cannot
    /// race a concurrent leave, removal, or ownership transfer on the same
    /// pet. Conflict when ending the row would leave the pet without an
    /// active owner; NotFound when the user holds no such active
    /// relationship.
    pub async fn leave(
        pool: &PgPool,
        pet_id: DbId,
        user_id: DbId,
        kind: RelationshipKind,
        at: Timestamp,
    ) -> Result<(), DbError> {
        let mut tx = pool.begin().await.map_err(DbError::Sqlx)?;
        Self::lock_pet(&mut tx, pet_id).await?;

        let active: Option<(DbId,)> = sqlx::query_as(
            "SELECT id FROM pet_relationships
             WHERE pet_id = $1 AND user_id = $2 AND kind = $3 AND ended_at IS NULL",
        )
        .bind(pet_id)
        .bind(user_id)
        .bind(kind.as_str())
        .fetch_optional(&mut *tx)
        .await?;
        if active.is_none() {
            return Err(CoreError::NotFound {
                entity: "PetRelationship",
                id: pet_id,
            }
            .into());
        }

        let owner_count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM pet_relationships
             WHERE pet_id = $1 AND kind = 'owner' AND ended_at IS NULL",
        )
        .bind(pet_id)
        .fetch_one(&mut *tx)
        .await?;
        relationship::validate_leave(kind, owner_count.0)?;

        Self::end_in_tx(&mut tx, pet_id, user_id, kind, at)
            .await
            .map_err(DbError::Sqlx)?;
        tx.commit().await.map_err(DbError::Sqlx)?;

        tracing::info!(pet_id, user_id, kind = kind.as_str(), "Relationship ended");
        Ok(())
    }

    /// Move legal ownership inside an existing transaction.
    ///
    /// Ends the sender's owner relationship, grants the recipient owner,
    /// and grants the sender viewer so they keep read access -- all at the
    /// same timestamp. The caller must already hold the pet lock; no
    /// observer outside the transaction ever sees the pet ownerless.
    pub(crate) async fn transfer_ownership_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        pet_id: DbId,
        from_user_id: DbId,
        to_user_id: DbId,
        at: Timestamp,
    ) -> Result<PetRelationship, DbError> {
        let ended = Self::end_in_tx(tx, pet_id, from_user_id, RelationshipKind::Owner, at).await?;
        if !ended {
            return Err(CoreError::Conflict(format!(
                "User {from_user_id} does not hold an active owner relationship on pet {pet_id}"
            ))
            .into());
        }

        let new_owner =
            Self::grant_in_tx(tx, pet_id, to_user_id, RelationshipKind::Owner, from_user_id, at)
                .await?;

        // The prior owner keeps read access.
        Self::grant_in_tx(
            tx,
            pet_id,
            from_user_id,
            RelationshipKind::Viewer,
            from_user_id,
            at,
        )
        .await?;

        Ok(new_owner)
    }

}
