//! Repository for the `placement_requests` table.
//!
//! Owns the request lifecycle transitions that do not go through response
//! acceptance or handover completion: creation (only one live request per
//! pet) and finalization (temporary placements only).

use sqlx::{PgPool, Postgres, Transaction};

use rehome_core::error::CoreError;
use rehome_core::placement::{self, PlacementType};
use rehome_core::types::{DbId, Timestamp};

use crate::models::placement::{CreatePlacementRequest, PlacementRequest};
use crate::repositories::RelationshipRepo;
use crate::DbError;

/// Column list for placement_requests queries.
pub(crate) const COLUMNS: &str = "id, pet_id, requester_id, request_type, status, starts_on, \
    is_active, created_at, updated_at";

/// Provides lifecycle operations for placement requests.
pub struct PlacementRequestRepo;

impl PlacementRequestRepo {
    /// Insert a new open placement request.
    ///
    /// Conflicts when the pet already has a request that is still driving
    /// a placement (open, pending handover, or active). The pet row is
    /// locked so two concurrent creates cannot both pass the check.
    pub async fn create(
        pool: &PgPool,
        pet_id: DbId,
        requester_id: DbId,
        input: &CreatePlacementRequest,
    ) -> Result<PlacementRequest, DbError> {
        // Parse early so a bad type never opens a transaction.
        let request_type = PlacementType::parse(&input.request_type)?;

        let mut tx = pool.begin().await.map_err(DbError::Sqlx)?;
        RelationshipRepo::lock_pet(&mut tx, pet_id).await?;

        let live: (bool,) = sqlx::query_as(
            "SELECT EXISTS(
                SELECT 1 FROM placement_requests
                WHERE pet_id = $1 AND status IN ('open', 'pending_transfer', 'active')
             )",
        )
        .bind(pet_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::Sqlx)?;
        if live.0 {
            return Err(CoreError::Conflict(
                "Pet already has a placement request in progress".to_string(),
            )
            .into());
        }

        let query = format!(
            "INSERT INTO placement_requests (pet_id, requester_id, request_type, starts_on)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let request = sqlx::query_as::<_, PlacementRequest>(&query)
            .bind(pet_id)
            .bind(requester_id)
            .bind(request_type.as_str())
            .bind(input.starts_on)
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::Sqlx)?;

        tx.commit().await.map_err(DbError::Sqlx)?;

        tracing::info!(
            request_id = request.id,
            pet_id,
            requester_id,
            request_type = request_type.as_str(),
            "Placement request created"
        );
        Ok(request)
    }

    /// Find a placement request by its primary key.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PlacementRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM placement_requests WHERE id = $1");
        sqlx::query_as::<_, PlacementRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lock a placement request row for the duration of the transaction.
    ///
    /// Serializes competing accepts, completions, and finalizations on the
    /// same request. NotFound when the request does not exist.
    pub(crate) async fn lock(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<PlacementRequest, DbError> {
        let query = format!("SELECT {COLUMNS} FROM placement_requests WHERE id = $1 FOR UPDATE");
        let request = sqlx::query_as::<_, PlacementRequest>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "PlacementRequest",
                id,
            })?;
        Ok(request)
    }

    /// Set the request status inside an existing transaction.
    pub(crate) async fn set_status_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        status: &str,
        is_active: bool,
    ) -> Result<PlacementRequest, sqlx::Error> {
        let query = format!(
            "UPDATE placement_requests
             SET status = $2, is_active = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PlacementRequest>(&query)
            .bind(id)
            .bind(status)
            .bind(is_active)
            .fetch_one(&mut **tx)
            .await
    }

    /// Finalize an active temporary placement.
    ///
    /// Single transaction: lock the request, validate the transition, end
    /// the helper's foster/sitter relationship at `at`, and mark the
    /// request finalized. The owner relationship is untouched.
    pub async fn finalize(
        pool: &PgPool,
        id: DbId,
        at: Timestamp,
    ) -> Result<PlacementRequest, DbError> {
        let mut tx = pool.begin().await.map_err(DbError::Sqlx)?;

        let request = Self::lock(&mut tx, id).await?;
        let request_type = PlacementType::parse(&request.request_type)?;
        placement::validate_finalize(request_type, &request.status)?;

        // Temporary types always carry an active relationship to end;
        // validate_finalize already excluded permanent.
        let kind = request_type
            .active_relationship_kind()
            .ok_or_else(|| CoreError::Internal("Temporary placement without a relationship kind".to_string()))?;

        let helper_user: Option<(DbId,)> = sqlx::query_as(
            "SELECT hp.user_id
             FROM placement_request_responses r
             JOIN helper_profiles hp ON hp.id = r.helper_profile_id
             WHERE r.request_id = $1 AND r.status = 'accepted'",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DbError::Sqlx)?;
        let (helper_user_id,) = helper_user.ok_or_else(|| {
            CoreError::Conflict("Active placement has no accepted response".to_string())
        })?;

        RelationshipRepo::lock_pet(&mut tx, request.pet_id).await?;
        RelationshipRepo::end_in_tx(&mut tx, request.pet_id, helper_user_id, kind, at)
            .await
            .map_err(DbError::Sqlx)?;

        let finalized = Self::set_status_in_tx(
            &mut tx,
            id,
            placement::REQUEST_STATUS_FINALIZED,
            false,
        )
        .await
        .map_err(DbError::Sqlx)?;

        tx.commit().await.map_err(DbError::Sqlx)?;

        tracing::info!(
            request_id = id,
            pet_id = finalized.pet_id,
            helper_user_id,
            kind = kind.as_str(),
            "Placement finalized"
        );
        Ok(finalized)
    }
}
