//! Repository for the `placement_request_responses` table.
//!
//! Response arbitration: submission, the single-winner accept transaction,
//! owner rejection, and helper cancellation. Acceptance is always one
//! explicit owner action; sibling responses are only ever rejected as a
//! side effect of acceptance, never by time elapsed.

use sqlx::{PgPool, Postgres, Transaction};

use rehome_core::error::CoreError;
use rehome_core::placement::{self, PlacementType};
use rehome_core::relationship::RelationshipKind;
use rehome_core::response::{self, RESPONSE_STATUS_REJECTED};
use rehome_core::transfer::TRANSFER_STATUS_PENDING;
use rehome_core::types::{DbId, Timestamp};

use crate::models::placement::{PlacementRequest, PlacementResponse, SubmitResponse};
use crate::models::transfer::{TransferHandover, TransferRequest};
use crate::repositories::transfer_repo::{HANDOVER_COLUMNS, TRANSFER_COLUMNS};
use crate::repositories::{PlacementRequestRepo, RelationshipRepo};
use crate::DbError;

/// Column list for placement_request_responses queries.
const COLUMNS: &str = "id, request_id, helper_profile_id, status, message, \
    responded_at, accepted_at, created_at, updated_at";

/// Everything the accept transaction settled, for the handler to report
/// and to emit notifications from.
#[derive(Debug)]
pub struct AcceptOutcome {
    pub response: PlacementResponse,
    pub request: PlacementRequest,
    /// Present for placements that require a physical handover.
    pub transfer_request: Option<TransferRequest>,
    pub handover: Option<TransferHandover>,
    /// The accepted helper's user id, for notification emission.
    pub helper_user_id: DbId,
    /// Helper user ids whose responses were auto-rejected (sitting only).
    pub auto_rejected_user_ids: Vec<DbId>,
}

/// Provides arbitration operations for placement responses.
pub struct PlacementResponseRepo;

impl PlacementResponseRepo {
    /// Find a response by its primary key.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PlacementResponse>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM placement_request_responses WHERE id = $1");
        sqlx::query_as::<_, PlacementResponse>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all responses for a request, newest first.
    pub async fn list_for_request(
        pool: &PgPool,
        request_id: DbId,
    ) -> Result<Vec<PlacementResponse>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM placement_request_responses
             WHERE request_id = $1
             ORDER BY responded_at DESC"
        );
        sqlx::query_as::<_, PlacementResponse>(&query)
            .bind(request_id)
            .fetch_all(pool)
            .await
    }

    /// Submit a helper's response to an open placement request.
    ///
    /// Locks the request row so the open-status check and the live-response
    /// check cannot race a concurrent accept. A helper profile with a
    /// settled (cancelled/rejected) response may respond again.
    pub async fn submit(
        pool: &PgPool,
        request_id: DbId,
        helper_profile_id: DbId,
        input: &SubmitResponse,
    ) -> Result<PlacementResponse, DbError> {
        let mut tx = pool.begin().await.map_err(DbError::Sqlx)?;

        let request = PlacementRequestRepo::lock(&mut tx, request_id).await?;
        if request.status != placement::REQUEST_STATUS_OPEN {
            return Err(CoreError::Conflict(format!(
                "Placement request is '{}', responses can only be submitted while it is open",
                request.status
            ))
            .into());
        }

        let live: (bool,) = sqlx::query_as(
            "SELECT EXISTS(
                SELECT 1 FROM placement_request_responses
                WHERE request_id = $1 AND helper_profile_id = $2
                  AND status IN ('responded', 'accepted')
             )",
        )
        .bind(request_id)
        .bind(helper_profile_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::Sqlx)?;
        if live.0 {
            return Err(CoreError::Conflict(
                "Helper already has a live response to this request".to_string(),
            )
            .into());
        }

        let query = format!(
            "INSERT INTO placement_request_responses (request_id, helper_profile_id, message)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        let created = sqlx::query_as::<_, PlacementResponse>(&query)
            .bind(request_id)
            .bind(helper_profile_id)
            .bind(&input.message)
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::Sqlx)?;

        tx.commit().await.map_err(DbError::Sqlx)?;

        tracing::info!(
            response_id = created.id,
            request_id,
            helper_profile_id,
            "Placement response submitted"
        );
        Ok(created)
    }

    /// Accept a response: the single transaction that moves the request out
    /// of `open`.
    ///
    /// For placements that require a handover, spawns a pending transfer
    /// request (with its handover record) and moves the request to
    /// `pending_transfer`. For pet-sitting, grants the sitter relationship
    /// immediately, activates the request, and auto-rejects every sibling
    /// response still in `responded`.
    pub async fn accept(
        pool: &PgPool,
        response_id: DbId,
        at: Timestamp,
    ) -> Result<AcceptOutcome, DbError> {
        let mut tx = pool.begin().await.map_err(DbError::Sqlx)?;

        // Lock the request first (consistent lock order with submit and
        // complete), then re-read the response under that lock.
        let request_id = Self::request_id_of(&mut tx, response_id).await?;
        let request = PlacementRequestRepo::lock(&mut tx, request_id).await?;
        let response = Self::load_in_tx(&mut tx, response_id).await?;

        placement::validate_acceptance(&request.status)?;
        response::validate_decision(&response.status)?;

        let request_type = PlacementType::parse(&request.request_type)?;
        let helper_user_id = Self::helper_user_in_tx(&mut tx, response.helper_profile_id).await?;

        let accept_query = format!(
            "UPDATE placement_request_responses
             SET status = 'accepted', accepted_at = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let accepted = sqlx::query_as::<_, PlacementResponse>(&accept_query)
            .bind(response_id)
            .bind(at)
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::Sqlx)?;

        let outcome = if request_type.requires_handover() {
            let transfer_query = format!(
                "INSERT INTO transfer_requests
                    (placement_request_id, response_id, from_user_id, to_user_id, status)
                 VALUES ($1, $2, $3, $4, '{TRANSFER_STATUS_PENDING}')
                 RETURNING {TRANSFER_COLUMNS}"
            );
            let transfer = sqlx::query_as::<_, TransferRequest>(&transfer_query)
                .bind(request.id)
                .bind(response_id)
                .bind(request.requester_id)
                .bind(helper_user_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(DbError::Sqlx)?;

            let handover_query = format!(
                "INSERT INTO transfer_handovers (transfer_request_id)
                 VALUES ($1)
                 RETURNING {HANDOVER_COLUMNS}"
            );
            let handover = sqlx::query_as::<_, TransferHandover>(&handover_query)
                .bind(transfer.id)
                .fetch_one(&mut *tx)
                .await
                .map_err(DbError::Sqlx)?;

            let updated = PlacementRequestRepo::set_status_in_tx(
                &mut tx,
                request.id,
                placement::REQUEST_STATUS_PENDING_TRANSFER,
                true,
            )
            .await
            .map_err(DbError::Sqlx)?;

            AcceptOutcome {
                response: accepted,
                request: updated,
                transfer_request: Some(transfer),
                handover: Some(handover),
                helper_user_id,
                auto_rejected_user_ids: Vec::new(),
            }
        } else {
            RelationshipRepo::lock_pet(&mut tx, request.pet_id).await?;
            RelationshipRepo::grant_in_tx(
                &mut tx,
                request.pet_id,
                helper_user_id,
                RelationshipKind::Sitter,
                request.requester_id,
                at,
            )
            .await?;

            let auto_rejected_user_ids =
                Self::auto_reject_siblings_in_tx(&mut tx, request.id, response_id).await?;

            let updated = PlacementRequestRepo::set_status_in_tx(
                &mut tx,
                request.id,
                placement::REQUEST_STATUS_ACTIVE,
                true,
            )
            .await
            .map_err(DbError::Sqlx)?;

            AcceptOutcome {
                response: accepted,
                request: updated,
                transfer_request: None,
                handover: None,
                helper_user_id,
                auto_rejected_user_ids,
            }
        };

        tx.commit().await.map_err(DbError::Sqlx)?;

        tracing::info!(
            response_id,
            request_id = outcome.request.id,
            status = %outcome.request.status,
            helper_user_id,
            "Placement response accepted"
        );
        Ok(outcome)
    }

    /// Reject a response. Owner decision; the request status is untouched.
    ///
    /// Returns the rejected response and the helper's user id for
    /// notification emission.
    pub async fn reject(
        pool: &PgPool,
        response_id: DbId,
    ) -> Result<(PlacementResponse, DbId), DbError> {
        let mut tx = pool.begin().await.map_err(DbError::Sqlx)?;

        let request_id = Self::request_id_of(&mut tx, response_id).await?;
        PlacementRequestRepo::lock(&mut tx, request_id).await?;
        let response = Self::load_in_tx(&mut tx, response_id).await?;
        response::validate_decision(&response.status)?;

        let helper_user_id = Self::helper_user_in_tx(&mut tx, response.helper_profile_id).await?;

        let query = format!(
            "UPDATE placement_request_responses
             SET status = 'rejected', updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let rejected = sqlx::query_as::<_, PlacementResponse>(&query)
            .bind(response_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::Sqlx)?;

        tx.commit().await.map_err(DbError::Sqlx)?;

        tracing::info!(response_id, request_id, "Placement response rejected");
        Ok((rejected, helper_user_id))
    }

    /// Cancel a response. Helper decision; only permitted from `responded`,
    /// and frees the helper to respond again later.
    pub async fn cancel(pool: &PgPool, response_id: DbId) -> Result<PlacementResponse, DbError> {
        let mut tx = pool.begin().await.map_err(DbError::Sqlx)?;

        let request_id = Self::request_id_of(&mut tx, response_id).await?;
        PlacementRequestRepo::lock(&mut tx, request_id).await?;
        let response = Self::load_in_tx(&mut tx, response_id).await?;
        response::validate_cancel(&response.status)?;

        let query = format!(
            "UPDATE placement_request_responses
             SET status = 'cancelled', updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let cancelled = sqlx::query_as::<_, PlacementResponse>(&query)
            .bind(response_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::Sqlx)?;

        tx.commit().await.map_err(DbError::Sqlx)?;

        tracing::info!(response_id, request_id, "Placement response cancelled");
        Ok(cancelled)
    }

    /// Reject every sibling response still in `responded` for a request,
    /// returning the affected helpers' user ids.
    pub(crate) async fn auto_reject_siblings_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        request_id: DbId,
        winning_response_id: DbId,
    ) -> Result<Vec<DbId>, DbError> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "UPDATE placement_request_responses r
             SET status = $3, updated_at = NOW()
             FROM helper_profiles hp
             WHERE r.helper_profile_id = hp.id
               AND r.request_id = $1 AND r.id <> $2 AND r.status = 'responded'
             RETURNING hp.user_id",
        )
        .bind(request_id)
        .bind(winning_response_id)
        .bind(RESPONSE_STATUS_REJECTED)
        .fetch_all(&mut **tx)
        .await
        .map_err(DbError::Sqlx)?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// Resolve the helper profile's user id inside a transaction.
    pub(crate) async fn helper_user_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        helper_profile_id: DbId,
    ) -> Result<DbId, DbError> {
        let row: Option<(DbId,)> =
            sqlx::query_as("SELECT user_id FROM helper_profiles WHERE id = $1")
                .bind(helper_profile_id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(DbError::Sqlx)?;
        let (user_id,) = row.ok_or(CoreError::NotFound {
            entity: "HelperProfile",
            id: helper_profile_id,
        })?;
        Ok(user_id)
    }

    /// Look up a response's parent request id (without locking).
    async fn request_id_of(
        tx: &mut Transaction<'_, Postgres>,
        response_id: DbId,
    ) -> Result<DbId, DbError> {
        let row: Option<(DbId,)> =
            sqlx::query_as("SELECT request_id FROM placement_request_responses WHERE id = $1")
                .bind(response_id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(DbError::Sqlx)?;
        let (request_id,) = row.ok_or(CoreError::NotFound {
            entity: "PlacementResponse",
            id: response_id,
        })?;
        Ok(request_id)
    }

    /// Re-read a response inside the transaction, after the request lock
    /// is held.
    async fn load_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        response_id: DbId,
    ) -> Result<PlacementResponse, DbError> {
        let query = format!("SELECT {COLUMNS} FROM placement_request_responses WHERE id = $1");
        let response = sqlx::query_as::<_, PlacementResponse>(&query)
            .bind(response_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(DbError::Sqlx)?
            .ok_or(CoreError::NotFound {
                entity: "PlacementResponse",
                id: response_id,
            })?;
        Ok(response)
    }
}
