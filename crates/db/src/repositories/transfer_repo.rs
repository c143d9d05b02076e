//! Repository for the `transfer_requests` and `transfer_handovers` tables.
//!
//! The handover protocol: either party confirms the physical exchange, the
//! recipient confirms the pet's condition, and `complete` runs the custody
//! mutation. Completion is idempotent -- a transfer already `confirmed`
//! short-circuits to the settled state before any mutation, so a retried
//! request can never create duplicate relationships.

use sqlx::{PgPool, Postgres, Transaction};

use rehome_core::error::CoreError;
use rehome_core::placement::{CustodyStrategy, PlacementType};
use rehome_core::relationship::RelationshipKind;
use rehome_core::transfer::{self, TRANSFER_STATUS_CONFIRMED};
use rehome_core::types::{DbId, Timestamp};

use crate::models::transfer::{CompletedTransfer, ConfirmHandover, TransferHandover, TransferRequest};
use crate::repositories::{PlacementRequestRepo, RelationshipRepo};
use crate::DbError;

/// Column list for transfer_requests queries.
pub(crate) const TRANSFER_COLUMNS: &str = "id, placement_request_id, response_id, from_user_id, \
    to_user_id, status, confirmed_at, created_at, updated_at";

/// Column list for transfer_handovers queries.
pub(crate) const HANDOVER_COLUMNS: &str = "id, transfer_request_id, confirmed_by_sender, \
    confirmed_by_recipient, condition_confirmed, condition_notes, completed_at, \
    created_at, updated_at";

/// Provides handover protocol operations for transfer requests.
pub struct TransferRepo;

impl TransferRepo {
    /// Find a transfer request by its primary key.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<TransferRequest>, sqlx::Error> {
        let query = format!("SELECT {TRANSFER_COLUMNS} FROM transfer_requests WHERE id = $1");
        sqlx::query_as::<_, TransferRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a handover by its primary key.
    pub async fn find_handover_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<TransferHandover>, sqlx::Error> {
        let query = format!("SELECT {HANDOVER_COLUMNS} FROM transfer_handovers WHERE id = $1");
        sqlx::query_as::<_, TransferHandover>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Record that one party confirmed the physical handover occurred.
    ///
    /// `as_recipient` selects which flag is set. Re-confirming is a no-op,
    /// not an error.
    pub async fn confirm_party(
        pool: &PgPool,
        transfer_request_id: DbId,
        as_recipient: bool,
    ) -> Result<TransferHandover, DbError> {
        let column = if as_recipient {
            "confirmed_by_recipient"
        } else {
            "confirmed_by_sender"
        };
        let query = format!(
            "UPDATE transfer_handovers
             SET {column} = true, updated_at = NOW()
             WHERE transfer_request_id = $1
             RETURNING {HANDOVER_COLUMNS}"
        );
        let handover = sqlx::query_as::<_, TransferHandover>(&query)
            .bind(transfer_request_id)
            .fetch_optional(pool)
            .await
            .map_err(DbError::Sqlx)?
            .ok_or(CoreError::NotFound {
                entity: "TransferHandover",
                id: transfer_request_id,
            })?;

        tracing::info!(transfer_request_id, as_recipient, "Handover confirmed");
        Ok(handover)
    }

    /// Record the recipient's condition confirmation and notes.
    pub async fn confirm_condition(
        pool: &PgPool,
        handover_id: DbId,
        input: &ConfirmHandover,
    ) -> Result<TransferHandover, DbError> {
        let query = format!(
            "UPDATE transfer_handovers
             SET confirmed_by_recipient = true,
                 condition_confirmed = $2,
                 condition_notes = COALESCE($3, condition_notes),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {HANDOVER_COLUMNS}"
        );
        let handover = sqlx::query_as::<_, TransferHandover>(&query)
            .bind(handover_id)
            .bind(input.condition_confirmed)
            .bind(&input.condition_notes)
            .fetch_optional(pool)
            .await
            .map_err(DbError::Sqlx)?
            .ok_or(CoreError::NotFound {
                entity: "TransferHandover",
                id: handover_id,
            })?;

        tracing::info!(
            handover_id,
            condition_confirmed = input.condition_confirmed,
            "Handover condition recorded"
        );
        Ok(handover)
    }

    /// Complete a handover: the atomic custody mutation.
    ///
    /// Single transaction, in lock order placement request then pet:
    /// 1. If the transfer request is already `confirmed`, return the
    ///    settled rows unchanged (idempotent re-invocation).
    /// 2. Validate the completion preconditions.
    /// 3. Mutate the relationship ledger per the placement type's custody
    ///    strategy (ownership transfer, or foster grant).
    /// 4. Confirm the transfer request, auto-reject sibling pending
    ///    transfers, advance the placement request, stamp the handover.
    pub async fn complete(
        pool: &PgPool,
        handover_id: DbId,
        at: Timestamp,
    ) -> Result<CompletedTransfer, DbError> {
        let mut tx = pool.begin().await.map_err(DbError::Sqlx)?;

        // Resolve the chain handover -> transfer -> placement request, then
        // take the request lock before re-reading anything mutable.
        let ids: Option<(DbId, DbId)> = sqlx::query_as(
            "SELECT h.transfer_request_id, t.placement_request_id
             FROM transfer_handovers h
             JOIN transfer_requests t ON t.id = h.transfer_request_id
             WHERE h.id = $1",
        )
        .bind(handover_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DbError::Sqlx)?;
        let (transfer_id, placement_id) = ids.ok_or(CoreError::NotFound {
            entity: "TransferHandover",
            id: handover_id,
        })?;

        let request = PlacementRequestRepo::lock(&mut tx, placement_id).await?;
        let transfer = Self::load_transfer_in_tx(&mut tx, transfer_id).await?;
        let handover = Self::load_handover_in_tx(&mut tx, handover_id).await?;

        // Idempotent re-invocation: already settled, return as-is.
        if transfer.status == TRANSFER_STATUS_CONFIRMED {
            tx.commit().await.map_err(DbError::Sqlx)?;
            return Ok(CompletedTransfer {
                transfer_request: transfer,
                handover,
                placement_request: request,
            });
        }

        transfer::validate_completion(
            &transfer.status,
            handover.confirmed_by_recipient,
            handover.condition_confirmed,
        )?;

        let request_type = PlacementType::parse(&request.request_type)?;

        RelationshipRepo::lock_pet(&mut tx, request.pet_id).await?;
        match request_type.custody_strategy() {
            CustodyStrategy::TransferOwnership => {
                RelationshipRepo::transfer_ownership_in_tx(
                    &mut tx,
                    request.pet_id,
                    transfer.from_user_id,
                    transfer.to_user_id,
                    at,
                )
                .await?;
            }
            CustodyStrategy::GrantFoster => {
                RelationshipRepo::grant_in_tx(
                    &mut tx,
                    request.pet_id,
                    transfer.to_user_id,
                    RelationshipKind::Foster,
                    transfer.from_user_id,
                    at,
                )
                .await?;
            }
            CustodyStrategy::GrantSitter => {
                // Sitting placements never spawn a transfer request.
                return Err(CoreError::Internal(
                    "Pet-sitting placement has a transfer request".to_string(),
                )
                .into());
            }
        }

        let confirm_query = format!(
            "UPDATE transfer_requests
             SET status = 'confirmed', confirmed_at = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {TRANSFER_COLUMNS}"
        );
        let confirmed = sqlx::query_as::<_, TransferRequest>(&confirm_query)
            .bind(transfer_id)
            .bind(at)
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::Sqlx)?;

        sqlx::query(
            "UPDATE transfer_requests
             SET status = 'rejected', updated_at = NOW()
             WHERE placement_request_id = $1 AND id <> $2 AND status = 'pending'",
        )
        .bind(placement_id)
        .bind(transfer_id)
        .execute(&mut *tx)
        .await
        .map_err(DbError::Sqlx)?;

        let new_status = request_type.status_after_custody_mutation();
        let still_active = new_status == rehome_core::placement::REQUEST_STATUS_ACTIVE;
        let advanced =
            PlacementRequestRepo::set_status_in_tx(&mut tx, placement_id, new_status, still_active)
                .await
                .map_err(DbError::Sqlx)?;

        let stamp_query = format!(
            "UPDATE transfer_handovers
             SET completed_at = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {HANDOVER_COLUMNS}"
        );
        let stamped = sqlx::query_as::<_, TransferHandover>(&stamp_query)
            .bind(handover_id)
            .bind(at)
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::Sqlx)?;

        tx.commit().await.map_err(DbError::Sqlx)?;

        tracing::info!(
            handover_id,
            transfer_id,
            placement_id,
            pet_id = advanced.pet_id,
            status = %advanced.status,
            "Handover completed"
        );
        Ok(CompletedTransfer {
            transfer_request: confirmed,
            handover: stamped,
            placement_request: advanced,
        })
    }

    async fn load_transfer_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<TransferRequest, DbError> {
        let query = format!("SELECT {TRANSFER_COLUMNS} FROM transfer_requests WHERE id = $1");
        let transfer = sqlx::query_as::<_, TransferRequest>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(DbError::Sqlx)?
            .ok_or(CoreError::NotFound {
                entity: "TransferRequest",
                id,
            })?;
        Ok(transfer)
    }

    async fn load_handover_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<TransferHandover, DbError> {
        let query = format!("SELECT {HANDOVER_COLUMNS} FROM transfer_handovers WHERE id = $1");
        let handover = sqlx::query_as::<_, TransferHandover>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(DbError::Sqlx)?
            .ok_or(CoreError::NotFound {
                entity: "TransferHandover",
                id,
            })?;
        Ok(handover)
    }
}
