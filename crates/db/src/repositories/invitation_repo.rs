//! Repository for the `relationship_invitations` table.
//!
//! Invitations are single-use tokens that grant a relationship on
//! acceptance. Expiry is marked lazily: no sweeper runs, the first
//! operation to observe a stale `pending` row flips it to `expired`.

use sqlx::{PgPool, Postgres, Transaction};

use rehome_core::error::CoreError;
use rehome_core::invitation::{self, INVITATION_STATUS_EXPIRED};
use rehome_core::relationship::RelationshipKind;
use rehome_core::types::{DbId, Timestamp};

use crate::models::invitation::{CreateInvitation, InvitationPreview, RelationshipInvitation};
use crate::models::relationship::PetRelationship;
use crate::repositories::RelationshipRepo;
use crate::DbError;

const COLUMNS: &str = "id, pet_id, inviter_id, token, kind, status, expires_at, \
    accepted_by_id, created_at, updated_at";

const DEFAULT_EXPIRY_DAYS: i64 = 7;

/// Manages invitation issuance, preview and resolution.
pub struct InvitationRepo;

impl InvitationRepo {
    /// Issue a new invitation for a pet with a fresh token.
    pub async fn create(
        pool: &PgPool,
        pet_id: DbId,
        inviter_id: DbId,
        input: &CreateInvitation,
    ) -> Result<RelationshipInvitation, DbError> {
        // Reject unknown kinds before touching the database.
        let kind = RelationshipKind::parse(&input.kind)?;
        let days = input.expires_in_days.unwrap_or(DEFAULT_EXPIRY_DAYS);
        if days <= 0 {
            return Err(CoreError::Validation(
                "expires_in_days must be positive".to_string(),
            )
            .into());
        }
        let expires_at = chrono::Utc::now() + chrono::Duration::days(days);
        let token = invitation::generate_token();

        let query = format!(
            "INSERT INTO relationship_invitations (pet_id, inviter_id, token, kind, expires_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, RelationshipInvitation>(&query)
            .bind(pet_id)
            .bind(inviter_id)
            .bind(&token)
            .bind(kind.as_str())
            .bind(expires_at)
            .fetch_one(pool)
            .await
            .map_err(DbError::Sqlx)?;

        tracing::info!(
            invitation_id = row.id,
            pet_id,
            inviter_id,
            kind = %row.kind,
            "Invitation created"
        );
        Ok(row)
    }

    /// List invitations issued for a pet, newest first.
    pub async fn list_for_pet(
        pool: &PgPool,
        pet_id: DbId,
    ) -> Result<Vec<RelationshipInvitation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM relationship_invitations
             WHERE pet_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, RelationshipInvitation>(&query)
            .bind(pet_id)
            .fetch_all(pool)
            .await
    }

    /// Unauthenticated preview of an invitation by token.
    ///
    /// Reports validity without mutating the row; an expired-but-pending
    /// invitation previews as invalid.
    pub async fn preview(
        pool: &PgPool,
        token: &str,
        now: Timestamp,
    ) -> Result<InvitationPreview, DbError> {
        let row: Option<(String, String, Timestamp, String, String)> = sqlx::query_as(
            "SELECT i.kind, i.status, i.expires_at,
                    p.name AS pet_name, u.username AS inviter_username
             FROM relationship_invitations i
             JOIN pets p ON p.id = i.pet_id
             JOIN users u ON u.id = i.inviter_id
             WHERE i.token = $1",
        )
        .bind(token)
        .fetch_optional(pool)
        .await
        .map_err(DbError::Sqlx)?;

        let (kind, status, expires_at, pet_name, inviter_username) =
            row.ok_or(CoreError::NotFound {
                entity: "RelationshipInvitation",
                id: 0,
            })?;

        let valid = status == invitation::INVITATION_STATUS_PENDING
            && !invitation::is_expired(expires_at, now);
        Ok(InvitationPreview {
            valid,
            kind,
            status,
            pet_name,
            inviter_username,
            expires_at,
        })
    }

    /// Accept an invitation: grant the relationship and consume the token.
    ///
    /// Runs in one transaction with the invitation row locked. If the
    /// invitation is observed expired it is flipped to `expired` before the
    /// error is returned, which is why the expiry path commits.
    pub async fn accept(
        pool: &PgPool,
        token: &str,
        acceptor_id: DbId,
        now: Timestamp,
    ) -> Result<(RelationshipInvitation, PetRelationship), DbError> {
        let mut tx = pool.begin().await.map_err(DbError::Sqlx)?;

        let invite = Self::lock_by_token(&mut tx, token).await?;

        match invitation::validate_accept(
            &invite.status,
            invite.inviter_id,
            acceptor_id,
            invite.expires_at,
            now,
        ) {
            Ok(()) => {}
            Err(err @ CoreError::Gone(_)) => {
                // Lazy expiry: persist the observed transition, then fail.
                Self::set_status_in_tx(&mut tx, invite.id, INVITATION_STATUS_EXPIRED, None)
                    .await
                    .map_err(DbError::Sqlx)?;
                tx.commit().await.map_err(DbError::Sqlx)?;
                tracing::info!(invitation_id = invite.id, "Invitation marked expired");
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        }

        let kind = RelationshipKind::parse(&invite.kind)?;
        RelationshipRepo::lock_pet(&mut tx, invite.pet_id).await?;
        let relationship = RelationshipRepo::grant_in_tx(
            &mut tx,
            invite.pet_id,
            acceptor_id,
            kind,
            invite.inviter_id,
            now,
        )
        .await?;

        let accepted = Self::set_status_in_tx(
            &mut tx,
            invite.id,
            invitation::INVITATION_STATUS_ACCEPTED,
            Some(acceptor_id),
        )
        .await
        .map_err(DbError::Sqlx)?;

        tx.commit().await.map_err(DbError::Sqlx)?;

        tracing::info!(
            invitation_id = accepted.id,
            pet_id = accepted.pet_id,
            acceptor_id,
            kind = %accepted.kind,
            "Invitation accepted"
        );
        Ok((accepted, relationship))
    }

    /// Decline a pending invitation.
    pub async fn decline(
        pool: &PgPool,
        token: &str,
        now: Timestamp,
    ) -> Result<RelationshipInvitation, DbError> {
        let mut tx = pool.begin().await.map_err(DbError::Sqlx)?;
        let invite = Self::lock_by_token(&mut tx, token).await?;

        if invitation::is_expired(invite.expires_at, now)
            && invite.status == invitation::INVITATION_STATUS_PENDING
        {
            Self::set_status_in_tx(&mut tx, invite.id, INVITATION_STATUS_EXPIRED, None)
                .await
                .map_err(DbError::Sqlx)?;
            tx.commit().await.map_err(DbError::Sqlx)?;
            return Err(CoreError::Gone("Invitation has expired".to_string()).into());
        }
        invitation::validate_decline(&invite.status)?;

        let declined = Self::set_status_in_tx(
            &mut tx,
            invite.id,
            invitation::INVITATION_STATUS_DECLINED,
            None,
        )
        .await
        .map_err(DbError::Sqlx)?;
        tx.commit().await.map_err(DbError::Sqlx)?;

        tracing::info!(invitation_id = declined.id, "Invitation declined");
        Ok(declined)
    }

    /// Revoke a pending invitation addressed through its pet. Only the
    /// inviter may revoke, unless `admin_override` is set.
    ///
    /// The invitation must belong to `pet_id`; an id reached through
    /// another pet's URL is NotFound, not a revocable row.
    pub async fn revoke(
        pool: &PgPool,
        pet_id: DbId,
        id: DbId,
        caller_id: DbId,
        admin_override: bool,
    ) -> Result<RelationshipInvitation, DbError> {
        let mut tx = pool.begin().await.map_err(DbError::Sqlx)?;

        let query = format!(
            "SELECT {COLUMNS} FROM relationship_invitations
             WHERE id = $1 AND pet_id = $2 FOR UPDATE"
        );
        let invite = sqlx::query_as::<_, RelationshipInvitation>(&query)
            .bind(id)
            .bind(pet_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(DbError::Sqlx)?
            .ok_or(CoreError::NotFound {
                entity: "RelationshipInvitation",
                id,
            })?;

        let effective_caller = if admin_override {
            invite.inviter_id
        } else {
            caller_id
        };
        invitation::validate_revoke(&invite.status, invite.inviter_id, effective_caller)?;

        let revoked = Self::set_status_in_tx(
            &mut tx,
            invite.id,
            invitation::INVITATION_STATUS_REVOKED,
            None,
        )
        .await
        .map_err(DbError::Sqlx)?;
        tx.commit().await.map_err(DbError::Sqlx)?;

        tracing::info!(invitation_id = revoked.id, caller_id, "Invitation revoked");
        Ok(revoked)
    }

    async fn lock_by_token(
        tx: &mut Transaction<'_, Postgres>,
        token: &str,
    ) -> Result<RelationshipInvitation, DbError> {
        let query =
            format!("SELECT {COLUMNS} FROM relationship_invitations WHERE token = $1 FOR UPDATE");
        let invite = sqlx::query_as::<_, RelationshipInvitation>(&query)
            .bind(token)
            .fetch_optional(&mut **tx)
            .await
            .map_err(DbError::Sqlx)?
            .ok_or(CoreError::NotFound {
                entity: "RelationshipInvitation",
                id: 0,
            })?;
        Ok(invite)
    }

    async fn set_status_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        status: &str,
        accepted_by_id: Option<DbId>,
    ) -> Result<RelationshipInvitation, sqlx::Error> {
        let query = format!(
            "UPDATE relationship_invitations
             SET status = $2, accepted_by_id = COALESCE($3, accepted_by_id), updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RelationshipInvitation>(&query)
            .bind(id)
            .bind(status)
            .bind(accepted_by_id)
            .fetch_one(&mut **tx)
            .await
    }
}
