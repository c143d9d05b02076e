//! Relationship invitation entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use rehome_core::types::{DbId, Timestamp};

/// A row from the `relationship_invitations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RelationshipInvitation {
    pub id: DbId,
    pub pet_id: DbId,
    pub inviter_id: DbId,
    /// Single-use opaque token; unique across all invitations.
    pub token: String,
    /// One of the `rehome_core::relationship` kind strings.
    pub kind: String,
    /// One of the `rehome_core::invitation` status strings.
    pub status: String,
    pub expires_at: Timestamp,
    pub accepted_by_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating an invitation.
#[derive(Debug, Deserialize)]
pub struct CreateInvitation {
    pub kind: String,
    /// Days until expiry; defaults to 7 when omitted.
    pub expires_in_days: Option<i64>,
}

/// Public preview of an invitation, safe to return without authentication.
///
/// Exposes validity and summary fields only -- never the inviter's email
/// or the raw row.
#[derive(Debug, Clone, Serialize)]
pub struct InvitationPreview {
    pub valid: bool,
    pub kind: String,
    pub status: String,
    pub pet_name: String,
    pub inviter_username: String,
    pub expires_at: Timestamp,
}
