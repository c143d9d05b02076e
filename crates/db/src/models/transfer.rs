//! Transfer request and handover entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use rehome_core::types::{DbId, Timestamp};

/// A row from the `transfer_requests` table.
///
/// The agreement to move custody, spawned when a response to a non-sitting
/// placement is accepted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TransferRequest {
    pub id: DbId,
    pub placement_request_id: DbId,
    pub response_id: DbId,
    pub from_user_id: DbId,
    pub to_user_id: DbId,
    /// One of the `rehome_core::transfer` status strings.
    pub status: String,
    pub confirmed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `transfer_handovers` table.
///
/// The physical-possession confirmation attached to a transfer request.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TransferHandover {
    pub id: DbId,
    pub transfer_request_id: DbId,
    pub confirmed_by_sender: bool,
    pub confirmed_by_recipient: bool,
    pub condition_confirmed: bool,
    pub condition_notes: Option<String>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for the recipient's condition confirmation on a handover.
#[derive(Debug, Deserialize)]
pub struct ConfirmHandover {
    pub condition_confirmed: bool,
    pub condition_notes: Option<String>,
}

/// Combined result of a handover completion: the settled transfer, its
/// handover record, and the advanced placement request.
#[derive(Debug, Clone, Serialize)]
pub struct CompletedTransfer {
    pub transfer_request: TransferRequest,
    pub handover: TransferHandover,
    pub placement_request: super::placement::PlacementRequest,
}
