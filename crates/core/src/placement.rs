//! Placement request types, statuses, and the lifecycle transition rules.
//!
//! A placement request moves through
//! `open -> {pending_transfer, active} -> {fulfilled, finalized}`. Which
//! branch it takes is decided entirely by the request's type: each type
//! maps to exactly one [`CustodyStrategy`], so adding a new placement type
//! means adding one match arm the compiler will insist on.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::relationship::RelationshipKind;

/* --------------------------------------------------------------------------
Statuses
-------------------------------------------------------------------------- */

/// Request is accepting responses.
pub const REQUEST_STATUS_OPEN: &str = "open";

/// A response was accepted; a physical handover is pending.
pub const REQUEST_STATUS_PENDING_TRANSFER: &str = "pending_transfer";

/// The placement is running (foster in possession, or sitter engaged).
pub const REQUEST_STATUS_ACTIVE: &str = "active";

/// Terminal: custody changed hands permanently.
pub const REQUEST_STATUS_FULFILLED: &str = "fulfilled";

/// Terminal: a temporary placement ended.
pub const REQUEST_STATUS_FINALIZED: &str = "finalized";

/// All valid placement request status values.
pub const VALID_REQUEST_STATUSES: &[&str] = &[
    REQUEST_STATUS_OPEN,
    REQUEST_STATUS_PENDING_TRANSFER,
    REQUEST_STATUS_ACTIVE,
    REQUEST_STATUS_FULFILLED,
    REQUEST_STATUS_FINALIZED,
];

/* --------------------------------------------------------------------------
Placement types and custody strategies
-------------------------------------------------------------------------- */

/// The kind of placement a custodian is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementType {
    Permanent,
    FosterFree,
    FosterPaid,
    PetSitting,
}

/// All valid placement type strings, as stored in
/// `placement_requests.request_type`.
pub const VALID_PLACEMENT_TYPES: &[&str] =
    &["permanent", "foster_free", "foster_paid", "pet_sitting"];

/// How accepting a helper ultimately mutates the relationship ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustodyStrategy {
    /// Legal ownership moves to the helper; the prior owner keeps viewer
    /// access. Requires a transfer request and handover.
    TransferOwnership,
    /// The helper gains a foster relationship; ownership is untouched.
    /// Requires a transfer request and handover.
    GrantFoster,
    /// The helper gains a sitter relationship immediately on acceptance.
    /// No transfer request or handover is involved.
    GrantSitter,
}

impl PlacementType {
    /// The string stored in the `placement_requests.request_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementType::Permanent => "permanent",
            PlacementType::FosterFree => "foster_free",
            PlacementType::FosterPaid => "foster_paid",
            PlacementType::PetSitting => "pet_sitting",
        }
    }

    /// Parse a stored type string. Fails with `Validation` on unknown values.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "permanent" => Ok(PlacementType::Permanent),
            "foster_free" => Ok(PlacementType::FosterFree),
            "foster_paid" => Ok(PlacementType::FosterPaid),
            "pet_sitting" => Ok(PlacementType::PetSitting),
            other => Err(CoreError::Validation(format!(
                "Invalid placement type '{other}'. Must be one of: {}",
                VALID_PLACEMENT_TYPES.join(", ")
            ))),
        }
    }

    /// The relationship-mutation strategy for this placement type.
    pub fn custody_strategy(&self) -> CustodyStrategy {
        match self {
            PlacementType::Permanent => CustodyStrategy::TransferOwnership,
            PlacementType::FosterFree | PlacementType::FosterPaid => CustodyStrategy::GrantFoster,
            PlacementType::PetSitting => CustodyStrategy::GrantSitter,
        }
    }

    /// Whether accepting a response spawns a transfer request (and thus a
    /// physical handover) rather than activating the placement directly.
    pub fn requires_handover(&self) -> bool {
        self.custody_strategy() != CustodyStrategy::GrantSitter
    }

    /// Whether the placement can end via `finalize` (temporary placements
    /// only). A permanent rehoming has no finalize transition.
    pub fn is_temporary(&self) -> bool {
        !matches!(self, PlacementType::Permanent)
    }

    /// The relationship kind the helper holds while the placement is
    /// `active`, if any. A permanent transfer leaves no temporary
    /// relationship to end later.
    pub fn active_relationship_kind(&self) -> Option<RelationshipKind> {
        match self.custody_strategy() {
            CustodyStrategy::TransferOwnership => None,
            CustodyStrategy::GrantFoster => Some(RelationshipKind::Foster),
            CustodyStrategy::GrantSitter => Some(RelationshipKind::Sitter),
        }
    }

    /// The request status after the custody mutation lands: `fulfilled` for
    /// an ownership change, `active` for temporary placements.
    pub fn status_after_custody_mutation(&self) -> &'static str {
        match self.custody_strategy() {
            CustodyStrategy::TransferOwnership => REQUEST_STATUS_FULFILLED,
            CustodyStrategy::GrantFoster | CustodyStrategy::GrantSitter => REQUEST_STATUS_ACTIVE,
        }
    }
}

/* --------------------------------------------------------------------------
Transition validation
-------------------------------------------------------------------------- */

/// Validate that a response may be accepted on a request in `status`.
///
/// Acceptance drives the `open -> {pending_transfer, active}` transition,
/// so the request must still be open.
pub fn validate_acceptance(status: &str) -> Result<(), CoreError> {
    if status != REQUEST_STATUS_OPEN {
        return Err(CoreError::Conflict(format!(
            "Placement request is '{status}', responses can only be accepted while it is open"
        )));
    }
    Ok(())
}

/// Validate the `active -> finalized` transition.
///
/// Only temporary placement types can be finalized, and only while the
/// placement is running. Finalizing a permanent placement is never a valid
/// transition.
pub fn validate_finalize(request_type: PlacementType, status: &str) -> Result<(), CoreError> {
    if !request_type.is_temporary() {
        return Err(CoreError::Conflict(
            "A permanent placement cannot be finalized".to_string(),
        ));
    }
    if status != REQUEST_STATUS_ACTIVE {
        return Err(CoreError::Conflict(format!(
            "Placement request is '{status}', only an active placement can be finalized"
        )));
    }
    Ok(())
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */
