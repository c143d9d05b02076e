//! Transfer request and handover rules.
//!
//! A transfer request is the agreement to move custody, spawned when a
//! response to a non-sitting placement is accepted. The attached handover
//! records the physical exchange. Completion is idempotent: it is detected
//! from the transfer request's terminal status, never from a
//! unique-constraint violation, so a retried `complete` returns the
//! settled state instead of failing.

use crate::error::CoreError;

/* --------------------------------------------------------------------------
Statuses
-------------------------------------------------------------------------- */

/// Agreement exists; the handover has not completed.
pub const TRANSFER_STATUS_PENDING: &str = "pending";

/// Terminal: the handover completed and custody was mutated.
pub const TRANSFER_STATUS_CONFIRMED: &str = "confirmed";

/// Terminal: superseded by a sibling transfer that confirmed first.
pub const TRANSFER_STATUS_REJECTED: &str = "rejected";

/// All valid transfer request status values.
pub const VALID_TRANSFER_STATUSES: &[&str] = &[
    TRANSFER_STATUS_PENDING,
    TRANSFER_STATUS_CONFIRMED,
    TRANSFER_STATUS_REJECTED,
];

/// Whether a transfer request has reached a terminal status.
pub fn is_terminal(status: &str) -> bool {
    status == TRANSFER_STATUS_CONFIRMED || status == TRANSFER_STATUS_REJECTED
}

/* --------------------------------------------------------------------------
Completion preconditions
-------------------------------------------------------------------------- */

/// Validate that a handover may complete.
///
/// The contract's minimum is the recipient's condition confirmation: the
/// new custodian must have the pet in hand and have confirmed its
/// condition. A rejected transfer can never complete.
pub fn validate_completion(
    transfer_status: &str,
    confirmed_by_recipient: bool,
    condition_confirmed: bool,
) -> Result<(), CoreError> {
    if transfer_status == TRANSFER_STATUS_REJECTED {
        return Err(CoreError::Conflict(
            "Transfer request was rejected and cannot complete".to_string(),
        ));
    }
    if !confirmed_by_recipient {
        return Err(CoreError::Conflict(
            "Handover must be confirmed by the recipient before completion".to_string(),
        ));
    }
    if !condition_confirmed {
        return Err(CoreError::Conflict(
            "Recipient must confirm the pet's condition before completion".to_string(),
        ));
    }
    Ok(())
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_terminal_statuses() {
        assert!(!is_terminal(TRANSFER_STATUS_PENDING));
        assert!(is_terminal(TRANSFER_STATUS_CONFIRMED));
        assert!(is_terminal(TRANSFER_STATUS_REJECTED));
    }

    #[test]
    fn test_completion_requires_recipient_confirmation() {
        assert_matches!(
            validate_completion(TRANSFER_STATUS_PENDING, false, true),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn test_completion_requires_condition_confirmation() {
        assert_matches!(
            validate_completion(TRANSFER_STATUS_PENDING, true, false),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn test_rejected_transfer_cannot_complete() {
        assert_matches!(
            validate_completion(TRANSFER_STATUS_REJECTED, true, true),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn test_fully_confirmed_handover_completes() {
        assert!(validate_completion(TRANSFER_STATUS_PENDING, true, true).is_ok());
    }
}
