//! Response arbitration rules.
//!
//! A helper's offer against an open placement request. A helper profile may
//! hold at most one live ({responded, accepted}) response per request;
//! cancelled and rejected responses free the helper to respond again.

use crate::error::CoreError;

/* --------------------------------------------------------------------------
Statuses
-------------------------------------------------------------------------- */

/// Initial state after submission.
pub const RESPONSE_STATUS_RESPONDED: &str = "responded";

/// Chosen by the request owner.
pub const RESPONSE_STATUS_ACCEPTED: &str = "accepted";

/// Declined by the request owner, or auto-rejected when a sibling won.
pub const RESPONSE_STATUS_REJECTED: &str = "rejected";

/// Withdrawn by the helper.
pub const RESPONSE_STATUS_CANCELLED: &str = "cancelled";

/// All valid response status values.
pub const VALID_RESPONSE_STATUSES: &[&str] = &[
    RESPONSE_STATUS_RESPONDED,
    RESPONSE_STATUS_ACCEPTED,
    RESPONSE_STATUS_REJECTED,
    RESPONSE_STATUS_CANCELLED,
];

/// Statuses that block the same helper profile from submitting again.
pub const LIVE_RESPONSE_STATUSES: &[&str] =
    &[RESPONSE_STATUS_RESPONDED, RESPONSE_STATUS_ACCEPTED];

/* --------------------------------------------------------------------------
Rules
-------------------------------------------------------------------------- */

/// Whether a response in `status` blocks the helper from responding again
/// to the same request.
pub fn blocks_resubmission(status: &str) -> bool {
    LIVE_RESPONSE_STATUSES.contains(&status)
}

/// Validate that a response in `status` may be accepted or rejected by the
/// request owner. Both decisions only apply to a live `responded` offer.
pub fn validate_decision(status: &str) -> Result<(), CoreError> {
    if status != RESPONSE_STATUS_RESPONDED {
        return Err(CoreError::Conflict(format!(
            "Response is '{status}', only a responded offer can be decided"
        )));
    }
    Ok(())
}

/// Validate that the responding helper may cancel. Cancellation is only
/// permitted from `responded`; an accepted offer is already driving the
/// placement and must be unwound by the owner instead.
pub fn validate_cancel(status: &str) -> Result<(), CoreError> {
    if status != RESPONSE_STATUS_RESPONDED {
        return Err(CoreError::Conflict(format!(
            "Response is '{status}', only a responded offer can be cancelled"
        )));
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
    fn test_live_statuses_block_resubmission() {
        assert!(blocks_resubmission(RESPONSE_STATUS_RESPONDED));
        assert!(blocks_resubmission(RESPONSE_STATUS_ACCEPTED));
    }

    #[test]
    fn test_settled_statuses_allow_resubmission() {
        assert!(!blocks_resubmission(RESPONSE_STATUS_CANCELLED));
        assert!(!blocks_resubmission(RESPONSE_STATUS_REJECTED));
    }

    #[test]
    fn test_decision_requires_responded() {
        assert!(validate_decision(RESPONSE_STATUS_RESPONDED).is_ok());
        for status in [
            RESPONSE_STATUS_ACCEPTED,
            RESPONSE_STATUS_REJECTED,
            RESPONSE_STATUS_CANCELLED,
        ] {
            assert_matches!(validate_decision(status), Err(CoreError::Conflict(_)));
        }
    }

    #[test]
    fn test_cancel_only_from_responded() {
        assert!(validate_cancel(RESPONSE_STATUS_RESPONDED).is_ok());
        assert_matches!(
            validate_cancel(RESPONSE_STATUS_ACCEPTED),
            Err(CoreError::Conflict(_))
        );
        assert_matches!(
            validate_cancel(RESPONSE_STATUS_CANCELLED),
            Err(CoreError::Conflict(_))
        );
    }
}
