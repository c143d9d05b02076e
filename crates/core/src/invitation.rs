//! Relationship invitation rules.
//!
//! An invitation is an out-of-band, token-based, single-use grant of a
//! relationship, independent of the placement-request flow. Expiry is
//! evaluated lazily at read/accept time; there is no background sweep.

use uuid::Uuid;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/* --------------------------------------------------------------------------
Statuses
-------------------------------------------------------------------------- */

/// Created and awaiting a decision.
pub const INVITATION_STATUS_PENDING: &str = "pending";

/// Terminal: the invitee took the relationship.
pub const INVITATION_STATUS_ACCEPTED: &str = "accepted";

/// Terminal: the invitee turned it down.
pub const INVITATION_STATUS_DECLINED: &str = "declined";

/// Terminal: withdrawn by the inviter.
pub const INVITATION_STATUS_REVOKED: &str = "revoked";

/// Terminal: an accept attempt observed the expiry.
pub const INVITATION_STATUS_EXPIRED: &str = "expired";

/// All valid invitation status values.
pub const VALID_INVITATION_STATUSES: &[&str] = &[
    INVITATION_STATUS_PENDING,
    INVITATION_STATUS_ACCEPTED,
    INVITATION_STATUS_DECLINED,
    INVITATION_STATUS_REVOKED,
    INVITATION_STATUS_EXPIRED,
];

/* --------------------------------------------------------------------------
Token generation
-------------------------------------------------------------------------- */

/// Generate a globally unique invitation token.
///
/// UUIDv4 gives us unguessability and the database's unique index on the
/// token column backs up global uniqueness.
pub fn generate_token() -> String {
    Uuid::new_v4().to_string()
}

/* --------------------------------------------------------------------------
Rules
-------------------------------------------------------------------------- */

/// Whether the invitation is past its expiry at `now`.
pub fn is_expired(expires_at: Timestamp, now: Timestamp) -> bool {
    now > expires_at
}

/// Validate an accept attempt.
///
/// Order matters: a revoked/settled invitation reports `Conflict` on its
/// status before expiry is considered, an expired pending invitation is
/// `Gone`, and the inviter accepting their own invitation is `Conflict`.
pub fn validate_accept(
    status: &str,
    inviter_id: DbId,
    acceptor_id: DbId,
    expires_at: Timestamp,
    now: Timestamp,
) -> Result<(), CoreError> {
    if status != INVITATION_STATUS_PENDING {
        return Err(CoreError::Conflict(format!(
            "Invitation is '{status}' and can no longer be accepted"
        )));
    }
    if is_expired(expires_at, now) {
        return Err(CoreError::Gone("Invitation has expired".to_string()));
    }
    if inviter_id == acceptor_id {
        return Err(CoreError::Conflict(
            "An inviter cannot accept their own invitation".to_string(),
        ));
    }
    Ok(())
}

/// Validate a decline attempt. Like accept, only a pending invitation can
/// be declined; expiry does not matter since no grant happens.
pub fn validate_decline(status: &str) -> Result<(), CoreError> {
    if status != INVITATION_STATUS_PENDING {
        return Err(CoreError::Conflict(format!(
            "Invitation is '{status}' and can no longer be declined"
        )));
    }
    Ok(())
}

/// Validate a revoke attempt by `caller_id`. Only the original inviter may
/// revoke (the API layer additionally allows admins), and only while the
/// invitation is still pending.
pub fn validate_revoke(status: &str, inviter_id: DbId, caller_id: DbId) -> Result<(), CoreError> {
    if caller_id != inviter_id {
        return Err(CoreError::Forbidden(
            "Only the inviter can revoke an invitation".to_string(),
        ));
    }
    if status != INVITATION_STATUS_PENDING {
        return Err(CoreError::Conflict(format!(
            "Invitation is '{status}' and can no longer be revoked"
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
    use chrono::{Duration, Utc};

    #[test]
    fn test_tokens_are_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36); // uuid string form
    }

    #[test]
    fn test_accept_pending_unexpired() {
        let now = Utc::now();
        let expires = now + Duration::days(7);
        assert!(validate_accept(INVITATION_STATUS_PENDING, 1, 2, expires, now).is_ok());
    }

    #[test]
    fn test_accept_after_expiry_is_gone() {
        let now = Utc::now();
        let expires = now - Duration::seconds(1);
        assert_matches!(
            validate_accept(INVITATION_STATUS_PENDING, 1, 2, expires, now),
            Err(CoreError::Gone(_))
        );
    }

    #[test]
    fn test_inviter_cannot_accept_own_invitation() {
        let now = Utc::now();
        let expires = now + Duration::days(7);
        assert_matches!(
            validate_accept(INVITATION_STATUS_PENDING, 1, 1, expires, now),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn test_settled_invitation_cannot_be_accepted() {
        let now = Utc::now();
        let expires = now + Duration::days(7);
        for status in [
            INVITATION_STATUS_ACCEPTED,
            INVITATION_STATUS_DECLINED,
            INVITATION_STATUS_REVOKED,
            INVITATION_STATUS_EXPIRED,
        ] {
            assert_matches!(
                validate_accept(status, 1, 2, expires, now),
                Err(CoreError::Conflict(_))
            );
        }
    }

    #[test]
    fn test_decline_only_from_pending() {
        assert!(validate_decline(INVITATION_STATUS_PENDING).is_ok());
        assert_matches!(
            validate_decline(INVITATION_STATUS_ACCEPTED),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn test_revoke_requires_inviter() {
        assert_matches!(
            validate_revoke(INVITATION_STATUS_PENDING, 1, 2),
            Err(CoreError::Forbidden(_))
        );
        assert!(validate_revoke(INVITATION_STATUS_PENDING, 1, 1).is_ok());
    }

    #[test]
    fn test_revoke_only_from_pending() {
        assert_matches!(
            validate_revoke(INVITATION_STATUS_DECLINED, 1, 1),
            Err(CoreError::Conflict(_))
        );
    }
}
