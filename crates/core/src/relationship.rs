//! Custody relationship kinds and the rules that govern them.
//!
//! A relationship is a typed, time-bounded right one user holds over one
//! pet. Kinds form a strict privilege order; granting a higher kind ends
//! any active lower kind the user holds on the same pet
//! (upgrade-ends-downgrade). A pet must keep at least one active owner at
//! all times outside the atomic ownership-transfer mutation.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/* --------------------------------------------------------------------------
Relationship kinds
-------------------------------------------------------------------------- */

/// The kind of right a user holds over a pet.
///
/// Privilege order, highest first: owner > foster > sitter > editor > viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    Owner,
    Foster,
    Sitter,
    Editor,
    Viewer,
}

/// All valid relationship kind strings, as stored in `pet_relationships.kind`.
pub const VALID_RELATIONSHIP_KINDS: &[&str] =
    &["owner", "foster", "sitter", "editor", "viewer"];

impl RelationshipKind {
    /// The string stored in the `pet_relationships.kind` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::Owner => "owner",
            RelationshipKind::Foster => "foster",
            RelationshipKind::Sitter => "sitter",
            RelationshipKind::Editor => "editor",
            RelationshipKind::Viewer => "viewer",
        }
    }

    /// Parse a stored kind string. Fails with `Validation` on unknown values.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "owner" => Ok(RelationshipKind::Owner),
            "foster" => Ok(RelationshipKind::Foster),
            "sitter" => Ok(RelationshipKind::Sitter),
            "editor" => Ok(RelationshipKind::Editor),
            "viewer" => Ok(RelationshipKind::Viewer),
            other => Err(CoreError::Validation(format!(
                "Invalid relationship kind '{other}'. Must be one of: {}",
                VALID_RELATIONSHIP_KINDS.join(", ")
            ))),
        }
    }

    /// Numeric privilege rank; higher means more privilege.
    pub fn rank(&self) -> u8 {
        match self {
            RelationshipKind::Owner => 5,
            RelationshipKind::Foster => 4,
            RelationshipKind::Sitter => 3,
            RelationshipKind::Editor => 2,
            RelationshipKind::Viewer => 1,
        }
    }

    /// Whether granting `self` should end an existing active `other`
    /// relationship for the same user (upgrade-ends-downgrade).
    pub fn subsumes(&self, other: RelationshipKind) -> bool {
        self.rank() > other.rank()
    }

    /// The kinds that an upgrade to `self` ends, as column strings.
    ///
    /// Used by the relationship repository to end lower-privilege rows in
    /// the same statement that grants the new one.
    pub fn subsumed_kinds(&self) -> Vec<&'static str> {
        [
            RelationshipKind::Owner,
            RelationshipKind::Foster,
            RelationshipKind::Sitter,
            RelationshipKind::Editor,
            RelationshipKind::Viewer,
        ]
        .into_iter()
        .filter(|k| self.subsumes(*k))
        .map(|k| k.as_str())
        .collect()
    }
}

/* --------------------------------------------------------------------------
Rules
-------------------------------------------------------------------------- */

/// Decide whether a user may drop a relationship of `kind` on a pet.
///
/// Removing the last active owner is a conflict; a pet must never be left
/// ownerless. `active_owner_count` is the number of active owner rows on
/// the pet at decision time.
pub fn validate_leave(kind: RelationshipKind, active_owner_count: i64) -> Result<(), CoreError> {
    if kind == RelationshipKind::Owner && active_owner_count <= 1 {
        return Err(CoreError::Conflict(
            "Cannot remove the last owner of a pet".to_string(),
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

    #[test]
    fn test_parse_valid_kinds() {
        for s in VALID_RELATIONSHIP_KINDS {
            let kind = RelationshipKind::parse(s).expect("valid kind should parse");
            assert_eq!(kind.as_str(), *s);
        }
    }

    #[test]
    fn test_parse_invalid_kind_rejected() {
        let result = RelationshipKind::parse("landlord");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Invalid relationship kind"));
    }

    #[test]
    fn test_privilege_order() {
        assert!(RelationshipKind::Owner.subsumes(RelationshipKind::Foster));
        assert!(RelationshipKind::Foster.subsumes(RelationshipKind::Sitter));
        assert!(RelationshipKind::Sitter.subsumes(RelationshipKind::Editor));
        assert!(RelationshipKind::Editor.subsumes(RelationshipKind::Viewer));
    }

    #[test]
    fn test_kind_does_not_subsume_itself_or_higher() {
        assert!(!RelationshipKind::Viewer.subsumes(RelationshipKind::Viewer));
        assert!(!RelationshipKind::Viewer.subsumes(RelationshipKind::Editor));
        assert!(!RelationshipKind::Foster.subsumes(RelationshipKind::Owner));
    }

    #[test]
    fn test_editor_grant_ends_only_viewer() {
        assert_eq!(RelationshipKind::Editor.subsumed_kinds(), vec!["viewer"]);
    }

    #[test]
    fn test_owner_grant_ends_all_lower_kinds() {
        assert_eq!(
            RelationshipKind::Owner.subsumed_kinds(),
            vec!["foster", "sitter", "editor", "viewer"]
        );
    }

    #[test]
    fn test_last_owner_cannot_leave() {
        let result = validate_leave(RelationshipKind::Owner, 1);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("last owner"));
    }

    #[test]
    fn test_co_owner_can_leave() {
        assert!(validate_leave(RelationshipKind::Owner, 2).is_ok());
    }

    #[test]
    fn test_non_owner_can_always_leave() {
        assert!(validate_leave(RelationshipKind::Foster, 1).is_ok());
        assert!(validate_leave(RelationshipKind::Viewer, 1).is_ok());
    }
}
