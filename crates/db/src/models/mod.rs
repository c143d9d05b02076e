//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts

pub mod event;
pub mod helper_profile;
pub mod invitation;
pub mod pet;
pub mod placement;
pub mod relationship;
pub mod transfer;
pub mod user;
