//! Repository layer: one zero-sized struct per aggregate, queries built
//! from shared column lists, lifecycle mutations in explicit transactions.

pub mod event_repo;
pub mod helper_profile_repo;
pub mod invitation_repo;
pub mod pet_repo;
pub mod placement_request_repo;
pub mod placement_response_repo;
pub mod relationship_repo;
pub mod role_repo;
pub mod transfer_repo;
pub mod user_repo;

pub use event_repo::EventRepo;
pub use helper_profile_repo::HelperProfileRepo;
pub use invitation_repo::InvitationRepo;
pub use pet_repo::PetRepo;
pub use placement_request_repo::PlacementRequestRepo;
pub use placement_response_repo::{AcceptOutcome, PlacementResponseRepo};
pub use relationship_repo::RelationshipRepo;
pub use role_repo::RoleRepo;
pub use transfer_repo::TransferRepo;
pub use user_repo::UserRepo;
