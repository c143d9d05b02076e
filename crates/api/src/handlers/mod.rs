//! HTTP handlers, one module per resource.

pub mod auth;
pub mod helper_profiles;
pub mod invitations;
pub mod pets;
pub mod placement_requests;
pub mod placement_responses;
pub mod transfers;

use rehome_core::error::CoreError;
use rehome_core::types::DbId;
use rehome_db::repositories::RelationshipRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Authorization gate shared by custodian-only operations.
///
/// Passes when the caller holds an active owner relationship on the pet,
/// or holds the admin role.
pub(crate) async fn ensure_owner_or_admin(
    state: &AppState,
    pet_id: DbId,
    user: &AuthUser,
) -> AppResult<()> {
    if user.is_admin() {
        return Ok(());
    }
    let is_owner = RelationshipRepo::is_owner(&state.pool, pet_id, user.user_id).await?;
    if is_owner {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(
            "Owner relationship required".into(),
        )))
    }
}
