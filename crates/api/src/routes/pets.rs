//! Route definitions for `/pets` and its sub-resources.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{invitations, pets, placement_requests};
use crate::state::AppState;

/// Routes mounted at `/pets`.
///
/// ```text
/// POST   /                                          create
/// GET    /{pet_id}                                  get
/// GET    /{pet_id}/relationships                    list_relationships
/// GET    /{pet_id}/events                           list_events
/// POST   /{pet_id}/leave                            leave
/// DELETE /{pet_id}/users/{user_id}                  remove_user
/// POST   /{pet_id}/placement-requests               placement create
/// GET    /{pet_id}/relationship-invitations         invitation list
/// POST   /{pet_id}/relationship-invitations         invitation create
/// DELETE /{pet_id}/relationship-invitations/{id}    invitation revoke
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(pets::create))
        .route("/{pet_id}", get(pets::get))
        .route("/{pet_id}/relationships", get(pets::list_relationships))
        .route("/{pet_id}/events", get(pets::list_events))
        .route("/{pet_id}/leave", post(pets::leave))
        .route("/{pet_id}/users/{user_id}", delete(pets::remove_user))
        .route(
            "/{pet_id}/placement-requests",
            post(placement_requests::create),
        )
        .route(
            "/{pet_id}/relationship-invitations",
            get(invitations::list_for_pet).post(invitations::create),
        )
        .route(
            "/{pet_id}/relationship-invitations/{invitation_id}",
            delete(invitations::revoke),
        )
}
