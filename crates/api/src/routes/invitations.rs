//! Route definitions for token-addressed relationship invitations.
//!
//! Creation and revocation live under `/pets` (see [`super::pets`]); the
//! token routes here are how an invited user interacts with an invitation.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::invitations;
use crate::state::AppState;

/// Routes for `/relationship-invitations`.
///
/// ```text
/// GET  /relationship-invitations/{token}            public preview
/// POST /relationship-invitations/{token}/accept     accept
/// POST /relationship-invitations/{token}/decline    decline
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/relationship-invitations/{token}",
            get(invitations::preview),
        )
        .route(
            "/relationship-invitations/{token}/accept",
            post(invitations::accept),
        )
        .route(
            "/relationship-invitations/{token}/decline",
            post(invitations::decline),
        )
}
