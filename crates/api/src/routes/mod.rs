pub mod auth;
pub mod health;
pub mod helper_profiles;
pub mod invitations;
pub mod pets;
pub mod placements;
pub mod transfers;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                                    register (public)
/// /auth/login                                       login (public)
/// /auth/me                                          current user (GET)
///
/// /helper-profiles                                  opt in to helping (POST)
///
/// /pets                                             create (POST)
/// /pets/{pet_id}                                    fetch (GET)
/// /pets/{pet_id}/relationships                      active relationships (GET)
/// /pets/{pet_id}/events                             audit events (GET)
/// /pets/{pet_id}/leave                              voluntary leave (POST)
/// /pets/{pet_id}/users/{user_id}                    forced removal (DELETE)
/// /pets/{pet_id}/placement-requests                 create request (POST)
/// /pets/{pet_id}/relationship-invitations           list (GET), create (POST)
/// /pets/{pet_id}/relationship-invitations/{id}      revoke (DELETE)
///
/// /placement-requests/{id}/responses                submit (POST), list (GET)
/// /placement-requests/{id}/finalize                 finalize (POST)
/// /placement-responses/{id}/accept                  owner accept (POST)
/// /placement-responses/{id}/reject                  owner reject (POST)
/// /placement-responses/{id}/cancel                  helper cancel (POST)
///
/// /transfer-requests/{id}/confirm                   party confirm (POST)
/// /transfer-handovers/{id}/confirm                  condition confirm (POST)
/// /transfer-handovers/{id}/complete                 custody mutation (POST)
///
/// /relationship-invitations/{token}                 public preview (GET)
/// /relationship-invitations/{token}/accept          accept (POST)
/// /relationship-invitations/{token}/decline         decline (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/helper-profiles", helper_profiles::router())
        .nest("/pets", pets::router())
        .merge(placements::router())
        .merge(transfers::router())
        .merge(invitations::router())
}
