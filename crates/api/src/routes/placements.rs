//! Route definitions for placement requests and responses.

use axum::routing::post;
use axum::Router;

use crate::handlers::{placement_requests, placement_responses};
use crate::state::AppState;

/// Routes for `/placement-requests` and `/placement-responses`.
///
/// ```text
/// POST /placement-requests/{id}/responses    submit
/// GET  /placement-requests/{id}/responses    list (owner only)
/// POST /placement-requests/{id}/finalize     finalize
/// POST /placement-responses/{id}/accept      accept
/// POST /placement-responses/{id}/reject      reject
/// POST /placement-responses/{id}/cancel      cancel
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/placement-requests/{id}/responses",
            post(placement_responses::submit).get(placement_requests::list_responses),
        )
        .route(
            "/placement-requests/{id}/finalize",
            post(placement_requests::finalize),
        )
        .route(
            "/placement-responses/{id}/accept",
            post(placement_responses::accept),
        )
        .route(
            "/placement-responses/{id}/reject",
            post(placement_responses::reject),
        )
        .route(
            "/placement-responses/{id}/cancel",
            post(placement_responses::cancel),
        )
}
