//! Route definitions for transfer requests and handovers.

use axum::routing::post;
use axum::Router;

use crate::handlers::transfers;
use crate::state::AppState;

/// Routes for `/transfer-requests` and `/transfer-handovers`.
///
/// ```text
/// POST /transfer-requests/{id}/confirm     party confirm
/// POST /transfer-handovers/{id}/confirm    condition confirm (recipient)
/// POST /transfer-handovers/{id}/complete   custody mutation (idempotent)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/transfer-requests/{id}/confirm", post(transfers::confirm))
        .route(
            "/transfer-handovers/{id}/confirm",
            post(transfers::confirm_handover),
        )
        .route(
            "/transfer-handovers/{id}/complete",
            post(transfers::complete),
        )
}
