//! Route definitions for `/helper-profiles`.

use axum::routing::post;
use axum::Router;

use crate::handlers::helper_profiles;
use crate::state::AppState;

/// Routes mounted at `/helper-profiles`.
///
/// ```text
/// POST /    opt in to helping (idempotent)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(helper_profiles::create))
}
