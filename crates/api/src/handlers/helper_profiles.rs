//! Handlers for the `/helper-profiles` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use rehome_db::models::helper_profile::{CreateHelperProfile, HelperProfile};
use rehome_db::repositories::HelperProfileRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/helper-profiles
///
/// Opt in to helping with placements. Idempotent: a user who already has
/// an active profile gets it back with 200 instead of a duplicate.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateHelperProfile>,
) -> AppResult<(StatusCode, Json<DataResponse<HelperProfile>>)> {
    if let Some(existing) = HelperProfileRepo::find_active_by_user(&state.pool, user.user_id).await?
    {
        return Ok((StatusCode::OK, Json(DataResponse { data: existing })));
    }

    let profile = HelperProfileRepo::create(&state.pool, user.user_id, &input).await?;
    tracing::info!(
        helper_profile_id = profile.id,
        user_id = user.user_id,
        "Helper profile created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: profile })))
}
