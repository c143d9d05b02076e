//! Handlers for placement requests (creation, response listing, finalize).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use rehome_core::error::CoreError;
use rehome_core::types::DbId;
use rehome_db::models::placement::{CreatePlacementRequest, PlacementRequest, PlacementResponse};
use rehome_db::repositories::{PlacementRequestRepo, PlacementResponseRepo};
use rehome_events::DomainEvent;

use super::ensure_owner_or_admin;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/pets/{pet_id}/placement-requests
///
/// Custodian only. Conflict when the pet already has a live request.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Path(pet_id): Path<DbId>,
    Json(input): Json<CreatePlacementRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<PlacementRequest>>)> {
    ensure_owner_or_admin(&state, pet_id, &user).await?;

    let request = PlacementRequestRepo::create(&state.pool, pet_id, user.user_id, &input).await?;

    state.event_bus.publish(
        DomainEvent::new("placement.created")
            .with_source("placement_request", request.id)
            .with_actor(user.user_id)
            .with_payload(serde_json::json!({
                "pet_id": pet_id,
                "request_type": request.request_type,
            })),
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: request })))
}

/// GET /api/v1/placement-requests/{id}/responses
///
/// Owner-only listing of responses to a request.
pub async fn list_responses(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<PlacementResponse>>>> {
    let request = PlacementRequestRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PlacementRequest",
            id,
        }))?;
    ensure_owner_or_admin(&state, request.pet_id, &user).await?;

    let responses = PlacementResponseRepo::list_for_request(&state.pool, id).await?;
    Ok(Json(DataResponse { data: responses }))
}

/// POST /api/v1/placement-requests/{id}/finalize
///
/// Ends a temporary placement: the helper's foster/sitter relationship is
/// closed and the request becomes `finalized`. Owner or admin only;
/// Conflict for permanent placements or requests that are not `active`.
pub async fn finalize(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PlacementRequest>>> {
    let request = PlacementRequestRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PlacementRequest",
            id,
        }))?;
    ensure_owner_or_admin(&state, request.pet_id, &user).await?;

    let finalized = PlacementRequestRepo::finalize(&state.pool, id, Utc::now()).await?;

    state.event_bus.publish(
        DomainEvent::new("placement.finalized")
            .with_source("placement_request", finalized.id)
            .with_actor(user.user_id)
            .with_payload(serde_json::json!({ "pet_id": finalized.pet_id })),
    );
    Ok(Json(DataResponse { data: finalized }))
}
