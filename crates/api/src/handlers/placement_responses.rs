//! Handlers for placement responses (submit, accept, reject, cancel).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use rehome_core::error::CoreError;
use rehome_core::types::DbId;
use rehome_db::models::placement::{PlacementRequest, PlacementResponse, SubmitResponse};
use rehome_db::models::transfer::{TransferHandover, TransferRequest};
use rehome_db::repositories::{
    HelperProfileRepo, PlacementRequestRepo, PlacementResponseRepo, RelationshipRepo,
};
use rehome_events::DomainEvent;

use super::ensure_owner_or_admin;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Response payload for `POST /placement-responses/{id}/accept`.
///
/// Includes the spawned transfer request and handover when the placement
/// type requires one; `null` for pet-sitting.
#[derive(Debug, Serialize)]
pub struct AcceptResult {
    pub response: PlacementResponse,
    pub request: PlacementRequest,
    pub transfer_request: Option<TransferRequest>,
    pub handover: Option<TransferHandover>,
}

/// POST /api/v1/placement-requests/{id}/responses
///
/// Helper-only. Requires an active helper profile; a pet owner cannot
/// respond to their own request.
pub async fn submit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(request_id): Path<DbId>,
    Json(input): Json<SubmitResponse>,
) -> AppResult<(StatusCode, Json<DataResponse<PlacementResponse>>)> {
    let request = PlacementRequestRepo::find_by_id(&state.pool, request_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PlacementRequest",
            id: request_id,
        }))?;

    if RelationshipRepo::is_owner(&state.pool, request.pet_id, user.user_id).await? {
        return Err(AppError::Core(CoreError::Forbidden(
            "Owners cannot respond to their own placement request".into(),
        )));
    }

    let profile = HelperProfileRepo::find_active_by_user(&state.pool, user.user_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Forbidden(
                "An active helper profile is required to respond".into(),
            ))
        })?;

    let response =
        PlacementResponseRepo::submit(&state.pool, request_id, profile.id, &input).await?;

    state.event_bus.publish(
        DomainEvent::new("placement.response_submitted")
            .with_source("placement_request", request_id)
            .with_actor(user.user_id)
            .with_recipient(request.requester_id)
            .with_payload(serde_json::json!({ "response_id": response.id })),
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: response })))
}

/// POST /api/v1/placement-responses/{id}/accept
///
/// Owner decision. For handover placements this spawns the transfer
/// request; for pet-sitting it grants the sitter relationship immediately
/// and auto-rejects every sibling response.
pub async fn accept(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<AcceptResult>>> {
    let pet_id = request_pet_of_response(&state, id).await?;
    ensure_owner_or_admin(&state, pet_id, &user).await?;

    let outcome = PlacementResponseRepo::accept(&state.pool, id, Utc::now()).await?;

    state.event_bus.publish(
        DomainEvent::new("placement.response_accepted")
            .with_source("placement_request", outcome.request.id)
            .with_actor(user.user_id)
            .with_recipient(outcome.helper_user_id)
            .with_payload(serde_json::json!({ "response_id": outcome.response.id })),
    );
    for rejected_user_id in &outcome.auto_rejected_user_ids {
        state.event_bus.publish(
            DomainEvent::new("placement.response_rejected")
                .with_source("placement_request", outcome.request.id)
                .with_actor(user.user_id)
                .with_recipient(*rejected_user_id),
        );
    }

    Ok(Json(DataResponse {
        data: AcceptResult {
            response: outcome.response,
            request: outcome.request,
            transfer_request: outcome.transfer_request,
            handover: outcome.handover,
        },
    }))
}

/// POST /api/v1/placement-responses/{id}/reject
///
/// Owner decision; the request stays open for other responses.
pub async fn reject(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PlacementResponse>>> {
    let pet_id = request_pet_of_response(&state, id).await?;
    ensure_owner_or_admin(&state, pet_id, &user).await?;

    let (response, helper_user_id) = PlacementResponseRepo::reject(&state.pool, id).await?;

    state.event_bus.publish(
        DomainEvent::new("placement.response_rejected")
            .with_source("placement_request", response.request_id)
            .with_actor(user.user_id)
            .with_recipient(helper_user_id)
            .with_payload(serde_json::json!({ "response_id": response.id })),
    );
    Ok(Json(DataResponse { data: response }))
}

/// POST /api/v1/placement-responses/{id}/cancel
///
/// Helper decision on their own response; frees them to respond again.
pub async fn cancel(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PlacementResponse>>> {
    let response = PlacementResponseRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PlacementResponse",
            id,
        }))?;

    let profile = HelperProfileRepo::find_by_id(&state.pool, response.helper_profile_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "HelperProfile",
            id: response.helper_profile_id,
        }))?;
    if profile.user_id != user.user_id && !user.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the responding helper may cancel this response".into(),
        )));
    }

    let cancelled = PlacementResponseRepo::cancel(&state.pool, id).await?;

    state.event_bus.publish(
        DomainEvent::new("placement.response_cancelled")
            .with_source("placement_request", cancelled.request_id)
            .with_actor(user.user_id)
            .with_payload(serde_json::json!({ "response_id": cancelled.id })),
    );
    Ok(Json(DataResponse { data: cancelled }))
}

/// Resolve the pet behind a response's placement request, for gating.
async fn request_pet_of_response(state: &AppState, response_id: DbId) -> AppResult<DbId> {
    let response = PlacementResponseRepo::find_by_id(&state.pool, response_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PlacementResponse",
            id: response_id,
        }))?;
    let request = PlacementRequestRepo::find_by_id(&state.pool, response.request_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PlacementRequest",
            id: response.request_id,
        }))?;
    Ok(request.pet_id)
}
