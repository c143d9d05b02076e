//! Handlers for the `/pets` resource and its relationship sub-resources.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use rehome_core::error::CoreError;
use rehome_core::relationship::RelationshipKind;
use rehome_core::types::DbId;
use rehome_db::models::event::Event;
use rehome_db::models::pet::{CreatePet, Pet};
use rehome_db::models::relationship::PetRelationship;
use rehome_db::repositories::{EventRepo, PetRepo, RelationshipRepo};
use rehome_events::DomainEvent;

use super::ensure_owner_or_admin;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /pets/{pet_id}/leave`.
#[derive(Debug, Deserialize)]
pub struct LeaveRequest {
    pub kind: String,
}

/// Query parameters for `DELETE /pets/{pet_id}/users/{user_id}`.
#[derive(Debug, Deserialize)]
pub struct RemoveUserParams {
    pub kind: String,
}

/// POST /api/v1/pets
///
/// Creates the pet and bootstraps the creator's owner relationship in the
/// same transaction.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreatePet>,
) -> AppResult<(StatusCode, Json<DataResponse<Pet>>)> {
    let pet = PetRepo::create(&state.pool, &input, user.user_id).await?;

    state.event_bus.publish(
        DomainEvent::new("pet.created")
            .with_source("pet", pet.id)
            .with_actor(user.user_id),
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: pet })))
}

/// GET /api/v1/pets/{pet_id}
///
/// Owner or admin only.
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(pet_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Pet>>> {
    ensure_owner_or_admin(&state, pet_id, &user).await?;
    let pet = PetRepo::find_by_id(&state.pool, pet_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Pet",
            id: pet_id,
        }))?;
    Ok(Json(DataResponse { data: pet }))
}

/// GET /api/v1/pets/{pet_id}/relationships
///
/// Active relationships for a pet. Owner or admin only.
pub async fn list_relationships(
    State(state): State<AppState>,
    user: AuthUser,
    Path(pet_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<PetRelationship>>>> {
    ensure_owner_or_admin(&state, pet_id, &user).await?;
    let relationships = RelationshipRepo::list_active_for_pet(&state.pool, pet_id).await?;
    Ok(Json(DataResponse {
        data: relationships,
    }))
}

/// GET /api/v1/pets/{pet_id}/events
///
/// Recent audit events recorded against the pet, newest first. Owner or
/// admin only.
pub async fn list_events(
    State(state): State<AppState>,
    user: AuthUser,
    Path(pet_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Event>>>> {
    ensure_owner_or_admin(&state, pet_id, &user).await?;
    let events = EventRepo::list_for_entity(&state.pool, "pet", pet_id, 100).await?;
    Ok(Json(DataResponse { data: events }))
}

/// POST /api/v1/pets/{pet_id}/leave
///
/// Voluntarily drop the caller's own relationship of the given kind.
/// Conflict when the caller is the pet's last active owner.
pub async fn leave(
    State(state): State<AppState>,
    user: AuthUser,
    Path(pet_id): Path<DbId>,
    Json(input): Json<LeaveRequest>,
) -> AppResult<StatusCode> {
    let kind = RelationshipKind::parse(&input.kind)?;

    RelationshipRepo::leave(&state.pool, pet_id, user.user_id, kind, Utc::now()).await?;

    state.event_bus.publish(
        DomainEvent::new("relationship.ended")
            .with_source("pet", pet_id)
            .with_actor(user.user_id)
            .with_payload(serde_json::json!({ "kind": kind.as_str(), "user_id": user.user_id })),
    );
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/pets/{pet_id}/users/{user_id}?kind=...
///
/// Forced removal of another user's relationship. Owner or admin only,
/// gated by the same last-owner check as voluntary leave.
pub async fn remove_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path((pet_id, target_user_id)): Path<(DbId, DbId)>,
    Query(params): Query<RemoveUserParams>,
) -> AppResult<StatusCode> {
    ensure_owner_or_admin(&state, pet_id, &user).await?;
    let kind = RelationshipKind::parse(&params.kind)?;

    RelationshipRepo::leave(&state.pool, pet_id, target_user_id, kind, Utc::now()).await?;

    state.event_bus.publish(
        DomainEvent::new("relationship.ended")
            .with_source("pet", pet_id)
            .with_actor(user.user_id)
            .with_recipient(target_user_id)
            .with_payload(serde_json::json!({ "kind": kind.as_str(), "user_id": target_user_id })),
    );
    Ok(StatusCode::NO_CONTENT)
}
