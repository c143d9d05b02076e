//! Handlers for relationship invitations.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use rehome_core::types::DbId;
use rehome_db::models::invitation::{CreateInvitation, InvitationPreview, RelationshipInvitation};
use rehome_db::models::relationship::PetRelationship;
use rehome_db::repositories::InvitationRepo;
use rehome_events::DomainEvent;

use super::ensure_owner_or_admin;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Response payload for invitation acceptance.
#[derive(Debug, Serialize)]
pub struct AcceptedInvitation {
    pub invitation: RelationshipInvitation,
    pub relationship: PetRelationship,
}

/// POST /api/v1/pets/{pet_id}/relationship-invitations
///
/// Owner or admin only. The returned row carries the single-use token.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Path(pet_id): Path<DbId>,
    Json(input): Json<CreateInvitation>,
) -> AppResult<(StatusCode, Json<DataResponse<RelationshipInvitation>>)> {
    ensure_owner_or_admin(&state, pet_id, &user).await?;

    let invitation = InvitationRepo::create(&state.pool, pet_id, user.user_id, &input).await?;

    state.event_bus.publish(
        DomainEvent::new("invitation.created")
            .with_source("relationship_invitation", invitation.id)
            .with_actor(user.user_id)
            .with_payload(serde_json::json!({ "pet_id": pet_id, "kind": invitation.kind })),
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: invitation })))
}

/// GET /api/v1/pets/{pet_id}/relationship-invitations
///
/// All invitations issued for a pet, newest first. Owner or admin only.
pub async fn list_for_pet(
    State(state): State<AppState>,
    user: AuthUser,
    Path(pet_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<RelationshipInvitation>>>> {
    ensure_owner_or_admin(&state, pet_id, &user).await?;
    let invitations = InvitationRepo::list_for_pet(&state.pool, pet_id).await?;
    Ok(Json(DataResponse { data: invitations }))
}

/// GET /api/v1/relationship-invitations/{token}
///
/// Public preview: validity and summary fields, no authentication.
pub async fn preview(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<DataResponse<InvitationPreview>>> {
    let preview = InvitationRepo::preview(&state.pool, &token, Utc::now()).await?;
    Ok(Json(DataResponse { data: preview }))
}

/// POST /api/v1/relationship-invitations/{token}/accept
///
/// Grants the invited relationship to the caller and consumes the token.
/// Gone when expired, Conflict on self-accept or a non-pending token.
pub async fn accept(
    State(state): State<AppState>,
    user: AuthUser,
    Path(token): Path<String>,
) -> AppResult<Json<DataResponse<AcceptedInvitation>>> {
    let (invitation, relationship) =
        InvitationRepo::accept(&state.pool, &token, user.user_id, Utc::now()).await?;

    state.event_bus.publish(
        DomainEvent::new("invitation.accepted")
            .with_source("relationship_invitation", invitation.id)
            .with_actor(user.user_id)
            .with_recipient(invitation.inviter_id)
            .with_payload(serde_json::json!({
                "pet_id": invitation.pet_id,
                "kind": invitation.kind,
            })),
    );
    Ok(Json(DataResponse {
        data: AcceptedInvitation {
            invitation,
            relationship,
        },
    }))
}

/// POST /api/v1/relationship-invitations/{token}/decline
pub async fn decline(
    State(state): State<AppState>,
    user: AuthUser,
    Path(token): Path<String>,
) -> AppResult<Json<DataResponse<RelationshipInvitation>>> {
    let declined = InvitationRepo::decline(&state.pool, &token, Utc::now()).await?;

    state.event_bus.publish(
        DomainEvent::new("invitation.declined")
            .with_source("relationship_invitation", declined.id)
            .with_actor(user.user_id)
            .with_recipient(declined.inviter_id),
    );
    Ok(Json(DataResponse { data: declined }))
}

/// DELETE /api/v1/pets/{pet_id}/relationship-invitations/{invitation_id}
///
/// Revokes a pending invitation. Inviter or admin only.
pub async fn revoke(
    State(state): State<AppState>,
    user: AuthUser,
    Path((pet_id, invitation_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    let revoked = InvitationRepo::revoke(
        &state.pool,
        pet_id,
        invitation_id,
        user.user_id,
        user.is_admin(),
    )
    .await?;

    state.event_bus.publish(
        DomainEvent::new("invitation.revoked")
            .with_source("relationship_invitation", revoked.id)
            .with_actor(user.user_id),
    );
    Ok(StatusCode::NO_CONTENT)
}
