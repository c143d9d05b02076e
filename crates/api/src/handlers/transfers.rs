//! Handlers for transfer requests and handovers.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;

use rehome_core::error::CoreError;
use rehome_core::types::DbId;
use rehome_db::models::transfer::{
    CompletedTransfer, ConfirmHandover, TransferHandover, TransferRequest,
};
use rehome_db::repositories::TransferRepo;
use rehome_events::DomainEvent;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/transfer-requests/{id}/confirm
///
/// Either party records that the physical handover took place. The caller
/// must be the sender or the recipient of the transfer.
pub async fn confirm(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TransferHandover>>> {
    let transfer = load_transfer(&state, id).await?;

    let as_recipient = if user.user_id == transfer.to_user_id {
        true
    } else if user.user_id == transfer.from_user_id {
        false
    } else {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the transfer parties may confirm the handover".into(),
        )));
    };

    let handover = TransferRepo::confirm_party(&state.pool, id, as_recipient).await?;

    state.event_bus.publish(
        DomainEvent::new("transfer.party_confirmed")
            .with_source("transfer_request", id)
            .with_actor(user.user_id)
            .with_recipient(if as_recipient {
                transfer.from_user_id
            } else {
                transfer.to_user_id
            }),
    );
    Ok(Json(DataResponse { data: handover }))
}

/// POST /api/v1/transfer-handovers/{id}/confirm
///
/// The recipient confirms the pet's condition on arrival. Recipient only.
pub async fn confirm_handover(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<ConfirmHandover>,
) -> AppResult<Json<DataResponse<TransferHandover>>> {
    let handover = load_handover(&state, id).await?;
    let transfer = load_transfer(&state, handover.transfer_request_id).await?;

    if user.user_id != transfer.to_user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the transfer recipient may confirm the pet's condition".into(),
        )));
    }

    let confirmed = TransferRepo::confirm_condition(&state.pool, id, &input).await?;

    state.event_bus.publish(
        DomainEvent::new("transfer.condition_confirmed")
            .with_source("transfer_request", transfer.id)
            .with_actor(user.user_id)
            .with_recipient(transfer.from_user_id)
            .with_payload(serde_json::json!({
                "condition_confirmed": input.condition_confirmed,
            })),
    );
    Ok(Json(DataResponse { data: confirmed }))
}

/// POST /api/v1/transfer-handovers/{id}/complete
///
/// Runs the custody mutation. Recipient (or admin) only; idempotent, so a
/// retried completion returns the settled state unchanged.
pub async fn complete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<CompletedTransfer>>> {
    let handover = load_handover(&state, id).await?;
    let transfer = load_transfer(&state, handover.transfer_request_id).await?;

    if user.user_id != transfer.to_user_id && !user.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the transfer recipient may complete the handover".into(),
        )));
    }

    let completed = TransferRepo::complete(&state.pool, id, Utc::now()).await?;

    state.event_bus.publish(
        DomainEvent::new("transfer.completed")
            .with_source("transfer_request", completed.transfer_request.id)
            .with_actor(user.user_id)
            .with_recipient(completed.transfer_request.from_user_id)
            .with_payload(serde_json::json!({
                "pet_id": completed.placement_request.pet_id,
                "placement_request_id": completed.placement_request.id,
                "status": completed.placement_request.status,
            })),
    );
    Ok(Json(DataResponse { data: completed }))
}

async fn load_transfer(state: &AppState, id: DbId) -> AppResult<TransferRequest> {
    TransferRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "TransferRequest",
            id,
        }))
}

async fn load_handover(state: &AppState, id: DbId) -> AppResult<TransferHandover> {
    TransferRepo::find_handover_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "TransferHandover",
            id,
        }))
}
