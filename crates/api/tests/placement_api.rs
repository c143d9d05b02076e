//! End-to-end lifecycle tests for placement requests, responses, and
//! transfer handovers.

mod common;

use axum::http::StatusCode;
use common::{
    auth_get, auth_post, auth_post_json, expect_status, seed_helper_profile, seed_member, seed_pet,
};
use sqlx::PgPool;

/// Drive a request through submit and accept, returning
/// `(request_id, transfer_request_id, handover_id)`.
async fn accept_response(
    pool: &PgPool,
    pet_id: i64,
    owner_token: &str,
    helper_token: &str,
    request_type: &str,
) -> (i64, serde_json::Value) {
    let app = common::build_test_app(pool.clone());
    let response = auth_post_json(
        app,
        &format!("/api/v1/pets/{pet_id}/placement-requests"),
        owner_token,
        serde_json::json!({ "request_type": request_type }),
    )
    .await;
    let created = expect_status(response, StatusCode::CREATED).await;
    let request_id = created["data"]["id"].as_i64().unwrap();

    let app = common::build_test_app(pool.clone());
    let response = auth_post_json(
        app,
        &format!("/api/v1/placement-requests/{request_id}/responses"),
        helper_token,
        serde_json::json!({ "message": "I can take them in" }),
    )
    .await;
    let submitted = expect_status(response, StatusCode::CREATED).await;
    let response_id = submitted["data"]["id"].as_i64().unwrap();

    let app = common::build_test_app(pool.clone());
    let response = auth_post(
        app,
        &format!("/api/v1/placement-responses/{response_id}/accept"),
        owner_token,
    )
    .await;
    let accepted = expect_status(response, StatusCode::OK).await;

    (request_id, accepted["data"].clone())
}

/// Run the full handover protocol up to (but not including) completion.
async fn confirm_handover(
    pool: &PgPool,
    transfer_id: i64,
    handover_id: i64,
    owner_token: &str,
    helper_token: &str,
) {
    // Sender confirms the exchange happened.
    let app = common::build_test_app(pool.clone());
    let response = auth_post(
        app,
        &format!("/api/v1/transfer-requests/{transfer_id}/confirm"),
        owner_token,
    )
    .await;
    expect_status(response, StatusCode::OK).await;

    // Recipient confirms the pet's condition.
    let app = common::build_test_app(pool.clone());
    let response = auth_post_json(
        app,
        &format!("/api/v1/transfer-handovers/{handover_id}/confirm"),
        helper_token,
        serde_json::json!({ "condition_confirmed": true, "condition_notes": "healthy" }),
    )
    .await;
    expect_status(response, StatusCode::OK).await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_foster_free_full_lifecycle(pool: PgPool) {
    let (owner_id, owner_token) = seed_member(&pool, "owner").await;
    let (helper_id, helper_token) = seed_member(&pool, "helper").await;
    seed_helper_profile(&pool, helper_id).await;
    let pet_id = seed_pet(&pool, owner_id, "Rex").await;

    let (request_id, accepted) =
        accept_response(&pool, pet_id, &owner_token, &helper_token, "foster_free").await;

    // Foster placements hand over custody, so acceptance spawns a transfer.
    assert_eq!(accepted["request"]["status"], "pending_transfer");
    let transfer_id = accepted["transfer_request"]["id"].as_i64().unwrap();
    let handover_id = accepted["handover"]["id"].as_i64().unwrap();

    confirm_handover(&pool, transfer_id, handover_id, &owner_token, &helper_token).await;

    let app = common::build_test_app(pool.clone());
    let response = auth_post(
        app,
        &format!("/api/v1/transfer-handovers/{handover_id}/complete"),
        &helper_token,
    )
    .await;
    let completed = expect_status(response, StatusCode::OK).await;
    assert_eq!(completed["data"]["transfer_request"]["status"], "confirmed");
    assert_eq!(completed["data"]["placement_request"]["status"], "active");

    // The helper now holds an active foster relationship; ownership is kept.
    let app = common::build_test_app(pool.clone());
    let response = auth_get(
        app,
        &format!("/api/v1/pets/{pet_id}/relationships"),
        &owner_token,
    )
    .await;
    let relationships = expect_status(response, StatusCode::OK).await;
    let kinds: Vec<(i64, String)> = relationships["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| {
            (
                r["user_id"].as_i64().unwrap(),
                r["kind"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert!(kinds.contains(&(owner_id, "owner".to_string())));
    assert!(kinds.contains(&(helper_id, "foster".to_string())));

    // Finalize ends the foster relationship and closes the request.
    let app = common::build_test_app(pool.clone());
    let response = auth_post(
        app,
        &format!("/api/v1/placement-requests/{request_id}/finalize"),
        &owner_token,
    )
    .await;
    let finalized = expect_status(response, StatusCode::OK).await;
    assert_eq!(finalized["data"]["status"], "finalized");

    let app = common::build_test_app(pool);
    let response = auth_get(
        app,
        &format!("/api/v1/pets/{pet_id}/relationships"),
        &owner_token,
    )
    .await;
    let relationships = expect_status(response, StatusCode::OK).await;
    let active: Vec<&str> = relationships["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["kind"].as_str().unwrap())
        .collect();
    assert_eq!(active, vec!["owner"], "only the owner remains after finalize");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_permanent_placement_transfers_ownership(pool: PgPool) {
    let (owner_id, owner_token) = seed_member(&pool, "owner").await;
    let (helper_id, helper_token) = seed_member(&pool, "adopter").await;
    seed_helper_profile(&pool, helper_id).await;
    let pet_id = seed_pet(&pool, owner_id, "Mia").await;

    let (_request_id, accepted) =
        accept_response(&pool, pet_id, &owner_token, &helper_token, "permanent").await;
    let transfer_id = accepted["transfer_request"]["id"].as_i64().unwrap();
    let handover_id = accepted["handover"]["id"].as_i64().unwrap();

    confirm_handover(&pool, transfer_id, handover_id, &owner_token, &helper_token).await;

    let app = common::build_test_app(pool.clone());
    let response = auth_post(
        app,
        &format!("/api/v1/transfer-handovers/{handover_id}/complete"),
        &helper_token,
    )
    .await;
    let completed = expect_status(response, StatusCode::OK).await;

    // Permanent rehoming fulfills the request outright.
    assert_eq!(completed["data"]["placement_request"]["status"], "fulfilled");

    // Ownership moved: the adopter lists relationships now, the previous
    // owner was demoted to viewer.
    let app = common::build_test_app(pool.clone());
    let response = auth_get(
        app,
        &format!("/api/v1/pets/{pet_id}/relationships"),
        &helper_token,
    )
    .await;
    let relationships = expect_status(response, StatusCode::OK).await;
    let kinds: Vec<(i64, String)> = relationships["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| {
            (
                r["user_id"].as_i64().unwrap(),
                r["kind"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert!(kinds.contains(&(helper_id, "owner".to_string())));
    assert!(kinds.contains(&(owner_id, "viewer".to_string())));
    assert!(!kinds.contains(&(owner_id, "owner".to_string())));

    // The previous owner no longer passes the owner gate.
    let app = common::build_test_app(pool);
    let response = auth_get(
        app,
        &format!("/api/v1/pets/{pet_id}/relationships"),
        &owner_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_complete_is_idempotent(pool: PgPool) {
    let (owner_id, owner_token) = seed_member(&pool, "owner").await;
    let (helper_id, helper_token) = seed_member(&pool, "helper").await;
    seed_helper_profile(&pool, helper_id).await;
    let pet_id = seed_pet(&pool, owner_id, "Rex").await;

    let (_request_id, accepted) =
        accept_response(&pool, pet_id, &owner_token, &helper_token, "foster_paid").await;
    let transfer_id = accepted["transfer_request"]["id"].as_i64().unwrap();
    let handover_id = accepted["handover"]["id"].as_i64().unwrap();

    confirm_handover(&pool, transfer_id, handover_id, &owner_token, &helper_token).await;

    let app = common::build_test_app(pool.clone());
    let response = auth_post(
        app,
        &format!("/api/v1/transfer-handovers/{handover_id}/complete"),
        &helper_token,
    )
    .await;
    expect_status(response, StatusCode::OK).await;

    // A retried completion returns the settled state, not an error, and
    // must not grant a second relationship.
    let app = common::build_test_app(pool.clone());
    let response = auth_post(
        app,
        &format!("/api/v1/transfer-handovers/{handover_id}/complete"),
        &helper_token,
    )
    .await;
    let replay = expect_status(response, StatusCode::OK).await;
    assert_eq!(replay["data"]["transfer_request"]["status"], "confirmed");

    let count: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM pet_relationships
         WHERE pet_id = $1 AND user_id = $2 AND kind = 'foster' AND ended_at IS NULL",
    )
    .bind(pet_id)
    .bind(helper_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count.0, 1, "replayed completion must not duplicate the grant");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_complete_requires_condition_confirmation(pool: PgPool) {
    let (owner_id, owner_token) = seed_member(&pool, "owner").await;
    let (helper_id, helper_token) = seed_member(&pool, "helper").await;
    seed_helper_profile(&pool, helper_id).await;
    let pet_id = seed_pet(&pool, owner_id, "Rex").await;

    let (_request_id, accepted) =
        accept_response(&pool, pet_id, &owner_token, &helper_token, "foster_free").await;
    let handover_id = accepted["handover"]["id"].as_i64().unwrap();

    // No confirmations yet: completion must refuse.
    let app = common::build_test_app(pool);
    let response = auth_post(
        app,
        &format!("/api/v1/transfer-handovers/{handover_id}/complete"),
        &helper_token,
    )
    .await;
    let json = expect_status(response, StatusCode::CONFLICT).await;
    assert_eq!(json["code"], "CONFLICT");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_pet_sitting_grants_sitter_and_auto_rejects_siblings(pool: PgPool) {
    let (owner_id, owner_token) = seed_member(&pool, "owner").await;
    let (sitter_id, sitter_token) = seed_member(&pool, "sitter").await;
    let (other_id, other_token) = seed_member(&pool, "other").await;
    seed_helper_profile(&pool, sitter_id).await;
    seed_helper_profile(&pool, other_id).await;
    let pet_id = seed_pet(&pool, owner_id, "Rex").await;

    let app = common::build_test_app(pool.clone());
    let response = auth_post_json(
        app,
        &format!("/api/v1/pets/{pet_id}/placement-requests"),
        &owner_token,
        serde_json::json!({ "request_type": "pet_sitting" }),
    )
    .await;
    let created = expect_status(response, StatusCode::CREATED).await;
    let request_id = created["data"]["id"].as_i64().unwrap();

    for token in [&sitter_token, &other_token] {
        let app = common::build_test_app(pool.clone());
        let response = auth_post_json(
            app,
            &format!("/api/v1/placement-requests/{request_id}/responses"),
            token,
            serde_json::json!({ "message": "available" }),
        )
        .await;
        expect_status(response, StatusCode::CREATED).await;
    }

    // Accept one of the two responses from the owner's listing.
    let app = common::build_test_app(pool.clone());
    let response = auth_get(
        app,
        &format!("/api/v1/placement-requests/{request_id}/responses"),
        &owner_token,
    )
    .await;
    let listing = expect_status(response, StatusCode::OK).await;
    let responses = listing["data"].as_array().unwrap();
    assert_eq!(responses.len(), 2);
    let accepted_response_id = responses[0]["id"].as_i64().unwrap();

    let app = common::build_test_app(pool.clone());
    let response = auth_post(
        app,
        &format!("/api/v1/placement-responses/{accepted_response_id}/accept"),
        &owner_token,
    )
    .await;
    let accepted = expect_status(response, StatusCode::OK).await;

    // Sitting skips the handover protocol entirely.
    assert!(accepted["data"]["transfer_request"].is_null());
    assert_eq!(accepted["data"]["request"]["status"], "active");

    // Sibling response was auto-rejected.
    let app = common::build_test_app(pool.clone());
    let response = auth_get(
        app,
        &format!("/api/v1/placement-requests/{request_id}/responses"),
        &owner_token,
    )
    .await;
    let listing = expect_status(response, StatusCode::OK).await;
    let statuses: Vec<&str> = listing["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["status"].as_str().unwrap())
        .collect();
    assert!(statuses.contains(&"accepted"));
    assert!(statuses.contains(&"rejected"));

    // The accepted sitter holds an active sitter relationship.
    let active: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM pet_relationships
         WHERE pet_id = $1 AND kind = 'sitter' AND ended_at IS NULL",
    )
    .bind(pet_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(active.0, 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_owner_cannot_respond_to_own_request(pool: PgPool) {
    let (owner_id, owner_token) = seed_member(&pool, "owner").await;
    seed_helper_profile(&pool, owner_id).await;
    let pet_id = seed_pet(&pool, owner_id, "Rex").await;

    let app = common::build_test_app(pool.clone());
    let response = auth_post_json(
        app,
        &format!("/api/v1/pets/{pet_id}/placement-requests"),
        &owner_token,
        serde_json::json!({ "request_type": "foster_free" }),
    )
    .await;
    let created = expect_status(response, StatusCode::CREATED).await;
    let request_id = created["data"]["id"].as_i64().unwrap();

    let app = common::build_test_app(pool);
    let response = auth_post_json(
        app,
        &format!("/api/v1/placement-requests/{request_id}/responses"),
        &owner_token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_response_requires_helper_profile(pool: PgPool) {
    let (owner_id, owner_token) = seed_member(&pool, "owner").await;
    let (_stranger_id, stranger_token) = seed_member(&pool, "stranger").await;
    let pet_id = seed_pet(&pool, owner_id, "Rex").await;

    let app = common::build_test_app(pool.clone());
    let response = auth_post_json(
        app,
        &format!("/api/v1/pets/{pet_id}/placement-requests"),
        &owner_token,
        serde_json::json!({ "request_type": "foster_free" }),
    )
    .await;
    let created = expect_status(response, StatusCode::CREATED).await;
    let request_id = created["data"]["id"].as_i64().unwrap();

    let app = common::build_test_app(pool);
    let response = auth_post_json(
        app,
        &format!("/api/v1/placement-requests/{request_id}/responses"),
        &stranger_token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_duplicate_live_response_conflicts_until_cancelled(pool: PgPool) {
    let (owner_id, owner_token) = seed_member(&pool, "owner").await;
    let (helper_id, helper_token) = seed_member(&pool, "helper").await;
    seed_helper_profile(&pool, helper_id).await;
    let pet_id = seed_pet(&pool, owner_id, "Rex").await;

    let app = common::build_test_app(pool.clone());
    let response = auth_post_json(
        app,
        &format!("/api/v1/pets/{pet_id}/placement-requests"),
        &owner_token,
        serde_json::json!({ "request_type": "foster_free" }),
    )
    .await;
    let created = expect_status(response, StatusCode::CREATED).await;
    let request_id = created["data"]["id"].as_i64().unwrap();

    let app = common::build_test_app(pool.clone());
    let response = auth_post_json(
        app,
        &format!("/api/v1/placement-requests/{request_id}/responses"),
        &helper_token,
        serde_json::json!({}),
    )
    .await;
    let submitted = expect_status(response, StatusCode::CREATED).await;
    let response_id = submitted["data"]["id"].as_i64().unwrap();

    // Second live response is refused.
    let app = common::build_test_app(pool.clone());
    let response = auth_post_json(
        app,
        &format!("/api/v1/placement-requests/{request_id}/responses"),
        &helper_token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Cancelling frees the helper to respond again.
    let app = common::build_test_app(pool.clone());
    let response = auth_post(
        app,
        &format!("/api/v1/placement-responses/{response_id}/cancel"),
        &helper_token,
    )
    .await;
    expect_status(response, StatusCode::OK).await;

    let app = common::build_test_app(pool);
    let response = auth_post_json(
        app,
        &format!("/api/v1/placement-requests/{request_id}/responses"),
        &helper_token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_rejected_helper_may_resubmit(pool: PgPool) {
    let (owner_id, owner_token) = seed_member(&pool, "owner").await;
    let (helper_id, helper_token) = seed_member(&pool, "helper").await;
    seed_helper_profile(&pool, helper_id).await;
    let pet_id = seed_pet(&pool, owner_id, "Rex").await;

    let app = common::build_test_app(pool.clone());
    let response = auth_post_json(
        app,
        &format!("/api/v1/pets/{pet_id}/placement-requests"),
        &owner_token,
        serde_json::json!({ "request_type": "foster_free" }),
    )
    .await;
    let created = expect_status(response, StatusCode::CREATED).await;
    let request_id = created["data"]["id"].as_i64().unwrap();

    let app = common::build_test_app(pool.clone());
    let response = auth_post_json(
        app,
        &format!("/api/v1/placement-requests/{request_id}/responses"),
        &helper_token,
        serde_json::json!({}),
    )
    .await;
    let submitted = expect_status(response, StatusCode::CREATED).await;
    let response_id = submitted["data"]["id"].as_i64().unwrap();

    // An owner rejection settles the response and frees the helper.
    let app = common::build_test_app(pool.clone());
    let response = auth_post(
        app,
        &format!("/api/v1/placement-responses/{response_id}/reject"),
        &owner_token,
    )
    .await;
    expect_status(response, StatusCode::OK).await;

    let app = common::build_test_app(pool);
    let response = auth_post_json(
        app,
        &format!("/api/v1/placement-requests/{request_id}/responses"),
        &helper_token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_one_live_request_per_pet(pool: PgPool) {
    let (owner_id, owner_token) = seed_member(&pool, "owner").await;
    let pet_id = seed_pet(&pool, owner_id, "Rex").await;

    let app = common::build_test_app(pool.clone());
    let response = auth_post_json(
        app,
        &format!("/api/v1/pets/{pet_id}/placement-requests"),
        &owner_token,
        serde_json::json!({ "request_type": "foster_free" }),
    )
    .await;
    expect_status(response, StatusCode::CREATED).await;

    let app = common::build_test_app(pool);
    let response = auth_post_json(
        app,
        &format!("/api/v1/pets/{pet_id}/placement-requests"),
        &owner_token,
        serde_json::json!({ "request_type": "pet_sitting" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_finalize_permanent_placement_conflicts(pool: PgPool) {
    let (owner_id, owner_token) = seed_member(&pool, "owner").await;
    let (helper_id, helper_token) = seed_member(&pool, "adopter").await;
    seed_helper_profile(&pool, helper_id).await;
    let pet_id = seed_pet(&pool, owner_id, "Mia").await;

    let (request_id, accepted) =
        accept_response(&pool, pet_id, &owner_token, &helper_token, "permanent").await;
    let transfer_id = accepted["transfer_request"]["id"].as_i64().unwrap();
    let handover_id = accepted["handover"]["id"].as_i64().unwrap();

    confirm_handover(&pool, transfer_id, handover_id, &owner_token, &helper_token).await;

    let app = common::build_test_app(pool.clone());
    let response = auth_post(
        app,
        &format!("/api/v1/transfer-handovers/{handover_id}/complete"),
        &helper_token,
    )
    .await;
    expect_status(response, StatusCode::OK).await;

    // Permanent rehoming is irreversible; finalize is for temporary types.
    let app = common::build_test_app(pool);
    let response = auth_post(
        app,
        &format!("/api/v1/placement-requests/{request_id}/finalize"),
        &helper_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
