//! Placement request and response entity models and DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use rehome_core::types::{DbId, Timestamp};

/// A row from the `placement_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PlacementRequest {
    pub id: DbId,
    pub pet_id: DbId,
    pub requester_id: DbId,
    /// One of the `rehome_core::placement` type strings.
    pub request_type: String,
    /// One of the `rehome_core::placement` status strings.
    pub status: String,
    pub starts_on: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a placement request.
#[derive(Debug, Deserialize)]
pub struct CreatePlacementRequest {
    pub request_type: String,
    pub starts_on: Option<NaiveDate>,
}

/// A row from the `placement_request_responses` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PlacementResponse {
    pub id: DbId,
    pub request_id: DbId,
    pub helper_profile_id: DbId,
    /// One of the `rehome_core::response` status strings.
    pub status: String,
    pub message: Option<String>,
    pub responded_at: Timestamp,
    pub accepted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for submitting a response to an open placement request.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub message: Option<String>,
}
