use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use podium_db::StoreError;
use podium_db::models::{RegistrationRow, parse_timestamp};
use podium_types::api::{RegistrationRequest, RegistrationResponse};

use crate::error::{ApiError, ApiJson};
use crate::sanitize;
use crate::state::AppState;

const MSG_REQUIRED: &str = "All fields are required";
const MSG_EMAIL: &str = "A valid email is required";
const MSG_TERMS: &str = "You must accept the terms and conditions";
const MSG_DUPLICATE: &str = "This email is already registered";
const MSG_NOT_FOUND: &str = "Qeydiyyat tapılmadı";
const MSG_DELETED: &str = "Qeydiyyat silindi";

/// POST /api/register — public attendee registration.
pub async fn submit(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegistrationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let first_name = sanitize::clean(req.first_name.trim());
    let last_name = sanitize::clean(req.last_name.trim());
    let email = req.email.trim().to_lowercase();
    let phone = req.phone.trim().to_string();

    if first_name.is_empty() || last_name.is_empty() || email.is_empty() || phone.is_empty() {
        return Err(ApiError::Validation(MSG_REQUIRED.into()));
    }
    if !email.contains('@') {
        return Err(ApiError::Validation(MSG_EMAIL.into()));
    }
    if !req.terms {
        return Err(ApiError::Validation(MSG_TERMS.into()));
    }

    let occupation = req
        .occupation
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(sanitize::clean);

    let topics = req
        .topics
        .iter()
        .map(|t| sanitize::clean(t.trim()))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(",");

    // No prior existence check: the UNIQUE constraint on email is the
    // authoritative duplicate signal, closing the check-then-insert race.
    let row = state
        .db
        .create_registration(
            &first_name,
            &last_name,
            &email,
            &phone,
            occupation.as_deref(),
            &topics,
        )
        .map_err(|e| match e {
            StoreError::Conflict => ApiError::Conflict(MSG_DUPLICATE.into()),
            other => ApiError::internal(other),
        })?;

    Ok((StatusCode::CREATED, Json(to_response(row))))
}

/// GET /api/admin/registrations — newest first, no pagination (event-scale).
pub async fn admin_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<RegistrationResponse>>, ApiError> {
    let rows = state.db.list_registrations().map_err(ApiError::internal)?;
    Ok(Json(rows.into_iter().map(to_response).collect()))
}

/// DELETE /api/admin/registrations/{id}
pub async fn admin_delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.delete_registration(id).map_err(|e| match e {
        StoreError::NotFound => ApiError::NotFound(MSG_NOT_FOUND.into()),
        other => ApiError::internal(other),
    })?;
    Ok(Json(serde_json::json!({ "message": MSG_DELETED })))
}

fn to_response(row: RegistrationRow) -> RegistrationResponse {
    let topics = if row.topics.is_empty() {
        Vec::new()
    } else {
        row.topics.split(',').map(str::to_string).collect()
    };
    RegistrationResponse {
        id: row.id,
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        phone: row.phone,
        occupation: row.occupation,
        topics,
        created_at: parse_timestamp(&row.created_at),
    }
}
