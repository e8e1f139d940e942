use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use podium_db::StoreError;
use podium_db::models::{ContactRow, parse_timestamp};
use podium_types::api::{ContactRequest, ContactResponse};

use crate::error::{ApiError, ApiJson};
use crate::sanitize;
use crate::state::AppState;

const MSG_REQUIRED: &str = "All fields are required";
const MSG_NOT_FOUND: &str = "Mesaj tapılmadı";
const MSG_DELETED: &str = "Mesaj silindi";

/// POST /api/contact — public contact form. Rows always start unread.
pub async fn submit(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ContactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = sanitize::clean(req.name.trim());
    let email = req.email.trim().to_lowercase();
    let subject = sanitize::clean(req.subject.trim());
    let message = sanitize::clean(req.message.trim());

    if name.is_empty() || email.is_empty() || subject.is_empty() || message.is_empty() {
        return Err(ApiError::Validation(MSG_REQUIRED.into()));
    }

    let row = state
        .db
        .create_contact(&name, &email, &subject, &message)
        .map_err(ApiError::internal)?;

    Ok((StatusCode::CREATED, Json(to_response(row))))
}

/// GET /api/admin/contacts — newest first.
pub async fn admin_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<ContactResponse>>, ApiError> {
    let rows = state.db.list_contacts().map_err(ApiError::internal)?;
    Ok(Json(rows.into_iter().map(to_response).collect()))
}

/// PATCH /api/admin/contacts/{id}/read — one-way Unread -> Read, idempotent.
pub async fn admin_mark_read(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ContactResponse>, ApiError> {
    let row = state.db.mark_contact_read(id).map_err(|e| match e {
        StoreError::NotFound => ApiError::NotFound(MSG_NOT_FOUND.into()),
        other => ApiError::internal(other),
    })?;
    Ok(Json(to_response(row)))
}

/// DELETE /api/admin/contacts/{id}
pub async fn admin_delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.delete_contact(id).map_err(|e| match e {
        StoreError::NotFound => ApiError::NotFound(MSG_NOT_FOUND.into()),
        other => ApiError::internal(other),
    })?;
    Ok(Json(serde_json::json!({ "message": MSG_DELETED })))
}

fn to_response(row: ContactRow) -> ContactResponse {
    ContactResponse {
        id: row.id,
        name: row.name,
        email: row.email,
        subject: row.subject,
        message: row.message,
        is_read: row.is_read,
        created_at: parse_timestamp(&row.created_at),
    }
}
