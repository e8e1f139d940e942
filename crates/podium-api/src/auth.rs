use axum::{
    Extension, Json, extract::State, http::StatusCode, response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use podium_db::StoreError;
use podium_types::api::{LoginRequest, SignupRequest, UserResponse};

use crate::error::{ApiError, ApiJson};
use crate::password;
use crate::session::{self, CurrentUser, SESSION_COOKIE};
use crate::state::AppState;

pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim().to_string();
    if username.is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation(
            "Username and password are required".into(),
        ));
    }

    // Scrypt is deliberately slow; keep it off the async runtime.
    let password = req.password;
    let password_hash =
        tokio::task::spawn_blocking(move || password::hash_password(&password))
            .await
            .map_err(ApiError::internal)??;

    let user = state
        .db
        .create_user(&username, &password_hash)
        .map_err(|e| match e {
            StoreError::Conflict => ApiError::Conflict("Username already taken".into()),
            other => ApiError::internal(other),
        })?;

    let cookie = session::establish(&state, user.id)?;

    Ok((
        StatusCode::CREATED,
        jar.add(cookie),
        Json(UserResponse {
            id: user.id,
            username: user.username,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // An unknown username and a bad password are indistinguishable to the
    // caller.
    let user = state
        .db
        .get_user_by_username(req.username.trim())
        .map_err(ApiError::internal)?
        .ok_or(ApiError::Unauthorized)?;

    let stored = user.password.clone();
    let password = req.password;
    let ok = tokio::task::spawn_blocking(move || password::verify_password(&stored, &password))
        .await
        .map_err(ApiError::internal)??;
    if !ok {
        return Err(ApiError::Unauthorized);
    }

    let cookie = session::establish(&state, user.id)?;

    Ok((
        jar.add(cookie),
        Json(UserResponse {
            id: user.id,
            username: user.username,
        }),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Some(session_id) = session::verify_cookie(&state.session_secret, cookie.value()) {
            state
                .db
                .delete_session(&session_id)
                .map_err(ApiError::internal)?;
        }
    }

    let jar = jar.remove(session::removal_cookie());
    Ok((jar, Json(serde_json::json!({ "message": "Logged out" }))))
}

pub async fn current_user(Extension(user): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(UserResponse {
        id: user.id,
        username: user.username,
    })
}
