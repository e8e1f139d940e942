use axum::{
    Json,
    extract::{FromRequest, Request, State, rejection::JsonRejection},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use thiserror::Error;
use tracing::error;

use podium_types::api::ErrorEnvelope;

use crate::state::AppState;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    /// Duplicate email or username.
    #[error("{0}")]
    Conflict(String),

    /// No active session.
    #[error("Unauthorized")]
    Unauthorized,

    /// Delete/update target absent.
    #[error("{0}")]
    NotFound(String),

    /// Unexpected database or runtime failure.
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            // The original API reported conflicts as plain 400s, and the
            // admin dashboard depends on that; do not upgrade to 409.
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn internal<E: Into<anyhow::Error>>(e: E) -> Self {
        ApiError::Internal(e.into())
    }
}

/// Carried through response extensions so [`error_envelope`] can rebuild the
/// body with the request path attached.
#[derive(Debug, Clone)]
pub struct ErrorDetail {
    pub message: String,
    pub detail: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = match &self {
            ApiError::Internal(e) => {
                error!("internal error: {e:#}");
                Some(format!("{e:#}"))
            }
            _ => None,
        };

        let mut res = self.status().into_response();
        res.extensions_mut().insert(ErrorDetail {
            message: self.to_string(),
            detail,
        });
        res
    }
}

/// Json extractor whose rejection speaks the envelope dialect instead of
/// leaking parser internals as plain text.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|_| ApiError::Validation("Invalid request body".into()))?;
        Ok(ApiJson(value))
    }
}

/// Outermost layer: converts any error response produced by a handler into
/// the JSON envelope `{message, timestamp, path}`. Internal detail is only
/// included outside production.
pub async fn error_envelope(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let mut res = next.run(req).await;

    let status = res.status();
    let Some(detail) = res.extensions_mut().remove::<ErrorDetail>() else {
        // Errors raised below the handlers (extractor rejections, the rate
        // limiter, unmatched routes) carry no ErrorDetail; give them the
        // envelope too, with the status's canonical reason as the message.
        if status.is_client_error() || status.is_server_error() {
            let envelope = ErrorEnvelope {
                message: status.canonical_reason().unwrap_or("Error").to_string(),
                timestamp: Utc::now(),
                path,
                detail: None,
            };
            return (status, Json(envelope)).into_response();
        }
        return res;
    };

    let envelope = ErrorEnvelope {
        message: detail.message,
        timestamp: Utc::now(),
        path,
        detail: if state.production { None } else { detail.detail },
    };

    (status, Json(envelope)).into_response()
}
