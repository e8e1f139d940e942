use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};

use crate::rate_limit::{RateLimiter, rate_limit_middleware};
use crate::state::AppState;
use crate::{auth, contacts, content, error, registrations, session};

/// Assembles the full API router. CORS, tracing, and security headers are
/// layered on by the server binary.
pub fn router(state: AppState, limiter: RateLimiter) -> Router {
    let public = Router::new()
        .route("/api/speakers", get(content::list_speakers))
        .route("/api/program/sessions", get(content::list_sessions))
        .route("/api/program/items", get(content::list_program_items))
        .route("/api/register", post(registrations::submit))
        .route("/api/contact", post(contacts::submit))
        .route("/api/signup", post(auth::signup))
        .route("/api/login", post(auth::login))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/api/logout", post(auth::logout))
        .route("/api/user", get(auth::current_user))
        .route("/api/admin/registrations", get(registrations::admin_list))
        .route(
            "/api/admin/registrations/{id}",
            delete(registrations::admin_delete),
        )
        .route("/api/admin/contacts", get(contacts::admin_list))
        .route("/api/admin/contacts/{id}", delete(contacts::admin_delete))
        .route(
            "/api/admin/contacts/{id}/read",
            patch(contacts::admin_mark_read),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_session,
        ))
        .with_state(state.clone());

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(middleware::from_fn_with_state(
            limiter,
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn_with_state(state, error::error_envelope))
}
