//! Server-side sessions carried by an HMAC-signed cookie.
//!
//! The cookie value is `<session id>.<hex hmac-sha256(secret, id)>`; the id
//! keys a row in the sessions table. A valid signature over an expired or
//! deleted session, or over a session whose user was removed, degrades to the
//! unauthenticated state rather than an error.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "podium.sid";
pub const SESSION_TTL_DAYS: u32 = 7;

type HmacSha256 = Hmac<Sha256>;

/// Authenticated user attached to request extensions by [`require_session`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

pub fn new_session_id() -> String {
    let mut raw = [0u8; 32];
    rand::rng().fill_bytes(&mut raw);
    hex::encode(raw)
}

fn mac(secret: &str, session_id: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(session_id.as_bytes());
    mac
}

pub fn cookie_value(secret: &str, session_id: &str) -> String {
    let sig = mac(secret, session_id).finalize().into_bytes();
    format!("{session_id}.{}", hex::encode(sig))
}

/// Returns the session id when the signature checks out. Verification is
/// constant-time via [`Mac::verify_slice`].
pub fn verify_cookie(secret: &str, value: &str) -> Option<String> {
    let (session_id, sig_hex) = value.split_once('.')?;
    let sig = hex::decode(sig_hex).ok()?;
    mac(secret, session_id).verify_slice(&sig).ok()?;
    Some(session_id.to_string())
}

pub fn session_cookie(secret: &str, session_id: &str, production: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, cookie_value(secret, session_id)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(production)
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Creates a session row for the user and returns the cookie to set.
pub fn establish(state: &AppState, user_id: i64) -> Result<Cookie<'static>, ApiError> {
    let session_id = new_session_id();
    state
        .db
        .create_session(&session_id, user_id, SESSION_TTL_DAYS)
        .map_err(ApiError::internal)?;
    Ok(session_cookie(
        &state.session_secret,
        &session_id,
        state.production,
    ))
}

/// Resolves the request's session cookie to a user, or fails with 401.
pub fn authenticate(state: &AppState, jar: &CookieJar) -> Result<CurrentUser, ApiError> {
    let cookie = jar.get(SESSION_COOKIE).ok_or(ApiError::Unauthorized)?;
    let session_id =
        verify_cookie(&state.session_secret, cookie.value()).ok_or(ApiError::Unauthorized)?;

    let session = state
        .db
        .get_session(&session_id)
        .map_err(ApiError::internal)?
        .ok_or(ApiError::Unauthorized)?;

    // User deleted since the session was issued: unauthenticated, not a 500.
    let user = state
        .db
        .get_user_by_id(session.user_id)
        .map_err(ApiError::internal)?
        .ok_or(ApiError::Unauthorized)?;

    Ok(CurrentUser {
        id: user.id,
        username: user.username,
    })
}

/// Middleware guarding /api/admin/* and the session endpoints. Rejects with
/// 401 before any handler logic runs.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let jar = CookieJar::from_headers(req.headers());
    let user = authenticate(&state, &jar)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_roundtrip() {
        let id = new_session_id();
        let value = cookie_value("secret", &id);
        assert_eq!(verify_cookie("secret", &value).as_deref(), Some(id.as_str()));
    }

    #[test]
    fn tampered_cookie_is_rejected() {
        let id = new_session_id();
        let value = cookie_value("secret", &id);

        let mut forged = value.clone();
        forged.replace_range(..1, if value.starts_with('0') { "1" } else { "0" });
        assert!(verify_cookie("secret", &forged).is_none());

        assert!(verify_cookie("other-secret", &value).is_none());
        assert!(verify_cookie("secret", "no-signature").is_none());
        assert!(verify_cookie("secret", &format!("{id}.deadbeef")).is_none());
    }

    #[test]
    fn session_ids_are_unique_and_hex() {
        let a = new_session_id();
        let b = new_session_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.bytes().all(|b| b.is_ascii_hexdigit()));
    }
}
