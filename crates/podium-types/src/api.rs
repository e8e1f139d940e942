use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Speaker;

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
}

// -- Registration --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub terms: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub occupation: Option<String>,
    pub topics: Vec<String>,
    pub created_at: DateTime<Utc>,
}

// -- Contact --

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

// -- Program --

/// A program item denormalized with its speaker for the public program view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramItemResponse {
    pub id: u32,
    pub time: String,
    pub title: String,
    pub description: String,
    pub session: String,
    pub speaker: Option<Speaker>,
    pub order: u32,
}

// -- Errors --

/// JSON error envelope returned for every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub path: String,
    /// Internal error chain, present outside production only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
