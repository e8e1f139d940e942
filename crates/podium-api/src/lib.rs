pub mod auth;
pub mod contacts;
pub mod content;
pub mod error;
pub mod password;
pub mod rate_limit;
pub mod registrations;
pub mod routes;
pub mod sanitize;
pub mod session;
pub mod state;
