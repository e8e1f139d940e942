use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use podium_api::content::EventContent;
use podium_api::rate_limit::RateLimiter;
use podium_api::routes;
use podium_api::state::{AppState, AppStateInner};
use podium_db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "podium=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let host = std::env::var("PODIUM_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("PODIUM_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let db_path = std::env::var("PODIUM_DB_PATH").unwrap_or_else(|_| "podium.db".into());
    let content_dir = std::env::var("PODIUM_CONTENT_DIR").unwrap_or_else(|_| "content".into());
    let production = std::env::var("PODIUM_ENV").as_deref() == Ok("production");
    let allowed_origin = std::env::var("PODIUM_ALLOWED_ORIGIN")
        .unwrap_or_else(|_| "http://localhost:5173".into());
    let session_secret = std::env::var("PODIUM_SESSION_SECRET").unwrap_or_else(|_| {
        warn!("PODIUM_SESSION_SECRET not set, using a development secret");
        "dev-secret-change-me".into()
    });

    // Init database and static content
    let db = Database::open(Path::new(&db_path))?;
    let content = EventContent::load(Path::new(&content_dir))?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        content,
        session_secret,
        production,
    });

    seed_admin(&state)?;

    // Periodic sweep of stale rate-limit windows and expired session rows.
    // The first tick fires immediately, so boot also cleans up.
    let limiter = RateLimiter::default();
    {
        let limiter = limiter.clone();
        let state = state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            loop {
                interval.tick().await;
                limiter.purge_stale().await;
                match state.db.purge_expired_sessions() {
                    Ok(0) => {}
                    Ok(n) => info!("Purged {} expired sessions", n),
                    Err(e) => warn!("Session purge failed: {e}"),
                }
            }
        });
    }

    let cors = CorsLayer::new()
        .allow_origin(allowed_origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::PATCH])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let app = routes::router(state, limiter)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ));

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Podium server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Creates the admin account from PODIUM_ADMIN_USERNAME / PODIUM_ADMIN_PASSWORD
/// when configured and not already present.
fn seed_admin(state: &AppState) -> anyhow::Result<()> {
    let (Ok(username), Ok(password)) = (
        std::env::var("PODIUM_ADMIN_USERNAME"),
        std::env::var("PODIUM_ADMIN_PASSWORD"),
    ) else {
        return Ok(());
    };

    if state.db.get_user_by_username(&username)?.is_some() {
        return Ok(());
    }

    let hash = podium_api::password::hash_password(&password)?;
    state.db.create_user(&username, &hash)?;
    info!(username = %username, "Seeded admin user");
    Ok(())
}
