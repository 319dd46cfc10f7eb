use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use guildhall_api::auth::{self, AppState, AppStateInner};
use guildhall_api::middleware::require_auth;
use guildhall_api::{clubs, points, submissions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "guildhall=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("GUILDHALL_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("GUILDHALL_DB_PATH").unwrap_or_else(|_| "guildhall.db".into());
    let host = std::env::var("GUILDHALL_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("GUILDHALL_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let daily_bonus: i64 = std::env::var("GUILDHALL_DAILY_BONUS")
        .unwrap_or_else(|_| "10".into())
        .parse()?;

    // Init database
    let db = guildhall_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let app_state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        daily_bonus,
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route("/auth/role", get(auth::role))
        .route("/points/me", get(points::me))
        .route("/points/claim", post(points::claim_daily))
        .route("/submissions/submit", post(submissions::submit))
        .route("/submissions/by-quest", get(submissions::by_quest))
        .route("/submissions/review", post(submissions::review))
        .route("/admin/submissions/list", post(submissions::list))
        .route("/superadmin/clubs", post(clubs::upsert))
        .layer(middleware::from_fn(require_auth))
        .with_state(app_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Guildhall server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
