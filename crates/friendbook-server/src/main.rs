mod config;

use std::sync::Arc;

use tracing::{info, warn};

use friendbook_api::{AppState, AppStateInner, routes};
use friendbook_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "friendbook=debug,friendbook_api=debug,friendbook_db=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.uses_placeholder_secret() {
        warn!("FRIENDBOOK_JWT_SECRET is unset or a placeholder; sessions can be forged. Set it before deploying.");
    }

    // Init database
    let db = Database::open(&config.db_path)?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret,
        session_ttl: chrono::Duration::days(config.session_days),
        cookie_secure: config.cookie_secure,
    });

    let app = routes::router(state);

    info!("FriendBook listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
