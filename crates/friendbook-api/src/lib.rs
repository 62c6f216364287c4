pub mod auth;
pub mod chat;
pub mod error;
pub mod feed;
pub mod flash;
pub mod pages;
pub mod routes;
pub mod session;

mod convert;

use std::sync::Arc;

use anyhow::anyhow;
use friendbook_db::Database;
use tracing::error;

use crate::error::AppError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    /// How long a login stays valid.
    pub session_ttl: chrono::Duration,
    /// Mark cookies `Secure` (only sent over HTTPS).
    pub cookie_secure: bool,
}

/// Run store work (SQLite, Argon2) off the async runtime.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, AppError>
where
    F: FnOnce(&AppStateInner) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            AppError::Store(anyhow!("blocking task failed: {}", e))
        })?
}

#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        jwt_secret: "test-secret".into(),
        session_ttl: chrono::Duration::days(1),
        cookie_secure: false,
    })
}
