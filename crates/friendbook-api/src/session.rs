use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use friendbook_db::Database;
use friendbook_types::session::{Claims, CurrentUser};

use crate::convert::timestamp;
use crate::error::AppError;
use crate::{AppState, run_blocking};

pub const SESSION_COOKIE: &str = "friendbook_session";

/// Guard for every route that needs a logged-in user.
///
/// Verifies the signed cookie, then checks the session row it names is still
/// live. On success the request carries a [`CurrentUser`] extension.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_owned())
        .ok_or(AppError::Unauthenticated)?;

    let claims = decode_token(&state.jwt_secret, &token).map_err(|e| {
        debug!("Rejected session token: {}", e);
        AppError::Unauthenticated
    })?;

    let user = run_blocking(&state, move |s| Ok(resolve_session(&s.db, &claims, Utc::now())?))
        .await?
        .ok_or(AppError::Unauthenticated)?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Map verified claims to the user they belong to, if the session is live.
pub fn resolve_session(
    db: &Database,
    claims: &Claims,
    now: DateTime<Utc>,
) -> anyhow::Result<Option<CurrentUser>> {
    let Some(row) = db.get_session(&claims.sid.to_string(), &timestamp(now))? else {
        return Ok(None);
    };

    if row.user_id != claims.sub.to_string() {
        debug!("Session {} does not belong to {}", claims.sid, claims.sub);
        return Ok(None);
    }

    Ok(Some(CurrentUser {
        user_id: claims.sub,
        username: row.username,
        session_id: claims.sid,
    }))
}

pub fn create_token(secret: &str, user: &CurrentUser, expires_at: DateTime<Utc>) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.user_id,
        username: user.username.clone(),
        sid: user.session_id,
        exp: expires_at.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn decode_token(secret: &str, token: &str) -> jsonwebtoken::errors::Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

pub(crate) fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

pub(crate) fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}
