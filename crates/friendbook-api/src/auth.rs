use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use anyhow::anyhow;
use axum::{
    Extension, Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use friendbook_db::Database;
use friendbook_types::forms::{LoginForm, RegisterForm};
use friendbook_types::session::CurrentUser;

use crate::convert::timestamp;
use crate::error::{AppError, Field};
use crate::flash::{self, Notice};
use crate::session::{clear_session_cookie, create_token, session_cookie};
use crate::{AppState, pages, run_blocking};

/// Create an account. The password is stored as an Argon2id PHC string.
pub fn register_user(db: &Database, username: &str, password: &str) -> Result<Uuid, AppError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::EmptyField(Field::Username));
    }
    if password.is_empty() {
        return Err(AppError::EmptyField(Field::Password));
    }

    // Cheap pre-check so a taken name does not cost a hash. The insert
    // itself is what enforces uniqueness.
    if db.get_user_by_username(username)?.is_some() {
        return Err(AppError::DuplicateUsername);
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {}", e))?
        .to_string();

    let user_id = Uuid::new_v4();
    let created = db.create_user(&user_id.to_string(), username, &password_hash, &timestamp(Utc::now()))?;
    if !created {
        return Err(AppError::DuplicateUsername);
    }

    info!("Registered user {} ({})", username, user_id);
    Ok(user_id)
}

/// Check credentials and open a session. Nothing is written on failure.
pub fn login_user(
    db: &Database,
    username: &str,
    password: &str,
    now: DateTime<Utc>,
    ttl: chrono::Duration,
) -> Result<(CurrentUser, DateTime<Utc>), AppError> {
    let user = db
        .get_user_by_username(username)?
        .ok_or(AppError::InvalidCredentials)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| anyhow!("stored hash for {} is unreadable: {}", user.id, e))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::InvalidCredentials)?;

    let user_id: Uuid = user.id.parse().map_err(|e| anyhow!("corrupt user id '{}': {}", user.id, e))?;
    let session_id = Uuid::new_v4();
    let expires_at = now + ttl;

    db.create_session(
        &session_id.to_string(),
        &user.id,
        &timestamp(now),
        &timestamp(expires_at),
    )?;

    Ok((
        CurrentUser {
            user_id,
            username: user.username,
            session_id,
        },
        expires_at,
    ))
}

pub fn logout_user(db: &Database, user: &CurrentUser) -> Result<(), AppError> {
    if !db.delete_session(&user.session_id.to_string())? {
        warn!("Session {} was already gone at logout", user.session_id);
    }
    Ok(())
}

// -- Handlers --

pub async fn register_page(jar: CookieJar) -> impl IntoResponse {
    let (jar, notice) = flash::take(jar);
    (jar, Html(pages::register(notice)))
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let result = run_blocking(&state, move |s| register_user(&s.db, &form.username, &form.password)).await;

    match result {
        Ok(_) => Ok((flash::set(jar, Notice::Registered, state.cookie_secure), Redirect::to("/login")).into_response()),
        Err(e) => match Notice::for_error(&e) {
            Some(notice) => Ok((flash::set(jar, notice, state.cookie_secure), Redirect::to("/register")).into_response()),
            None => Err(e),
        },
    }
}

pub async fn login_page(jar: CookieJar) -> impl IntoResponse {
    let (jar, notice) = flash::take(jar);
    (jar, Html(pages::login(notice)))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let ttl = state.session_ttl;
    let result = run_blocking(&state, move |s| {
        login_user(&s.db, &form.username, &form.password, Utc::now(), ttl)
    })
    .await;

    let (user, expires_at) = match result {
        Ok(session) => session,
        Err(AppError::InvalidCredentials) => {
            return Ok((flash::set(jar, Notice::InvalidCredentials, state.cookie_secure), Redirect::to("/login")).into_response());
        }
        Err(e) => return Err(e),
    };

    let token = create_token(&state.jwt_secret, &user, expires_at)?;
    info!("{} logged in (session {})", user.username, user.session_id);

    let jar = jar.add(session_cookie(token, state.cookie_secure));
    Ok((jar, Redirect::to("/")).into_response())
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let username = user.username.clone();
    run_blocking(&state, move |s| logout_user(&s.db, &user)).await?;
    info!("{} logged out", username);

    Ok((clear_session_cookie(jar), Redirect::to("/login")))
}
