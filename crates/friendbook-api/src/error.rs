use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::error;

/// A form field that must carry some text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Password,
    Post,
    Comment,
    Message,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Username => "username",
            Self::Password => "password",
            Self::Post => "post",
            Self::Comment => "comment",
            Self::Message => "message",
        })
    }
}

/// Failures of the auth, feed and chat operations.
///
/// Handlers turn the recoverable variants into flash notices themselves; the
/// `IntoResponse` impl covers whatever reaches the framework unhandled.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("username already exists")]
    DuplicateUsername,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("authentication required")]
    Unauthenticated,

    #[error("{0} must not be empty")]
    EmptyField(Field),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthenticated => Redirect::to("/login").into_response(),
            Self::Store(e) => {
                error!("store error: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            other => (StatusCode::BAD_REQUEST, other.to_string()).into_response(),
        }
    }
}
