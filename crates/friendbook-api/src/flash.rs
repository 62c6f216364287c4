//! One-shot notices shown on the next rendered page.
//!
//! The cookie carries a short code rather than the text, so it never needs
//! escaping and cannot be used to inject arbitrary markup.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::error::{AppError, Field};

pub const FLASH_COOKIE: &str = "friendbook_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Registered,
    UsernameTaken,
    InvalidCredentials,
    EmptyUsername,
    EmptyPassword,
    EmptyPost,
    EmptyComment,
    EmptyMessage,
}

impl Notice {
    pub fn message(self) -> &'static str {
        match self {
            Self::Registered => "Registration successful. Please login.",
            Self::UsernameTaken => "Username already exists",
            Self::InvalidCredentials => "Invalid credentials",
            Self::EmptyUsername => "Username must not be empty",
            Self::EmptyPassword => "Password must not be empty",
            Self::EmptyPost => "Post must not be empty",
            Self::EmptyComment => "Comment must not be empty",
            Self::EmptyMessage => "Message must not be empty",
        }
    }

    fn code(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::UsernameTaken => "username-taken",
            Self::InvalidCredentials => "invalid-credentials",
            Self::EmptyUsername => "empty-username",
            Self::EmptyPassword => "empty-password",
            Self::EmptyPost => "empty-post",
            Self::EmptyComment => "empty-comment",
            Self::EmptyMessage => "empty-message",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        [
            Self::Registered,
            Self::UsernameTaken,
            Self::InvalidCredentials,
            Self::EmptyUsername,
            Self::EmptyPassword,
            Self::EmptyPost,
            Self::EmptyComment,
            Self::EmptyMessage,
        ]
        .into_iter()
        .find(|n| n.code() == code)
    }

    /// The notice a recoverable error turns into, if any.
    pub fn for_error(err: &AppError) -> Option<Self> {
        match err {
            AppError::DuplicateUsername => Some(Self::UsernameTaken),
            AppError::InvalidCredentials => Some(Self::InvalidCredentials),
            AppError::EmptyField(Field::Username) => Some(Self::EmptyUsername),
            AppError::EmptyField(Field::Password) => Some(Self::EmptyPassword),
            AppError::EmptyField(Field::Post) => Some(Self::EmptyPost),
            AppError::EmptyField(Field::Comment) => Some(Self::EmptyComment),
            AppError::EmptyField(Field::Message) => Some(Self::EmptyMessage),
            _ => None,
        }
    }
}

pub fn set(jar: CookieJar, notice: Notice, secure: bool) -> CookieJar {
    jar.add(
        Cookie::build((FLASH_COOKIE, notice.code()))
            .path("/")
            .http_only(true)
            .secure(secure)
            .same_site(SameSite::Lax),
    )
}

/// Read the pending notice and clear it.
pub fn take(jar: CookieJar) -> (CookieJar, Option<Notice>) {
    let Some(notice) = jar.get(FLASH_COOKIE).map(|c| Notice::from_code(c.value())) else {
        return (jar, None);
    };
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), notice)
}
