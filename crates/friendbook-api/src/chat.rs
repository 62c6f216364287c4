use axum::{
    Extension, Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use uuid::Uuid;

use friendbook_db::Database;
use friendbook_types::forms::ContentForm;
use friendbook_types::models::ChatMessage;
use friendbook_types::session::CurrentUser;

use crate::convert::{chat_message_from_row, timestamp};
use crate::error::{AppError, Field};
use crate::flash::{self, Notice};
use crate::{AppState, pages, run_blocking};

/// Append a message to the room. There is no way to edit or remove it later.
pub fn send_message(db: &Database, author_id: Uuid, content: &str) -> Result<Uuid, AppError> {
    if content.trim().is_empty() {
        return Err(AppError::EmptyField(Field::Message));
    }

    let message_id = Uuid::new_v4();
    db.insert_chat_message(&message_id.to_string(), &author_id.to_string(), content, &timestamp(Utc::now()))?;
    Ok(message_id)
}

/// The whole room history, newest first.
pub fn list_messages(db: &Database) -> Result<Vec<ChatMessage>, AppError> {
    Ok(db.list_chat_messages()?.into_iter().map(chat_message_from_row).collect())
}

// -- Handlers --

pub async fn chat_page(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let messages = run_blocking(&state, |s| list_messages(&s.db)).await?;
    let (jar, notice) = flash::take(jar);
    Ok((jar, Html(pages::chat(&user, &messages, notice))))
}

pub async fn submit_message(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
    Form(form): Form<ContentForm>,
) -> Result<Response, AppError> {
    let result = run_blocking(&state, move |s| send_message(&s.db, user.user_id, &form.content)).await;

    match result {
        Ok(_) => Ok(Redirect::to("/chat").into_response()),
        Err(AppError::EmptyField(_)) => {
            Ok((flash::set(jar, Notice::EmptyMessage, state.cookie_secure), Redirect::to("/chat")).into_response())
        }
        Err(e) => Err(e),
    }
}
