use std::collections::HashMap;

use axum::{
    Extension, Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use friendbook_db::Database;
use friendbook_types::forms::ContentForm;
use friendbook_types::models::{Comment, FeedEntry, Post};
use friendbook_types::session::CurrentUser;

use crate::convert::{comment_from_row, post_from_row, timestamp};
use crate::error::{AppError, Field};
use crate::flash::{self, Notice};
use crate::{AppState, pages, run_blocking};

fn non_empty(content: &str, field: Field) -> Result<&str, AppError> {
    if content.trim().is_empty() {
        return Err(AppError::EmptyField(field));
    }
    Ok(content)
}

pub fn create_post(db: &Database, author_id: Uuid, content: &str) -> Result<Uuid, AppError> {
    let content = non_empty(content, Field::Post)?;
    let post_id = Uuid::new_v4();
    db.insert_post(&post_id.to_string(), &author_id.to_string(), content, &timestamp(Utc::now()))?;
    Ok(post_id)
}

/// All posts, newest first.
pub fn list_posts(db: &Database) -> Result<Vec<Post>, AppError> {
    Ok(db.list_posts()?.into_iter().map(post_from_row).collect())
}

/// Comments are accepted for any `post_id`, including posts that do not exist.
pub fn create_comment(db: &Database, post_id: Uuid, author_id: Uuid, content: &str) -> Result<Uuid, AppError> {
    let content = non_empty(content, Field::Comment)?;
    let comment_id = Uuid::new_v4();
    db.insert_comment(
        &comment_id.to_string(),
        &post_id.to_string(),
        &author_id.to_string(),
        content,
        &timestamp(Utc::now()),
    )?;
    Ok(comment_id)
}

/// Replace a comment's text. Does nothing, without error, when the comment is
/// missing, belongs to someone else, or `new_content` is empty.
pub fn edit_comment(db: &Database, comment_id: Uuid, author_id: Uuid, new_content: &str) -> Result<(), AppError> {
    if new_content.trim().is_empty() {
        debug!("Ignoring empty edit of comment {}", comment_id);
        return Ok(());
    }
    if !db.update_comment_content(&comment_id.to_string(), &author_id.to_string(), new_content)? {
        debug!("Edit of comment {} by {} had no effect", comment_id, author_id);
    }
    Ok(())
}

/// Remove a comment. Same silent guard as [`edit_comment`].
pub fn delete_comment(db: &Database, comment_id: Uuid, author_id: Uuid) -> Result<(), AppError> {
    if !db.delete_comment(&comment_id.to_string(), &author_id.to_string())? {
        debug!("Delete of comment {} by {} had no effect", comment_id, author_id);
    }
    Ok(())
}

/// Comments on one post, oldest first.
pub fn list_comments_for_post(db: &Database, post_id: Uuid) -> Result<Vec<Comment>, AppError> {
    Ok(db
        .list_comments_for_post(&post_id.to_string())?
        .into_iter()
        .map(comment_from_row)
        .collect())
}

/// Posts newest first, each with its comments. Two queries regardless of
/// how many posts there are.
pub fn feed(db: &Database) -> Result<Vec<FeedEntry>, AppError> {
    let post_rows = db.list_posts()?;
    let comment_rows = db.list_comments_on_posts()?;

    let mut comments_by_post: HashMap<String, Vec<Comment>> = HashMap::new();
    for row in comment_rows {
        comments_by_post
            .entry(row.post_id.clone())
            .or_default()
            .push(comment_from_row(row));
    }

    Ok(post_rows
        .into_iter()
        .map(|row| {
            let comments = comments_by_post.remove(&row.id).unwrap_or_default();
            FeedEntry {
                post: post_from_row(row),
                comments,
            }
        })
        .collect())
}

// -- Handlers --

pub async fn index(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let entries = run_blocking(&state, |s| feed(&s.db)).await?;
    let (jar, notice) = flash::take(jar);
    Ok((jar, Html(pages::index(&user, &entries, notice))))
}

pub async fn submit_post(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
    Form(form): Form<ContentForm>,
) -> Result<Response, AppError> {
    let result = run_blocking(&state, move |s| create_post(&s.db, user.user_id, &form.content)).await;
    back_to_feed(jar, state.cookie_secure, result)
}

pub async fn submit_comment(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
    Form(form): Form<ContentForm>,
) -> Result<Response, AppError> {
    let result = run_blocking(&state, move |s| {
        create_comment(&s.db, post_id, user.user_id, &form.content)
    })
    .await;
    back_to_feed(jar, state.cookie_secure, result)
}

pub async fn submit_comment_edit(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
    Form(form): Form<ContentForm>,
) -> Result<Redirect, AppError> {
    run_blocking(&state, move |s| {
        edit_comment(&s.db, comment_id, user.user_id, &form.content)
    })
    .await?;
    Ok(Redirect::to("/"))
}

pub async fn submit_comment_delete(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Redirect, AppError> {
    run_blocking(&state, move |s| delete_comment(&s.db, comment_id, user.user_id)).await?;
    Ok(Redirect::to("/"))
}

fn back_to_feed<T>(jar: CookieJar, secure: bool, result: Result<T, AppError>) -> Result<Response, AppError> {
    match result {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(e) => match Notice::for_error(&e) {
            Some(notice) => Ok((flash::set(jar, notice, secure), Redirect::to("/")).into_response()),
            None => Err(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::register_user;

    fn setup() -> (Database, Uuid, Uuid) {
        let db = Database::open_in_memory().unwrap();
        let alice = register_user(&db, "alice", "pw1").unwrap();
        let bob = register_user(&db, "bob", "pw2").unwrap();
        (db, alice, bob)
    }

    #[test]
    fn new_posts_come_first() {
        let (db, alice, bob) = setup();
        let first = create_post(&db, alice, "first").unwrap();
        let second = create_post(&db, bob, "second").unwrap();

        let posts = list_posts(&db).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, second);
        assert_eq!(posts[0].author_username, "bob");
        assert_eq!(posts[1].id, first);
        assert!(posts[0].created_at >= posts[1].created_at);
    }

    #[test]
    fn blank_content_is_rejected() {
        let (db, alice, _) = setup();
        assert!(matches!(create_post(&db, alice, "   "), Err(AppError::EmptyField(Field::Post))));
        assert!(matches!(
            create_comment(&db, Uuid::new_v4(), alice, ""),
            Err(AppError::EmptyField(Field::Comment))
        ));
        assert!(list_posts(&db).unwrap().is_empty());
    }

    #[test]
    fn non_author_edit_is_a_silent_no_op() {
        let (db, alice, bob) = setup();
        let post = create_post(&db, alice, "hello").unwrap();
        let comment = create_comment(&db, post, bob, "hi").unwrap();

        edit_comment(&db, comment, alice, "hijacked").unwrap();
        assert_eq!(list_comments_for_post(&db, post).unwrap()[0].content, "hi");

        edit_comment(&db, Uuid::new_v4(), alice, "nothing there").unwrap();
    }

    #[test]
    fn empty_edit_keeps_content() {
        let (db, alice, _) = setup();
        let post = create_post(&db, alice, "hello").unwrap();
        let comment = create_comment(&db, post, alice, "mine").unwrap();

        edit_comment(&db, comment, alice, "  ").unwrap();
        assert_eq!(list_comments_for_post(&db, post).unwrap()[0].content, "mine");
    }

    #[test]
    fn only_the_author_can_delete() {
        let (db, alice, bob) = setup();
        let post = create_post(&db, alice, "hello").unwrap();
        let comment = create_comment(&db, post, bob, "hi").unwrap();

        delete_comment(&db, comment, alice).unwrap();
        assert_eq!(list_comments_for_post(&db, post).unwrap().len(), 1);

        delete_comment(&db, comment, bob).unwrap();
        assert!(list_comments_for_post(&db, post).unwrap().is_empty());
        assert!(feed(&db).unwrap()[0].comments.is_empty());
    }

    #[test]
    fn comments_on_missing_posts_are_stored() {
        let (db, alice, _) = setup();
        let ghost = Uuid::new_v4();
        create_comment(&db, ghost, alice, "anyone here?").unwrap();

        assert_eq!(list_comments_for_post(&db, ghost).unwrap().len(), 1);
        // Orphans have no post to hang off, so the feed does not show them.
        assert!(feed(&db).unwrap().is_empty());
    }

    #[test]
    fn feed_groups_comments_under_their_post() {
        let (db, alice, bob) = setup();
        let older = create_post(&db, alice, "older").unwrap();
        let newer = create_post(&db, bob, "newer").unwrap();
        create_comment(&db, older, bob, "one").unwrap();
        create_comment(&db, newer, alice, "two").unwrap();
        create_comment(&db, older, alice, "three").unwrap();

        let entries = feed(&db).unwrap();
        assert_eq!(entries[0].post.id, newer);
        let contents: Vec<&str> = entries[1].comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, ["one", "three"]);
        assert_eq!(entries[0].comments[0].author_username, "alice");
    }

    #[test]
    fn feed_handles_more_posts_than_sqlite_bind_slots() {
        let (db, alice, bob) = setup();
        db.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO posts (id, author_id, content, created_at) VALUES (?1, ?2, 'bulk', ?3)",
                )?;
                for i in 0..33_000u32 {
                    stmt.execute((
                        Uuid::new_v4().to_string(),
                        alice.to_string(),
                        format!("2026-01-01T00:00:00.{i:06}Z"),
                    ))?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .unwrap();
        let latest = create_post(&db, bob, "latest").unwrap();
        create_comment(&db, latest, alice, "still works").unwrap();

        let entries = feed(&db).unwrap();
        assert_eq!(entries.len(), 33_001);
        assert_eq!(entries[0].post.id, latest);
        assert_eq!(entries[0].comments[0].content, "still works");
    }

    #[test]
    fn alice_and_bob_scenario() {
        let db = Database::open_in_memory().unwrap();
        let alice = register_user(&db, "alice", "pw1").unwrap();
        let post = create_post(&db, alice, "hello").unwrap();

        let bob = register_user(&db, "bob", "pw2").unwrap();
        let comment = create_comment(&db, post, bob, "hi").unwrap();

        edit_comment(&db, comment, alice, "alice was here").unwrap();
        edit_comment(&db, comment, bob, "hi there").unwrap();

        let entries = feed(&db).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].post.content, "hello");
        assert_eq!(entries[0].comments.len(), 1);
        assert_eq!(entries[0].comments[0].content, "hi there");
        assert_eq!(entries[0].comments[0].author_id, bob);
    }
}
