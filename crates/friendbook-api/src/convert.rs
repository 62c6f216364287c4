use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use tracing::warn;
use uuid::Uuid;

use friendbook_db::models::{ChatMessageRow, CommentRow, PostRow};
use friendbook_types::models::{ChatMessage, Comment, Post};

/// Store format for timestamps. Fixed-width UTC with microseconds, so string
/// order in SQLite is chronological order.
pub(crate) fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn post_from_row(row: PostRow) -> Post {
    Post {
        id: parse_id(&row.id, "id", &row.id),
        author_id: parse_id(&row.author_id, "author_id", &row.id),
        created_at: parse_time(&row.created_at, &row.id),
        author_username: row.author_username,
        content: row.content,
    }
}

pub(crate) fn comment_from_row(row: CommentRow) -> Comment {
    Comment {
        id: parse_id(&row.id, "id", &row.id),
        post_id: parse_id(&row.post_id, "post_id", &row.id),
        author_id: parse_id(&row.author_id, "author_id", &row.id),
        created_at: parse_time(&row.created_at, &row.id),
        author_username: row.author_username,
        content: row.content,
    }
}

pub(crate) fn chat_message_from_row(row: ChatMessageRow) -> ChatMessage {
    ChatMessage {
        id: parse_id(&row.id, "id", &row.id),
        author_id: parse_id(&row.author_id, "author_id", &row.id),
        created_at: parse_time(&row.created_at, &row.id),
        author_username: row.author_username,
        content: row.content,
    }
}

fn parse_id(raw: &str, column: &str, row_id: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}' on row '{}': {}", column, raw, row_id, e);
        Uuid::default()
    })
}

fn parse_time(raw: &str, row_id: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by hand through the sqlite shell use datetime('now'),
            // which has no timezone. Treat those as naive UTC.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on row '{}': {}", raw, row_id, e);
            DateTime::default()
        })
}
