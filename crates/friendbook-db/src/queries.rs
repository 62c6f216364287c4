use crate::models::{ChatMessageRow, CommentRow, PostRow, SessionRow, UserRow};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, Row};
use tracing::debug;

impl Database {
    // -- Users --

    /// Insert a user unless the username is taken.
    /// Returns `false` (and writes nothing) when the username already exists.
    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        password_hash: &str,
        created_at: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, username, password, created_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(username) DO NOTHING",
                (id, username, password_hash, created_at),
            )?;
            Ok(inserted == 1)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn count_users(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?;
            Ok(count as u64)
        })
    }

    // -- Sessions --

    /// Store a new session, pruning every session already expired at `created_at`
    /// in the same transaction. Returns the number of pruned rows.
    pub fn create_session(
        &self,
        id: &str,
        user_id: &str,
        created_at: &str,
        expires_at: &str,
    ) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let pruned = tx.execute("DELETE FROM sessions WHERE expires_at <= ?1", [created_at])?;
            tx.execute(
                "INSERT INTO sessions (id, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
                (id, user_id, created_at, expires_at),
            )?;
            tx.commit()?;
            if pruned > 0 {
                debug!("Pruned {} expired sessions", pruned);
            }
            Ok(pruned)
        })
    }

    /// Look up a live session. Expired sessions are treated as absent.
    pub fn get_session(&self, id: &str, now: &str) -> Result<Option<SessionRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT s.user_id, u.username
                 FROM sessions s
                 JOIN users u ON u.id = s.user_id
                 WHERE s.id = ?1 AND s.expires_at > ?2",
                [id, now],
                |row| {
                    Ok(SessionRow {
                        user_id: row.get(0)?,
                        username: row.get(1)?,
                    })
                },
            )
            .optional()
        })
    }

    pub fn delete_session(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM sessions WHERE id = ?1", [id])?;
            Ok(deleted == 1)
        })
    }

    // -- Posts --

    pub fn insert_post(&self, id: &str, author_id: &str, content: &str, created_at: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (id, author_id, content, created_at) VALUES (?1, ?2, ?3, ?4)",
                (id, author_id, content, created_at),
            )?;
            Ok(())
        })
    }

    /// Every post, newest first. Equal timestamps fall back to insertion order.
    pub fn list_posts(&self) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.author_id, u.username, p.content, p.created_at
                 FROM posts p
                 LEFT JOIN users u ON p.author_id = u.id
                 ORDER BY p.created_at DESC, p.rowid DESC",
            )?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(PostRow {
                        id: row.get(0)?,
                        author_id: row.get(1)?,
                        author_username: username_or_unknown(row, 2)?,
                        content: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Comments --

    pub fn insert_comment(
        &self,
        id: &str,
        post_id: &str,
        author_id: &str,
        content: &str,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (id, post_id, author_id, content, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, post_id, author_id, content, created_at),
            )?;
            Ok(())
        })
    }

    pub fn get_comment(&self, id: &str) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("{COMMENT_SELECT} WHERE c.id = ?1"),
                [id],
                comment_from_row,
            )
            .optional()
        })
    }

    /// Overwrite a comment's content if, and only if, `author_id` wrote it.
    /// Returns whether a row changed; `created_at` is never touched.
    pub fn update_comment_content(&self, id: &str, author_id: &str, content: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE comments SET content = ?3 WHERE id = ?1 AND author_id = ?2",
                (id, author_id, content),
            )?;
            Ok(updated == 1)
        })
    }

    /// Delete a comment if, and only if, `author_id` wrote it.
    pub fn delete_comment(&self, id: &str, author_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM comments WHERE id = ?1 AND author_id = ?2",
                (id, author_id),
            )?;
            Ok(deleted == 1)
        })
    }

    /// Comments on one post in insertion order.
    pub fn list_comments_for_post(&self, post_id: &str) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{COMMENT_SELECT} WHERE c.post_id = ?1 ORDER BY c.created_at ASC, c.rowid ASC"
            ))?;

            let rows = stmt
                .query_map([post_id], comment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Every comment that belongs to an existing post, oldest first.
    /// Orphaned comments are left out by the join.
    pub fn list_comments_on_posts(&self) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{COMMENT_SELECT}
                 JOIN posts p ON p.id = c.post_id
                 ORDER BY c.created_at ASC, c.rowid ASC"
            ))?;

            let rows = stmt
                .query_map([], comment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Chat --

    pub fn insert_chat_message(&self, id: &str, author_id: &str, content: &str, created_at: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chat_messages (id, author_id, content, created_at) VALUES (?1, ?2, ?3, ?4)",
                (id, author_id, content, created_at),
            )?;
            Ok(())
        })
    }

    /// Every chat message, newest first.
    pub fn list_chat_messages(&self) -> Result<Vec<ChatMessageRow>> {
        self.with_conn(|conn| {
            // JOIN users to fetch author_username in a single query (eliminates N+1)
            let mut stmt = conn.prepare(
                "SELECT m.id, m.author_id, u.username, m.content, m.created_at
                 FROM chat_messages m
                 LEFT JOIN users u ON m.author_id = u.id
                 ORDER BY m.created_at DESC, m.rowid DESC",
            )?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(ChatMessageRow {
                        id: row.get(0)?,
                        author_id: row.get(1)?,
                        author_username: username_or_unknown(row, 2)?,
                        content: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

const COMMENT_SELECT: &str = "SELECT c.id, c.post_id, c.author_id, u.username, c.content, c.created_at
     FROM comments c
     LEFT JOIN users u ON c.author_id = u.id";

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        post_id: row.get(1)?,
        author_id: row.get(2)?,
        author_username: username_or_unknown(row, 3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn username_or_unknown(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_else(|| "unknown".to_string()))
}

const USER_SELECT: &str = "SELECT id, username, password FROM users";

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("{USER_SELECT} WHERE username = ?1"))?;
    let row = stmt.query_row([username], user_from_row).optional()?;
    Ok(row)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "00000000-0000-0000-0000-00000000000a";
    const BOB: &str = "00000000-0000-0000-0000-00000000000b";

    fn db_with_users() -> Database {
        let db = Database::open_in_memory().unwrap();
        assert!(db.create_user(ALICE, "alice", "hash-a", "2026-01-01T00:00:00.000000Z").unwrap());
        assert!(db.create_user(BOB, "bob", "hash-b", "2026-01-01T00:00:00.000000Z").unwrap());
        db
    }

    #[test]
    fn duplicate_username_is_rejected_without_insert() {
        let db = db_with_users();
        let inserted = db
            .create_user("other-id", "alice", "hash-x", "2026-01-02T00:00:00.000000Z")
            .unwrap();
        assert!(!inserted);
        assert_eq!(db.count_users().unwrap(), 2);
        assert_eq!(db.get_user_by_username("alice").unwrap().unwrap().password, "hash-a");
    }

    #[test]
    fn posts_are_listed_newest_first() {
        let db = db_with_users();
        db.insert_post("p1", ALICE, "first", "2026-01-01T10:00:00.000000Z").unwrap();
        db.insert_post("p2", BOB, "second", "2026-01-01T11:00:00.000000Z").unwrap();
        // Same timestamp as p2: insertion order breaks the tie.
        db.insert_post("p3", ALICE, "third", "2026-01-01T11:00:00.000000Z").unwrap();

        let ids: Vec<String> = db.list_posts().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, ["p3", "p2", "p1"]);

        let posts = db.list_posts().unwrap();
        assert_eq!(posts[1].author_username, "bob");
    }

    #[test]
    fn comment_mutation_requires_author() {
        let db = db_with_users();
        db.insert_post("p1", ALICE, "hello", "2026-01-01T10:00:00.000000Z").unwrap();
        db.insert_comment("c1", "p1", BOB, "hi", "2026-01-01T10:05:00.000000Z").unwrap();

        assert!(!db.update_comment_content("c1", ALICE, "hijacked").unwrap());
        assert!(!db.delete_comment("c1", ALICE).unwrap());
        assert_eq!(db.get_comment("c1").unwrap().unwrap().content, "hi");

        assert!(db.update_comment_content("c1", BOB, "hi there").unwrap());
        let comment = db.get_comment("c1").unwrap().unwrap();
        assert_eq!(comment.content, "hi there");
        assert_eq!(comment.created_at, "2026-01-01T10:05:00.000000Z");

        assert!(db.delete_comment("c1", BOB).unwrap());
        assert!(db.get_comment("c1").unwrap().is_none());
        assert!(db.list_comments_for_post("p1").unwrap().is_empty());
    }

    #[test]
    fn missing_comment_mutations_change_nothing() {
        let db = db_with_users();
        assert!(!db.update_comment_content("nope", ALICE, "x").unwrap());
        assert!(!db.delete_comment("nope", ALICE).unwrap());
    }

    #[test]
    fn comments_on_unknown_posts_are_kept() {
        let db = db_with_users();
        db.insert_comment("c1", "no-such-post", ALICE, "orphan", "2026-01-01T10:00:00.000000Z")
            .unwrap();

        let comments = db.list_comments_for_post("no-such-post").unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].content, "orphan");
    }

    #[test]
    fn feed_comments_skip_orphans() {
        let db = db_with_users();
        db.insert_post("p1", ALICE, "hello", "2026-01-01T09:00:00.000000Z").unwrap();
        db.insert_comment("c1", "p1", ALICE, "one", "2026-01-01T10:00:00.000000Z").unwrap();
        db.insert_comment("c2", "gone", BOB, "two", "2026-01-01T10:01:00.000000Z").unwrap();
        db.insert_comment("c3", "p1", BOB, "three", "2026-01-01T10:02:00.000000Z").unwrap();

        let rows = db.list_comments_on_posts().unwrap();
        let ids: Vec<&str> = rows.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["c1", "c3"]);
        assert_eq!(rows[1].author_username, "bob");
    }

    #[test]
    fn feed_comments_scale_past_sqlite_parameter_limit() {
        let db = db_with_users();
        db.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO posts (id, author_id, content, created_at) VALUES (?1, ?2, 'x', ?3)",
                )?;
                for i in 0..33_000 {
                    stmt.execute((format!("p{i}"), ALICE, format!("2026-01-01T00:00:00.{i:06}Z")))?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .unwrap();
        db.insert_comment("c1", "p32999", BOB, "last", "2026-01-02T00:00:00.000000Z").unwrap();

        assert_eq!(db.list_posts().unwrap().len(), 33_000);
        let rows = db.list_comments_on_posts().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].post_id, "p32999");
    }

    #[test]
    fn chat_messages_are_listed_newest_first() {
        let db = db_with_users();
        db.insert_chat_message("m1", ALICE, "hey", "2026-01-01T10:00:00.000000Z").unwrap();
        db.insert_chat_message("m2", BOB, "yo", "2026-01-01T10:00:01.000000Z").unwrap();

        let messages = db.list_chat_messages().unwrap();
        assert_eq!(messages[0].id, "m2");
        assert_eq!(messages[0].author_username, "bob");
        assert_eq!(messages[1].content, "hey");
    }

    #[test]
    fn sessions_expire_and_are_pruned() {
        let db = db_with_users();
        db.create_session("s1", ALICE, "2026-01-01T00:00:00.000000Z", "2026-01-02T00:00:00.000000Z")
            .unwrap();

        let live = db.get_session("s1", "2026-01-01T12:00:00.000000Z").unwrap().unwrap();
        assert_eq!(live.user_id, ALICE);
        assert_eq!(live.username, "alice");
        assert!(db.get_session("s1", "2026-01-03T00:00:00.000000Z").unwrap().is_none());

        let pruned = db
            .create_session("s2", BOB, "2026-01-03T00:00:00.000000Z", "2026-01-04T00:00:00.000000Z")
            .unwrap();
        assert_eq!(pruned, 1);

        assert!(db.delete_session("s2").unwrap());
        assert!(!db.delete_session("s2").unwrap());
    }
}
