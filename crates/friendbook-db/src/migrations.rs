use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE CHECK (length(username) > 0),
                password    TEXT NOT NULL CHECK (length(password) > 0),
                created_at  TEXT NOT NULL
            );

            CREATE TABLE sessions (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id),
                created_at  TEXT NOT NULL,
                expires_at  TEXT NOT NULL
            );

            CREATE INDEX idx_sessions_expiry ON sessions(expires_at);

            CREATE TABLE posts (
                id          TEXT PRIMARY KEY,
                author_id   TEXT NOT NULL REFERENCES users(id),
                content     TEXT NOT NULL CHECK (length(content) > 0),
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_posts_created ON posts(created_at);

            -- post_id deliberately carries no foreign key: comments are
            -- accepted for any post id.
            CREATE TABLE comments (
                id          TEXT PRIMARY KEY,
                post_id     TEXT NOT NULL,
                author_id   TEXT NOT NULL REFERENCES users(id),
                content     TEXT NOT NULL CHECK (length(content) > 0),
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_comments_post ON comments(post_id);

            CREATE TABLE chat_messages (
                id          TEXT PRIMARY KEY,
                author_id   TEXT NOT NULL REFERENCES users(id),
                content     TEXT NOT NULL CHECK (length(content) > 0),
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_chat_messages_created ON chat_messages(created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
