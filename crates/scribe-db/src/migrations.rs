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
        info!("DB: running migration v1 (users, posts, contacts)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                username    TEXT NOT NULL UNIQUE,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            -- owner_id is nullable: rows imported from the name-matched era
            -- have no owner and stay read-only.
            CREATE TABLE posts (
                id            TEXT PRIMARY KEY,
                author_name   TEXT NOT NULL,
                owner_id      TEXT REFERENCES users(id),
                title         TEXT NOT NULL,
                body          TEXT NOT NULL,
                created_date  TEXT NOT NULL,
                image_data    TEXT,
                created_at    TEXT NOT NULL
            );

            CREATE INDEX idx_posts_created ON posts(created_at);
            CREATE INDEX idx_posts_owner ON posts(owner_id, created_at);

            CREATE TABLE contacts (
                id            TEXT PRIMARY KEY,
                name          TEXT NOT NULL,
                email         TEXT NOT NULL,
                message       TEXT NOT NULL,
                submitted_at  TEXT NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (1);
            "
        )?;
    }

    if version < 2 {
        info!("DB: running migration v2 (sessions)");
        conn.execute_batch(
            "
            CREATE TABLE sessions (
                token_hash  TEXT PRIMARY KEY,
                data        TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (2);
            "
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
