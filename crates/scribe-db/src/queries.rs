use crate::models::{ContactRow, PostRow, UserRow};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, ErrorCode, Row};

const USER_COLUMNS: &str = "id, name, username, email, password, created_at";
const POST_COLUMNS: &str =
    "id, author_name, owner_id, title, body, created_date, image_data, created_at";

impl Database {
    // -- Users --

    /// Insert a user. Returns `false` when the username or email UNIQUE
    /// constraint rejects the row; nothing is written in that case.
    pub fn create_user(&self, user: &UserRow) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, name, username, email, password, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    user.id,
                    user.name,
                    user.username,
                    user.email,
                    user.password,
                    user.created_at
                ],
            );
            match inserted {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Look up a user whose username or email equals `identifier`.
    pub fn get_user_by_identifier(&self, identifier: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users WHERE username = ?1 OR email = ?1 LIMIT 1"
            );
            conn.query_row(&sql, [identifier], user_from_row).optional()
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
            conn.query_row(&sql, [id], user_from_row).optional()
        })
    }

    // -- Posts --

    pub fn insert_post(&self, post: &PostRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (id, author_name, owner_id, title, body, created_date, image_data, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    post.id,
                    post.author_name,
                    post.owner_id,
                    post.title,
                    post.body,
                    post.created_date,
                    post.image_data,
                    post.created_at
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_post(&self, id: &str) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1");
            conn.query_row(&sql, [id], post_from_row).optional()
        })
    }

    /// Overwrite title and body. `image_data` of `None` keeps the stored image.
    /// Returns `false` if no row matched.
    pub fn update_post(
        &self,
        id: &str,
        title: &str,
        body: &str,
        image_data: Option<&str>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE posts
                 SET title = ?2, body = ?3, image_data = COALESCE(?4, image_data)
                 WHERE id = ?1",
                rusqlite::params![id, title, body, image_data],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_post(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    /// All posts, newest first.
    pub fn list_posts(&self) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| query_posts(conn, None))
    }

    /// Posts owned by `owner_id`, newest first.
    pub fn list_posts_by_owner(&self, owner_id: &str) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| query_posts(conn, Some(owner_id)))
    }

    pub fn count_posts_by_owner(&self, owner_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM posts WHERE owner_id = ?1",
                [owner_id],
                |r| r.get(0),
            )?;
            Ok(count as u64)
        })
    }

    // -- Contacts --

    pub fn insert_contact(&self, contact: &ContactRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO contacts (id, name, email, message, submitted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    contact.id,
                    contact.name,
                    contact.email,
                    contact.message,
                    contact.submitted_at
                ],
            )?;
            Ok(())
        })
    }

    // -- Sessions --

    pub fn put_session(&self, token_hash: &str, data: &str, created_at: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO sessions (token_hash, data, created_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![token_hash, data, created_at],
            )?;
            Ok(())
        })
    }

    pub fn get_session(&self, token_hash: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT data FROM sessions WHERE token_hash = ?1",
                [token_hash],
                |row| row.get(0),
            )
            .optional()
        })
    }

    pub fn delete_session(&self, token_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM sessions WHERE token_hash = ?1", [token_hash])?;
            Ok(())
        })
    }
}

fn query_posts(conn: &Connection, owner_id: Option<&str>) -> Result<Vec<PostRow>> {
    // rowid breaks ties between posts created within the same microsecond
    let rows = match owner_id {
        Some(owner) => {
            let sql = format!(
                "SELECT {POST_COLUMNS} FROM posts WHERE owner_id = ?1
                 ORDER BY created_at DESC, rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_map([owner], post_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
        None => {
            let sql = format!("SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, rowid DESC");
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_map([], post_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    Ok(rows)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        username: row.get(2)?,
        email: row.get(3)?,
        password: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        author_name: row.get(1)?,
        owner_id: row.get(2)?,
        title: row.get(3)?,
        body: row.get(4)?,
        created_date: row.get(5)?,
        image_data: row.get(6)?,
        created_at: row.get(7)?,
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

    fn user(id: &str, username: &str, email: &str) -> UserRow {
        UserRow {
            id: id.to_string(),
            name: format!("{username} name"),
            username: username.to_string(),
            email: email.to_string(),
            password: "hash".to_string(),
            created_at: "2026-10-19T10:00:00.000000Z".to_string(),
        }
    }

    fn post(id: &str, owner: Option<&str>, title: &str, created_at: &str) -> PostRow {
        PostRow {
            id: id.to_string(),
            author_name: "Ada".to_string(),
            owner_id: owner.map(str::to_string),
            title: title.to_string(),
            body: "body".to_string(),
            created_date: "Mon Oct 19 2026".to_string(),
            image_data: None,
            created_at: created_at.to_string(),
        }
    }

    fn user_count(db: &Database) -> i64 {
        db.with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?))
            .unwrap()
    }

    #[test]
    fn unique_constraints_reject_duplicates() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.create_user(&user("u1", "ada", "ada@example.com")).unwrap());
        assert!(!db.create_user(&user("u2", "ada", "other@example.com")).unwrap());
        assert!(!db.create_user(&user("u3", "bob", "ada@example.com")).unwrap());
        assert_eq!(user_count(&db), 1);
    }

    #[test]
    fn identifier_matches_username_or_email() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&user("u1", "ada", "ada@example.com")).unwrap();

        assert_eq!(db.get_user_by_identifier("ada").unwrap().unwrap().id, "u1");
        assert_eq!(db.get_user_by_identifier("ada@example.com").unwrap().unwrap().id, "u1");
        assert!(db.get_user_by_identifier("nobody").unwrap().is_none());
        assert!(db.get_user_by_id("u1").unwrap().is_some());
    }

    #[test]
    fn posts_list_newest_first_with_insertion_tiebreak() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&user("u1", "ada", "ada@example.com")).unwrap();
        db.insert_post(&post("p1", Some("u1"), "first", "2026-10-19T10:00:00.000000Z")).unwrap();
        db.insert_post(&post("p2", None, "second", "2026-10-19T11:00:00.000000Z")).unwrap();
        db.insert_post(&post("p3", Some("u1"), "third", "2026-10-19T11:00:00.000000Z")).unwrap();

        let ids: Vec<String> = db.list_posts().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["p3", "p2", "p1"]);

        let mine: Vec<String> =
            db.list_posts_by_owner("u1").unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(mine, vec!["p3", "p1"]);
        assert_eq!(db.count_posts_by_owner("u1").unwrap(), 2);
        assert_eq!(db.count_posts_by_owner("u2").unwrap(), 0);
    }

    #[test]
    fn update_without_image_keeps_existing_one() {
        let db = Database::open_in_memory().unwrap();
        let mut row = post("p1", None, "title", "2026-10-19T10:00:00.000000Z");
        row.image_data = Some("data:image/png;base64,AAAA".to_string());
        db.insert_post(&row).unwrap();

        assert!(db.update_post("p1", "new title", "new body", None).unwrap());
        let stored = db.get_post("p1").unwrap().unwrap();
        assert_eq!(stored.title, "new title");
        assert_eq!(stored.image_data.as_deref(), Some("data:image/png;base64,AAAA"));

        assert!(db.update_post("p1", "t", "b", Some("data:image/png;base64,BBBB")).unwrap());
        let stored = db.get_post("p1").unwrap().unwrap();
        assert_eq!(stored.image_data.as_deref(), Some("data:image/png;base64,BBBB"));

        assert!(!db.update_post("missing", "t", "b", None).unwrap());
    }

    #[test]
    fn delete_reports_whether_a_row_was_removed() {
        let db = Database::open_in_memory().unwrap();
        db.insert_post(&post("p1", None, "title", "2026-10-19T10:00:00.000000Z")).unwrap();
        assert!(db.delete_post("p1").unwrap());
        assert!(!db.delete_post("p1").unwrap());
        assert!(db.get_post("p1").unwrap().is_none());
    }

    #[test]
    fn sessions_round_trip_and_delete() {
        let db = Database::open_in_memory().unwrap();
        db.put_session("h1", "{}", "2026-10-19T10:00:00.000000Z").unwrap();
        assert_eq!(db.get_session("h1").unwrap().as_deref(), Some("{}"));
        db.delete_session("h1").unwrap();
        db.delete_session("h1").unwrap();
        assert!(db.get_session("h1").unwrap().is_none());
    }
}
