//! Database row types: these map directly to SQLite rows.
//! Distinct from scribe-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

pub struct PostRow {
    pub id: String,
    pub author_name: String,
    pub owner_id: Option<String>,
    pub title: String,
    pub body: String,
    pub created_date: String,
    pub image_data: Option<String>,
    pub created_at: String,
}

pub struct ContactRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub submitted_at: String,
}
