use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use scribe_db::Database;
use scribe_db::models::PostRow;
use scribe_types::models::{Post, SessionUser};

use crate::error::ApiError;
use crate::guard::can_mutate;

/// Display format for `Post::created_date`, e.g. "Mon Oct 19 2026".
const CREATED_DATE_FORMAT: &str = "%a %b %d %Y";

/// Posts and their ownership rules. Every mutation of an existing post goes
/// through [`can_mutate`].
pub struct PostStore<'a> {
    db: &'a Database,
}

impl<'a> PostStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Author name and owner come from the session, never from the request.
    pub fn create(
        &self,
        session: Option<&SessionUser>,
        title: &str,
        body: &str,
        image_data: Option<&str>,
    ) -> Result<Uuid, ApiError> {
        let owner = session.ok_or(ApiError::Unauthenticated)?;
        if title.trim().is_empty() {
            return Err(ApiError::Invalid("title is required".into()));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        self.db.insert_post(&PostRow {
            id: id.to_string(),
            author_name: owner.name.clone(),
            owner_id: Some(owner.id.to_string()),
            title: title.to_string(),
            body: body.to_string(),
            created_date: now.format(CREATED_DATE_FORMAT).to_string(),
            image_data: non_blank(image_data).map(str::to_string),
            created_at: scribe_db::to_sql_timestamp(&now),
        })?;

        info!("Post {} created by {}", id, owner.username);
        Ok(id)
    }

    /// Overwrites title and body. The image is replaced only by a non-blank
    /// value; blank or missing keeps the current one.
    pub fn update(
        &self,
        id: Uuid,
        session: Option<&SessionUser>,
        title: &str,
        body: &str,
        image_data: Option<&str>,
    ) -> Result<Post, ApiError> {
        self.authorize(id, session)?;
        if title.trim().is_empty() {
            return Err(ApiError::Invalid("title is required".into()));
        }

        let updated = self
            .db
            .update_post(&id.to_string(), title, body, non_blank(image_data))?;
        if !updated {
            // Deleted between the ownership check and the write.
            return Err(ApiError::NotFound);
        }

        info!("Post {} updated", id);
        self.get(id)
    }

    pub fn delete(&self, id: Uuid, session: Option<&SessionUser>) -> Result<(), ApiError> {
        self.authorize(id, session)?;

        if !self.db.delete_post(&id.to_string())? {
            return Err(ApiError::NotFound);
        }

        info!("Post {} deleted", id);
        Ok(())
    }

    /// Returns the post if `session` owns it: `NotFound` before `Forbidden`.
    pub fn authorize(&self, id: Uuid, session: Option<&SessionUser>) -> Result<Post, ApiError> {
        let post = self.get(id)?;
        if !can_mutate(session, &post) {
            warn!(
                "Denied mutation of post {} by {}",
                id,
                session.map(|s| s.username.as_str()).unwrap_or("anonymous")
            );
            return Err(ApiError::Forbidden);
        }
        Ok(post)
    }

    pub fn get(&self, id: Uuid) -> Result<Post, ApiError> {
        self.db
            .get_post(&id.to_string())?
            .map(post_from_row)
            .ok_or(ApiError::NotFound)
    }

    pub fn list_all(&self) -> Result<Vec<Post>, ApiError> {
        Ok(self.db.list_posts()?.into_iter().map(post_from_row).collect())
    }

    pub fn list_owned_by(&self, user_id: Uuid) -> Result<Vec<Post>, ApiError> {
        Ok(self
            .db
            .list_posts_by_owner(&user_id.to_string())?
            .into_iter()
            .map(post_from_row)
            .collect())
    }

    /// Zero for anonymous callers.
    pub fn count_owned_by(&self, user_id: Option<Uuid>) -> Result<u64, ApiError> {
        match user_id {
            Some(id) => Ok(self.db.count_posts_by_owner(&id.to_string())?),
            None => Ok(0),
        }
    }

    /// Case-insensitive substring match on the title. Empty matches all.
    pub fn search_by_title(&self, needle: &str) -> Result<Vec<Post>, ApiError> {
        let posts = self.list_all()?;
        if needle.is_empty() {
            return Ok(posts);
        }

        // Unicode lowercase on both sides; SQLite's lower() only folds ASCII.
        let needle = needle.to_lowercase();
        Ok(posts
            .into_iter()
            .filter(|p| p.title.to_lowercase().contains(&needle))
            .collect())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn post_from_row(row: PostRow) -> Post {
    Post {
        id: row.id.parse::<Uuid>().unwrap_or_else(|e| {
            warn!("Corrupt post id '{}': {}", row.id, e);
            Uuid::default()
        }),
        // A corrupt owner makes the post read-only rather than owned by someone else.
        owner_id: row.owner_id.as_deref().and_then(|owner| {
            owner
                .parse::<Uuid>()
                .map_err(|e| warn!("Corrupt owner_id '{}' on post '{}': {}", owner, row.id, e))
                .ok()
        }),
        created_at: scribe_db::parse_sql_timestamp(&row.created_at).unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on post '{}': {}", row.created_at, row.id, e);
            DateTime::<Utc>::default()
        }),
        author_name: row.author_name,
        title: row.title,
        body: row.body,
        created_date: row.created_date,
        image_data: row.image_data,
    }
}
