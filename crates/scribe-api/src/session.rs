use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use chrono::Utc;
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use scribe_db::Database;
use scribe_types::models::SessionUser;

use crate::error::ApiError;

/// Random bytes per session token before encoding.
const TOKEN_BYTES: usize = 32;

/// Backing storage for session bindings: opaque token -> user projection.
pub trait SessionStore: Send + Sync {
    fn load(&self, token: &str) -> anyhow::Result<Option<SessionUser>>;
    fn save(&self, token: &str, user: &SessionUser) -> anyhow::Result<()>;
    /// Removing an unknown token is not an error.
    fn remove(&self, token: &str) -> anyhow::Result<()>;
}

/// Process-local sessions. Lost on restart and not shared between instances.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionUser>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, token: &str) -> anyhow::Result<Option<SessionUser>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|e| anyhow::anyhow!("session lock poisoned: {}", e))?;
        Ok(sessions.get(token).cloned())
    }

    fn save(&self, token: &str, user: &SessionUser) -> anyhow::Result<()> {
        self.sessions
            .write()
            .map_err(|e| anyhow::anyhow!("session lock poisoned: {}", e))?
            .insert(token.to_string(), user.clone());
        Ok(())
    }

    fn remove(&self, token: &str) -> anyhow::Result<()> {
        self.sessions
            .write()
            .map_err(|e| anyhow::anyhow!("session lock poisoned: {}", e))?
            .remove(token);
        Ok(())
    }
}

/// Sessions persisted in the application database, so they outlive the
/// process and are visible to every instance sharing the file. Rows are keyed
/// by the SHA-256 of the token; raw tokens are never stored.
pub struct SqliteSessionStore {
    db: Arc<Database>,
}

impl SqliteSessionStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl SessionStore for SqliteSessionStore {
    fn load(&self, token: &str) -> anyhow::Result<Option<SessionUser>> {
        let Some(data) = self.db.get_session(&token_hash(token))? else {
            return Ok(None);
        };
        match serde_json::from_str(&data) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!("Discarding unreadable session record: {}", e);
                Ok(None)
            }
        }
    }

    fn save(&self, token: &str, user: &SessionUser) -> anyhow::Result<()> {
        let data = serde_json::to_string(user)?;
        self.db
            .put_session(&token_hash(token), &data, &scribe_db::to_sql_timestamp(&Utc::now()))
    }

    fn remove(&self, token: &str) -> anyhow::Result<()> {
        self.db.delete_session(&token_hash(token))
    }
}

fn token_hash(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// 32 bytes from the OS RNG, base64url without padding.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    B64.encode(bytes)
}

/// Session lifecycle on top of a [`SessionStore`].
#[derive(Clone)]
pub struct Sessions {
    store: Arc<dyn SessionStore>,
}

impl Sessions {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Bind `user` to a fresh token and return the token.
    pub fn start(&self, user: &SessionUser) -> Result<String, ApiError> {
        let token = generate_token();
        self.store.save(&token, user)?;
        debug!("Session started for {}", user.username);
        Ok(token)
    }

    pub fn current(&self, token: Option<&str>) -> Result<Option<SessionUser>, ApiError> {
        match token {
            Some(token) if !token.is_empty() => Ok(self.store.load(token)?),
            _ => Ok(None),
        }
    }

    /// Idempotent.
    pub fn end(&self, token: Option<&str>) -> Result<(), ApiError> {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.store.remove(token)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn ada() -> SessionUser {
        SessionUser {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            created_at: Utc::now(),
        }
    }

    fn lifecycle(sessions: Sessions) {
        let user = ada();
        let token = sessions.start(&user).unwrap();

        assert_eq!(sessions.current(Some(&token)).unwrap(), Some(user));
        assert_eq!(sessions.current(Some("not-a-token")).unwrap(), None);
        assert_eq!(sessions.current(None).unwrap(), None);

        sessions.end(Some(&token)).unwrap();
        assert_eq!(sessions.current(Some(&token)).unwrap(), None);

        // Ending twice, or ending nothing, is fine.
        sessions.end(Some(&token)).unwrap();
        sessions.end(None).unwrap();
    }

    #[test]
    fn memory_store_lifecycle() {
        lifecycle(Sessions::new(Arc::new(MemorySessionStore::new())));
    }

    #[test]
    fn sqlite_store_lifecycle() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        lifecycle(Sessions::new(Arc::new(SqliteSessionStore::new(db))));
    }

    #[test]
    fn sqlite_store_keeps_only_token_hashes() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let sessions = Sessions::new(Arc::new(SqliteSessionStore::new(db.clone())));
        let token = sessions.start(&ada()).unwrap();

        assert!(db.get_session(&token).unwrap().is_none());
        assert!(db.get_session(&token_hash(&token)).unwrap().is_some());
    }

    #[test]
    fn sqlite_sessions_survive_a_new_store_instance() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let user = ada();
        let token = Sessions::new(Arc::new(SqliteSessionStore::new(db.clone())))
            .start(&user)
            .unwrap();

        let other = Sessions::new(Arc::new(SqliteSessionStore::new(db)));
        assert_eq!(other.current(Some(&token)).unwrap(), Some(user));
    }

    #[test]
    fn tokens_are_unique_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
