use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use scribe_db::Database;
use scribe_db::models::UserRow;
use scribe_types::models::{SessionUser, User};

use crate::error::ApiError;

/// User accounts: signup and password login.
pub struct CredentialStore<'a> {
    db: &'a Database,
    hasher: &'a Argon2<'static>,
}

impl<'a> CredentialStore<'a> {
    pub fn new(db: &'a Database, hasher: &'a Argon2<'static>) -> Self {
        Self { db, hasher }
    }

    pub fn register(
        &self,
        name: &str,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        for (field, value) in [("name", name), ("username", username), ("email", email)] {
            if value.trim().is_empty() {
                return Err(ApiError::Invalid(format!("{field} is required")));
            }
        }
        if password.is_empty() {
            return Err(ApiError::Invalid("password is required".into()));
        }

        // Hash password with Argon2id
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = self
            .hasher
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
            .to_string();

        let user = User {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            username: username.trim().to_string(),
            email: email.trim().to_string(),
            created_at: Utc::now(),
        };

        // The UNIQUE indexes decide; a pre-check would race concurrent signups.
        let inserted = self.db.create_user(&UserRow {
            id: user.id.to_string(),
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            password: password_hash,
            created_at: scribe_db::to_sql_timestamp(&user.created_at),
        })?;
        if !inserted {
            info!("Signup rejected: duplicate username or email");
            return Err(ApiError::DuplicateCredential);
        }

        info!("User {} registered", user.username);
        Ok(user)
    }

    /// `identifier` is matched against both username and email.
    pub fn authenticate(&self, identifier: &str, password: &str) -> Result<SessionUser, ApiError> {
        let row = self
            .db
            .get_user_by_identifier(identifier.trim())?
            .ok_or(ApiError::InvalidCredentials)?;

        let parsed_hash = PasswordHash::new(&row.password)
            .map_err(|e| anyhow::anyhow!("corrupt password hash for user {}: {}", row.id, e))?;

        if self
            .hasher
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_err()
        {
            warn!("Login failed: wrong credentials");
            return Err(ApiError::InvalidCredentials);
        }

        Ok(user_from_row(row)?.into())
    }
}

fn user_from_row(row: UserRow) -> anyhow::Result<User> {
    Ok(User {
        id: row.id.parse::<Uuid>()?,
        created_at: scribe_db::parse_sql_timestamp(&row.created_at)?,
        name: row.name,
        username: row.username,
        email: row.email,
    })
}

#[cfg(test)]
pub(crate) fn test_hasher() -> Argon2<'static> {
    use argon2::{Algorithm, Params, Version};
    Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        Params::new(8, 1, 1, None).unwrap(),
    )
}
