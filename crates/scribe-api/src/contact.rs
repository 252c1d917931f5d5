use axum::{Form, extract::State};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use scribe_db::Database;
use scribe_db::models::ContactRow;
use scribe_types::api::ContactForm;
use scribe_types::models::ContactMessage;

use crate::auth::AppState;
use crate::error::{ApiError, blocking};

/// Append-only store for contact form submissions.
pub struct ContactInbox<'a> {
    db: &'a Database,
}

impl<'a> ContactInbox<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn submit(&self, name: &str, email: &str, message: &str) -> Result<ContactMessage, ApiError> {
        let contact = ContactMessage {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
            submitted_at: Utc::now(),
        };

        self.db.insert_contact(&ContactRow {
            id: contact.id.to_string(),
            name: contact.name.clone(),
            email: contact.email.clone(),
            message: contact.message.clone(),
            submitted_at: scribe_db::to_sql_timestamp(&contact.submitted_at),
        })?;

        info!("Contact message {} received", contact.id);
        Ok(contact)
    }
}

/// POST /contact
pub async fn submit_contact(
    State(state): State<AppState>,
    Form(form): Form<ContactForm>,
) -> Result<&'static str, ApiError> {
    blocking(move || ContactInbox::new(&state.db).submit(&form.name, &form.email, &form.message))
        .await?;

    Ok("Message sent successfully!")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submissions_are_stored() {
        let db = Database::open_in_memory().unwrap();
        let inbox = ContactInbox::new(&db);
        let sent = inbox.submit("Ada", "ada@example.com", "Hello there").unwrap();

        let stored: (String, String) = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT name, message FROM contacts WHERE id = ?1",
                    [sent.id.to_string()],
                    |r| Ok((r.get(0)?, r.get(1)?)),
                )?)
            })
            .unwrap();
        assert_eq!(stored, ("Ada".to_string(), "Hello there".to_string()));
    }
}
