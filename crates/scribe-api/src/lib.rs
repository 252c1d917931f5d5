//! Scribe application core: accounts, sessions, posts with owner-only
//! mutation, listings, the contact inbox, and the HTTP handlers over them.

pub mod auth;
pub mod blog;
pub mod browse;
pub mod contact;
pub mod credentials;
pub mod error;
pub mod guard;
pub mod middleware;
pub mod posts;
pub mod router;
pub mod session;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
pub use router::router;
