use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::auth::{self, AppState};
use crate::{blog, contact};

/// All application routes, with state and the request body cap applied.
pub fn router(state: AppState) -> Router {
    let body_limit = state.body_limit_bytes;

    Router::new()
        .route("/", get(blog::index))
        .route("/view", get(blog::view))
        .route("/search", get(blog::search))
        .route("/create", get(blog::create_page))
        .route("/submit", post(blog::submit))
        .route("/edit/{id}", get(blog::edit_page).post(blog::edit))
        .route("/delete/{id}", post(blog::delete))
        .route("/post/{id}", get(blog::show))
        .route("/api/user-post-count", get(blog::user_post_count))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/profile", get(auth::profile))
        .route("/contact", post(contact::submit_contact))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// GET /health: liveness check (no auth).
async fn health() -> &'static str {
    "ok"
}
