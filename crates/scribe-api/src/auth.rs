use std::sync::Arc;

use argon2::Argon2;
use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::info;

use scribe_db::Database;
use scribe_types::api::{FormPage, LoginRequest, SignupRequest};

use crate::credentials::CredentialStore;
use crate::error::{ApiError, blocking};
use crate::middleware::{CurrentUser, expired_session_cookie, session_cookie, session_token};
use crate::session::Sessions;

pub type AppState = Arc<AppStateInner>;

/// Request body cap. Posts carry their image inline as a data URL.
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub sessions: Sessions,
    pub hasher: Argon2<'static>,
    pub cookie_secure: bool,
    pub body_limit_bytes: usize,
}

impl AppStateInner {
    /// Argon2id with default parameters, non-`Secure` cookies and a 50 MB
    /// body cap.
    pub fn new(db: Arc<Database>, sessions: Sessions) -> Self {
        Self {
            db,
            sessions,
            hasher: Argon2::default(),
            cookie_secure: false,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }

    pub fn with_hasher(mut self, hasher: Argon2<'static>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit_bytes = bytes;
        self
    }
}

pub async fn signup_page(current: CurrentUser) -> Json<FormPage> {
    Json(FormPage {
        form: "signup".into(),
        current_user: current.0,
    })
}

pub async fn signup(
    State(state): State<AppState>,
    Form(req): Form<SignupRequest>,
) -> Result<Redirect, ApiError> {
    blocking(move || {
        CredentialStore::new(&state.db, &state.hasher).register(
            &req.name,
            &req.username,
            &req.email,
            &req.password,
        )
    })
    .await?;

    Ok(Redirect::to("/login"))
}

pub async fn login_page(current: CurrentUser) -> Json<FormPage> {
    Json(FormPage {
        form: "login".into(),
        current_user: current.0,
    })
}

/// Starts a fresh session; any session the browser already held is ended
/// first so a pre-set token cannot be carried across the login.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(req): Form<LoginRequest>,
) -> Result<(CookieJar, Redirect), ApiError> {
    let previous = session_token(&jar);
    let secure = state.cookie_secure;

    let token = blocking(move || {
        let user = CredentialStore::new(&state.db, &state.hasher)
            .authenticate(&req.username, &req.password)?;
        state.sessions.end(previous.as_deref())?;
        let token = state.sessions.start(&user)?;
        info!("User {} logged in", user.username);
        Ok(token)
    })
    .await?;

    Ok((jar.add(session_cookie(token, secure)), Redirect::to("/")))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ApiError> {
    let token = session_token(&jar);
    let sessions = state.sessions.clone();
    blocking(move || sessions.end(token.as_deref())).await?;

    Ok((jar.remove(expired_session_cookie()), Redirect::to("/")))
}

pub async fn profile(current: CurrentUser) -> Response {
    match current.0 {
        Some(user) => Json(user).into_response(),
        None => Redirect::to("/login").into_response(),
    }
}
