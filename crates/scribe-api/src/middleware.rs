use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use scribe_types::models::SessionUser;

use crate::auth::AppState;
use crate::error::{ApiError, blocking};

pub const SESSION_COOKIE: &str = "scribe_session";

/// The caller's session projection, if the request carries a live session
/// cookie. Unknown or ended tokens resolve to `None`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<SessionUser>);

impl CurrentUser {
    pub fn user(&self) -> Option<&SessionUser> {
        self.0.as_ref()
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&CookieJar::from_headers(&parts.headers)) else {
            return Ok(Self(None));
        };

        let sessions = state.sessions.clone();
        let user = blocking(move || sessions.current(Some(&token))).await?;
        Ok(Self(user))
    }
}

pub fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE).map(|c| c.value().to_string())
}

pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Removal cookie; the path must match the one the session cookie was set with.
pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}
