use serde::{Deserialize, Serialize};

use crate::models::{Post, SessionUser};

// -- Auth --

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// `username` accepts either the username or the email address.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// -- Posts --

/// Body of `POST /submit` and `POST /edit/{id}`.
///
/// Author fields are deliberately absent: anything the client sends for them
/// is dropped during deserialization.
#[derive(Debug, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "imageData")]
    pub image_data: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    #[serde(default, rename = "myPosts")]
    pub my_posts: Option<String>,
}

impl ViewQuery {
    pub fn wants_own_posts(&self) -> bool {
        self.my_posts.as_deref() == Some("true")
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

// -- Contact --

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

// -- Pages --

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub posts: Vec<Post>,
    pub show_controls: bool,
    pub show_searchbar: bool,
    pub current_user: Option<SessionUser>,
}

/// Create form (no post) or edit form (prefilled with the post).
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorPage {
    pub post: Option<Post>,
    pub current_user: Option<SessionUser>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub post: Post,
    pub current_user: Option<SessionUser>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormPage {
    pub form: String,
    pub current_user: Option<SessionUser>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostCountResponse {
    pub count: u64,
}
