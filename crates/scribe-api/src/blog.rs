use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::error;
use uuid::Uuid;

use scribe_types::api::{
    EditorPage, FeedPage, PostCountResponse, PostForm, PostPage, SearchQuery, ViewQuery,
};

use crate::auth::AppState;
use crate::browse::{PostFilter, browse};
use crate::error::{ApiError, blocking};
use crate::middleware::CurrentUser;
use crate::posts::PostStore;

/// Malformed ids cannot name a post, so they are reported like missing ones.
fn parse_post_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound)
}

async fn feed(
    state: &AppState,
    current: CurrentUser,
    filter: PostFilter,
    show_controls: bool,
    show_searchbar: bool,
) -> Result<Json<FeedPage>, ApiError> {
    let db = state.db.clone();
    let posts = blocking(move || browse(&PostStore::new(&db), &filter)).await?;

    Ok(Json(FeedPage {
        posts,
        show_controls,
        show_searchbar,
        current_user: current.0,
    }))
}

/// GET /: every post, newest first.
pub async fn index(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<FeedPage>, ApiError> {
    feed(&state, current, PostFilter::All, false, false).await
}

/// GET /view?myPosts=true: own posts with edit controls; anonymous callers
/// get the full list instead.
pub async fn view(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ViewQuery>,
) -> Result<Json<FeedPage>, ApiError> {
    match current.user().map(|u| u.id) {
        Some(user_id) if query.wants_own_posts() => {
            feed(&state, current, PostFilter::MineOf(user_id), true, true).await
        }
        _ => feed(&state, current, PostFilter::All, false, true).await,
    }
}

/// GET /search?q=
pub async fn search(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<FeedPage>, ApiError> {
    let text = query.q.unwrap_or_default();
    feed(&state, current, PostFilter::TitleContains(text), false, true).await
}

/// GET /create: empty editor; anonymous callers are sent to the login form.
pub async fn create_page(current: CurrentUser) -> Response {
    if current.0.is_none() {
        return Redirect::to("/login").into_response();
    }
    Json(EditorPage {
        post: None,
        current_user: current.0,
    })
    .into_response()
}

/// POST /submit
pub async fn submit(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<PostForm>,
) -> Result<Redirect, ApiError> {
    blocking(move || {
        PostStore::new(&state.db).create(
            current.user(),
            &form.title,
            &form.text,
            form.image_data.as_deref(),
        )
    })
    .await?;

    Ok(Redirect::to("/"))
}

/// GET /edit/{id}: editor prefilled with the post, owner only.
pub async fn edit_page(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<EditorPage>, ApiError> {
    let id = parse_post_id(&id)?;
    let db = state.db.clone();
    let session = current.0.clone();
    let post = blocking(move || PostStore::new(&db).authorize(id, session.as_ref())).await?;

    Ok(Json(EditorPage {
        post: Some(post),
        current_user: current.0,
    }))
}

/// POST /edit/{id}
pub async fn edit(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<PostForm>,
) -> Result<Redirect, ApiError> {
    let id = parse_post_id(&id)?;
    blocking(move || {
        PostStore::new(&state.db).update(
            id,
            current.user(),
            &form.title,
            &form.text,
            form.image_data.as_deref(),
        )
    })
    .await?;

    Ok(Redirect::to("/view?myPosts=true"))
}

/// POST /delete/{id}
pub async fn delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Redirect, ApiError> {
    let id = parse_post_id(&id)?;
    blocking(move || PostStore::new(&state.db).delete(id, current.user())).await?;

    Ok(Redirect::to("/"))
}

/// GET /post/{id}
pub async fn show(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<PostPage>, ApiError> {
    let id = parse_post_id(&id)?;
    let db = state.db.clone();
    let post = blocking(move || PostStore::new(&db).get(id)).await?;

    Ok(Json(PostPage {
        post,
        current_user: current.0,
    }))
}

/// GET /api/user-post-count: zero for anonymous callers. A store failure
/// still answers with a count body so widgets can render.
pub async fn user_post_count(State(state): State<AppState>, current: CurrentUser) -> Response {
    let user_id = current.user().map(|u| u.id);
    let db = state.db.clone();

    match blocking(move || PostStore::new(&db).count_owned_by(user_id)).await {
        Ok(count) => Json(PostCountResponse { count }).into_response(),
        Err(e) => {
            error!("Error fetching post count: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(PostCountResponse { count: 0 }),
            )
                .into_response()
        }
    }
}
