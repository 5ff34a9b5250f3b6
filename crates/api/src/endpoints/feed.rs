//! Feed, post and comment endpoints.

use anifeed_common::AppResult;
use anifeed_core::{FeedItem, LikeToggle, PostDetail};
use axum::{
    Form, Json, Router,
    extract::{Path, State},
    response::Response,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{page, redirect},
};

#[derive(Serialize)]
struct FeedPage {
    posts: Vec<FeedItem>,
}

/// Home feed.
async fn home(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<Response> {
    let posts = state.post_service.feed(&user.id).await?;
    Ok(page(jar, FeedPage { posts }))
}

/// Post or comment text form.
#[derive(Debug, Deserialize)]
pub struct ContentForm {
    #[serde(default)]
    pub content: String,
}

/// Create a post; invalid content is ignored.
async fn create_post(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Form(form): Form<ContentForm>,
) -> AppResult<Response> {
    state.post_service.create(&user.id, &form.content).await?;
    Ok(redirect("/"))
}

/// Post detail with comments.
async fn post_detail(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    jar: CookieJar,
) -> AppResult<Response> {
    let detail: PostDetail = state.post_service.detail(&user.id, &post_id).await?;
    Ok(page(jar, detail))
}

fn post_path(post_id: &str) -> String {
    format!("/post/{post_id}/")
}

/// Comment on a post; invalid content is ignored.
async fn create_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Form(form): Form<ContentForm>,
) -> AppResult<Response> {
    state
        .comment_service
        .create(&user.id, &post_id, &form.content)
        .await?;
    Ok(redirect(&post_path(&post_id)))
}

async fn like_post(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<Json<LikeToggle>> {
    let result = state.post_service.toggle_like(&user.id, &post_id).await?;
    Ok(Json(result))
}

async fn delete_post(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<Response> {
    state.post_service.delete(&user, &post_id).await?;
    Ok(redirect("/"))
}

/// Delete a comment and return to its post.
async fn delete_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> AppResult<Response> {
    let comment = state
        .comment_service
        .delete(&user.id, &comment_id)
        .await?;
    Ok(redirect(&post_path(&comment.post_id)))
}

async fn like_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> AppResult<Json<LikeToggle>> {
    let result = state
        .comment_service
        .toggle_like(&user.id, &comment_id)
        .await?;
    Ok(Json(result))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/new-post", post(create_post))
        .route("/post/{id}/", get(post_detail))
        .route("/post/{id}/comment/", post(create_comment))
        .route("/post/{id}/like/", post(like_post))
        .route("/post/{id}/delete/", post(delete_post))
        .route("/comment/{id}/delete/", post(delete_comment))
        .route("/comment/{id}/like/", post(like_comment))
}
