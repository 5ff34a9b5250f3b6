//! Watchlist endpoints.

use anifeed_common::AppResult;
use anifeed_core::{FavoriteToggle, UpsertInput, UpsertOutcome, parse_mal_id};
use axum::{
    Form, Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::json;

use crate::{extractors::AuthUser, middleware::AppState, response::page};

/// Form carrying a catalog ID.
#[derive(Debug, Deserialize)]
pub struct MalIdForm {
    #[serde(default)]
    pub mal_id: String,
}

/// The user's watchlist page.
async fn watchlist_page(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<Response> {
    let list = state.watchlist_service.list(&user.id).await?;
    Ok(page(jar, list))
}

async fn add_to_watchlist(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Form(form): Form<MalIdForm>,
) -> AppResult<Response> {
    let mal_id = parse_mal_id(&form.mal_id)?;
    state.watchlist_service.add(&user.id, mal_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Anime added to watchlist" })),
    )
        .into_response())
}

async fn toggle_favorite(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Form(form): Form<MalIdForm>,
) -> AppResult<Json<FavoriteToggle>> {
    let mal_id = parse_mal_id(&form.mal_id)?;
    let result = state
        .watchlist_service
        .toggle_favorite(&user.id, mal_id)
        .await?;
    Ok(Json(result))
}

/// Create or update an entry from the edit dialog.
async fn add_or_update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<UpsertInput>, JsonRejection>,
) -> AppResult<Response> {
    let Json(input) = payload?;
    let body = match state.watchlist_service.upsert(&user.id, input).await? {
        UpsertOutcome::Saved(entry) => json!({
            "success": true,
            "is_update": entry.is_update,
            "anime_id": entry.anime_id,
            "mal_id": entry.mal_id,
            "title": entry.title,
            "image_url": entry.image_url,
            "status": entry.status,
            "rating": entry.rating,
            "date": entry.date,
        }),
        UpsertOutcome::DuplicateTitle { title } => json!({
            "success": false,
            "message": "Anime already exists",
            "anime_id": null,
            "title": title,
        }),
    };
    Ok(Json(body).into_response())
}

async fn delete_anime(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Response> {
    let mal_id = parse_mal_id(&raw_id)?;
    state.watchlist_service.delete(&user.id, mal_id).await?;
    Ok(Json(json!({ "success": true })).into_response())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/watchlist", get(watchlist_page))
        .route("/add-to-watchlist/", post(add_to_watchlist))
        .route("/toggle-favorite/", post(toggle_favorite))
        .route("/anime/add-or-update/", post(add_or_update))
        .route("/delete-anime/{id}/", post(delete_anime))
}
