//! Catalog browsing endpoints.

use anifeed_common::{AppError, AppResult};
use anifeed_core::{CatalogFilters, MoreAnime, parse_mal_id};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Response,
    routing::get,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::{extractors::AuthUser, middleware::AppState, response::page};

/// Explore page with the facet-driven listing.
async fn explore(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(filters): Query<CatalogFilters>,
    jar: CookieJar,
) -> AppResult<Response> {
    let view = state.catalog_service.explore(&user.id, &filters).await?;
    Ok(page(jar, view))
}

/// Continuation query: a page number plus the explore facets.
#[derive(Debug, Deserialize)]
pub struct FetchMoreQuery {
    // Kept as text: flattened urlencoded structs only see strings.
    page: Option<String>,
    #[serde(flatten)]
    filters: CatalogFilters,
}

impl FetchMoreQuery {
    fn page(&self) -> AppResult<u32> {
        match self.page.as_deref().map(str::trim) {
            None | Some("") => Ok(1),
            Some(raw) => raw
                .parse()
                .map_err(|_| AppError::BadRequest("Invalid page".to_string())),
        }
    }
}

async fn fetch_more(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<FetchMoreQuery>,
) -> AppResult<Json<MoreAnime>> {
    let page = query.page()?;
    let more = state
        .catalog_service
        .fetch_more(&user.id, page, &query.filters)
        .await?;
    Ok(Json(more))
}

/// Details of one catalog entry.
async fn anime_details(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    jar: CookieJar,
) -> AppResult<Response> {
    let mal_id = parse_mal_id(&raw_id)?;
    let details = state.catalog_service.details(&user.id, mal_id).await?;
    Ok(page(jar, details))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/explore", get(explore))
        .route("/fetch-more-anime", get(fetch_more))
        .route("/anime/{id}/", get(anime_details))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(query: &str) -> FetchMoreQuery {
        let uri: axum::http::Uri = format!("/fetch-more-anime?{query}").parse().unwrap();
        Query::<FetchMoreQuery>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_fetch_more_query_reads_page_and_facets() {
        let query = parse("page=3&genre=Action&year=2020");
        assert_eq!(query.page().unwrap(), 3);
        assert_eq!(query.filters.genre.as_deref(), Some("Action"));
        assert_eq!(query.filters.year.as_deref(), Some("2020"));
    }

    #[test]
    fn test_fetch_more_query_defaults_to_first_page() {
        assert_eq!(parse("").page().unwrap(), 1);
        assert!(parse("page=abc").page().is_err());
    }
}
