//! HTTP endpoints.

mod auth;
mod explore;
mod feed;
mod profile;
mod watchlist;

use axum::Router;

use crate::middleware::AppState;

/// Create the application router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(feed::router())
        .merge(explore::router())
        .merge(watchlist::router())
        .merge(profile::router())
}
