//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use anifeed_common::{StorageBackend, config::SessionConfig};
use anifeed_core::{
    CatalogClient, CatalogService, CommentObserver, CommentService, PostService, ProfileService,
    UserService, WatchlistService,
};
use anifeed_db::repositories::{
    CommentLikeRepository, CommentRepository, PostLikeRepository, PostRepository,
    UserProfileRepository, UserRepository, WatchlistRepository,
};
use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use sea_orm::DatabaseConnection;
use tracing::warn;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub watchlist_service: WatchlistService,
    pub profile_service: ProfileService,
    pub catalog_service: CatalogService,
    pub session: SessionConfig,
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        catalog: Arc<dyn CatalogClient>,
        storage: Arc<dyn StorageBackend>,
        comment_observer: Arc<dyn CommentObserver>,
        session: SessionConfig,
    ) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let profile_repo = UserProfileRepository::new(Arc::clone(&db));
        let post_repo = PostRepository::new(Arc::clone(&db));
        let post_like_repo = PostLikeRepository::new(Arc::clone(&db));
        let comment_repo = CommentRepository::new(Arc::clone(&db));
        let comment_like_repo = CommentLikeRepository::new(Arc::clone(&db));
        let watchlist_repo = WatchlistRepository::new(Arc::clone(&db));

        Self {
            user_service: UserService::new(user_repo.clone(), profile_repo.clone()),
            post_service: PostService::new(
                post_repo.clone(),
                comment_repo.clone(),
                post_like_repo,
                profile_repo.clone(),
            ),
            comment_service: CommentService::new(
                comment_repo,
                comment_like_repo,
                post_repo,
                comment_observer,
            ),
            watchlist_service: WatchlistService::new(watchlist_repo.clone(), Arc::clone(&catalog)),
            profile_service: ProfileService::new(
                user_repo,
                profile_repo,
                watchlist_repo.clone(),
                storage,
            ),
            catalog_service: CatalogService::new(catalog, watchlist_repo),
            session,
        }
    }
}

/// Session token from the `Authorization: Bearer` header, else the session cookie.
fn session_token(req: &Request<Body>, cookie_name: &str) -> Option<String> {
    if let Some(token) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return Some(token.to_string());
    }

    CookieJar::from_headers(req.headers())
        .get(cookie_name)
        .map(|c| c.value().to_string())
}

/// Authentication middleware.
///
/// Resolves the session token to a user and stores it in the request
/// extensions; unauthenticated requests pass through untouched.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = session_token(&req, &state.session.cookie_name) {
        match state.user_service.authenticate_by_token(&token).await {
            Ok(Some(user)) => {
                req.extensions_mut().insert(user);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Session lookup failed"),
        }
    }

    next.run(req).await
}
