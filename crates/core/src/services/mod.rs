//! Business logic services.

#![allow(missing_docs)]

pub mod catalog;
pub mod catalog_client;
pub mod comment;
pub mod post;
pub mod profile;
pub mod user;
pub mod watchlist;

pub use catalog::{
    AiringStatus, AnimeDetails, AnnotatedAnime, CatalogFilters, CatalogQuery, CatalogService,
    ExploreView, Genre, MoreAnime, SortOrder, StatusFilter,
};
pub use catalog_client::{CatalogAnime, CatalogClient, CatalogPage, JikanClient};
pub use comment::{CommentObserver, CommentService, NoOpCommentObserver};
pub use post::{Author, CommentItem, FeedItem, LikeToggle, PostDetail, PostService};
pub use profile::{EditProfileInput, ImageUpload, ProfilePage, ProfileService};
pub use user::{SignupInput, UserService};
pub use watchlist::{
    FavoriteToggle, SavedEntry, UpsertInput, UpsertOutcome, WatchlistPage, WatchlistService,
    WatchlistStats, parse_mal_id,
};
