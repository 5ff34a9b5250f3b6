//! Repositories wrapping the sea-orm entities.

mod comment;
mod comment_like;
mod post;
mod post_like;
mod user;
mod user_profile;
mod watchlist;

pub use comment::CommentRepository;
pub use comment_like::CommentLikeRepository;
pub use post::PostRepository;
pub use post_like::PostLikeRepository;
pub use user::UserRepository;
pub use user_profile::UserProfileRepository;
pub use watchlist::{UpsertColumns, WatchlistRepository};
