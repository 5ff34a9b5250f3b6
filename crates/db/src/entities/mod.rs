//! Database entities.

#![allow(missing_docs)]

pub mod comment;
pub mod comment_like;
pub mod post;
pub mod post_like;
pub mod user;
pub mod user_profile;
pub mod watchlist_entry;

pub use comment::Entity as Comment;
pub use comment_like::Entity as CommentLike;
pub use post::Entity as Post;
pub use post_like::Entity as PostLike;
pub use user::Entity as User;
pub use user_profile::Entity as UserProfile;
pub use watchlist_entry::Entity as WatchlistEntry;
