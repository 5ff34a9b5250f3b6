//! Post service: feed, post creation and deletion, likes.

use std::collections::HashMap;

use anifeed_common::{AppError, AppResult, IdGenerator};
use anifeed_db::{
    entities::{
        post, post_like, user,
        user_profile::{self, resolve_avatar_url},
    },
    repositories::{CommentRepository, PostLikeRepository, PostRepository, UserProfileRepository},
};
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::Set;
use serde::Serialize;
use tracing::info;

use crate::format::relative_time;

/// Author shown next to a post or comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub id: String,
    pub username: String,
    pub avatar_url: String,
}

impl Author {
    pub(crate) fn from_user(
        user: &user::Model,
        profiles: &HashMap<String, user_profile::Model>,
    ) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            avatar_url: resolve_avatar_url(profiles.get(&user.id)),
        }
    }
}

/// One post as listed in the feed.
#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
    pub id: String,
    pub content: String,
    pub author: Author,
    pub likes_count: i32,
    pub share_count: i32,
    pub comment_count: u64,
    pub liked: bool,
    pub created_at: DateTime<FixedOffset>,
    pub time_ago: String,
}

/// One comment under a post.
#[derive(Debug, Clone, Serialize)]
pub struct CommentItem {
    pub id: String,
    pub content: String,
    pub author: Author,
    pub likes_count: i32,
    pub can_delete: bool,
    pub created_at: DateTime<FixedOffset>,
    pub time_ago: String,
}

/// A post with its comments.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: FeedItem,
    pub comments: Vec<CommentItem>,
}

/// Result of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeToggle {
    pub liked: bool,
    pub likes_count: i32,
}

/// Trimmed content if it is non-empty and at most `max` characters.
pub(crate) fn accept_content(content: &str, max: usize) -> Option<&str> {
    let content = content.trim();
    let len = content.chars().count();
    (len > 0 && len <= max).then_some(content)
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    comment_repo: CommentRepository,
    like_repo: PostLikeRepository,
    profile_repo: UserProfileRepository,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        comment_repo: CommentRepository,
        like_repo: PostLikeRepository,
        profile_repo: UserProfileRepository,
    ) -> Self {
        Self {
            post_repo,
            comment_repo,
            like_repo,
            profile_repo,
            id_gen: IdGenerator::new(),
        }
    }

    async fn profiles_of<'a>(
        &self,
        users: impl Iterator<Item = &'a user::Model>,
    ) -> AppResult<HashMap<String, user_profile::Model>> {
        let mut ids: Vec<String> = users.map(|u| u.id.clone()).collect();
        ids.sort_unstable();
        ids.dedup();

        let profiles = self.profile_repo.find_by_user_ids(&ids).await?;
        Ok(profiles
            .into_iter()
            .map(|p| (p.user_id.clone(), p))
            .collect())
    }

    fn feed_item(
        post: post::Model,
        author: Author,
        comment_count: u64,
        liked: bool,
        now: DateTime<Utc>,
    ) -> FeedItem {
        FeedItem {
            time_ago: relative_time(post.created_at, now),
            id: post.id,
            content: post.content,
            author,
            likes_count: post.likes_count,
            share_count: post.share_count,
            comment_count,
            liked,
            created_at: post.created_at,
        }
    }

    /// All posts newest first, annotated for the viewer.
    pub async fn feed(&self, viewer_id: &str) -> AppResult<Vec<FeedItem>> {
        let rows = self.post_repo.find_feed().await?;

        let post_ids: Vec<String> = rows.iter().map(|(p, _)| p.id.clone()).collect();
        let comment_counts = self.comment_repo.count_by_posts(&post_ids).await?;
        let liked = self.like_repo.find_liked_post_ids(viewer_id, &post_ids).await?;
        let profiles = self.profiles_of(rows.iter().filter_map(|(_, u)| u.as_ref())).await?;

        let now = Utc::now();
        Ok(rows
            .into_iter()
            .filter_map(|(post, author)| {
                let author = Author::from_user(author.as_ref()?, &profiles);
                let count = comment_counts.get(&post.id).copied().unwrap_or(0);
                let is_liked = liked.contains(&post.id);
                Some(Self::feed_item(post, author, count, is_liked, now))
            })
            .collect())
    }

    /// Create a post. Empty or over-long content is ignored and returns `None`.
    pub async fn create(&self, user_id: &str, content: &str) -> AppResult<Option<post::Model>> {
        let Some(content) = accept_content(content, post::MAX_CONTENT_LENGTH) else {
            return Ok(None);
        };

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            content: Set(content.to_string()),
            likes_count: Set(0),
            share_count: Set(0),
            created_at: Set(Utc::now().into()),
        };

        let post = self.post_repo.create(model).await?;
        info!(post_id = %post.id, user_id = %user_id, "Post created");
        Ok(Some(post))
    }

    /// Delete a post. Only its author or an administrator may do so.
    pub async fn delete(&self, actor: &user::Model, post_id: &str) -> AppResult<()> {
        let post = self.post_repo.get_by_id(post_id).await?;

        if post.user_id != actor.id && !actor.is_admin {
            return Err(AppError::Forbidden(
                "You don't have permission to delete this post".to_string(),
            ));
        }

        self.post_repo.delete(post_id).await?;
        info!(post_id = %post_id, actor_id = %actor.id, "Post deleted");
        Ok(())
    }

    /// A post with its comments, newest first.
    pub async fn detail(&self, viewer_id: &str, post_id: &str) -> AppResult<PostDetail> {
        let (post, author) = self
            .post_repo
            .find_with_author(post_id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(post_id.to_string()))?;
        let author = author.ok_or_else(|| AppError::PostNotFound(post_id.to_string()))?;

        let comments = self.comment_repo.find_by_post(post_id).await?;
        let profiles = self
            .profiles_of(
                std::iter::once(&author).chain(comments.iter().filter_map(|(_, u)| u.as_ref())),
            )
            .await?;
        let liked = self.like_repo.is_liked(viewer_id, post_id).await?;

        let now = Utc::now();
        let comment_items: Vec<CommentItem> = comments
            .into_iter()
            .filter_map(|(comment, user)| {
                let author = Author::from_user(user.as_ref()?, &profiles);
                Some(CommentItem {
                    can_delete: comment.user_id == viewer_id,
                    time_ago: relative_time(comment.created_at, now),
                    id: comment.id,
                    content: comment.content,
                    author,
                    likes_count: comment.likes_count,
                    created_at: comment.created_at,
                })
            })
            .collect();

        let author = Author::from_user(&author, &profiles);
        let count = comment_items.len() as u64;

        Ok(PostDetail {
            post: Self::feed_item(post, author, count, liked, now),
            comments: comment_items,
        })
    }

    /// Like the post if the user has not, otherwise remove the like.
    ///
    /// The stored counter is recomputed from the like rows after every toggle.
    pub async fn toggle_like(&self, user_id: &str, post_id: &str) -> AppResult<LikeToggle> {
        self.post_repo.get_by_id(post_id).await?;

        let removed = self.like_repo.delete_by_user_and_post(user_id, post_id).await?;
        let liked = if removed > 0 {
            false
        } else {
            self.like_repo
                .insert_if_absent(post_like::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    user_id: Set(user_id.to_string()),
                    post_id: Set(post_id.to_string()),
                    created_at: Set(Utc::now().into()),
                })
                .await?;
            true
        };

        let count = self.like_repo.count_by_post(post_id).await?;
        let likes_count = i32::try_from(count).unwrap_or(i32::MAX);
        self.post_repo.set_likes_count(post_id, likes_count).await?;

        Ok(LikeToggle { liked, likes_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anifeed_db::test_utils::{in_memory, seed_comment, seed_post, seed_user};
    use sea_orm::DatabaseConnection;
    use std::sync::Arc;

    fn service(db: &Arc<DatabaseConnection>) -> PostService {
        PostService::new(
            PostRepository::new(db.clone()),
            CommentRepository::new(db.clone()),
            PostLikeRepository::new(db.clone()),
            UserProfileRepository::new(db.clone()),
        )
    }

    async fn setup() -> (Arc<DatabaseConnection>, PostService) {
        let db = Arc::new(in_memory().await.unwrap());
        seed_user(&db, "u1", "alice").await.unwrap();
        seed_user(&db, "u2", "bob").await.unwrap();
        let service = service(&db);
        (db, service)
    }

    #[test]
    fn test_accept_content_bounds() {
        assert_eq!(accept_content("  hi  ", 500), Some("hi"));
        assert_eq!(accept_content("   ", 500), None);
        assert_eq!(accept_content(&"a".repeat(500), 500).map(str::len), Some(500));
        assert_eq!(accept_content(&"a".repeat(501), 500), None);
    }

    #[tokio::test]
    async fn test_create_ignores_empty_and_long_content() {
        let (_db, service) = setup().await;

        assert!(service.create("u1", "   ").await.unwrap().is_none());
        assert!(service.create("u1", &"x".repeat(501)).await.unwrap().is_none());

        let post = service.create("u1", "  hello  ").await.unwrap().unwrap();
        assert_eq!(post.content, "hello");
        assert_eq!(service.feed("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_feed_annotates_likes_and_comments() {
        let (db, service) = setup().await;
        seed_post(&db, "p1", "u1", "first").await.unwrap();
        seed_comment(&db, "c1", "p1", "u2", "nice").await.unwrap();
        seed_comment(&db, "c2", "p1", "u2", "again").await.unwrap();
        service.toggle_like("u2", "p1").await.unwrap();

        let feed = service.feed("u2").await.unwrap();
        assert_eq!(feed.len(), 1);
        let item = &feed[0];
        assert_eq!(item.author.username, "alice");
        assert_eq!(item.author.avatar_url, user_profile::DEFAULT_AVATAR_URL);
        assert_eq!(item.comment_count, 2);
        assert!(item.liked);
        assert_eq!(item.likes_count, 1);
        assert_eq!(item.time_ago, "Just now");

        let feed = service.feed("u1").await.unwrap();
        assert!(!feed[0].liked);
    }

    #[tokio::test]
    async fn test_toggle_like_twice_restores_state() {
        let (db, service) = setup().await;
        seed_post(&db, "p1", "u1", "first").await.unwrap();

        let first = service.toggle_like("u2", "p1").await.unwrap();
        assert_eq!(first, LikeToggle { liked: true, likes_count: 1 });

        let second = service.toggle_like("u2", "p1").await.unwrap();
        assert_eq!(second, LikeToggle { liked: false, likes_count: 0 });

        let post = PostRepository::new(db.clone()).get_by_id("p1").await.unwrap();
        assert_eq!(post.likes_count, 0);
    }

    #[tokio::test]
    async fn test_toggle_like_missing_post() {
        let (_db, service) = setup().await;
        assert!(matches!(
            service.toggle_like("u1", "missing").await,
            Err(AppError::PostNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_requires_author_or_admin() {
        let (db, service) = setup().await;
        seed_post(&db, "p1", "u1", "first").await.unwrap();
        seed_post(&db, "p2", "u1", "second").await.unwrap();

        let users = anifeed_db::repositories::UserRepository::new(db.clone());
        let alice = users.get_by_id("u1").await.unwrap();
        let mut bob = users.get_by_id("u2").await.unwrap();

        assert!(matches!(
            service.delete(&bob, "p1").await,
            Err(AppError::Forbidden(_))
        ));

        service.delete(&alice, "p1").await.unwrap();

        bob.is_admin = true;
        service.delete(&bob, "p2").await.unwrap();

        assert!(service.feed("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_detail_lists_comments_newest_first() {
        let (db, service) = setup().await;
        seed_post(&db, "p1", "u1", "first").await.unwrap();
        seed_comment(&db, "c1", "p1", "u2", "older").await.unwrap();
        seed_comment(&db, "c2", "p1", "u1", "newer").await.unwrap();

        let detail = service.detail("u2", "p1").await.unwrap();
        assert_eq!(detail.post.comment_count, 2);
        assert_eq!(detail.comments[0].content, "newer");
        assert!(!detail.comments[0].can_delete);
        assert!(detail.comments[1].can_delete);

        assert!(matches!(
            service.detail("u2", "missing").await,
            Err(AppError::PostNotFound(_))
        ));
    }
}
