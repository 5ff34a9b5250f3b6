//! Comment service.

use std::sync::Arc;

use anifeed_common::{AppError, AppResult, IdGenerator};
use anifeed_db::{
    entities::{comment, comment_like, post},
    repositories::{CommentLikeRepository, CommentRepository, PostRepository},
};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::Set;
use tracing::{info, warn};

use super::post::{LikeToggle, accept_content};

/// Hook invoked when someone comments on another user's post.
#[async_trait]
pub trait CommentObserver: Send + Sync {
    /// Called after `comment` was stored under `post`. Errors are logged only.
    async fn on_comment(&self, post: &post::Model, comment: &comment::Model) -> AppResult<()>;
}

/// Observer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCommentObserver;

#[async_trait]
impl CommentObserver for NoOpCommentObserver {
    async fn on_comment(&self, _post: &post::Model, _comment: &comment::Model) -> AppResult<()> {
        Ok(())
    }
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    like_repo: CommentLikeRepository,
    post_repo: PostRepository,
    observer: Arc<dyn CommentObserver>,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub fn new(
        comment_repo: CommentRepository,
        like_repo: CommentLikeRepository,
        post_repo: PostRepository,
        observer: Arc<dyn CommentObserver>,
    ) -> Self {
        Self {
            comment_repo,
            like_repo,
            post_repo,
            observer,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add a comment to a post.
    ///
    /// Empty content or content over 280 characters is dropped and yields
    /// `None`.
    pub async fn create(
        &self,
        user_id: &str,
        post_id: &str,
        content: &str,
    ) -> AppResult<Option<comment::Model>> {
        let post = self.post_repo.get_by_id(post_id).await?;

        let Some(content) = accept_content(content, comment::MAX_CONTENT_LENGTH) else {
            return Ok(None);
        };

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post.id.clone()),
            user_id: Set(user_id.to_string()),
            content: Set(content.to_string()),
            likes_count: Set(0),
            created_at: Set(Utc::now().into()),
        };
        let comment = self.comment_repo.create(model).await?;
        info!(comment_id = %comment.id, post_id = %post.id, "Comment created");

        if post.user_id != user_id {
            if let Err(e) = self.observer.on_comment(&post, &comment).await {
                warn!(error = %e, comment_id = %comment.id, "Comment observer failed");
            }
        }

        Ok(Some(comment))
    }

    /// Delete a comment. Only its author may do so.
    pub async fn delete(&self, user_id: &str, comment_id: &str) -> AppResult<comment::Model> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;

        if comment.user_id != user_id {
            return Err(AppError::Forbidden(
                "You can only delete your own comments".to_string(),
            ));
        }

        self.comment_repo.delete(comment_id).await?;
        info!(comment_id = %comment_id, "Comment deleted");
        Ok(comment)
    }

    /// Like the comment if the user has not, otherwise remove the like.
    pub async fn toggle_like(&self, user_id: &str, comment_id: &str) -> AppResult<LikeToggle> {
        self.comment_repo.get_by_id(comment_id).await?;

        let removed = self
            .like_repo
            .delete_by_user_and_comment(user_id, comment_id)
            .await?;
        let liked = if removed > 0 {
            false
        } else {
            self.like_repo
                .insert_if_absent(comment_like::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    user_id: Set(user_id.to_string()),
                    comment_id: Set(comment_id.to_string()),
                    created_at: Set(Utc::now().into()),
                })
                .await?;
            true
        };

        let count = self.like_repo.count_by_comment(comment_id).await?;
        let likes_count = i32::try_from(count).unwrap_or(i32::MAX);
        self.comment_repo
            .set_likes_count(comment_id, likes_count)
            .await?;

        Ok(LikeToggle { liked, likes_count })
    }
}
