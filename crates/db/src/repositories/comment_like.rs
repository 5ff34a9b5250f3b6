//! Comment like repository.

use std::sync::Arc;

use crate::entities::{CommentLike, comment_like};
use anifeed_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    sea_query::OnConflict,
};

/// Comment like repository for database operations.
#[derive(Clone)]
pub struct CommentLikeRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentLikeRepository {
    /// Create a new comment like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a like unless the (user, comment) pair already exists.
    pub async fn insert_if_absent(&self, model: comment_like::ActiveModel) -> AppResult<u64> {
        CommentLike::insert(model)
            .on_conflict(
                OnConflict::columns([
                    comment_like::Column::UserId,
                    comment_like::Column::CommentId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete the like of a user on a comment, returning the rows removed.
    pub async fn delete_by_user_and_comment(
        &self,
        user_id: &str,
        comment_id: &str,
    ) -> AppResult<u64> {
        let result = CommentLike::delete_many()
            .filter(comment_like::Column::UserId.eq(user_id))
            .filter(comment_like::Column::CommentId.eq(comment_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Count likes on a comment.
    pub async fn count_by_comment(&self, comment_id: &str) -> AppResult<u64> {
        CommentLike::find()
            .filter(comment_like::Column::CommentId.eq(comment_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{in_memory, seed_comment, seed_post, seed_user};
    use chrono::Utc;
    use sea_orm::Set;

    #[tokio::test]
    async fn test_like_then_unlike_comment() {
        let db = in_memory().await.unwrap();
        seed_user(&db, "u1", "alice").await.unwrap();
        seed_post(&db, "p1", "u1", "hello").await.unwrap();
        seed_comment(&db, "c1", "p1", "u1", "nice").await.unwrap();

        let repo = CommentLikeRepository::new(Arc::new(db));
        let written = repo
            .insert_if_absent(comment_like::ActiveModel {
                id: Set("l1".to_string()),
                user_id: Set("u1".to_string()),
                comment_id: Set("c1".to_string()),
                created_at: Set(Utc::now().into()),
            })
            .await
            .unwrap();
        assert_eq!(written, 1);
        assert_eq!(repo.count_by_comment("c1").await.unwrap(), 1);

        assert_eq!(repo.delete_by_user_and_comment("u1", "c1").await.unwrap(), 1);
        assert_eq!(repo.count_by_comment("c1").await.unwrap(), 0);
    }
}
