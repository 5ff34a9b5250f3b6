//! Post like repository.

use std::collections::HashSet;
use std::sync::Arc;

use crate::entities::{PostLike, post_like};
use anifeed_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
    sea_query::OnConflict,
};

/// Post like repository for database operations.
#[derive(Clone)]
pub struct PostLikeRepository {
    db: Arc<DatabaseConnection>,
}

impl PostLikeRepository {
    /// Create a new post like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Check if a post is liked by user.
    pub async fn is_liked(&self, user_id: &str, post_id: &str) -> AppResult<bool> {
        let count = PostLike::find()
            .filter(post_like::Column::UserId.eq(user_id))
            .filter(post_like::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// IDs of the given posts that the user has liked.
    pub async fn find_liked_post_ids(
        &self,
        user_id: &str,
        post_ids: &[String],
    ) -> AppResult<HashSet<String>> {
        if post_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<String> = PostLike::find()
            .select_only()
            .column(post_like::Column::PostId)
            .filter(post_like::Column::UserId.eq(user_id))
            .filter(post_like::Column::PostId.is_in(post_ids.to_vec()))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(ids.into_iter().collect())
    }

    /// Insert a like unless the (user, post) pair already exists.
    ///
    /// Returns the number of rows written (0 or 1).
    pub async fn insert_if_absent(&self, model: post_like::ActiveModel) -> AppResult<u64> {
        PostLike::insert(model)
            .on_conflict(
                OnConflict::columns([post_like::Column::UserId, post_like::Column::PostId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete the like of a user on a post, returning the rows removed.
    pub async fn delete_by_user_and_post(&self, user_id: &str, post_id: &str) -> AppResult<u64> {
        let result = PostLike::delete_many()
            .filter(post_like::Column::UserId.eq(user_id))
            .filter(post_like::Column::PostId.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Count likes on a post.
    pub async fn count_by_post(&self, post_id: &str) -> AppResult<u64> {
        PostLike::find()
            .filter(post_like::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{in_memory, seed_post, seed_user};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn like(id: &str, user_id: &str, post_id: &str) -> post_like::ActiveModel {
        post_like::ActiveModel {
            id: Set(id.to_string()),
            user_id: Set(user_id.to_string()),
            post_id: Set(post_id.to_string()),
            created_at: Set(Utc::now().into()),
        }
    }

    #[tokio::test]
    async fn test_delete_by_user_and_post() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = PostLikeRepository::new(db);
        assert_eq!(repo.delete_by_user_and_post("user1", "post1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_like_is_ignored() {
        let db = in_memory().await.unwrap();
        seed_user(&db, "u1", "alice").await.unwrap();
        seed_post(&db, "p1", "u1", "hello").await.unwrap();

        let repo = PostLikeRepository::new(Arc::new(db));
        assert_eq!(repo.insert_if_absent(like("l1", "u1", "p1")).await.unwrap(), 1);
        assert_eq!(repo.insert_if_absent(like("l2", "u1", "p1")).await.unwrap(), 0);

        assert_eq!(repo.count_by_post("p1").await.unwrap(), 1);
        assert!(repo.is_liked("u1", "p1").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_liked_post_ids() {
        let db = in_memory().await.unwrap();
        seed_user(&db, "u1", "alice").await.unwrap();
        seed_post(&db, "p1", "u1", "one").await.unwrap();
        seed_post(&db, "p2", "u1", "two").await.unwrap();

        let repo = PostLikeRepository::new(Arc::new(db));
        repo.insert_if_absent(like("l1", "u1", "p2")).await.unwrap();

        let liked = repo
            .find_liked_post_ids("u1", &["p1".to_string(), "p2".to_string()])
            .await
            .unwrap();
        assert_eq!(liked, HashSet::from(["p2".to_string()]));
    }
}
