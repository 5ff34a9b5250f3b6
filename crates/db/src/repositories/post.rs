//! Post repository.

use std::sync::Arc;

use crate::entities::{Post, User, post, user};
use anifeed_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    sea_query::Expr,
};

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Find a post together with its author.
    pub async fn find_with_author(
        &self,
        id: &str,
    ) -> AppResult<Option<(post::Model, Option<user::Model>)>> {
        Post::find_by_id(id)
            .find_also_related(User)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All posts with their authors, newest first.
    pub async fn find_feed(&self) -> AppResult<Vec<(post::Model, Option<user::Model>)>> {
        Post::find()
            .find_also_related(User)
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a post; comments and likes go with it (foreign key cascade).
    pub async fn delete(&self, id: &str) -> AppResult<u64> {
        let result = Post::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Overwrite the denormalized like counter.
    pub async fn set_likes_count(&self, id: &str, count: i32) -> AppResult<()> {
        Post::update_many()
            .col_expr(post::Column::LikesCount, Expr::value(count))
            .filter(post::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Comment, PostLike, post_like};
    use crate::test_utils::{in_memory, seed_comment, seed_post, seed_user};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, PaginatorTrait, Set};

    fn create_test_post(id: &str, user_id: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            content: "Hello".to_string(),
            likes_count: 0,
            share_count: 0,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_by_id_found() {
        let post = create_test_post("post1", "user1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post.clone()]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo.get_by_id("post1").await.unwrap();

        assert_eq!(result.id, "post1");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_reports_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        assert_eq!(repo.delete("post1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_feed_newest_first_with_author() {
        let db = in_memory().await.unwrap();
        seed_user(&db, "u1", "alice").await.unwrap();
        seed_post(&db, "p1", "u1", "first").await.unwrap();
        seed_post(&db, "p2", "u1", "second").await.unwrap();

        let repo = PostRepository::new(Arc::new(db));
        let feed = repo.find_feed().await.unwrap();

        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].0.id, "p2");
        assert_eq!(feed[0].1.as_ref().unwrap().username, "alice");
    }

    #[tokio::test]
    async fn test_delete_cascades_to_comments_and_likes() {
        let db = in_memory().await.unwrap();
        seed_user(&db, "u1", "alice").await.unwrap();
        seed_post(&db, "p1", "u1", "hello").await.unwrap();
        seed_comment(&db, "c1", "p1", "u1", "nice").await.unwrap();
        post_like::ActiveModel {
            id: Set("l1".to_string()),
            user_id: Set("u1".to_string()),
            post_id: Set("p1".to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&db)
        .await
        .unwrap();

        let db = Arc::new(db);
        let repo = PostRepository::new(db.clone());
        assert_eq!(repo.delete("p1").await.unwrap(), 1);

        assert_eq!(Comment::find().count(db.as_ref()).await.unwrap(), 0);
        assert_eq!(PostLike::find().count(db.as_ref()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_set_likes_count() {
        let db = in_memory().await.unwrap();
        seed_user(&db, "u1", "alice").await.unwrap();
        seed_post(&db, "p1", "u1", "hello").await.unwrap();

        let repo = PostRepository::new(Arc::new(db));
        repo.set_likes_count("p1", 3).await.unwrap();

        assert_eq!(repo.get_by_id("p1").await.unwrap().likes_count, 3);
    }
}
