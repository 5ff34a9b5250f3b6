//! Watchlist repository.
//!
//! The favorite toggle and the title upsert are single conditional
//! statements keyed on the `(user_id, mal_id)` unique index, so concurrent
//! identical requests never race into a uniqueness violation.

use std::sync::Arc;

use crate::entities::{WatchlistEntry, watchlist_entry};
use anifeed_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::Expr, sea_query::OnConflict,
};

/// Which catalog-derived columns an upsert may overwrite on an existing
/// entry. Title, status and rating are always written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertColumns {
    /// Overwrite `image_url`.
    pub image_url: bool,
    /// Overwrite `total_episodes`.
    pub total_episodes: bool,
}

/// Watchlist repository for database operations.
#[derive(Clone)]
pub struct WatchlistRepository {
    db: Arc<DatabaseConnection>,
}

impl WatchlistRepository {
    /// Create a new watchlist repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Entries of a user, most recently added first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<watchlist_entry::Model>> {
        WatchlistEntry::find()
            .filter(watchlist_entry::Column::UserId.eq(user_id))
            .order_by_desc(watchlist_entry::Column::AddedAt)
            .order_by_desc(watchlist_entry::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the entry of a user for a catalog ID.
    pub async fn find_by_user_and_mal_id(
        &self,
        user_id: &str,
        mal_id: i32,
    ) -> AppResult<Option<watchlist_entry::Model>> {
        WatchlistEntry::find()
            .filter(watchlist_entry::Column::UserId.eq(user_id))
            .filter(watchlist_entry::Column::MalId.eq(mal_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether the user already tracks the catalog ID.
    pub async fn exists(&self, user_id: &str, mal_id: i32) -> AppResult<bool> {
        let count = WatchlistEntry::find()
            .filter(watchlist_entry::Column::UserId.eq(user_id))
            .filter(watchlist_entry::Column::MalId.eq(mal_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Whether the user already has an entry with exactly this title.
    pub async fn exists_with_title(&self, user_id: &str, title: &str) -> AppResult<bool> {
        let count = WatchlistEntry::find()
            .filter(watchlist_entry::Column::UserId.eq(user_id))
            .filter(watchlist_entry::Column::Title.eq(title))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// `(mal_id, is_favorite)` for every entry of a user.
    pub async fn find_marks(&self, user_id: &str) -> AppResult<Vec<(i32, bool)>> {
        WatchlistEntry::find()
            .select_only()
            .column(watchlist_entry::Column::MalId)
            .column(watchlist_entry::Column::IsFavorite)
            .filter(watchlist_entry::Column::UserId.eq(user_id))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert an entry unless the user already tracks its catalog ID.
    ///
    /// Returns the number of rows written (0 or 1).
    pub async fn insert_if_absent(&self, model: watchlist_entry::ActiveModel) -> AppResult<u64> {
        WatchlistEntry::insert(model)
            .on_conflict(
                OnConflict::columns([
                    watchlist_entry::Column::UserId,
                    watchlist_entry::Column::MalId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Flip the favorite flag of an existing entry in place.
    ///
    /// Returns the number of rows updated; 0 means the entry does not exist.
    pub async fn flip_favorite(&self, user_id: &str, mal_id: i32) -> AppResult<u64> {
        let result = WatchlistEntry::update_many()
            .col_expr(
                watchlist_entry::Column::IsFavorite,
                Expr::cust("NOT is_favorite"),
            )
            .filter(watchlist_entry::Column::UserId.eq(user_id))
            .filter(watchlist_entry::Column::MalId.eq(mal_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Insert the entry, or update the existing one for the same
    /// `(user_id, mal_id)` in the same statement.
    pub async fn upsert(
        &self,
        model: watchlist_entry::ActiveModel,
        columns: UpsertColumns,
    ) -> AppResult<()> {
        let mut update = vec![
            watchlist_entry::Column::Title,
            watchlist_entry::Column::Status,
            watchlist_entry::Column::Rating,
        ];
        if columns.image_url {
            update.push(watchlist_entry::Column::ImageUrl);
        }
        if columns.total_episodes {
            update.push(watchlist_entry::Column::TotalEpisodes);
        }

        WatchlistEntry::insert(model)
            .on_conflict(
                OnConflict::columns([
                    watchlist_entry::Column::UserId,
                    watchlist_entry::Column::MalId,
                ])
                .update_columns(update)
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete the entry of a user for a catalog ID, returning the rows removed.
    pub async fn delete_by_user_and_mal_id(&self, user_id: &str, mal_id: i32) -> AppResult<u64> {
        let result = WatchlistEntry::delete_many()
            .filter(watchlist_entry::Column::UserId.eq(user_id))
            .filter(watchlist_entry::Column::MalId.eq(mal_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::watchlist_entry::EntryStatus;
    use crate::test_utils::{in_memory, seed_user};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn entry(id: &str, user_id: &str, mal_id: i32, title: &str) -> watchlist_entry::ActiveModel {
        watchlist_entry::ActiveModel {
            id: Set(id.to_string()),
            user_id: Set(user_id.to_string()),
            mal_id: Set(mal_id),
            title: Set(title.to_string()),
            image_url: Set(Some("https://cdn.example/a.webp".to_string())),
            status: Set(Some(EntryStatus::Ongoing)),
            rating: Set(Some(8.0)),
            is_favorite: Set(false),
            total_episodes: Set(Some(220)),
            added_at: Set(Utc::now().into()),
        }
    }

    async fn repo_with_user() -> WatchlistRepository {
        let db = in_memory().await.unwrap();
        seed_user(&db, "u1", "alice").await.unwrap();
        WatchlistRepository::new(Arc::new(db))
    }

    #[tokio::test]
    async fn test_flip_favorite_missing_entry() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = WatchlistRepository::new(db);
        assert_eq!(repo.flip_favorite("user1", 20).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insert_if_absent_rejects_duplicate_pair() {
        let repo = repo_with_user().await;

        assert_eq!(repo.insert_if_absent(entry("e1", "u1", 20, "Naruto")).await.unwrap(), 1);
        assert_eq!(repo.insert_if_absent(entry("e2", "u1", 20, "Naruto")).await.unwrap(), 0);

        assert_eq!(repo.find_by_user("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_flip_favorite_toggles_in_place() {
        let repo = repo_with_user().await;
        repo.insert_if_absent(entry("e1", "u1", 20, "Naruto")).await.unwrap();

        assert_eq!(repo.flip_favorite("u1", 20).await.unwrap(), 1);
        let found = repo.find_by_user_and_mal_id("u1", 20).await.unwrap().unwrap();
        assert!(found.is_favorite);

        repo.flip_favorite("u1", 20).await.unwrap();
        let found = repo.find_by_user_and_mal_id("u1", 20).await.unwrap().unwrap();
        assert!(!found.is_favorite);
    }

    #[tokio::test]
    async fn test_upsert_keeps_image_when_not_supplied() {
        let repo = repo_with_user().await;
        repo.insert_if_absent(entry("e1", "u1", 20, "Naruto")).await.unwrap();

        let mut update = entry("e2", "u1", 20, "Naruto Shippuden");
        update.image_url = Set(None);
        update.total_episodes = Set(None);
        update.status = Set(Some(EntryStatus::Watching));
        repo.upsert(update, UpsertColumns::default()).await.unwrap();

        let entries = repo.find_by_user("u1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "e1");
        assert_eq!(entries[0].title, "Naruto Shippuden");
        assert_eq!(entries[0].status, Some(EntryStatus::Watching));
        assert_eq!(entries[0].image_url.as_deref(), Some("https://cdn.example/a.webp"));
        assert_eq!(entries[0].total_episodes, Some(220));
    }

    #[tokio::test]
    async fn test_marks_and_delete() {
        let repo = repo_with_user().await;
        repo.insert_if_absent(entry("e1", "u1", 20, "Naruto")).await.unwrap();
        repo.insert_if_absent(entry("e2", "u1", 21, "One Piece")).await.unwrap();
        repo.flip_favorite("u1", 21).await.unwrap();

        let mut marks = repo.find_marks("u1").await.unwrap();
        marks.sort_unstable();
        assert_eq!(marks, vec![(20, false), (21, true)]);

        assert!(repo.exists_with_title("u1", "One Piece").await.unwrap());
        assert_eq!(repo.delete_by_user_and_mal_id("u1", 21).await.unwrap(), 1);
        assert_eq!(repo.delete_by_user_and_mal_id("u1", 21).await.unwrap(), 0);
        assert!(!repo.exists("u1", 21).await.unwrap());
    }
}
