//! User profile repository.

use std::sync::Arc;

use crate::entities::{UserProfile, user_profile};
use anifeed_common::{AppError, AppResult};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    sea_query::OnConflict,
};

/// User profile repository for database operations.
#[derive(Clone)]
pub struct UserProfileRepository {
    db: Arc<DatabaseConnection>,
}

impl UserProfileRepository {
    /// Create a new user profile repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a profile by user ID.
    pub async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<user_profile::Model>> {
        UserProfile::find_by_id(user_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find profiles for several users.
    pub async fn find_by_user_ids(&self, user_ids: &[String]) -> AppResult<Vec<user_profile::Model>> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        UserProfile::find()
            .filter(user_profile::Column::UserId.is_in(user_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch the profile of a user, creating an empty one if it does not exist.
    ///
    /// Safe to call concurrently: the insert is a no-op when the row appears
    /// between the lookup and the write.
    pub async fn find_or_create(&self, user_id: &str) -> AppResult<user_profile::Model> {
        if let Some(profile) = self.find_by_user_id(user_id).await? {
            return Ok(profile);
        }

        let model = user_profile::ActiveModel {
            user_id: Set(user_id.to_string()),
            bio: Set(String::new()),
            location: Set(String::new()),
            profile_picture: Set(None),
            cover_image: Set(None),
            show_email: Set(false),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        UserProfile::insert(model)
            .on_conflict(
                OnConflict::column(user_profile::Column::UserId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_user_id(user_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Profile for {user_id} vanished")))
    }

    /// Create a new profile.
    pub async fn create(&self, model: user_profile::ActiveModel) -> AppResult<user_profile::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a profile.
    pub async fn update(&self, model: user_profile::ActiveModel) -> AppResult<user_profile::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
