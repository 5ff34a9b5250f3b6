//! Profile service.

use std::sync::Arc;

use anifeed_common::{AppError, AppResult, StorageBackend, generate_storage_key};
use anifeed_db::{
    entities::{user, user_profile},
    repositories::{UserProfileRepository, UserRepository, WatchlistRepository},
};
use chrono::Utc;
use sea_orm::Set;
use serde::Serialize;
use tracing::{info, warn};
use validator::Validate;

use super::watchlist::WatchlistStats;

/// Storage folder of profile pictures.
pub const PROFILE_PICS_FOLDER: &str = "profile_pics";

/// Storage folder of cover images.
pub const COVER_PICS_FOLDER: &str = "cover_pics";

/// An uploaded image from the edit form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Profile edit form.
#[derive(Debug, Clone, Default, Validate)]
pub struct EditProfileInput {
    #[validate(length(max = 256))]
    pub display_name: Option<String>,

    #[validate(length(max = 128))]
    pub username: Option<String>,

    #[validate(length(max = 256))]
    pub location: Option<String>,

    #[validate(length(max = 2048))]
    pub bio: Option<String>,

    pub show_email: bool,

    pub profile_picture: Option<ImageUpload>,

    pub cover_image: Option<ImageUpload>,
}

/// Account fields shown on the profile page.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUser {
    pub id: String,
    pub username: String,
    pub name: Option<String>,
    /// Present only when the user opted to show it.
    pub email: Option<String>,
}

/// Profile fields with resolved image URLs.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub bio: String,
    pub location: String,
    pub avatar_url: String,
    pub cover_image_url: String,
    pub show_email: bool,
}

/// Data behind the profile page.
#[derive(Debug, Clone, Serialize)]
pub struct ProfilePage {
    pub user: ProfileUser,
    pub profile: ProfileView,
    pub watchlist_count: usize,
    pub stats: WatchlistStats,
}

/// Profile service for business logic.
#[derive(Clone)]
pub struct ProfileService {
    user_repo: UserRepository,
    profile_repo: UserProfileRepository,
    watchlist_repo: WatchlistRepository,
    storage: Arc<dyn StorageBackend>,
}

impl ProfileService {
    /// Create a new profile service.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        profile_repo: UserProfileRepository,
        watchlist_repo: WatchlistRepository,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            user_repo,
            profile_repo,
            watchlist_repo,
            storage,
        }
    }

    /// Profile of the user, created empty on first access.
    pub async fn get_or_create(&self, user_id: &str) -> AppResult<user_profile::Model> {
        self.profile_repo.find_or_create(user_id).await
    }

    /// Everything the profile page shows.
    pub async fn page(&self, user: &user::Model) -> AppResult<ProfilePage> {
        let profile = self.get_or_create(&user.id).await?;
        let entries = self.watchlist_repo.find_by_user(&user.id).await?;
        let stats = WatchlistStats::from_entries(&entries);

        Ok(ProfilePage {
            user: ProfileUser {
                id: user.id.clone(),
                username: user.username.clone(),
                name: user.name.clone(),
                email: profile.show_email.then(|| user.email.clone()),
            },
            profile: ProfileView {
                avatar_url: profile.avatar_url(),
                cover_image_url: profile.cover_image_url(),
                bio: profile.bio,
                location: profile.location,
                show_email: profile.show_email,
            },
            watchlist_count: entries.len(),
            stats,
        })
    }

    async fn store_image(
        &self,
        folder: &str,
        user_id: &str,
        upload: &ImageUpload,
    ) -> AppResult<String> {
        let key = generate_storage_key(folder, user_id, &upload.file_name);
        let file = self
            .storage
            .upload(&key, &upload.data, &upload.content_type)
            .await?;
        Ok(file.url)
    }

    /// Remove an image this service stored earlier.
    ///
    /// URLs the storage backend did not produce (the static defaults) are
    /// left alone. Failures are logged since the profile already points
    /// at the new image.
    async fn discard_image(&self, url: &str) {
        let Some(key) = self.storage.key_for_url(url) else {
            return;
        };
        if let Err(e) = self.storage.delete(&key).await {
            warn!(key = %key, error = %e, "Failed to delete replaced image");
        }
    }

    /// Apply the edit form.
    ///
    /// A username already used by another account is rejected before
    /// anything is written. Images are only replaced when a new one was
    /// uploaded, and the replaced file is deleted once the profile is saved.
    pub async fn edit(&self, user: user::Model, input: EditProfileInput) -> AppResult<()> {
        input.validate()?;

        let username = input
            .username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);

        if let Some(name) = &username {
            if self.user_repo.is_username_taken(name, Some(&user.id)).await? {
                return Err(AppError::Conflict("Username already taken.".to_string()));
            }
        }

        let profile = self.get_or_create(&user.id).await?;

        let avatar = match &input.profile_picture {
            Some(upload) => Some(self.store_image(PROFILE_PICS_FOLDER, &user.id, upload).await?),
            None => None,
        };
        let cover = match &input.cover_image {
            Some(upload) => Some(self.store_image(COVER_PICS_FOLDER, &user.id, upload).await?),
            None => None,
        };

        let replaced_avatar = avatar.as_ref().and(profile.profile_picture.clone());
        let replaced_cover = cover.as_ref().and(profile.cover_image.clone());

        let user_id = user.id.clone();
        let now = Utc::now();

        let mut user_model: user::ActiveModel = user.into();
        if let Some(name) = username {
            user_model.username_lower = Set(name.to_lowercase());
            user_model.username = Set(name);
        }
        user_model.name = Set(input
            .display_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()));
        user_model.updated_at = Set(Some(now.into()));
        self.user_repo.update(user_model).await?;

        let mut profile_model: user_profile::ActiveModel = profile.into();
        profile_model.bio = Set(input.bio.unwrap_or_default());
        profile_model.location = Set(input.location.unwrap_or_default());
        profile_model.show_email = Set(input.show_email);
        if let Some(url) = avatar {
            profile_model.profile_picture = Set(Some(url));
        }
        if let Some(url) = cover {
            profile_model.cover_image = Set(Some(url));
        }
        profile_model.updated_at = Set(Some(now.into()));
        self.profile_repo.update(profile_model).await?;

        for url in replaced_avatar.iter().chain(replaced_cover.iter()) {
            self.discard_image(url).await;
        }

        info!(user_id = %user_id, "Profile updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anifeed_common::{IdGenerator, LocalStorage};
    use anifeed_db::{
        entities::user_profile::DEFAULT_AVATAR_URL,
        test_utils::{in_memory, seed_user},
    };
    use sea_orm::DatabaseConnection;
    use std::path::PathBuf;

    fn media_dir() -> PathBuf {
        std::env::temp_dir().join(format!("anifeed-profile-{}", IdGenerator::new().generate()))
    }

    async fn setup() -> (Arc<DatabaseConnection>, ProfileService, PathBuf) {
        let db = Arc::new(in_memory().await.unwrap());
        seed_user(&db, "u1", "alice").await.unwrap();
        seed_user(&db, "u2", "bob").await.unwrap();

        let dir = media_dir();
        let service = ProfileService::new(
            UserRepository::new(db.clone()),
            UserProfileRepository::new(db.clone()),
            WatchlistRepository::new(db.clone()),
            Arc::new(LocalStorage::new(dir.clone(), "/media".to_string())),
        );
        (db, service, dir)
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let (_db, service, _dir) = setup().await;

        let first = service.get_or_create("u1").await.unwrap();
        let second = service.get_or_create("u1").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.avatar_url(), DEFAULT_AVATAR_URL);
    }

    #[tokio::test]
    async fn test_page_hides_email_by_default() {
        let (db, service, _dir) = setup().await;
        let user = UserRepository::new(db).get_by_id("u1").await.unwrap();

        let page = service.page(&user).await.unwrap();
        assert_eq!(page.user.username, "alice");
        assert!(page.user.email.is_none());
        assert_eq!(page.watchlist_count, 0);
        assert_eq!(page.stats.total_episodes, 0);
    }

    #[tokio::test]
    async fn test_edit_rejects_taken_username() {
        let (db, service, _dir) = setup().await;
        let users = UserRepository::new(db);
        let alice = users.get_by_id("u1").await.unwrap();

        let input = EditProfileInput {
            username: Some("BOB".to_string()),
            ..EditProfileInput::default()
        };
        let err = service.edit(alice, input).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == "Username already taken."));
        assert_eq!(users.get_by_id("u1").await.unwrap().username, "alice");
    }

    #[tokio::test]
    async fn test_edit_updates_fields_and_uploads() {
        let (db, service, dir) = setup().await;
        let users = UserRepository::new(db);
        let alice = users.get_by_id("u1").await.unwrap();

        let input = EditProfileInput {
            display_name: Some("Alice A.".to_string()),
            username: Some("alice2".to_string()),
            location: Some("Osaka".to_string()),
            bio: Some("Watching everything".to_string()),
            show_email: true,
            profile_picture: Some(ImageUpload {
                file_name: "me.png".to_string(),
                content_type: "image/png".to_string(),
                data: b"png".to_vec(),
            }),
            cover_image: None,
        };
        service.edit(alice, input).await.unwrap();

        let alice = users.get_by_id("u1").await.unwrap();
        assert_eq!(alice.username, "alice2");
        assert_eq!(alice.username_lower, "alice2");
        assert_eq!(alice.name.as_deref(), Some("Alice A."));

        let page = service.page(&alice).await.unwrap();
        assert_eq!(page.profile.location, "Osaka");
        assert!(page.profile.avatar_url.starts_with("/media/profile_pics/u1_"));
        assert_eq!(page.profile.cover_image_url, user_profile::DEFAULT_COVER_URL);
        assert_eq!(page.user.email.as_deref(), Some("alice@example.com"));

        // Keeping the same username is not a collision.
        let input = EditProfileInput {
            username: Some("alice2".to_string()),
            ..EditProfileInput::default()
        };
        service.edit(alice, input).await.unwrap();
        let alice = users.get_by_id("u1").await.unwrap();
        let page = service.page(&alice).await.unwrap();
        assert!(page.profile.avatar_url.starts_with("/media/profile_pics/"));
        assert!(page.user.email.is_none());

        let _ = std::fs::remove_dir_all(dir);
    }

    fn png(name: &str) -> Option<ImageUpload> {
        Some(ImageUpload {
            file_name: name.to_string(),
            content_type: "image/png".to_string(),
            data: b"png".to_vec(),
        })
    }

    fn stored_path(dir: &std::path::Path, url: &str) -> PathBuf {
        dir.join(url.trim_start_matches("/media/"))
    }

    #[tokio::test]
    async fn test_edit_deletes_replaced_images() {
        let (db, service, dir) = setup().await;
        let users = UserRepository::new(db);

        let input = EditProfileInput {
            profile_picture: png("first.png"),
            cover_image: png("cover.png"),
            ..EditProfileInput::default()
        };
        service
            .edit(users.get_by_id("u1").await.unwrap(), input)
            .await
            .unwrap();
        let first = service.get_or_create("u1").await.unwrap();
        let first_avatar = first.profile_picture.clone().unwrap();
        let first_cover = first.cover_image.clone().unwrap();
        assert!(stored_path(&dir, &first_avatar).exists());
        assert!(stored_path(&dir, &first_cover).exists());

        // Only the avatar is replaced; the cover stays on disk.
        let input = EditProfileInput {
            profile_picture: png("second.png"),
            ..EditProfileInput::default()
        };
        service
            .edit(users.get_by_id("u1").await.unwrap(), input)
            .await
            .unwrap();
        let second = service.get_or_create("u1").await.unwrap();
        let second_avatar = second.profile_picture.unwrap();

        assert_ne!(second_avatar, first_avatar);
        assert!(stored_path(&dir, &second_avatar).exists());
        assert!(!stored_path(&dir, &first_avatar).exists());
        assert_eq!(second.cover_image.as_deref(), Some(first_cover.as_str()));
        assert!(stored_path(&dir, &first_cover).exists());

        let _ = std::fs::remove_dir_all(dir);
    }
}
