//! User profile entity (bio, images and privacy settings).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Shown when the user never uploaded a profile picture.
pub const DEFAULT_AVATAR_URL: &str = "/static/images/profile_pics/img.png";

/// Shown when the user never uploaded a cover image.
pub const DEFAULT_COVER_URL: &str = "/static/images/cover_pics/cover_page.jpg";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_profile")]
pub struct Model {
    /// Same as user.id (1:1 relationship)
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,

    #[sea_orm(column_type = "Text")]
    pub bio: String,

    #[sea_orm(column_type = "Text")]
    pub location: String,

    /// Public URL of the uploaded profile picture
    #[sea_orm(nullable)]
    pub profile_picture: Option<String>,

    /// Public URL of the uploaded cover image
    #[sea_orm(nullable)]
    pub cover_image: Option<String>,

    /// Show the account email on the profile page
    #[sea_orm(default_value = false)]
    pub show_email: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Profile picture URL, falling back to the bundled default.
    #[must_use]
    pub fn avatar_url(&self) -> String {
        resolve_avatar_url(Some(self))
    }

    /// Cover image URL, falling back to the bundled default.
    #[must_use]
    pub fn cover_image_url(&self) -> String {
        self.cover_image
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_COVER_URL)
            .to_string()
    }
}

/// Avatar URL for a user who may not have a profile row yet.
#[must_use]
pub fn resolve_avatar_url(profile: Option<&Model>) -> String {
    profile
        .and_then(|p| p.profile_picture.as_deref())
        .filter(|url| !url.is_empty())
        .unwrap_or(DEFAULT_AVATAR_URL)
        .to_string()
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn profile(picture: Option<&str>, cover: Option<&str>) -> Model {
        Model {
            user_id: "user1".to_string(),
            bio: String::new(),
            location: String::new(),
            profile_picture: picture.map(str::to_string),
            cover_image: cover.map(str::to_string),
            show_email: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_avatar_falls_back_to_default() {
        assert_eq!(profile(None, None).avatar_url(), DEFAULT_AVATAR_URL);
        assert_eq!(profile(Some(""), None).avatar_url(), DEFAULT_AVATAR_URL);
        assert_eq!(resolve_avatar_url(None), DEFAULT_AVATAR_URL);
    }

    #[test]
    fn test_uploaded_images_win() {
        let p = profile(Some("/media/profile_pics/a.png"), Some("/media/cover_pics/b.jpg"));
        assert_eq!(p.avatar_url(), "/media/profile_pics/a.png");
        assert_eq!(p.cover_image_url(), "/media/cover_pics/b.jpg");
    }

    #[test]
    fn test_cover_falls_back_to_default() {
        assert_eq!(profile(None, None).cover_image_url(), DEFAULT_COVER_URL);
    }
}
