//! Watchlist entry entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Status label of a watchlist entry.
///
/// The first four values are derived from the catalog's airing status; the
/// rest are set by the user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "ongoing")]
    Ongoing,
    #[sea_orm(string_value = "upcoming")]
    Upcoming,
    #[sea_orm(string_value = "unknown")]
    Unknown,
    #[sea_orm(string_value = "watching")]
    Watching,
    #[sea_orm(string_value = "plan_to_watch")]
    PlanToWatch,
    #[sea_orm(string_value = "dropped")]
    Dropped,
    #[sea_orm(string_value = "on_hold")]
    OnHold,
}

impl EntryStatus {
    /// Database/string form of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Ongoing => "ongoing",
            Self::Upcoming => "upcoming",
            Self::Unknown => "unknown",
            Self::Watching => "watching",
            Self::PlanToWatch => "plan_to_watch",
            Self::Dropped => "dropped",
            Self::OnHold => "on_hold",
        }
    }

    /// Parse a status label, `None` for anything unrecognized.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "completed" => Some(Self::Completed),
            "ongoing" => Some(Self::Ongoing),
            "upcoming" => Some(Self::Upcoming),
            "unknown" => Some(Self::Unknown),
            "watching" => Some(Self::Watching),
            "plan_to_watch" => Some(Self::PlanToWatch),
            "dropped" => Some(Self::Dropped),
            "on_hold" => Some(Self::OnHold),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "watchlist_entry")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owner user ID
    #[sea_orm(indexed)]
    pub user_id: String,

    /// External catalog (MyAnimeList) ID
    pub mal_id: i32,

    pub title: String,

    #[sea_orm(nullable)]
    pub image_url: Option<String>,

    #[sea_orm(nullable)]
    pub status: Option<EntryStatus>,

    /// Catalog score at the time the entry was written
    #[sea_orm(nullable)]
    pub rating: Option<f64>,

    #[sea_orm(default_value = false)]
    pub is_favorite: bool,

    #[sea_orm(nullable)]
    pub total_episodes: Option<i32>,

    pub added_at: DateTimeWithTimeZone,
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
