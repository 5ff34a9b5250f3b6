//! Watchlist service.
//!
//! Entries are keyed by `(user, mal_id)`. Catalog lookups happen before the
//! write; the write itself is a single conditional statement so concurrent
//! identical requests settle on one row.

use std::str::FromStr;
use std::sync::Arc;

use anifeed_common::{AppError, AppResult, IdGenerator};
use anifeed_db::{
    entities::watchlist_entry::{self, EntryStatus},
    repositories::{UpsertColumns, WatchlistRepository},
};
use chrono::Utc;
use sea_orm::Set;
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use tracing::{info, warn};
use validator::Validate;

use super::catalog::{AiringStatus, best_match};
use super::catalog_client::{CatalogAnime, CatalogClient};
use crate::format::short_date;

/// Number of search candidates considered when resolving a title.
const SEARCH_LIMIT: &str = "5";

/// Parse a catalog ID from a form value.
pub fn parse_mal_id(raw: &str) -> AppResult<i32> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::BadRequest("Invalid MAL ID".to_string()))
}

/// Accept a JSON number, a numeric string, an empty string or null.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Value(T),
        Text(String),
    }

    match Option::<Raw<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Value(v)) => Ok(Some(v)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid number: {s}"))),
    }
}

/// Body of the add-or-update request.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpsertInput {
    #[serde(default, deserialize_with = "lenient")]
    pub mal_id: Option<i32>,

    #[serde(default)]
    #[validate(length(max = 255))]
    pub title: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub rating: Option<f64>,

    #[serde(default)]
    pub is_exist: bool,
}

/// An entry written by an upsert.
#[derive(Debug, Clone, Serialize)]
pub struct SavedEntry {
    pub is_update: bool,
    pub anime_id: String,
    pub mal_id: i32,
    pub title: String,
    pub image_url: Option<String>,
    pub status: Option<EntryStatus>,
    pub rating: Option<f64>,
    pub date: String,
}

/// Result of an upsert.
#[derive(Debug, Clone)]
pub enum UpsertOutcome {
    Saved(SavedEntry),
    /// The user already tracks an entry with this title and no ID was given.
    DuplicateTitle { title: String },
}

/// Result of a favorite toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FavoriteToggle {
    pub favorited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A user's watchlist.
#[derive(Debug, Clone, Serialize)]
pub struct WatchlistPage {
    pub entries: Vec<watchlist_entry::Model>,
    pub count: usize,
}

/// Aggregates shown on the profile page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WatchlistStats {
    pub total: usize,
    pub completed: usize,
    pub watching: usize,
    pub plan_to_watch: usize,
    pub dropped: usize,
    /// Sum of episode counts over completed entries.
    pub total_episodes: i64,
    pub favorites: Vec<watchlist_entry::Model>,
}

impl WatchlistStats {
    #[must_use]
    pub fn from_entries(entries: &[watchlist_entry::Model]) -> Self {
        let mut stats = Self {
            total: entries.len(),
            ..Self::default()
        };

        for entry in entries {
            match entry.status {
                Some(EntryStatus::Completed) => {
                    stats.completed += 1;
                    stats.total_episodes += i64::from(entry.total_episodes.unwrap_or(0));
                }
                Some(EntryStatus::Watching) => stats.watching += 1,
                Some(EntryStatus::PlanToWatch) => stats.plan_to_watch += 1,
                Some(EntryStatus::Dropped) => stats.dropped += 1,
                _ => {}
            }
            if entry.is_favorite {
                stats.favorites.push(entry.clone());
            }
        }

        stats
    }
}

fn catalog_failure(e: &AppError) -> AppError {
    warn!(error = %e, "Catalog lookup failed");
    AppError::ExternalService("Failed to fetch anime data".to_string())
}

/// Watchlist service for business logic.
#[derive(Clone)]
pub struct WatchlistService {
    repo: WatchlistRepository,
    client: Arc<dyn CatalogClient>,
    id_gen: IdGenerator,
}

impl WatchlistService {
    /// Create a new watchlist service.
    #[must_use]
    pub fn new(repo: WatchlistRepository, client: Arc<dyn CatalogClient>) -> Self {
        Self {
            repo,
            client,
            id_gen: IdGenerator::new(),
        }
    }

    fn entry_from_catalog(
        &self,
        user_id: &str,
        anime: &CatalogAnime,
        is_favorite: bool,
    ) -> watchlist_entry::ActiveModel {
        let status = AiringStatus::from_catalog(anime.status.as_deref());
        watchlist_entry::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            mal_id: Set(anime.mal_id),
            title: Set(anime.display_title()),
            image_url: Set(anime.large_image_url()),
            status: Set(Some(status.entry_status())),
            rating: Set(anime.score),
            is_favorite: Set(is_favorite),
            total_episodes: Set(Some(anime.episodes.unwrap_or(0))),
            added_at: Set(Utc::now().into()),
        }
    }

    async fn fetch(&self, mal_id: i32) -> AppResult<CatalogAnime> {
        let mut anime = self
            .client
            .get_anime(mal_id)
            .await
            .map_err(|e| catalog_failure(&e))?;
        anime.mal_id = mal_id;
        Ok(anime)
    }

    /// Add a catalog anime to the user's watchlist.
    pub async fn add(&self, user_id: &str, mal_id: i32) -> AppResult<()> {
        if self.repo.exists(user_id, mal_id).await? {
            return Err(AppError::BadRequest("Already added".to_string()));
        }

        let anime = self.fetch(mal_id).await?;
        let inserted = self
            .repo
            .insert_if_absent(self.entry_from_catalog(user_id, &anime, false))
            .await?;
        if inserted == 0 {
            return Err(AppError::BadRequest("Already added".to_string()));
        }

        info!(user_id = %user_id, mal_id, "Anime added to watchlist");
        Ok(())
    }

    /// Flip the favorite flag, creating a favorited entry if none exists.
    pub async fn toggle_favorite(&self, user_id: &str, mal_id: i32) -> AppResult<FavoriteToggle> {
        if self.repo.flip_favorite(user_id, mal_id).await? > 0 {
            let entry = self
                .repo
                .find_by_user_and_mal_id(user_id, mal_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Anime not found".to_string()))?;
            return Ok(FavoriteToggle {
                favorited: entry.is_favorite,
                message: None,
            });
        }

        let anime = self.fetch(mal_id).await?;
        let inserted = self
            .repo
            .insert_if_absent(self.entry_from_catalog(user_id, &anime, true))
            .await?;

        if inserted == 0 {
            // A concurrent request created the entry first; it is favorited.
            return Ok(FavoriteToggle {
                favorited: true,
                message: None,
            });
        }

        info!(user_id = %user_id, mal_id, "Anime added as favorite");
        Ok(FavoriteToggle {
            favorited: true,
            message: Some("Anime added to watchlist and marked as favorite".to_string()),
        })
    }

    /// Create or update an entry from user-supplied details.
    ///
    /// Without a catalog ID the title is resolved against the catalog search
    /// and the closest match supplies the ID, title, image and episode count.
    pub async fn upsert(&self, user_id: &str, input: UpsertInput) -> AppResult<UpsertOutcome> {
        input.validate()?;

        let mut title = input
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::BadRequest("Anime title is required".to_string()))?
            .to_string();

        let status = match input.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                EntryStatus::parse(raw)
                    .ok_or_else(|| AppError::BadRequest(format!("Invalid status: {raw}")))?,
            ),
        };

        let mut image_url = None;
        let mut episodes = None;

        let mal_id = match input.mal_id.filter(|id| *id > 0) {
            Some(id) => id,
            None if input.is_exist => {
                return Err(AppError::Validation("A valid MAL ID is required".to_string()));
            }
            None => {
                if self.repo.exists_with_title(user_id, &title).await? {
                    return Ok(UpsertOutcome::DuplicateTitle { title });
                }

                let page = self
                    .client
                    .search_anime(&[
                        ("q", title.clone()),
                        ("type", "tv".to_string()),
                        ("limit", SEARCH_LIMIT.to_string()),
                    ])
                    .await
                    .map_err(|e| catalog_failure(&e))?;

                let best = best_match(&title, &page.data)
                    .filter(|anime| anime.mal_id > 0)
                    .ok_or_else(|| AppError::NotFound("No matching anime found".to_string()))?;

                let resolved = best.display_title();
                if !resolved.is_empty() {
                    title = resolved;
                }
                image_url = best.large_image_url();
                episodes = best.episodes;
                best.mal_id
            }
        };

        let is_update = self.repo.exists(user_id, mal_id).await?;

        let model = watchlist_entry::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            mal_id: Set(mal_id),
            title: Set(title),
            image_url: Set(image_url.clone()),
            status: Set(status),
            rating: Set(input.rating),
            is_favorite: Set(false),
            total_episodes: Set(episodes),
            added_at: Set(Utc::now().into()),
        };
        self.repo
            .upsert(
                model,
                UpsertColumns {
                    image_url: image_url.is_some(),
                    total_episodes: episodes.is_some(),
                },
            )
            .await?;

        let entry = self
            .repo
            .find_by_user_and_mal_id(user_id, mal_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Entry {mal_id} missing after upsert")))?;

        info!(user_id = %user_id, mal_id, is_update, "Watchlist entry saved");

        Ok(UpsertOutcome::Saved(SavedEntry {
            is_update,
            date: short_date(entry.added_at),
            anime_id: entry.id,
            mal_id: entry.mal_id,
            title: entry.title,
            image_url: entry.image_url,
            status: entry.status,
            rating: entry.rating,
        }))
    }

    /// Remove an entry from the user's watchlist.
    pub async fn delete(&self, user_id: &str, mal_id: i32) -> AppResult<()> {
        if self.repo.delete_by_user_and_mal_id(user_id, mal_id).await? == 0 {
            return Err(AppError::NotFound("Anime not found".to_string()));
        }
        info!(user_id = %user_id, mal_id, "Watchlist entry deleted");
        Ok(())
    }

    /// Entries of the user, newest first.
    pub async fn list(&self, user_id: &str) -> AppResult<WatchlistPage> {
        let entries = self.repo.find_by_user(user_id).await?;
        Ok(WatchlistPage {
            count: entries.len(),
            entries,
        })
    }

    /// Profile aggregates over the user's entries.
    pub async fn stats(&self, user_id: &str) -> AppResult<WatchlistStats> {
        let entries = self.repo.find_by_user(user_id).await?;
        Ok(WatchlistStats::from_entries(&entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog_client::CatalogPage;
    use anifeed_db::test_utils::{in_memory, seed_user};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::collections::HashMap;

    #[derive(Default)]
    struct StubCatalog {
        anime: HashMap<i32, CatalogAnime>,
        search: Option<Vec<CatalogAnime>>,
    }

    #[async_trait]
    impl CatalogClient for StubCatalog {
        async fn get_anime(&self, mal_id: i32) -> AppResult<CatalogAnime> {
            self.anime
                .get(&mal_id)
                .cloned()
                .ok_or_else(|| AppError::ExternalService("404".to_string()))
        }

        async fn get_characters(&self, _mal_id: i32) -> AppResult<Vec<Value>> {
            Ok(Vec::new())
        }

        async fn search_anime(&self, _params: &[(&'static str, String)]) -> AppResult<CatalogPage> {
            self.search
                .clone()
                .map(|data| CatalogPage {
                    data,
                    pagination: None,
                })
                .ok_or_else(|| AppError::ExternalService("500".to_string()))
        }

        async fn top_anime(&self, _params: &[(&'static str, String)]) -> AppResult<CatalogPage> {
            Ok(CatalogPage::default())
        }
    }

    fn anime(value: Value) -> CatalogAnime {
        serde_json::from_value(value).unwrap()
    }

    fn naruto() -> CatalogAnime {
        anime(json!({
            "mal_id": 20,
            "title": "Naruto",
            "status": "Currently Airing",
            "episodes": 220,
            "score": 8.0,
            "images": { "webp": { "large_image_url": "https://cdn.example/naruto.webp" } }
        }))
    }

    async fn setup(stub: StubCatalog) -> (WatchlistRepository, WatchlistService) {
        let db = Arc::new(in_memory().await.unwrap());
        seed_user(&db, "u1", "alice").await.unwrap();
        let repo = WatchlistRepository::new(db);
        let service = WatchlistService::new(repo.clone(), Arc::new(stub));
        (repo, service)
    }

    fn stub_with_naruto() -> StubCatalog {
        StubCatalog {
            anime: HashMap::from([(20, naruto())]),
            search: None,
        }
    }

    fn saved(outcome: UpsertOutcome) -> SavedEntry {
        match outcome {
            UpsertOutcome::Saved(entry) => entry,
            UpsertOutcome::DuplicateTitle { title } => panic!("unexpected duplicate {title}"),
        }
    }

    #[test]
    fn test_parse_mal_id() {
        assert_eq!(parse_mal_id(" 20 ").unwrap(), 20);
        assert!(parse_mal_id("abc").is_err());
        assert!(parse_mal_id("0").is_err());
        assert!(parse_mal_id("-5").is_err());
    }

    #[test]
    fn test_upsert_input_accepts_strings_and_numbers() {
        let input: UpsertInput = serde_json::from_value(json!({
            "mal_id": "21", "title": "One Piece", "rating": 9, "is_exist": true
        }))
        .unwrap();
        assert_eq!(input.mal_id, Some(21));
        assert_eq!(input.rating, Some(9.0));

        let input: UpsertInput =
            serde_json::from_value(json!({ "mal_id": "", "title": "x", "rating": null })).unwrap();
        assert_eq!(input.mal_id, None);
        assert_eq!(input.rating, None);
        assert!(!input.is_exist);
    }

    #[test]
    fn test_stats_from_entries() {
        let entry = |status: Option<EntryStatus>, episodes: Option<i32>, fav: bool| {
            watchlist_entry::Model {
                id: "e".to_string(),
                user_id: "u1".to_string(),
                mal_id: 1,
                title: "t".to_string(),
                image_url: None,
                status,
                rating: None,
                is_favorite: fav,
                total_episodes: episodes,
                added_at: Utc::now().into(),
            }
        };
        let entries = vec![
            entry(Some(EntryStatus::Completed), Some(12), true),
            entry(Some(EntryStatus::Completed), None, false),
            entry(Some(EntryStatus::Completed), Some(24), false),
            entry(Some(EntryStatus::Watching), Some(100), false),
            entry(Some(EntryStatus::PlanToWatch), None, true),
            entry(Some(EntryStatus::Dropped), None, false),
            entry(None, Some(5), false),
        ];

        let stats = WatchlistStats::from_entries(&entries);
        assert_eq!(stats.total, 7);
        assert_eq!(stats.completed, 3);
        assert_eq!(stats.watching, 1);
        assert_eq!(stats.plan_to_watch, 1);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.total_episodes, 36);
        assert_eq!(stats.favorites.len(), 2);
    }

    #[tokio::test]
    async fn test_add_maps_catalog_record() {
        let (repo, service) = setup(stub_with_naruto()).await;

        service.add("u1", 20).await.unwrap();

        let entry = repo.find_by_user_and_mal_id("u1", 20).await.unwrap().unwrap();
        assert_eq!(entry.title, "Naruto");
        assert_eq!(entry.status, Some(EntryStatus::Ongoing));
        assert_eq!(entry.total_episodes, Some(220));
        assert_eq!(entry.rating, Some(8.0));
        assert_eq!(entry.image_url.as_deref(), Some("https://cdn.example/naruto.webp"));
        assert!(!entry.is_favorite);
    }

    #[tokio::test]
    async fn test_add_twice_is_rejected() {
        let (repo, service) = setup(stub_with_naruto()).await;

        service.add("u1", 20).await.unwrap();
        let err = service.add("u1", 20).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Already added"));
        assert_eq!(repo.find_by_user("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_catalog_failure() {
        let (_repo, service) = setup(StubCatalog::default()).await;
        let err = service.add("u1", 99).await.unwrap_err();
        assert!(matches!(err, AppError::ExternalService(ref m) if m == "Failed to fetch anime data"));
    }

    #[tokio::test]
    async fn test_toggle_favorite_creates_then_flips() {
        let (repo, service) = setup(stub_with_naruto()).await;

        let created = service.toggle_favorite("u1", 20).await.unwrap();
        assert!(created.favorited);
        assert!(created.message.is_some());

        let off = service.toggle_favorite("u1", 20).await.unwrap();
        assert_eq!(off, FavoriteToggle { favorited: false, message: None });

        let on = service.toggle_favorite("u1", 20).await.unwrap();
        assert!(on.favorited);
        assert_eq!(repo.find_by_user("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_favorite_creates_one_row() {
        let (repo, service) = setup(stub_with_naruto()).await;

        let (a, b) = tokio::join!(
            service.toggle_favorite("u1", 20),
            service.toggle_favorite("u1", 20)
        );
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(repo.find_by_user("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_resolves_title_by_search() {
        let stub = StubCatalog {
            anime: HashMap::new(),
            search: Some(vec![
                anime(json!({ "mal_id": 1735, "title": "Naruto: Shippuuden", "episodes": 500 })),
                naruto(),
            ]),
        };
        let (_repo, service) = setup(stub).await;

        let input = UpsertInput {
            title: Some("naruto".to_string()),
            status: Some("watching".to_string()),
            rating: Some(7.5),
            ..UpsertInput::default()
        };
        let entry = saved(service.upsert("u1", input).await.unwrap());

        assert!(!entry.is_update);
        assert_eq!(entry.mal_id, 20);
        assert_eq!(entry.title, "Naruto");
        assert_eq!(entry.status, Some(EntryStatus::Watching));
        assert_eq!(entry.rating, Some(7.5));
        assert_eq!(entry.image_url.as_deref(), Some("https://cdn.example/naruto.webp"));
    }

    #[tokio::test]
    async fn test_upsert_updates_existing_entry() {
        let (repo, service) = setup(stub_with_naruto()).await;
        service.add("u1", 20).await.unwrap();

        let input = UpsertInput {
            mal_id: Some(20),
            title: Some("Naruto".to_string()),
            status: Some("completed".to_string()),
            rating: Some(9.0),
            is_exist: true,
        };
        let entry = saved(service.upsert("u1", input).await.unwrap());
        assert!(entry.is_update);
        assert_eq!(entry.status, Some(EntryStatus::Completed));

        let stored = repo.find_by_user_and_mal_id("u1", 20).await.unwrap().unwrap();
        // Columns the request did not supply keep their catalog values.
        assert_eq!(stored.total_episodes, Some(220));
        assert!(stored.image_url.is_some());
        assert_eq!(stored.rating, Some(9.0));
    }

    #[tokio::test]
    async fn test_upsert_duplicate_title_without_id() {
        let (_repo, service) = setup(stub_with_naruto()).await;
        service.add("u1", 20).await.unwrap();

        let input = UpsertInput {
            title: Some("Naruto".to_string()),
            ..UpsertInput::default()
        };
        assert!(matches!(
            service.upsert("u1", input).await.unwrap(),
            UpsertOutcome::DuplicateTitle { ref title } if title == "Naruto"
        ));
    }

    #[tokio::test]
    async fn test_upsert_errors() {
        let (_repo, service) = setup(StubCatalog {
            anime: HashMap::new(),
            search: Some(Vec::new()),
        })
        .await;

        let missing_title = UpsertInput::default();
        assert!(matches!(
            service.upsert("u1", missing_title).await,
            Err(AppError::BadRequest(ref m)) if m == "Anime title is required"
        ));

        let bad_status = UpsertInput {
            mal_id: Some(1),
            title: Some("x".to_string()),
            status: Some("binge".to_string()),
            ..UpsertInput::default()
        };
        assert!(matches!(
            service.upsert("u1", bad_status).await,
            Err(AppError::BadRequest(_))
        ));

        let no_match = UpsertInput {
            title: Some("zzz".to_string()),
            ..UpsertInput::default()
        };
        assert!(matches!(
            service.upsert("u1", no_match).await,
            Err(AppError::NotFound(ref m)) if m == "No matching anime found"
        ));

        let unresolved = UpsertInput {
            title: Some("zzz".to_string()),
            is_exist: true,
            ..UpsertInput::default()
        };
        assert!(matches!(
            service.upsert("u1", unresolved).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_upsert_search_failure_is_external() {
        let (_repo, service) = setup(StubCatalog::default()).await;
        let input = UpsertInput {
            title: Some("x".to_string()),
            ..UpsertInput::default()
        };
        assert!(matches!(
            service.upsert("u1", input).await,
            Err(AppError::ExternalService(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_reports_missing() {
        let (_repo, service) = setup(stub_with_naruto()).await;
        service.add("u1", 20).await.unwrap();

        service.delete("u1", 20).await.unwrap();
        assert!(matches!(
            service.delete("u1", 20).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(service.list("u1").await.unwrap().count, 0);
    }
}
