//! Catalog browsing: facet parsing, status badges, result annotation.
//!
//! Browsing is a thin proxy over the catalog API. Upstream failures while
//! browsing are logged and turned into an empty listing, so an empty result
//! can mean either "no matches" or "catalog unavailable".

use std::collections::HashSet;
use std::sync::Arc;

use anifeed_common::{AppError, AppResult};
use anifeed_db::{entities::watchlist_entry::EntryStatus, repositories::WatchlistRepository};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::catalog_client::{CatalogAnime, CatalogClient, CatalogPage, QueryParams};

/// Number of items shown on the first explore page.
pub const PAGE_SIZE: usize = 24;

/// Oldest year offered in the year facet.
pub const EARLIEST_YEAR: i32 = 1995;

/// Characters shown on the details page.
const MAX_CHARACTERS: usize = 10;

/// Genre facet values and their catalog IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Genre {
    Action,
    Adventure,
    Comedy,
    Drama,
    Fantasy,
    Romance,
    SciFi,
    Thriller,
}

impl Genre {
    pub const ALL: [Self; 8] = [
        Self::Action,
        Self::Adventure,
        Self::Comedy,
        Self::Drama,
        Self::Fantasy,
        Self::Romance,
        Self::SciFi,
        Self::Thriller,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Action => "Action",
            Self::Adventure => "Adventure",
            Self::Comedy => "Comedy",
            Self::Drama => "Drama",
            Self::Fantasy => "Fantasy",
            Self::Romance => "Romance",
            Self::SciFi => "Sci-Fi",
            Self::Thriller => "Thriller",
        }
    }

    /// Catalog genre ID.
    #[must_use]
    pub const fn id(self) -> u32 {
        match self {
            Self::Action => 1,
            Self::Adventure => 2,
            Self::Comedy => 4,
            Self::Drama => 8,
            Self::Fantasy => 10,
            Self::Romance => 22,
            Self::SciFi => 24,
            Self::Thriller => 41,
        }
    }

    /// Case-insensitive lookup by name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|g| g.name().eq_ignore_ascii_case(value))
    }
}

/// Rating facet labels and the minimum score each one maps to.
pub const RATING_OPTIONS: [(&str, u8); 5] = [
    ("5.0+", 5),
    ("6.0+", 6),
    ("7.0+", 7),
    ("8.0+", 8),
    ("9.0+", 9),
];

fn parse_min_score(value: &str) -> Option<u8> {
    RATING_OPTIONS
        .iter()
        .find(|(label, _)| *label == value.trim())
        .map(|(_, score)| *score)
}

/// Airing status facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Upcoming,
    Ongoing,
    Completed,
}

impl StatusFilter {
    pub const ALL: [Self; 3] = [Self::Upcoming, Self::Ongoing, Self::Completed];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Upcoming => "Upcoming",
            Self::Ongoing => "Ongoing",
            Self::Completed => "Completed",
        }
    }

    /// Value of the catalog's `status` query parameter.
    #[must_use]
    pub const fn api_code(self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Ongoing => "airing",
            Self::Completed => "complete",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "upcoming" => Some(Self::Upcoming),
            "ongoing" => Some(Self::Ongoing),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Ordering of the search listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Popularity,
    Rating,
    Year,
    Title,
}

impl SortOrder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Popularity => "popularity",
            Self::Rating => "rating",
            Self::Year => "year",
            Self::Title => "title",
        }
    }

    /// `(order_by, sort)` query parameters.
    #[must_use]
    pub const fn params(self) -> (&'static str, &'static str) {
        match self {
            Self::Popularity => ("members", "desc"),
            Self::Rating => ("score", "desc"),
            Self::Year => ("start_date", "desc"),
            Self::Title => ("title", "asc"),
        }
    }

    /// Unrecognized values fall back to popularity.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "rating" => Self::Rating,
            "year" => Self::Year,
            "title" => Self::Title,
            _ => Self::Popularity,
        }
    }
}

/// Normalized airing status of a catalog record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiringStatus {
    Completed,
    Ongoing,
    Upcoming,
    Unknown,
}

impl AiringStatus {
    /// Map the catalog's status string.
    #[must_use]
    pub fn from_catalog(status: Option<&str>) -> Self {
        match status {
            Some("Finished Airing") => Self::Completed,
            Some("Currently Airing") => Self::Ongoing,
            Some("Not yet aired") => Self::Upcoming,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Ongoing => "ongoing",
            Self::Upcoming => "upcoming",
            Self::Unknown => "unknown",
        }
    }

    /// CSS class of the status badge.
    #[must_use]
    pub const fn style(self) -> &'static str {
        match self {
            Self::Completed => "bg-green-600",
            Self::Ongoing => "bg-blue-600",
            Self::Upcoming => "bg-yellow-600",
            Self::Unknown => "bg-gray-500",
        }
    }

    #[must_use]
    pub const fn entry_status(self) -> EntryStatus {
        match self {
            Self::Completed => EntryStatus::Completed,
            Self::Ongoing => EntryStatus::Ongoing,
            Self::Upcoming => EntryStatus::Upcoming,
            Self::Unknown => EntryStatus::Unknown,
        }
    }

    #[must_use]
    pub const fn badge(self) -> StatusBadge {
        StatusBadge {
            label: self.label(),
            class: self.style(),
        }
    }
}

/// Status label and badge class attached to each listed anime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    pub label: &'static str,
    pub class: &'static str,
}

/// Raw facet values as they arrive in the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFilters {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub year: Option<String>,
    pub rating: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
}

impl CatalogFilters {
    /// Facets with a non-empty value, in display order.
    #[must_use]
    pub fn active(&self) -> Vec<(String, String)> {
        [
            ("genre", &self.genre),
            ("year", &self.year),
            ("rating", &self.rating),
            ("status", &self.status),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .map(|v| (name.to_string(), v.to_string()))
        })
        .collect()
    }
}

/// Facets after validation. Unrecognized values are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub genre: Option<Genre>,
    pub year: Option<i32>,
    pub min_score: Option<u8>,
    pub status: Option<StatusFilter>,
    pub sort: SortOrder,
}

impl CatalogQuery {
    #[must_use]
    pub fn parse(filters: &CatalogFilters) -> Self {
        let non_empty = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Self {
            search: non_empty(&filters.search),
            genre: filters.genre.as_deref().and_then(Genre::parse),
            year: filters
                .year
                .as_deref()
                .and_then(|y| y.trim().parse::<i32>().ok())
                .filter(|y| *y > 0),
            min_score: filters.rating.as_deref().and_then(parse_min_score),
            status: filters.status.as_deref().and_then(StatusFilter::parse),
            sort: filters
                .sort
                .as_deref()
                .map(SortOrder::parse)
                .unwrap_or_default(),
        }
    }

    /// Whether any recognized facet is set; without one the top listing is used.
    #[must_use]
    pub const fn has_facets(&self) -> bool {
        self.search.is_some()
            || self.genre.is_some()
            || self.year.is_some()
            || self.min_score.is_some()
            || self.status.is_some()
    }

    /// Query parameters for the listing this query selects.
    #[must_use]
    pub fn params(&self, page: Option<u32>) -> QueryParams {
        let mut params: QueryParams = Vec::new();

        if let Some(page) = page {
            params.push(("page", page.to_string()));
        }

        if self.has_facets() {
            let (order_by, sort) = self.sort.params();
            params.push(("order_by", order_by.to_string()));
            params.push(("sort", sort.to_string()));

            if let Some(q) = &self.search {
                params.push(("q", q.clone()));
            }
            if let Some(genre) = self.genre {
                params.push(("genres", genre.id().to_string()));
            }
            if let Some(year) = self.year {
                params.push(("start_date", format!("{year}-01-01")));
                params.push(("end_date", format!("{year}-12-31")));
            }
            if let Some(score) = self.min_score {
                params.push(("min_score", score.to_string()));
            }
            if let Some(status) = self.status {
                params.push(("status", status.api_code().to_string()));
            }
        }

        params.push(("sfw", "true".to_string()));
        params
    }
}

/// A catalog record annotated for the requesting user.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedAnime {
    #[serde(flatten)]
    pub anime: CatalogAnime,
    pub status_color: StatusBadge,
    pub is_in_watchlist: bool,
    pub is_favorite: bool,
}

/// Data behind the explore page.
#[derive(Debug, Clone, Serialize)]
pub struct ExploreView {
    pub search_title: String,
    pub anime_list: Vec<AnnotatedAnime>,
    pub total_results: i64,
    pub genres: Vec<&'static str>,
    pub years: Vec<i32>,
    pub ratings: Vec<&'static str>,
    pub statuses: Vec<&'static str>,
    pub sort_by: String,
    pub active_filters: Vec<(String, String)>,
    pub has_next_page: bool,
    pub next_api_page: Option<i32>,
}

/// One continuation page for infinite scrolling.
#[derive(Debug, Clone, Serialize)]
pub struct MoreAnime {
    pub anime: Vec<AnnotatedAnime>,
    pub has_next: bool,
    pub next_api_page: Option<u32>,
}

/// Data behind the anime details page.
#[derive(Debug, Clone, Serialize)]
pub struct AnimeDetails {
    pub anime: CatalogAnime,
    pub trailer_url: Option<String>,
    pub anime_characters: Vec<Value>,
    pub is_added: bool,
    pub is_fav: bool,
    #[serde(rename = "malId")]
    pub mal_id: i32,
}

/// The user's watchlist membership, used to annotate listings.
#[derive(Debug, Clone, Default)]
pub struct WatchlistMarks {
    pub listed: HashSet<i32>,
    pub favorites: HashSet<i32>,
}

impl WatchlistMarks {
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (i32, bool)>) -> Self {
        let mut marks = Self::default();
        for (mal_id, is_favorite) in pairs {
            marks.listed.insert(mal_id);
            if is_favorite {
                marks.favorites.insert(mal_id);
            }
        }
        marks
    }

    #[must_use]
    pub fn annotate(&self, anime: CatalogAnime) -> AnnotatedAnime {
        let status = AiringStatus::from_catalog(anime.status.as_deref());
        AnnotatedAnime {
            status_color: status.badge(),
            is_in_watchlist: self.listed.contains(&anime.mal_id),
            is_favorite: self.favorites.contains(&anime.mal_id),
            anime,
        }
    }
}

/// Drop repeated catalog IDs (first occurrence wins) and cap the page size.
#[must_use]
pub fn dedup_and_truncate(items: Vec<CatalogAnime>, limit: usize) -> Vec<CatalogAnime> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|anime| anime.mal_id > 0 && seen.insert(anime.mal_id))
        .take(limit)
        .collect()
}

/// Lowercase and collapse runs of whitespace.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Similarity ratio in `[0, 1]` between two titles.
#[must_use]
pub fn title_similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&normalize_title(a), &normalize_title(b))
}

/// Candidate whose display title is most similar to `title`.
///
/// Ties keep the earlier candidate.
#[must_use]
pub fn best_match<'a>(title: &str, candidates: &'a [CatalogAnime]) -> Option<&'a CatalogAnime> {
    let mut best: Option<(&CatalogAnime, f64)> = None;

    for candidate in candidates {
        let score = title_similarity(title, &candidate.display_title());
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((candidate, score)),
        }
    }

    best.map(|(anime, _)| anime)
}

/// Catalog browsing service.
#[derive(Clone)]
pub struct CatalogService {
    client: Arc<dyn CatalogClient>,
    watchlist_repo: WatchlistRepository,
}

impl CatalogService {
    /// Create a new catalog service.
    #[must_use]
    pub fn new(client: Arc<dyn CatalogClient>, watchlist_repo: WatchlistRepository) -> Self {
        Self {
            client,
            watchlist_repo,
        }
    }

    /// Fetch a listing page, swallowing upstream failures into an empty page.
    pub async fn listing(&self, query: &CatalogQuery, page: Option<u32>) -> CatalogPage {
        let params = query.params(page);
        let result = if query.has_facets() {
            self.client.search_anime(&params).await
        } else {
            self.client.top_anime(&params).await
        };

        result.unwrap_or_else(|e| {
            warn!(error = %e, "Catalog listing failed, returning empty result");
            CatalogPage::default()
        })
    }

    async fn marks(&self, user_id: &str) -> AppResult<WatchlistMarks> {
        let pairs = self.watchlist_repo.find_marks(user_id).await?;
        Ok(WatchlistMarks::from_pairs(pairs))
    }

    /// First explore page for the given facets.
    pub async fn explore(&self, user_id: &str, filters: &CatalogFilters) -> AppResult<ExploreView> {
        let query = CatalogQuery::parse(filters);
        let page = self.listing(&query, None).await;
        let marks = self.marks(user_id).await?;

        let pagination = page.pagination.unwrap_or_default();
        let has_next_page = pagination.has_next_page;
        let next_api_page =
            has_next_page.then(|| pagination.current_page.unwrap_or(1).saturating_add(1));

        let anime_list = dedup_and_truncate(page.data, PAGE_SIZE)
            .into_iter()
            .map(|anime| marks.annotate(anime))
            .collect();

        Ok(ExploreView {
            search_title: filters.search.clone().unwrap_or_default(),
            anime_list,
            total_results: pagination.items.map_or(0, |items| items.total),
            genres: Genre::ALL.iter().map(|g| g.name()).collect(),
            years: (EARLIEST_YEAR..=Utc::now().year()).rev().collect(),
            ratings: RATING_OPTIONS.iter().map(|(label, _)| *label).collect(),
            statuses: StatusFilter::ALL.iter().map(|s| s.label()).collect(),
            sort_by: query.sort.as_str().to_string(),
            active_filters: filters.active(),
            has_next_page,
            next_api_page,
        })
    }

    /// Continuation page `page` for the given facets.
    pub async fn fetch_more(
        &self,
        user_id: &str,
        page: u32,
        filters: &CatalogFilters,
    ) -> AppResult<MoreAnime> {
        if page == 0 {
            return Err(AppError::BadRequest("Invalid page".to_string()));
        }

        let query = CatalogQuery::parse(filters);
        let listing = self.listing(&query, Some(page)).await;
        let marks = self.marks(user_id).await?;

        let has_next = listing.pagination.is_some_and(|p| p.has_next_page);

        Ok(MoreAnime {
            anime: listing
                .data
                .into_iter()
                .map(|anime| marks.annotate(anime))
                .collect(),
            has_next,
            next_api_page: has_next.then(|| page.saturating_add(1)),
        })
    }

    /// Catalog record, trailer and leading characters of one anime.
    pub async fn details(&self, user_id: &str, mal_id: i32) -> AppResult<AnimeDetails> {
        let anime = self.client.get_anime(mal_id).await?;

        let mut characters = self.client.get_characters(mal_id).await.unwrap_or_else(|e| {
            warn!(error = %e, mal_id, "Failed to fetch characters");
            Vec::new()
        });
        characters.truncate(MAX_CHARACTERS);

        let entry = self
            .watchlist_repo
            .find_by_user_and_mal_id(user_id, mal_id)
            .await?;

        Ok(AnimeDetails {
            trailer_url: anime.trailer_url(),
            anime,
            anime_characters: characters,
            is_added: entry.is_some(),
            is_fav: entry.is_some_and(|e| e.is_favorite),
            mal_id,
        })
    }
}
