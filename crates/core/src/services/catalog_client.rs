//! Anime catalog HTTP client (Jikan v4 compatible).

use std::time::Duration;

use anifeed_common::{AppError, AppResult, config::CatalogConfig};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Query string parameters sent to the catalog.
pub type QueryParams = Vec<(&'static str, String)>;

/// One anime record as returned by the catalog.
///
/// Fields the application reads are typed; everything else is kept in
/// `extra` and serialized back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogAnime {
    pub mal_id: i32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub title_english: Option<String>,
    #[serde(default)]
    pub images: Option<CatalogImages>,
    #[serde(default)]
    pub episodes: Option<i32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub trailer: Option<CatalogTrailer>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogAnime {
    /// English title when present, otherwise the default (romanized) one.
    #[must_use]
    pub fn display_title(&self) -> String {
        self.title_english
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(self.title.as_deref())
            .unwrap_or_default()
            .to_string()
    }

    /// Large WebP cover image URL.
    #[must_use]
    pub fn large_image_url(&self) -> Option<String> {
        self.images
            .as_ref()
            .and_then(|i| i.webp.as_ref())
            .and_then(|set| set.large_image_url.clone())
    }

    /// Trailer page URL.
    #[must_use]
    pub fn trailer_url(&self) -> Option<String> {
        self.trailer.as_ref().and_then(|t| t.url.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogImages {
    #[serde(default)]
    pub jpg: Option<CatalogImageSet>,
    #[serde(default)]
    pub webp: Option<CatalogImageSet>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogImageSet {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub small_image_url: Option<String>,
    #[serde(default)]
    pub large_image_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogTrailer {
    #[serde(default)]
    pub youtube_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub embed_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Pagination block of a listing response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPagination {
    #[serde(default)]
    pub last_visible_page: Option<i32>,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub current_page: Option<i32>,
    #[serde(default)]
    pub items: Option<CatalogPaginationItems>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPaginationItems {
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub per_page: i64,
}

/// A page of anime from a listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogPage {
    #[serde(default)]
    pub data: Vec<CatalogAnime>,
    #[serde(default)]
    pub pagination: Option<CatalogPagination>,
}

#[derive(Debug, Deserialize)]
struct SingleResponse<T> {
    data: T,
}

/// Read access to the anime catalog.
///
/// Every non-success upstream response, transport failure or unparseable
/// body is reported as [`AppError::ExternalService`]; callers decide whether
/// to surface or swallow it.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// `GET /anime/{id}`.
    async fn get_anime(&self, mal_id: i32) -> AppResult<CatalogAnime>;

    /// `GET /anime/{id}/characters`.
    async fn get_characters(&self, mal_id: i32) -> AppResult<Vec<Value>>;

    /// `GET /anime` with search/filter parameters.
    async fn search_anime(&self, params: &[(&'static str, String)]) -> AppResult<CatalogPage>;

    /// `GET /top/anime`.
    async fn top_anime(&self, params: &[(&'static str, String)]) -> AppResult<CatalogPage>;
}

/// [`CatalogClient`] backed by the Jikan REST API.
#[derive(Clone)]
pub struct JikanClient {
    client: reqwest::Client,
    base_url: String,
}

impl JikanClient {
    /// Build a client from configuration.
    pub fn new(config: &CatalogConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> AppResult<T> {
        let url = format!("{}{path}", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Catalog request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ExternalService(format!(
                "Catalog API error: {status} on {path}"
            )));
        }

        response.json::<T>().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse catalog response: {e}"))
        })
    }
}

#[async_trait]
impl CatalogClient for JikanClient {
    async fn get_anime(&self, mal_id: i32) -> AppResult<CatalogAnime> {
        let response: SingleResponse<CatalogAnime> =
            self.get_json(&format!("/anime/{mal_id}"), &[]).await?;
        Ok(response.data)
    }

    async fn get_characters(&self, mal_id: i32) -> AppResult<Vec<Value>> {
        let response: SingleResponse<Vec<Value>> = self
            .get_json(&format!("/anime/{mal_id}/characters"), &[])
            .await?;
        Ok(response.data)
    }

    async fn search_anime(&self, params: &[(&'static str, String)]) -> AppResult<CatalogPage> {
        self.get_json("/anime", params).await
    }

    async fn top_anime(&self, params: &[(&'static str, String)]) -> AppResult<CatalogPage> {
        self.get_json("/top/anime", params).await
    }
}
