use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::{clients::backend::REQUEST_TIMEOUT, error::PlannerError};

/// Static hero image used when no relevant photo can be found. Lookups are
/// purely decorative and never block or fail the page.
pub const DEFAULT_HERO_IMAGE: &str = "/mountains.jpg";

/// First search hit from an image provider.
#[derive(Debug, Clone)]
pub struct ImageHit {
    pub url: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// First landscape-oriented result for `query`, if any.
    async fn first_image(&self, query: &str) -> Result<Option<ImageHit>, PlannerError>;
}

/// Does the hit actually depict the place? Provider results for landmark
/// queries drift to generic scenery, so a hit is accepted only when its
/// description or tags mention the place name.
pub fn is_relevant(hit: &ImageHit, place: &str) -> bool {
    let place = place.to_lowercase();
    let description_matches = hit
        .description
        .as_deref()
        .map(|d| d.to_lowercase().contains(&place))
        .unwrap_or(false);
    description_matches || hit.tags.iter().any(|t| t.to_lowercase().contains(&place))
}

/// Resolve a hero image for `place`: landmark query gated by the relevance
/// check, then a broader plain query, then the static default. Applies
/// `FailurePolicy::SilentFallback` — provider errors are logged and
/// swallowed.
pub async fn hero_image(search: &dyn ImageSearch, place: &str) -> String {
    let simplified = place.split(',').next().unwrap_or(place).trim();

    let landmark_query = format!("{simplified} famous landmark building historical site");
    match search.first_image(&landmark_query).await {
        Ok(Some(hit)) if is_relevant(&hit, simplified) => return hit.url,
        Ok(_) => {}
        Err(err) => debug!(place = %simplified, error = %err, "landmark image lookup failed"),
    }

    match search.first_image(simplified).await {
        Ok(Some(hit)) => hit.url,
        Ok(None) => DEFAULT_HERO_IMAGE.to_string(),
        Err(err) => {
            debug!(place = %simplified, error = %err, "fallback image lookup failed");
            DEFAULT_HERO_IMAGE.to_string()
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchPhotosResponse {
    #[serde(default)]
    results: Vec<PhotoResult>,
}

#[derive(Debug, Deserialize)]
struct PhotoResult {
    urls: PhotoUrls,
    description: Option<String>,
    alt_description: Option<String>,
    #[serde(default)]
    tags: Vec<PhotoTag>,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: String,
}

#[derive(Debug, Deserialize)]
struct PhotoTag {
    title: String,
}

/// Unsplash-style photo search client.
pub struct HttpImageSearch {
    http: reqwest::Client,
    base_url: String,
    access_key: String,
}

impl HttpImageSearch {
    pub fn new(
        base_url: impl Into<String>,
        access_key: impl Into<String>,
    ) -> Result<Self, PlannerError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            access_key: access_key.into(),
        })
    }
}

#[async_trait]
impl ImageSearch for HttpImageSearch {
    async fn first_image(&self, query: &str) -> Result<Option<ImageHit>, PlannerError> {
        let url = format!("{}/search/photos", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .get(url)
            .query(&[
                ("query", query),
                ("per_page", "1"),
                ("orientation", "landscape"),
                ("client_id", &self.access_key),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<SearchPhotosResponse>()
            .await?;

        Ok(response.results.into_iter().next().map(|photo| ImageHit {
            url: photo.urls.regular,
            description: photo.description.or(photo.alt_description),
            tags: photo.tags.into_iter().map(|t| t.title).collect(),
        }))
    }
}
