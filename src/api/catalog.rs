//! Catalog endpoints: movies, search and ratings

use serde::Serialize;

use super::client::{ApiClient, ApiError, ApiResult};
use crate::models::{Movie, RatingSummary};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RateRequest<'a> {
    movie_id: &'a str,
    rating: u8,
}

impl ApiClient {
    /// Full catalog in one call
    pub async fn movies(&self) -> ApiResult<Vec<Movie>> {
        self.get("/movies").await
    }

    /// Movies whose category equals `key`
    pub async fn movies_by_category(&self, key: &str) -> ApiResult<Vec<Movie>> {
        self.get(&format!("/movies/category/{}", urlencoding::encode(key)))
            .await
    }

    pub async fn movie(&self, id: &str) -> ApiResult<Movie> {
        self.get(&format!("/movies/{}", urlencoding::encode(id))).await
    }

    /// Text search; the query is sent as given, callers skip blank queries
    pub async fn search(&self, query: &str) -> ApiResult<Vec<Movie>> {
        self.get(&format!("/movies/search?q={}", urlencoding::encode(query)))
            .await
    }

    /// Aggregate star rating
    pub async fn ratings(&self, movie_id: &str) -> ApiResult<RatingSummary> {
        self.get(&format!("/movies/{}/ratings", urlencoding::encode(movie_id)))
            .await
    }

    /// Submit a 1-5 star rating
    pub async fn rate(&self, movie_id: &str, rating: u8) -> ApiResult<()> {
        if !(1..=5).contains(&rating) {
            return Err(ApiError::InvalidArgument(format!(
                "rating must be between 1 and 5, got {}",
                rating
            )));
        }
        self.post_unit("/movies/rate", &RateRequest { movie_id, rating })
            .await
    }
}
