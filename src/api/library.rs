//! Per-user endpoints: my list, watch progress, downloads and profiles

use serde::Serialize;

use super::client::{ApiClient, ApiResult};
use crate::models::{ContinueWatchingItem, DownloadRecord, Movie, Profile, WatchProgress};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MovieRef<'a> {
    movie_id: &'a str,
}

/// Body for profile creation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProfile {
    pub name: String,
    pub avatar: String,
    pub is_kids: bool,
}

/// Partial profile update
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_kids: Option<bool>,
}

impl ApiClient {
    // -------------------------------------------------------------------------
    // My List
    // -------------------------------------------------------------------------

    pub async fn my_list(&self) -> ApiResult<Vec<Movie>> {
        self.get("/user/list").await
    }

    pub async fn add_to_list(&self, movie_id: &str) -> ApiResult<()> {
        self.post_unit("/user/list/add", &MovieRef { movie_id }).await
    }

    pub async fn remove_from_list(&self, movie_id: &str) -> ApiResult<()> {
        self.post_unit("/user/list/remove", &MovieRef { movie_id })
            .await
    }

    // -------------------------------------------------------------------------
    // Watch progress
    // -------------------------------------------------------------------------

    pub async fn save_progress(&self, progress: &WatchProgress) -> ApiResult<()> {
        self.post_unit("/user/watch-progress", progress).await
    }

    pub async fn watch_progress(&self) -> ApiResult<Vec<WatchProgress>> {
        self.get("/user/watch-progress").await
    }

    pub async fn continue_watching(&self) -> ApiResult<Vec<ContinueWatchingItem>> {
        self.get("/user/continue-watching").await
    }

    // -------------------------------------------------------------------------
    // Downloads
    // -------------------------------------------------------------------------

    pub async fn downloads(&self) -> ApiResult<Vec<DownloadRecord>> {
        self.get("/user/downloads").await
    }

    /// Create the bookkeeping record for a finished download
    pub async fn record_download(&self, movie_id: &str) -> ApiResult<()> {
        self.post_unit("/user/downloads", &MovieRef { movie_id })
            .await
    }

    pub async fn delete_download(&self, download_id: &str) -> ApiResult<()> {
        self.delete(&format!(
            "/user/downloads/{}",
            urlencoding::encode(download_id)
        ))
        .await
    }

    // -------------------------------------------------------------------------
    // Profiles
    // -------------------------------------------------------------------------

    pub async fn profiles(&self) -> ApiResult<Vec<Profile>> {
        self.get("/user/profiles").await
    }

    pub async fn create_profile(&self, profile: &NewProfile) -> ApiResult<Profile> {
        self.post("/user/profiles", profile).await
    }

    pub async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> ApiResult<()> {
        self.put_unit(&format!("/user/profiles/{}", urlencoding::encode(id)), update)
            .await
    }

    pub async fn delete_profile(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/user/profiles/{}", urlencoding::encode(id)))
            .await
    }
}
