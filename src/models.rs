//! Data structures and types for FlixTUI
//!
//! Contains all shared models used across the application organized by domain:
//! - **Catalog**: movies, categories and rating aggregates
//! - **Library**: watch progress, continue watching and downloads
//! - **Account**: profiles and authenticated users
//!
//! Wire names follow the backend (`_id`, camelCase), Rust names stay snake_case.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Catalog Models
// =============================================================================

/// Fixed category keys used to bucket the flat catalog into rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Trending,
    TopRated,
    RecentlyAdded,
    Action,
    Comedy,
    Horror,
    Romance,
    Thriller,
    SciFi,
    Documentary,
    Kids,
}

impl Category {
    /// Every category in home-feed order
    pub const ALL: [Category; 11] = [
        Category::Trending,
        Category::TopRated,
        Category::RecentlyAdded,
        Category::Action,
        Category::Comedy,
        Category::Horror,
        Category::Romance,
        Category::Thriller,
        Category::SciFi,
        Category::Documentary,
        Category::Kids,
    ];

    /// Key as stored in a movie's `category` field
    pub fn key(&self) -> &'static str {
        match self {
            Category::Trending => "trending",
            Category::TopRated => "toprated",
            Category::RecentlyAdded => "recentlyadded",
            Category::Action => "action",
            Category::Comedy => "comedy",
            Category::Horror => "horror",
            Category::Romance => "romance",
            Category::Thriller => "thriller",
            Category::SciFi => "scifi",
            Category::Documentary => "documentary",
            Category::Kids => "kids",
        }
    }

    /// Row title on the home feed
    pub fn title(&self) -> &'static str {
        match self {
            Category::Trending => "Trending Now",
            Category::TopRated => "Top Rated",
            Category::RecentlyAdded => "Recently Added",
            Category::Action => "Action Thrillers",
            Category::Comedy => "Comedies",
            Category::Horror => "Horror Movies",
            Category::Romance => "Romantic Movies",
            Category::Thriller => "Thrillers",
            Category::SciFi => "Sci-Fi Movies",
            Category::Documentary => "Documentaries",
            Category::Kids => "Kids & Family",
        }
    }

    /// Parse a category key (exact match, as the backend stores it)
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.key() == key)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// A catalog entry as served by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub backdrop: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
    /// 0-10
    #[serde(default)]
    pub rating: f32,
    /// Display string, e.g. "2h 10m"
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub genre: Vec<String>,
    /// Raw category key; unknown keys are kept verbatim
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub cast: Option<Vec<String>>,
    #[serde(default)]
    pub video_url: Option<String>,
}

impl Movie {
    /// Category this movie is grouped under, if it is one of the fixed keys
    pub fn category(&self) -> Option<Category> {
        Category::from_key(&self.category)
    }

    /// Comma separated genre list
    pub fn genres_display(&self) -> String {
        self.genre.join(", ")
    }
}

impl fmt::Display for Movie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let year_str = self.year.map(|y| format!(" ({})", y)).unwrap_or_default();
        write!(f, "{}{} - ★ {:.1}", self.title, year_str, self.rating)
    }
}

/// Aggregate star rating for a movie
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    #[serde(default)]
    pub average: f64,
    #[serde(default)]
    pub count: u32,
}

impl RatingSummary {
    /// Aggregates with no votes are not displayed
    pub fn is_visible(&self) -> bool {
        self.count > 0
    }
}

impl fmt::Display for RatingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.count == 1 { "rating" } else { "ratings" };
        write!(f, "{:.1} ({} {})", self.average, self.count, noun)
    }
}

// =============================================================================
// Library Models
// =============================================================================

/// Last known playback position for a movie (last write wins)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchProgress {
    pub movie_id: String,
    pub current_time: f64,
    pub duration: f64,
}

impl WatchProgress {
    pub fn new(movie_id: impl Into<String>, current_time: f64, duration: f64) -> Self {
        Self {
            movie_id: movie_id.into(),
            current_time,
            duration,
        }
    }

    pub fn percent(&self) -> f64 {
        progress_percent(self.current_time, self.duration)
    }
}

/// Row of the continue-watching surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueWatchingItem {
    #[serde(default)]
    pub movie: Option<Movie>,
    #[serde(default)]
    pub current_time: f64,
    #[serde(default)]
    pub duration: f64,
}

impl ContinueWatchingItem {
    pub fn percent(&self) -> f64 {
        progress_percent(self.current_time, self.duration)
    }

    pub fn time_remaining(&self) -> String {
        format_time_remaining(self.current_time, self.duration)
    }
}

/// Backend bookkeeping for a simulated download
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub movie: Movie,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub downloaded_at: Option<String>,
}

impl DownloadRecord {
    /// Size shown when the backend did not record one
    pub const DEFAULT_FILE_SIZE: u64 = 1024 * 1024 * 500;

    pub fn display_size(&self) -> String {
        format_file_size(self.file_size.unwrap_or(Self::DEFAULT_FILE_SIZE))
    }

    /// Date part of the completion timestamp
    pub fn downloaded_on(&self) -> &str {
        self.downloaded_at
            .as_deref()
            .map(|ts| ts.split('T').next().unwrap_or(ts))
            .unwrap_or("")
    }
}

impl fmt::Display for DownloadRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} • {}", self.movie.title, self.display_size())?;
        if !self.downloaded_on().is_empty() {
            write!(f, " • Downloaded {}", self.downloaded_on())?;
        }
        Ok(())
    }
}

// =============================================================================
// Account Models
// =============================================================================

/// Viewer profile under one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub is_kids: bool,
}

impl Profile {
    pub const MAX_PER_ACCOUNT: usize = 5;

    /// Local stand-in shown when the profile list cannot be fetched
    pub fn fallback() -> Self {
        Self {
            id: "default".into(),
            name: "Profile 1".into(),
            avatar: DEFAULT_AVATARS[0].into(),
            is_kids: false,
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_kids {
            write!(f, "{} (Kids)", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Avatars handed out round-robin to new profiles
pub const DEFAULT_AVATARS: [&str; 4] = [
    "https://occ-0-2851-2186.1.nflxso.net/dnm/api/v6/K6hjPJd6cR6FpVELC5Pd6ovHRSk/AAAABdpkabKqQAxyWzo6QW_ZnPz1IZLqlmNfK-t4L1VIeV1DY00JhLo_LMVFp936keDxj-V5UELAVJrU--iUUY2MaDxQSSO-0qw.png?r=e6e",
    "https://occ-0-2851-2186.1.nflxso.net/dnm/api/v6/K6hjPJd6cR6FpVELC5Pd6ovHRSk/AAAABVxdX2WnFSp49eXb1do0euaj-F8upNImjofcaEODjeQpZYvMxdntOzaOmewhVn8qtLwjDp_ijcCiCv8Zb5ZLuaEqAeEuQkQyPOzgBQ.png?r=bd7",
    "https://occ-0-2851-2186.1.nflxso.net/dnm/api/v6/K6hjPJd6cR6FpVELC5Pd6ovHRSk/AAAABY20DrC9-11ewwAs6nfEgb1vrORxRPP9IGmlJFKtLKgjNlbBHsuoqiiy5sHSMKa149ml2m5ZF1N0VcXvDMT0lvoHJpfrHlF7W1KHOg.png?r=54d",
    "https://occ-0-2851-2186.1.nflxso.net/dnm/api/v6/K6hjPJd6cR6FpVELC5Pd6ovHRSk/AAAABcYjyCkf5csZGysp4jEI2z3QXZ_t8kYh_c-d2ZI8KnewtGrDmUVChDOcf1GoEjvzwa4RzAyn7bOZjQXKdpXNBan-bRHs1DqBrnda.png?r=e6e",
];

/// Signed-in user as returned by the auth endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
}

impl fmt::Display for AuthUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.email)
        } else {
            write!(f, "{} <{}>", self.name, self.email)
        }
    }
}

/// Successful login/register reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: AuthUser,
}

// =============================================================================
// Display Helpers
// =============================================================================

/// Format seconds as `H:MM:SS` (one hour or more) or `M:SS`
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Human readable size with 1024-based units
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut idx = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && idx < UNITS.len() - 1 {
        value /= 1024.0;
        idx += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[idx])
}

/// Watched share in percent, capped at 100; 0 when duration is unknown
pub fn progress_percent(current_time: f64, duration: f64) -> f64 {
    if duration <= 0.0 || !duration.is_finite() {
        return 0.0;
    }
    (current_time / duration * 100.0).clamp(0.0, 100.0)
}

/// "42m left" or "1h 5m left"; empty when duration is unknown
pub fn format_time_remaining(current_time: f64, duration: f64) -> String {
    if duration <= 0.0 || !duration.is_finite() {
        return String::new();
    }
    let remaining = (duration - current_time).max(0.0);
    let minutes = (remaining / 60.0) as u64;
    if minutes < 60 {
        format!("{}m left", minutes)
    } else {
        format!("{}h {}m left", minutes / 60, minutes % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_keys_round_trip() {
        for cat in Category::ALL {
            assert_eq!(Category::from_key(cat.key()), Some(cat));
        }
        assert_eq!(Category::from_key("Trending"), None);
        assert_eq!(Category::from_key("western"), None);
    }

    #[test]
    fn test_category_titles() {
        assert_eq!(Category::Trending.title(), "Trending Now");
        assert_eq!(Category::SciFi.title(), "Sci-Fi Movies");
        assert_eq!(Category::Kids.to_string(), "Kids & Family");
    }

    #[test]
    fn test_movie_deserialize_backend_shape() {
        let json = r#"{
            "_id": "65a1",
            "title": "Stranger Things",
            "description": "Kids vs the Upside Down",
            "poster": "https://img/poster.jpg",
            "backdrop": "https://img/backdrop.jpg",
            "year": 2016,
            "rating": 8.7,
            "duration": "4 Seasons",
            "genre": ["Drama", "Horror"],
            "category": "trending",
            "cast": ["Millie Bobby Brown"],
            "videoUrl": "https://cdn/st.mp4"
        }"#;
        let movie: Movie = serde_json::from_str(json).unwrap();
        assert_eq!(movie.id, "65a1");
        assert_eq!(movie.category(), Some(Category::Trending));
        assert_eq!(movie.video_url.as_deref(), Some("https://cdn/st.mp4"));
        assert_eq!(movie.genres_display(), "Drama, Horror");
    }

    #[test]
    fn test_movie_minimal_fields() {
        let movie: Movie = serde_json::from_str(r#"{"_id":"1","title":"Bare"}"#).unwrap();
        assert!(movie.genre.is_empty());
        assert_eq!(movie.category(), None);
        assert_eq!(movie.to_string(), "Bare - ★ 0.0");
    }

    #[test]
    fn test_watch_progress_wire_names() {
        let progress = WatchProgress::new("m1", 12.5, 100.0);
        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["movieId"], "m1");
        assert_eq!(json["currentTime"], 12.5);
        assert_eq!(json["duration"], 100.0);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(65.9), "1:05");
        assert_eq!(format_time(3600.0), "1:00:00");
        assert_eq!(format_time(3725.0), "1:02:05");
        assert_eq!(format_time(f64::NAN), "0:00");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1024 * 1024 * 500), "500 MB");
        assert_eq!(format_file_size(1024 * 1024 * 1024 * 3), "3 GB");
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(30.0, 0.0), 0.0);
        assert_eq!(progress_percent(50.0, 200.0), 25.0);
        assert_eq!(progress_percent(250.0, 200.0), 100.0);
    }

    #[test]
    fn test_time_remaining() {
        assert_eq!(format_time_remaining(10.0, 0.0), "");
        assert_eq!(format_time_remaining(0.0, 1800.0), "30m left");
        assert_eq!(format_time_remaining(600.0, 5400.0), "1h 20m left");
    }

    #[test]
    fn test_download_record_display_defaults() {
        let json = r#"{
            "_id": "d1",
            "movie": {"_id": "m1", "title": "Dune", "year": 2021},
            "downloadedAt": "2024-05-01T10:00:00.000Z"
        }"#;
        let record: DownloadRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.display_size(), "500 MB");
        assert_eq!(record.downloaded_on(), "2024-05-01");
        assert_eq!(record.to_string(), "Dune • 500 MB • Downloaded 2024-05-01");
    }

    #[test]
    fn test_rating_summary_visibility() {
        assert!(!RatingSummary::default().is_visible());
        let one = RatingSummary { average: 4.0, count: 1 };
        assert_eq!(one.to_string(), "4.0 (1 rating)");
        let many = RatingSummary { average: 3.3, count: 8 };
        assert_eq!(many.to_string(), "3.3 (8 ratings)");
    }

    #[test]
    fn test_profile_fallback() {
        let p = Profile::fallback();
        assert_eq!(p.name, "Profile 1");
        assert!(!p.is_kids);
    }
}
