//! Messages between the UI loop and background tasks
//!
//! Key handling produces [`Action`]s; the worker runs them on tokio tasks and
//! answers with [`AppEvent`]s over an mpsc channel. The UI loop is the only
//! place state changes.

use crate::api::{ApiError, NewProfile};
use crate::catalog::Catalog;
use crate::downloads::DownloadUpdate;
use crate::library::ListOp;
use crate::models::{
    AuthResponse, ContinueWatchingItem, DownloadRecord, Movie, Profile, RatingSummary,
    WatchProgress,
};
use crate::player::{MediaElement, MediaEvent};
use crate::profiles::Profiles;
use tokio_util::sync::CancellationToken;

/// Work requested by the UI
#[derive(Debug, Clone)]
pub enum Action {
    Login { email: String, password: String },
    Register { name: String, email: String, password: String },
    Logout,
    LoadProfiles,
    CreateProfile(NewProfile),
    RenameProfile { id: String, name: String },
    DeleteProfile { id: String },
    /// Catalog plus continue watching
    LoadBrowse,
    LoadMyList,
    Search(String),
    /// Similar titles and rating aggregate
    LoadDetail(Movie),
    /// Rating aggregate only (after rating)
    LoadRatings(String),
    CommitList { op: ListOp, movie_id: String },
    Rate { movie_id: String, stars: u8 },
    StartDownload { movie_id: String, cancel: CancellationToken },
    LoadDownloads,
    DeleteDownload { id: String },
    Play { movie: Movie, resume: f64 },
    ReportProgress(WatchProgress),
    ClosePlayer,
}

/// Results delivered back to the UI loop
pub enum AppEvent {
    Authenticated(Result<AuthResponse, ApiError>),
    ProfilesLoaded(Result<Profiles, ApiError>),
    ProfileCreated(Result<Profile, ApiError>),
    ProfileRenamed { id: String, name: String, result: Result<(), ApiError> },
    ProfileDeleted { id: String, result: Result<(), ApiError> },
    CatalogLoaded(Result<Catalog, ApiError>),
    ContinueWatchingLoaded(Vec<ContinueWatchingItem>),
    MyListLoaded(Result<Vec<Movie>, ApiError>),
    SearchResults { query: String, result: Result<Vec<Movie>, ApiError> },
    SimilarLoaded { movie_id: String, movies: Vec<Movie> },
    RatingsLoaded { movie_id: String, summary: RatingSummary },
    ListCommitted { movie_id: String, result: Result<(), ApiError> },
    Rated { movie_id: String, stars: u8, result: Result<(), ApiError> },
    Download(DownloadUpdate),
    DownloadsLoaded(Result<Vec<DownloadRecord>, ApiError>),
    DownloadDeleted { id: String, result: Result<(), ApiError> },
    PlayerReady {
        movie: Movie,
        element: Box<dyn MediaElement>,
        sources: Vec<String>,
        resume: f64,
    },
    PlayerFailed(String),
    /// Event from the player started for `movie_id`
    Media { movie_id: String, event: MediaEvent },
}

impl std::fmt::Debug for AppEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppEvent::PlayerReady { movie, sources, resume, .. } => f
                .debug_struct("PlayerReady")
                .field("movie", &movie.id)
                .field("sources", sources)
                .field("resume", resume)
                .finish(),
            AppEvent::Media { movie_id, event } => f
                .debug_struct("Media")
                .field("movie", movie_id)
                .field("event", event)
                .finish(),
            AppEvent::Download(update) => write!(f, "Download({:?})", update),
            other => write!(f, "{}", other.name()),
        }
    }
}

impl AppEvent {
    fn name(&self) -> &'static str {
        match self {
            AppEvent::Authenticated(_) => "Authenticated",
            AppEvent::ProfilesLoaded(_) => "ProfilesLoaded",
            AppEvent::ProfileCreated(_) => "ProfileCreated",
            AppEvent::ProfileRenamed { .. } => "ProfileRenamed",
            AppEvent::ProfileDeleted { .. } => "ProfileDeleted",
            AppEvent::CatalogLoaded(_) => "CatalogLoaded",
            AppEvent::ContinueWatchingLoaded(_) => "ContinueWatchingLoaded",
            AppEvent::MyListLoaded(_) => "MyListLoaded",
            AppEvent::SearchResults { .. } => "SearchResults",
            AppEvent::SimilarLoaded { .. } => "SimilarLoaded",
            AppEvent::RatingsLoaded { .. } => "RatingsLoaded",
            AppEvent::ListCommitted { .. } => "ListCommitted",
            AppEvent::Rated { .. } => "Rated",
            AppEvent::Download(_) => "Download",
            AppEvent::DownloadsLoaded(_) => "DownloadsLoaded",
            AppEvent::DownloadDeleted { .. } => "DownloadDeleted",
            AppEvent::PlayerReady { .. } => "PlayerReady",
            AppEvent::PlayerFailed(_) => "PlayerFailed",
            AppEvent::Media { .. } => "Media",
        }
    }
}

/// Sender half handed to background tasks
pub type EventSender = tokio::sync::mpsc::UnboundedSender<AppEvent>;
