//! FlixTUI - terminal storefront for a Netflix-style streaming backend
//!
//! # Modules
//!
//! - `models` - Movies, ratings, progress, downloads, profiles, users
//! - `api` - Backend client (catalog, library, auth)
//! - `session` - Token and user shared by every request
//! - `catalog`, `filters`, `library`, `profiles`, `downloads` - domain logic
//! - `player` - mpv-backed playback with progress reporting
//! - `app`, `events`, `worker` - TUI state machine and its background tasks
//! - `ui` - TUI components
//! - `cli`, `commands` - scriptable subcommands

pub mod api;
pub mod app;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod downloads;
pub mod events;
pub mod filters;
pub mod library;
pub mod models;
pub mod player;
pub mod profiles;
pub mod session;
pub mod ui;
pub mod worker;

// Re-export commonly used types
pub use models::{
    AuthUser, Category, ContinueWatchingItem, DownloadRecord, Movie, Profile, RatingSummary,
    WatchProgress,
};

pub use api::{ApiClient, ApiError};
pub use app::{App, AppState};
pub use config::Config;
pub use session::Session;
