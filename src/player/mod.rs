//! Playback
//!
//! - controller: play/pause/seek/volume/fullscreen state and key handling
//! - mpv: the shipped media element, an mpv process driven over JSON IPC
//! - progress: posts watch position to the backend on every time update

pub mod controller;
#[cfg(unix)]
pub mod mpv;
pub mod progress;

use thiserror::Error;

use crate::models::Movie;

pub use controller::{KeyOutcome, PlaybackState, PlayerController, SKIP_SECONDS, VOLUME_STEP};
#[cfg(unix)]
pub use mpv::MpvElement;
pub use progress::ProgressReporter;

/// Errors from the media element
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Player '{0}' not found. Install it first.")]
    NotFound(String),

    #[error("Failed to start player: {0}")]
    StartFailed(#[from] std::io::Error),

    #[error("Player IPC failed: {0}")]
    Ipc(String),

    #[error("Player already closed")]
    Closed,

    #[error("No playable source")]
    NoSource,
}

/// Events mirrored from the media element into controller state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaEvent {
    TimeUpdate(f64),
    LoadedMetadata(f64),
    Play,
    Pause,
    Ended,
}

/// Native playback surface the controller drives
///
/// Calls are fire-and-forget; the element reports what actually happened
/// through [`MediaEvent`]s.
pub trait MediaElement: Send {
    /// Load sources in order of preference, starting at `start` seconds
    fn load(&mut self, sources: &[String], start: f64) -> Result<(), PlayerError>;
    fn play(&mut self) -> Result<(), PlayerError>;
    fn pause(&mut self) -> Result<(), PlayerError>;
    fn seek(&mut self, seconds: f64) -> Result<(), PlayerError>;
    /// 0.0 to 1.0
    fn set_volume(&mut self, volume: f64) -> Result<(), PlayerError>;
    fn set_muted(&mut self, muted: bool) -> Result<(), PlayerError>;
    /// Applies to the player window, not the video surface
    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<(), PlayerError>;
    fn close(&mut self) -> Result<(), PlayerError>;
}

/// Ordered source list for a movie: backend stream, then the movie's own
/// URL (or the first fallback), then the remaining fallbacks.
pub fn sources_for(stream_url: String, movie: &Movie, fallbacks: &[String]) -> Vec<String> {
    let mut sources = vec![stream_url];
    let own = movie
        .video_url
        .clone()
        .filter(|u| !u.is_empty())
        .or_else(|| fallbacks.first().cloned());
    sources.extend(own);
    sources.extend(fallbacks.iter().skip(1).cloned());

    let mut seen = std::collections::HashSet::new();
    sources.retain(|s| seen.insert(s.clone()));
    sources
}
