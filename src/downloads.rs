//! Simulated downloads
//!
//! No media bytes are fetched. A download is a timer that walks progress from
//! 0 to 100 in steps of 10, then asks the backend to create a bookkeeping
//! record. Success shows "Completed" for a moment before the entry clears;
//! failure leaves an error with progress reset to 0.
//!
//! ```text
//! Idle -> Downloading(0..=100) -> Completed -> (cleared) -> Idle
//!                              \-> Error
//! ```

use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::api::ApiClient;
use crate::config::Config;

/// Percent added per tick
pub const STEP_PERCENT: u8 = 10;

/// Per-movie download state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DownloadStatus {
    #[default]
    Idle,
    Downloading(u8),
    Completed,
    Error(String),
}

impl DownloadStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, DownloadStatus::Downloading(_))
    }

    /// Progress shown on the bar; errors show 0
    pub fn progress(&self) -> u8 {
        match self {
            DownloadStatus::Downloading(p) => *p,
            DownloadStatus::Completed => 100,
            DownloadStatus::Idle | DownloadStatus::Error(_) => 0,
        }
    }

    pub fn label(&self) -> String {
        match self {
            DownloadStatus::Idle => "Download".to_string(),
            DownloadStatus::Downloading(p) => format!("Downloading {}%", p),
            DownloadStatus::Completed => "Downloaded".to_string(),
            DownloadStatus::Error(msg) => format!("Failed: {}", msg),
        }
    }
}

/// Messages emitted by a running simulation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadUpdate {
    Progress { movie_id: String, percent: u8 },
    Completed { movie_id: String },
    Failed { movie_id: String, message: String },
    /// Completed badge timed out
    Cleared { movie_id: String },
}

impl DownloadUpdate {
    pub fn movie_id(&self) -> &str {
        match self {
            DownloadUpdate::Progress { movie_id, .. }
            | DownloadUpdate::Completed { movie_id }
            | DownloadUpdate::Failed { movie_id, .. }
            | DownloadUpdate::Cleared { movie_id } => movie_id,
        }
    }
}

/// Tick interval and how long "Completed" stays up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadTiming {
    pub step: Duration,
    pub clear_after: Duration,
}

impl Default for DownloadTiming {
    fn default() -> Self {
        Self {
            step: Duration::from_millis(200),
            clear_after: Duration::from_secs(2),
        }
    }
}

impl From<&Config> for DownloadTiming {
    fn from(config: &Config) -> Self {
        Self {
            step: config.download_step(),
            ..Self::default()
        }
    }
}

/// Run one simulated download to completion.
///
/// Returns the final status (Completed or Error), or None if cancelled
/// before it finished. Nothing is emitted after cancellation.
pub async fn simulate<F>(
    api: &ApiClient,
    movie_id: &str,
    timing: DownloadTiming,
    cancel: &CancellationToken,
    mut emit: F,
) -> Option<DownloadStatus>
where
    F: FnMut(DownloadUpdate),
{
    let mut percent = 0u8;
    emit(DownloadUpdate::Progress {
        movie_id: movie_id.to_string(),
        percent,
    });

    while percent < 100 {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(movie = movie_id, percent, "download cancelled");
                return None;
            }
            _ = tokio::time::sleep(timing.step) => {}
        }
        percent = (percent + STEP_PERCENT).min(100);
        emit(DownloadUpdate::Progress {
            movie_id: movie_id.to_string(),
            percent,
        });
    }

    let result = tokio::select! {
        _ = cancel.cancelled() => return None,
        r = api.record_download(movie_id) => r,
    };

    match result {
        Ok(()) => {
            tracing::info!(movie = movie_id, "download recorded");
            emit(DownloadUpdate::Completed {
                movie_id: movie_id.to_string(),
            });
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(timing.clear_after) => {
                    emit(DownloadUpdate::Cleared { movie_id: movie_id.to_string() });
                }
            }
            Some(DownloadStatus::Completed)
        }
        Err(e) => {
            tracing::warn!(movie = movie_id, error = %e, "download record failed");
            let message = e.to_string();
            emit(DownloadUpdate::Failed {
                movie_id: movie_id.to_string(),
                message: message.clone(),
            });
            Some(DownloadStatus::Error(message))
        }
    }
}

/// Tracks every movie's download status for the UI
#[derive(Debug, Default)]
pub struct DownloadManager {
    states: HashMap<String, DownloadStatus>,
    cancel: CancellationToken,
}

impl DownloadManager {
    pub fn status(&self, movie_id: &str) -> DownloadStatus {
        self.states.get(movie_id).cloned().unwrap_or_default()
    }

    /// Movies currently downloading
    pub fn active(&self) -> impl Iterator<Item = (&str, u8)> {
        self.states.iter().filter_map(|(id, s)| match s {
            DownloadStatus::Downloading(p) => Some((id.as_str(), *p)),
            _ => None,
        })
    }

    /// Claim a movie for a new download; None when one is already running.
    /// On success returns the token the simulation must observe.
    pub fn begin(&mut self, movie_id: &str) -> Option<CancellationToken> {
        if self.status(movie_id).is_active() {
            tracing::debug!(movie = movie_id, "download already in progress");
            return None;
        }
        self.states
            .insert(movie_id.to_string(), DownloadStatus::Downloading(0));
        Some(self.cancel.child_token())
    }

    /// Fold a simulation update into the state table.
    ///
    /// Only a movie still tracked as downloading takes progress, completion
    /// or failure; updates from a cancelled run are dropped.
    pub fn apply(&mut self, update: &DownloadUpdate) {
        let movie_id = update.movie_id();
        let next = match update {
            DownloadUpdate::Progress { percent, .. } => DownloadStatus::Downloading(*percent),
            DownloadUpdate::Completed { .. } => DownloadStatus::Completed,
            DownloadUpdate::Failed { message, .. } => DownloadStatus::Error(message.clone()),
            DownloadUpdate::Cleared { .. } => {
                if self.status(movie_id) == DownloadStatus::Completed {
                    self.states.remove(movie_id);
                }
                return;
            }
        };
        match self.states.get_mut(movie_id) {
            Some(state) if state.is_active() => *state = next,
            _ => tracing::debug!(movie = movie_id, ?update, "stale download update dropped"),
        }
    }

    /// Stop every running timer and forget in-flight state
    pub fn cancel_all(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.states.retain(|_, s| !s.is_active());
    }
}

impl Drop for DownloadManager {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(DownloadStatus::Idle.label(), "Download");
        assert_eq!(DownloadStatus::Downloading(40).label(), "Downloading 40%");
        assert_eq!(DownloadStatus::Error("x".into()).progress(), 0);
        assert_eq!(DownloadStatus::Completed.progress(), 100);
    }

    #[test]
    fn test_duplicate_start_ignored() {
        let mut mgr = DownloadManager::default();
        assert!(mgr.begin("m1").is_some());
        assert!(mgr.begin("m1").is_none());
        assert!(mgr.begin("m2").is_some());
        assert_eq!(mgr.active().count(), 2);
    }

    #[test]
    fn test_restart_after_error() {
        let mut mgr = DownloadManager::default();
        mgr.begin("m");
        mgr.apply(&DownloadUpdate::Failed {
            movie_id: "m".into(),
            message: "boom".into(),
        });
        assert_eq!(mgr.status("m").progress(), 0);
        assert!(mgr.begin("m").is_some());
    }

    #[test]
    fn test_cleared_only_after_completed() {
        let mut mgr = DownloadManager::default();
        mgr.begin("m");
        mgr.apply(&DownloadUpdate::Cleared { movie_id: "m".into() });
        assert_eq!(mgr.status("m"), DownloadStatus::Downloading(0));

        mgr.apply(&DownloadUpdate::Completed { movie_id: "m".into() });
        mgr.apply(&DownloadUpdate::Cleared { movie_id: "m".into() });
        assert_eq!(mgr.status("m"), DownloadStatus::Idle);
    }

    #[test]
    fn test_cancel_all_drops_active() {
        let mut mgr = DownloadManager::default();
        let token = mgr.begin("m").unwrap();
        mgr.cancel_all();
        assert!(token.is_cancelled());
        assert_eq!(mgr.status("m"), DownloadStatus::Idle);
        assert!(mgr.begin("m").is_some());
    }

    #[test]
    fn test_update_after_cancel_is_dropped() {
        let mut mgr = DownloadManager::default();
        mgr.begin("m");
        mgr.cancel_all();

        // Already queued when the run was cancelled
        mgr.apply(&DownloadUpdate::Progress {
            movie_id: "m".into(),
            percent: 30,
        });
        mgr.apply(&DownloadUpdate::Completed { movie_id: "m".into() });
        assert_eq!(mgr.status("m"), DownloadStatus::Idle);
        assert_eq!(mgr.active().count(), 0);
        assert!(mgr.begin("m").is_some());
    }
}
