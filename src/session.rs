//! Signed-in session
//!
//! One `Session` is created at startup and handed to every component that
//! talks to the backend. It owns the bearer token and the user record, keeps
//! them in ~/.config/flixtui/session.toml between runs, and records when the
//! backend rejected the token so the UI can force the login screen.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use thiserror::Error;

use crate::models::{AuthResponse, AuthUser};

/// Session persistence errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Could not write session file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not encode session: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// What is stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    pub user: AuthUser,
}

impl From<AuthResponse> for Credentials {
    fn from(resp: AuthResponse) -> Self {
        Self {
            token: resp.token,
            user: resp.user,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    credentials: RwLock<Option<Credentials>>,
    expired: AtomicBool,
}

/// Shared handle to the current session
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<Inner>,
    store: Option<PathBuf>,
}

impl Session {
    /// Default session file (~/.config/flixtui/session.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("flixtui").join("session.toml"))
    }

    /// In-memory session, nothing is persisted
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Session backed by a file; previously stored credentials are restored
    pub fn with_store(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let restored = read_credentials(&path);
        if restored.is_some() {
            tracing::debug!(path = %path.display(), "restored stored session");
        }
        Self {
            inner: Arc::new(Inner {
                credentials: RwLock::new(restored),
                expired: AtomicBool::new(false),
            }),
            store: Some(path),
        }
    }

    /// Session at the default location, in memory when no config dir exists
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::with_store(path),
            None => Self::in_memory(),
        }
    }

    /// Bearer token, if signed in
    pub fn token(&self) -> Option<String> {
        self.read().as_ref().map(|c| c.token.clone())
    }

    /// Signed-in user, if any
    pub fn user(&self) -> Option<AuthUser> {
        self.read().as_ref().map(|c| c.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    /// Start a session from a successful auth reply
    pub fn login(&self, credentials: impl Into<Credentials>) -> Result<(), SessionError> {
        let credentials = credentials.into();
        tracing::info!(user = %credentials.user.email, "signed in");
        self.write(Some(credentials.clone()));
        self.inner.expired.store(false, Ordering::SeqCst);
        if let Some(path) = &self.store {
            write_credentials(path, &credentials)?;
        }
        Ok(())
    }

    /// End the session and forget stored credentials
    pub fn logout(&self) {
        self.write(None);
        if let Some(path) = &self.store {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "could not remove session file");
                }
            }
        }
    }

    /// Backend answered 401 for a request sent with `token`: drop the
    /// credentials and flag the expiry.
    ///
    /// A rejection of a token that is no longer current (the user signed in
    /// again while the request was in flight) leaves the session alone.
    pub fn expire(&self, token: &str) {
        {
            let mut guard = self.guard_mut();
            if guard.as_ref().map(|c| c.token.as_str()) != Some(token) {
                tracing::debug!("ignoring rejection of a replaced token");
                return;
            }
            *guard = None;
        }
        tracing::warn!("session rejected by backend, signing out");
        self.logout();
        self.inner.expired.store(true, Ordering::SeqCst);
    }

    /// Returns true once after each expiry
    pub fn take_expired(&self) -> bool {
        self.inner.expired.swap(false, Ordering::SeqCst)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<Credentials>> {
        self.inner
            .credentials
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn guard_mut(&self) -> std::sync::RwLockWriteGuard<'_, Option<Credentials>> {
        self.inner
            .credentials
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self, value: Option<Credentials>) {
        *self.guard_mut() = value;
    }
}

fn read_credentials(path: &Path) -> Option<Credentials> {
    let text = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&text) {
        Ok(c) => Some(c),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable session file");
            None
        }
    }
}

fn write_credentials(path: &Path, credentials: &Credentials) -> Result<(), SessionError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(credentials)?)?;
    Ok(())
}
