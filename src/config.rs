//! Configuration management for FlixTUI
//!
//! Handles config file loading/saving and backend URL resolution.
//! Config is stored at ~/.config/flixtui/config.toml

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Backend used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Public sample videos tried after the backend stream
const SAMPLE_SOURCES: &[&str] = &[
    "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4",
    "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ElephantsDream.mp4",
    "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ForBiggerBlazes.mp4",
];

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend origin, without the `/api` suffix
    pub api_base_url: Option<String>,
    /// Extra media URLs tried after the backend stream
    pub fallback_sources: Option<Vec<String>>,
    /// mpv binary to launch for playback
    pub player: Option<String>,
    /// Interval between simulated download steps (ms)
    pub download_step_ms: Option<u64>,
    /// Idle time before player controls hide (s)
    pub controls_hide_secs: Option<u64>,
}

impl Config {
    /// Get config file path (~/.config/flixtui/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("flixtui").join("config.toml"))
    }

    /// Directory for the TUI log file (~/.local/state/flixtui)
    pub fn log_dir() -> Option<PathBuf> {
        dirs::state_dir()
            .or_else(dirs::cache_dir)
            .map(|p| p.join("flixtui"))
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        Self::path()
            .map(|p| Self::load_from(&p))
            .unwrap_or_default()
    }

    /// Load config from an explicit path (missing or invalid file gives defaults)
    pub fn load_from(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(s) => toml::from_str(&s).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Resolve the backend origin with fallback chain:
    /// 1. Explicit override (CLI flag)
    /// 2. Environment variable FLIX_API_URL
    /// 3. Config file value
    /// 4. Built-in default
    pub fn api_base_url(&self, override_url: Option<&str>) -> String {
        let url = override_url
            .map(str::to_string)
            .or_else(|| std::env::var("FLIX_API_URL").ok().filter(|s| !s.is_empty()))
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        url.trim_end_matches('/').to_string()
    }

    /// Fallback media sources, in the order they are tried
    pub fn fallback_sources(&self) -> Vec<String> {
        match &self.fallback_sources {
            Some(list) if !list.is_empty() => list.clone(),
            _ => SAMPLE_SOURCES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn player_command(&self) -> String {
        self.player.clone().unwrap_or_else(|| "mpv".to_string())
    }

    pub fn download_step(&self) -> Duration {
        Duration::from_millis(self.download_step_ms.unwrap_or(200))
    }

    pub fn controls_hide_after(&self) -> Duration {
        Duration::from_secs(self.controls_hide_secs.unwrap_or(3))
    }
}
