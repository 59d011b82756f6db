//! Player controller
//!
//! Owns the playback state for one open movie and drives a [`MediaElement`].
//! User actions update state immediately and are forwarded to the element;
//! element events are folded back in, and each time update produces a
//! [`WatchProgress`] for the reporter.

use crossterm::event::KeyCode;
use std::time::{Duration, Instant};

use super::{MediaElement, MediaEvent, PlayerError};
use crate::models::{Movie, WatchProgress};

/// Arrow-key skip distance
pub const SKIP_SECONDS: f64 = 10.0;

/// Up/Down volume step
pub const VOLUME_STEP: f64 = 0.1;

/// Snapshot rendered by the player screen
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub playing: bool,
    pub current_time: f64,
    /// 0 until metadata arrives
    pub duration: f64,
    /// Last non-muting volume, 0.0 to 1.0
    pub volume: f64,
    pub muted: bool,
    pub fullscreen: bool,
    pub controls_visible: bool,
    pub ended: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume: 1.0,
            muted: false,
            fullscreen: false,
            controls_visible: true,
            ended: false,
        }
    }
}

impl PlaybackState {
    /// Volume as displayed: 0 while muted
    pub fn display_volume(&self) -> f64 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    /// Played fraction for the seek bar
    pub fn fraction(&self) -> f64 {
        if self.duration > 0.0 {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    fn clamp_time(&self, seconds: f64) -> f64 {
        let t = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        if self.duration > 0.0 {
            t.min(self.duration)
        } else {
            t
        }
    }
}

/// What the caller should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    Ignored,
    /// Player was closed; leave the screen
    Closed,
}

pub struct PlayerController {
    movie: Movie,
    element: Box<dyn MediaElement>,
    state: PlaybackState,
    hide_after: Duration,
    last_activity: Instant,
    closed: bool,
}

impl std::fmt::Debug for PlayerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerController")
            .field("movie", &self.movie.id)
            .field("state", &self.state)
            .field("closed", &self.closed)
            .finish()
    }
}

impl PlayerController {
    /// Load the element with `sources` and resume at `resume` seconds
    pub fn open(
        movie: Movie,
        mut element: Box<dyn MediaElement>,
        sources: &[String],
        resume: f64,
        hide_after: Duration,
    ) -> Result<Self, PlayerError> {
        if sources.is_empty() {
            return Err(PlayerError::NoSource);
        }
        let start = if resume.is_finite() && resume > 0.0 {
            resume
        } else {
            0.0
        };
        element.load(sources, start)?;
        tracing::info!(movie = %movie.id, sources = sources.len(), start, "player opened");

        Ok(Self {
            movie,
            element,
            state: PlaybackState {
                current_time: start,
                ..PlaybackState::default()
            },
            hide_after,
            last_activity: Instant::now(),
            closed: false,
        })
    }

    pub fn movie(&self) -> &Movie {
        &self.movie
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn forward(&mut self, what: &str, result: Result<(), PlayerError>) {
        if let Err(e) = result {
            tracing::warn!(action = what, error = %e, "media element call failed");
        }
    }

    // -------------------------------------------------------------------------
    // Actions
    // -------------------------------------------------------------------------

    pub fn toggle_play(&mut self) {
        if self.state.playing {
            let r = self.element.pause();
            self.forward("pause", r);
            self.state.playing = false;
            self.state.controls_visible = true;
        } else {
            let r = self.element.play();
            self.forward("play", r);
            self.state.playing = true;
            self.state.ended = false;
        }
    }

    /// Jump to an absolute position, clamped into [0, duration]
    pub fn seek(&mut self, seconds: f64) {
        let t = self.state.clamp_time(seconds);
        let r = self.element.seek(t);
        self.forward("seek", r);
        self.state.current_time = t;
    }

    pub fn skip(&mut self, delta: f64) {
        self.seek(self.state.current_time + delta);
    }

    /// Seek-bar click: fraction of the duration
    pub fn seek_fraction(&mut self, fraction: f64) {
        let f = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.seek(f * self.state.duration);
    }

    /// Setting 0 mutes; any other value unmutes
    pub fn set_volume(&mut self, volume: f64) {
        let v = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let muted = v == 0.0;
        let r = self.element.set_volume(v);
        self.forward("volume", r);
        if muted != self.state.muted {
            let r = self.element.set_muted(muted);
            self.forward("mute", r);
        }
        self.state.volume = v;
        self.state.muted = muted;
    }

    /// Move one step up or down, landing on the step grid so repeated
    /// presses reach exactly 0 and mute
    fn step_volume(&mut self, direction: f64) {
        let steps = (self.state.volume / VOLUME_STEP).round() + direction;
        self.set_volume(steps * VOLUME_STEP);
    }

    pub fn toggle_mute(&mut self) {
        let muted = !self.state.muted;
        let r = self.element.set_muted(muted);
        self.forward("mute", r);
        self.state.muted = muted;
    }

    pub fn toggle_fullscreen(&mut self) {
        let fs = !self.state.fullscreen;
        let r = self.element.set_fullscreen(fs);
        self.forward("fullscreen", r);
        self.state.fullscreen = fs;
    }

    pub fn exit_fullscreen(&mut self) {
        if self.state.fullscreen {
            self.toggle_fullscreen();
        }
    }

    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        let r = self.element.close();
        self.forward("close", r);
        self.closed = true;
        self.state.playing = false;
        tracing::info!(movie = %self.movie.id, at = self.state.current_time, "player closed");
    }

    // -------------------------------------------------------------------------
    // Input and timers
    // -------------------------------------------------------------------------

    /// Space, m, f, Esc, arrows
    pub fn handle_key(&mut self, code: KeyCode, now: Instant) -> KeyOutcome {
        if self.closed {
            return KeyOutcome::Closed;
        }
        self.activity(now);
        match code {
            KeyCode::Char(' ') => self.toggle_play(),
            KeyCode::Char('m') => self.toggle_mute(),
            KeyCode::Char('f') => self.toggle_fullscreen(),
            KeyCode::Esc => {
                if self.state.fullscreen {
                    self.exit_fullscreen();
                } else {
                    self.close();
                    return KeyOutcome::Closed;
                }
            }
            KeyCode::Left => self.skip(-SKIP_SECONDS),
            KeyCode::Right => self.skip(SKIP_SECONDS),
            KeyCode::Up => self.step_volume(1.0),
            KeyCode::Down => self.step_volume(-1.0),
            _ => return KeyOutcome::Ignored,
        }
        KeyOutcome::Handled
    }

    /// Any user activity reveals the controls
    pub fn activity(&mut self, now: Instant) {
        self.last_activity = now;
        self.state.controls_visible = true;
    }

    /// Hide controls after the idle period while playing
    pub fn tick(&mut self, now: Instant) {
        if !self.state.playing {
            self.state.controls_visible = true;
        } else if now.saturating_duration_since(self.last_activity) >= self.hide_after {
            self.state.controls_visible = false;
        }
    }

    // -------------------------------------------------------------------------
    // Element events
    // -------------------------------------------------------------------------

    /// Fold an element event into state; time updates yield a progress record
    pub fn handle_event(&mut self, event: MediaEvent) -> Option<WatchProgress> {
        if self.closed {
            return None;
        }
        match event {
            MediaEvent::TimeUpdate(t) => {
                if !t.is_finite() {
                    return None;
                }
                self.state.current_time = t.max(0.0);
                return Some(WatchProgress::new(
                    self.movie.id.clone(),
                    self.state.current_time,
                    self.state.duration,
                ));
            }
            MediaEvent::LoadedMetadata(d) => {
                if d.is_finite() && d > 0.0 {
                    self.state.duration = d;
                }
            }
            MediaEvent::Play => {
                self.state.playing = true;
                self.state.ended = false;
            }
            MediaEvent::Pause => {
                self.state.playing = false;
                self.state.controls_visible = true;
            }
            MediaEvent::Ended => {
                self.state.playing = false;
                self.state.ended = true;
                self.state.controls_visible = true;
            }
        }
        None
    }
}

impl Drop for PlayerController {
    fn drop(&mut self) {
        self.close();
    }
}
