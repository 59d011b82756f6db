//! Player controller and progress reporting tests

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use mockito::{Matcher, Server};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use flixtui::models::{AuthResponse, AuthUser, Movie, WatchProgress};
use flixtui::player::{
    self, KeyOutcome, MediaElement, MediaEvent, PlayerController, PlayerError, ProgressReporter,
};
use flixtui::{ApiClient, Session};

/// Element that only remembers what it was told
#[derive(Clone, Default)]
struct FakeElement {
    log: Arc<Mutex<Vec<String>>>,
    fail_seek: bool,
}

impl FakeElement {
    fn record(&self, entry: String) -> Result<(), PlayerError> {
        self.log.lock().unwrap().push(entry);
        Ok(())
    }

    fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

impl MediaElement for FakeElement {
    fn load(&mut self, sources: &[String], start: f64) -> Result<(), PlayerError> {
        self.record(format!("load[{}]@{}", sources.len(), start))
    }
    fn play(&mut self) -> Result<(), PlayerError> {
        self.record("play".into())
    }
    fn pause(&mut self) -> Result<(), PlayerError> {
        self.record("pause".into())
    }
    fn seek(&mut self, seconds: f64) -> Result<(), PlayerError> {
        if self.fail_seek {
            return Err(PlayerError::Ipc("socket gone".into()));
        }
        self.record(format!("seek {}", seconds))
    }
    fn set_volume(&mut self, volume: f64) -> Result<(), PlayerError> {
        self.record(format!("volume {:.1}", volume))
    }
    fn set_muted(&mut self, muted: bool) -> Result<(), PlayerError> {
        self.record(format!("muted {}", muted))
    }
    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<(), PlayerError> {
        self.record(format!("fullscreen {}", fullscreen))
    }
    fn close(&mut self) -> Result<(), PlayerError> {
        self.record("close".into())
    }
}

fn movie(video_url: Option<&str>) -> Movie {
    serde_json::from_value(json!({
        "_id": "m1",
        "title": "Sintel",
        "videoUrl": video_url,
    }))
    .unwrap()
}

fn open(element: FakeElement, resume: f64) -> PlayerController {
    PlayerController::open(
        movie(None),
        Box::new(element),
        &["http://backend/api/video/stream/m1".to_string()],
        resume,
        Duration::from_secs(3),
    )
    .unwrap()
}

// =============================================================================
// Sources
// =============================================================================

#[test]
fn test_sources_prefer_backend_then_own_url() {
    let fallbacks = vec!["https://f1/a.mp4".to_string(), "https://f2/b.mp4".to_string()];

    let with_own = player::sources_for(
        "http://backend/api/video/stream/m1".into(),
        &movie(Some("https://cdn/own.mp4")),
        &fallbacks,
    );
    assert_eq!(
        with_own,
        vec![
            "http://backend/api/video/stream/m1",
            "https://cdn/own.mp4",
            "https://f2/b.mp4"
        ]
    );

    let without = player::sources_for("http://backend/s".into(), &movie(None), &fallbacks);
    assert_eq!(
        without,
        vec!["http://backend/s", "https://f1/a.mp4", "https://f2/b.mp4"]
    );
}

// =============================================================================
// Controller
// =============================================================================

#[test]
fn test_keys_drive_element() {
    let el = FakeElement::default();
    let mut ctl = open(el.clone(), 30.0);
    let now = Instant::now();

    ctl.handle_event(MediaEvent::LoadedMetadata(120.0));
    assert_eq!(ctl.handle_key(KeyCode::Char(' '), now), KeyOutcome::Handled);
    assert!(ctl.state().playing);
    ctl.handle_key(KeyCode::Right, now);
    assert_eq!(ctl.state().current_time, 40.0);
    ctl.handle_key(KeyCode::Char('m'), now);
    assert!(ctl.state().muted);
    assert_eq!(ctl.handle_key(KeyCode::Char('z'), now), KeyOutcome::Ignored);

    assert_eq!(
        el.entries(),
        vec!["load[1]@30", "play", "seek 40", "muted true"]
    );
}

#[test]
fn test_element_errors_do_not_break_state() {
    let el = FakeElement {
        fail_seek: true,
        ..FakeElement::default()
    };
    let mut ctl = open(el, 0.0);
    ctl.handle_event(MediaEvent::LoadedMetadata(60.0));
    ctl.seek(20.0);
    assert_eq!(ctl.state().current_time, 20.0);
}

#[test]
fn test_ended_shows_controls() {
    let mut ctl = open(FakeElement::default(), 0.0);
    let start = Instant::now();
    ctl.toggle_play();
    ctl.activity(start);
    ctl.tick(start + Duration::from_secs(5));
    assert!(!ctl.state().controls_visible);

    ctl.handle_event(MediaEvent::Ended);
    assert!(ctl.state().ended);
    assert!(ctl.state().controls_visible);
}

#[test]
fn test_drop_closes_element() {
    let el = FakeElement::default();
    {
        let _ctl = open(el.clone(), 0.0);
    }
    assert_eq!(el.entries().last().map(String::as_str), Some("close"));
}

// =============================================================================
// Progress reporting
// =============================================================================

fn signed_in(origin: String) -> ApiClient {
    let session = Session::in_memory();
    session
        .login(AuthResponse {
            token: "tok".into(),
            user: AuthUser {
                id: "u1".into(),
                name: "Ada".into(),
                email: "ada@example.com".into(),
            },
        })
        .unwrap();
    ApiClient::new(origin, session)
}

#[tokio::test]
async fn test_reporter_posts_every_update_in_order() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/user/watch-progress")
        .match_body(Matcher::PartialJson(json!({"movieId": "m1"})))
        .with_status(200)
        .with_body("{}")
        .expect(3)
        .create_async()
        .await;

    let reporter = ProgressReporter::spawn(signed_in(server.url()), CancellationToken::new());
    for t in [1.0, 2.0, 3.0] {
        reporter.report(WatchProgress::new("m1", t, 100.0));
    }
    reporter.finish().await;
    mock.assert_async().await;
}

#[tokio::test]
async fn test_reporter_keeps_going_after_failures() {
    let mut server = Server::new_async().await;
    let failing = server
        .mock("POST", "/api/user/watch-progress")
        .match_body(Matcher::PartialJson(json!({"currentTime": 1.0})))
        .with_status(500)
        .create_async()
        .await;
    let ok = server
        .mock("POST", "/api/user/watch-progress")
        .match_body(Matcher::PartialJson(json!({"currentTime": 2.0})))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let reporter = ProgressReporter::spawn(signed_in(server.url()), CancellationToken::new());
    reporter.report(WatchProgress::new("m1", 1.0, 100.0));
    reporter.report(WatchProgress::new("m1", 2.0, 100.0));
    reporter.finish().await;

    failing.assert_async().await;
    ok.assert_async().await;
}

#[tokio::test]
async fn test_closed_reporter_ignores_records() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/user/watch-progress")
        .expect(0)
        .create_async()
        .await;

    let cancel = CancellationToken::new();
    let reporter = ProgressReporter::spawn(signed_in(server.url()), cancel.clone());
    cancel.cancel();
    assert!(reporter.is_closed());
    reporter.report(WatchProgress::new("m1", 5.0, 100.0));
    reporter.shutdown().await;
    mock.assert_async().await;
}
