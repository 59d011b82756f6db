//! My List, ratings, profiles and download simulation against a mock backend

use std::time::Duration;

use mockito::{Matcher, Server};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use flixtui::downloads::{self, DownloadManager, DownloadStatus, DownloadTiming, DownloadUpdate};
use flixtui::library::{self, MutationState, MyList, StarRating};
use flixtui::models::{AuthResponse, AuthUser, Movie};
use flixtui::profiles::{ProfileError, Profiles};
use flixtui::{ApiClient, Session};

fn api(origin: String) -> ApiClient {
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

fn movie(id: &str) -> Movie {
    serde_json::from_value(json!({"_id": id, "title": format!("Title {}", id)})).unwrap()
}

fn fast() -> DownloadTiming {
    DownloadTiming {
        step: Duration::from_millis(1),
        clear_after: Duration::from_millis(1),
    }
}

// =============================================================================
// My List
// =============================================================================

#[tokio::test]
async fn test_toggle_adds_then_removes() {
    let mut server = Server::new_async().await;
    let add = server
        .mock("POST", "/api/user/list/add")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;
    let remove = server
        .mock("POST", "/api/user/list/remove")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let api = api(server.url());
    let mut list = MyList::default();

    assert!(library::toggle(&api, &mut list, &movie("m1")).await.unwrap());
    assert_eq!(list.mutation_state("m1"), Some(MutationState::Confirmed));
    assert!(!library::toggle(&api, &mut list, &movie("m1")).await.unwrap());
    assert!(list.is_empty());

    add.assert_async().await;
    remove.assert_async().await;
}

#[tokio::test]
async fn test_failed_remove_restores_position() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/user/list/remove")
        .with_status(500)
        .create_async()
        .await;

    let api = api(server.url());
    let mut list = MyList::new(vec![movie("a"), movie("b"), movie("c")]);

    let result = library::toggle(&api, &mut list, &movie("b")).await;
    assert!(result.is_err());

    let ids: Vec<&str> = list.movies().iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(list.mutation_state("b"), Some(MutationState::Failed));
}

#[test]
fn test_no_second_change_while_pending() {
    let mut list = MyList::default();
    assert!(list.begin_add(&movie("m1")).is_some());
    assert!(list.begin_toggle(&movie("m1")).is_none());
    assert!(list.is_pending("m1"));
    list.confirm("m1");
    assert!(list.begin_toggle(&movie("m1")).is_some());
}

// =============================================================================
// Ratings
// =============================================================================

#[tokio::test]
async fn test_rate_updates_widget_only_on_success() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/movies/rate")
        .match_body(Matcher::PartialJson(json!({"rating": 4})))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;
    server
        .mock("POST", "/api/movies/rate")
        .match_body(Matcher::PartialJson(json!({"rating": 2})))
        .with_status(500)
        .create_async()
        .await;

    let api = api(server.url());
    let mut widget = StarRating::default();

    assert!(library::rate(&api, "m1", &mut widget, 4).await.unwrap());
    assert_eq!(widget.stars(), "★★★★☆");
    assert!(widget.is_liked());

    assert!(library::rate(&api, "m1", &mut widget, 2).await.is_err());
    assert_eq!(widget.rating, 4);
    assert!(!widget.submitting);

    // Out of range never reaches the backend
    assert!(!library::rate(&api, "m1", &mut widget, 0).await.unwrap());
}

// =============================================================================
// Profiles
// =============================================================================

fn profiles_body(n: usize) -> String {
    let items: Vec<_> = (1..=n)
        .map(|i| json!({"_id": format!("p{}", i), "name": format!("P{}", i), "avatar": "", "isKids": false}))
        .collect();
    serde_json::to_string(&items).unwrap()
}

#[tokio::test]
async fn test_profiles_fall_back_when_listing_fails() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/user/profiles")
        .with_status(500)
        .create_async()
        .await;

    let profiles = Profiles::load(&api(server.url())).await.unwrap();
    assert!(profiles.fallback);
    assert_eq!(profiles.items()[0].name, "Profile 1");
}

#[tokio::test]
async fn test_profile_limit_blocks_create() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/user/profiles")
        .with_status(200)
        .with_body(profiles_body(5))
        .create_async()
        .await;
    let create = server
        .mock("POST", "/api/user/profiles")
        .expect(0)
        .create_async()
        .await;

    let api = api(server.url());
    let mut profiles = Profiles::load(&api).await.unwrap();
    let err = profiles.create(&api, "Sixth").await.unwrap_err();
    assert!(matches!(err, ProfileError::LimitReached));
    create.assert_async().await;
}

#[tokio::test]
async fn test_profile_create_rename_delete() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/user/profiles")
        .with_status(200)
        .with_body(profiles_body(1))
        .create_async()
        .await;
    server
        .mock("POST", "/api/user/profiles")
        .match_body(Matcher::PartialJson(json!({"name": "Kids", "isKids": false})))
        .with_status(201)
        .with_body(r#"{"_id": "p2", "name": "Kids", "avatar": "a.png", "isKids": false}"#)
        .create_async()
        .await;
    server
        .mock("PUT", "/api/user/profiles/p2")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;
    server
        .mock("DELETE", "/api/user/profiles/p1")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let api = api(server.url());
    let mut profiles = Profiles::load(&api).await.unwrap();

    profiles.create(&api, "  Kids ").await.unwrap();
    assert_eq!(profiles.len(), 2);

    profiles.rename(&api, "p2", "Family").await.unwrap();
    assert_eq!(profiles.get("p2").unwrap().name, "Family");

    profiles.delete(&api, "p1").await.unwrap();
    assert_eq!(profiles.len(), 1);

    // Last one stays
    assert!(matches!(
        profiles.delete(&api, "p2").await,
        Err(ProfileError::LastProfile)
    ));
}

// =============================================================================
// Downloads
// =============================================================================

#[tokio::test]
async fn test_download_runs_to_completion_and_records() {
    let mut server = Server::new_async().await;
    let record = server
        .mock("POST", "/api/user/downloads")
        .match_body(Matcher::Json(json!({"movieId": "m1"})))
        .with_status(201)
        .with_body("{}")
        .create_async()
        .await;

    let api = api(server.url());
    let mut manager = DownloadManager::default();
    let token = manager.begin("m1").unwrap();
    assert!(manager.begin("m1").is_none());

    let mut updates = Vec::new();
    let status = downloads::simulate(&api, "m1", fast(), &token, |u| updates.push(u)).await;
    record.assert_async().await;

    assert_eq!(status, Some(DownloadStatus::Completed));
    let percents: Vec<u8> = updates
        .iter()
        .filter_map(|u| match u {
            DownloadUpdate::Progress { percent, .. } => Some(*percent),
            _ => None,
        })
        .collect();
    assert_eq!(percents, vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
    assert!(updates.contains(&DownloadUpdate::Completed {
        movie_id: "m1".into()
    }));
    assert_eq!(
        updates.last(),
        Some(&DownloadUpdate::Cleared {
            movie_id: "m1".into()
        })
    );

    for u in &updates {
        manager.apply(u);
    }
    assert_eq!(manager.status("m1"), DownloadStatus::Idle);
}

#[tokio::test]
async fn test_download_record_failure_surfaces_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/user/downloads")
        .with_status(500)
        .create_async()
        .await;

    let api = api(server.url());
    let mut manager = DownloadManager::default();
    let token = manager.begin("m1").unwrap();
    let status = downloads::simulate(&api, "m1", fast(), &token, |u| manager.apply(&u)).await;

    assert!(matches!(status, Some(DownloadStatus::Error(_))));
    assert!(matches!(manager.status("m1"), DownloadStatus::Error(_)));
    // Retry allowed after an error
    assert!(manager.begin("m1").is_some());
}

#[tokio::test]
async fn test_cancelled_download_emits_nothing_more() {
    let mut server = Server::new_async().await;
    let record = server
        .mock("POST", "/api/user/downloads")
        .expect(0)
        .create_async()
        .await;

    let api = api(server.url());
    let token = CancellationToken::new();
    token.cancel();

    let mut updates = Vec::new();
    let status = downloads::simulate(&api, "m1", fast(), &token, |u| updates.push(u)).await;
    assert_eq!(status, None);
    // Only the initial 0% tick
    assert_eq!(updates.len(), 1);
    record.assert_async().await;
}

#[tokio::test]
async fn test_downloads_run_side_by_side() {
    let mut server = Server::new_async().await;
    let record = server
        .mock("POST", "/api/user/downloads")
        .with_status(201)
        .with_body("{}")
        .expect(3)
        .create_async()
        .await;

    let api = api(server.url());
    let mut manager = DownloadManager::default();
    let runs: Vec<_> = ["m1", "m2", "m3"]
        .into_iter()
        .map(|id| {
            let token = manager.begin(id).unwrap();
            let api = api.clone();
            async move { downloads::simulate(&api, id, fast(), &token, |_| {}).await }
        })
        .collect();

    let statuses = futures::future::join_all(runs).await;
    assert!(statuses
        .iter()
        .all(|s| *s == Some(DownloadStatus::Completed)));
    record.assert_async().await;
}
