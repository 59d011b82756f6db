//! Backend client tests
//!
//! Tests request shapes, bearer auth, reply decoding and error mapping.

use mockito::{Matcher, Server};
use serde_json::json;

use flixtui::api::{ApiClient, ApiError, ProfileUpdate};
use flixtui::models::{AuthResponse, AuthUser, WatchProgress};
use flixtui::session::Session;

fn signed_in(origin: String) -> ApiClient {
    let session = Session::in_memory();
    session
        .login(AuthResponse {
            token: "tok-123".into(),
            user: AuthUser {
                id: "u1".into(),
                name: "Ada".into(),
                email: "ada@example.com".into(),
            },
        })
        .unwrap();
    ApiClient::new(origin, session)
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_movies_parse_backend_shape() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/movies")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                {
                    "_id": "65a1",
                    "title": "Dune",
                    "description": "Spice.",
                    "year": 2021,
                    "rating": 8.0,
                    "duration": "2h 35m",
                    "genre": ["Sci-Fi", "Adventure"],
                    "category": "scifi",
                    "videoUrl": "https://cdn.example.com/dune.mp4",
                    "__v": 0
                },
                { "_id": "65a2", "title": "Bare" }
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let client = ApiClient::new(server.url(), Session::in_memory());
    let movies = client.movies().await.unwrap();
    mock.assert_async().await;

    assert_eq!(movies.len(), 2);
    assert_eq!(movies[0].id, "65a1");
    assert_eq!(movies[0].year, Some(2021));
    assert_eq!(movies[0].genre, vec!["Sci-Fi", "Adventure"]);
    assert_eq!(
        movies[0].video_url.as_deref(),
        Some("https://cdn.example.com/dune.mp4")
    );

    // Missing optional fields default
    assert_eq!(movies[1].year, None);
    assert_eq!(movies[1].rating, 0.0);
    assert!(movies[1].genre.is_empty());
}

#[tokio::test]
async fn test_search_encodes_query() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/movies/search")
        .match_query(Matcher::UrlEncoded("q".into(), "blade runner & co".into()))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let client = ApiClient::new(server.url(), Session::in_memory());
    let results = client.search("blade runner & co").await.unwrap();
    mock.assert_async().await;
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_ratings_summary() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/movies/m1/ratings")
        .with_status(200)
        .with_body(r#"{"average": 4.5, "count": 2}"#)
        .create_async()
        .await;

    let client = ApiClient::new(server.url(), Session::in_memory());
    let summary = client.ratings("m1").await.unwrap();
    assert!(summary.is_visible());
    assert_eq!(summary.to_string(), "4.5 (2 ratings)");
}

#[tokio::test]
async fn test_rate_rejects_out_of_range_without_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/movies/rate")
        .expect(0)
        .create_async()
        .await;

    let client = signed_in(server.url());
    let err = client.rate("m1", 6).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidArgument(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rate_posts_camel_case_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/movies/rate")
        .match_header("authorization", "Bearer tok-123")
        .match_body(Matcher::Json(json!({"movieId": "m1", "rating": 4})))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let client = signed_in(server.url());
    client.rate("m1", 4).await.unwrap();
    mock.assert_async().await;
}

// =============================================================================
// Library
// =============================================================================

#[tokio::test]
async fn test_list_add_sends_bearer_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/user/list/add")
        .match_header("authorization", "Bearer tok-123")
        .match_body(Matcher::Json(json!({"movieId": "m7"})))
        .with_status(200)
        .with_body(r#"{"message": "Added"}"#)
        .create_async()
        .await;

    let client = signed_in(server.url());
    client.add_to_list("m7").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_save_progress_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/user/watch-progress")
        .match_body(Matcher::Json(json!({
            "movieId": "m1",
            "currentTime": 42.5,
            "duration": 600.0
        })))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let client = signed_in(server.url());
    client
        .save_progress(&WatchProgress::new("m1", 42.5, 600.0))
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_continue_watching_tolerates_missing_movie() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/user/continue-watching")
        .with_status(200)
        .with_body(
            json!([
                {"movie": {"_id": "m1", "title": "Heat"}, "currentTime": 300.0, "duration": 600.0},
                {"movie": null, "currentTime": 10.0, "duration": 100.0}
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let client = signed_in(server.url());
    let items = client.continue_watching().await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].percent(), 50.0);
    assert!(items[1].movie.is_none());
}

#[tokio::test]
async fn test_downloads_parse_and_display() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/user/downloads")
        .with_status(200)
        .with_body(
            json!([{
                "_id": "d1",
                "movie": {"_id": "m1", "title": "Heat"},
                "downloadedAt": "2024-03-05T10:00:00.000Z"
            }])
            .to_string(),
        )
        .create_async()
        .await;

    let client = signed_in(server.url());
    let records = client.downloads().await.unwrap();
    assert_eq!(records[0].display_size(), "500 MB");
    assert_eq!(records[0].downloaded_on(), "2024-03-05");
}

#[tokio::test]
async fn test_profile_update_sends_only_set_fields() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/api/user/profiles/p1")
        .match_body(Matcher::Json(json!({"name": "Kids"})))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let client = signed_in(server.url());
    let update = ProfileUpdate {
        name: Some("Kids".into()),
        ..ProfileUpdate::default()
    };
    client.update_profile("p1", &update).await.unwrap();
    mock.assert_async().await;
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_unauthorized_expires_session() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/user/list")
        .with_status(401)
        .with_body(r#"{"message": "Token is not valid"}"#)
        .create_async()
        .await;

    let client = signed_in(server.url());
    assert!(client.session().is_authenticated());

    let err = client.my_list().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.backend_message(), Some("Token is not valid"));

    assert!(!client.session().is_authenticated());
    assert!(client.session().take_expired());
    // Reported once
    assert!(!client.session().take_expired());
}

#[tokio::test]
async fn test_not_found_maps_to_variant() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/movies/missing")
        .with_status(404)
        .with_body(r#"{"message": "Movie not found"}"#)
        .create_async()
        .await;

    let client = ApiClient::new(server.url(), Session::in_memory());
    assert!(matches!(
        client.movie("missing").await,
        Err(ApiError::NotFound)
    ));
}

#[tokio::test]
async fn test_rejected_carries_backend_message() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/auth/login")
        .with_status(400)
        .with_body(r#"{"message": "Invalid credentials"}"#)
        .create_async()
        .await;

    let client = ApiClient::new(server.url(), Session::in_memory());
    let err = client.login("a@b.c", "wrong").await.unwrap_err();
    match &err {
        ApiError::Rejected { status, message } => {
            assert_eq!(*status, 400);
            assert_eq!(message, "Invalid credentials");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(
        flixtui::api::auth_failure_message(&err, "Login failed"),
        "Invalid credentials"
    );
}

#[tokio::test]
async fn test_server_error_and_bad_json() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/movies")
        .with_status(503)
        .create_async()
        .await;
    server
        .mock("GET", "/api/user/profiles")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let client = signed_in(server.url());
    assert!(matches!(
        client.movies().await,
        Err(ApiError::ServerError(503))
    ));
    assert!(matches!(
        client.profiles().await,
        Err(ApiError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    // Nothing listens on port 9 locally
    let client = ApiClient::new("http://127.0.0.1:9", Session::in_memory());
    let err = client.movies().await.unwrap_err();
    assert!(err.is_transport());
}
