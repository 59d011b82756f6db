//! Backend REST client
//!
//! Thin wrapper over reqwest that attaches the session's bearer token,
//! decodes JSON replies and maps HTTP failures onto [`ApiError`].
//! A 401 from any endpoint expires the shared [`Session`].

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::session::Session;

/// Backend API error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Session expired (401)")]
    Unauthorized(Option<String>),

    #[error("Resource not found (404)")]
    NotFound,

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Server error: {0}")]
    ServerError(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

impl ApiError {
    /// Message the backend attached to the failure, if any
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized(msg) => msg.as_deref(),
            ApiError::Rejected { message, .. } => Some(message),
            _ => None,
        }
    }

    /// True when the request never got an HTTP answer
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::RequestFailed(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Backend API client
#[derive(Debug, Clone)]
pub struct ApiClient {
    origin: String,
    client: reqwest::Client,
    session: Session,
}

impl ApiClient {
    /// Create a client for a backend origin (`/api` is appended)
    pub fn new(origin: impl Into<String>, session: Session) -> Self {
        let origin = origin.into().trim_end_matches('/').to_string();
        Self {
            origin,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            session,
        }
    }

    /// Backend origin, without the `/api` suffix
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Full URL for an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.origin, path)
    }

    /// Streaming endpoint for a movie
    pub fn stream_url(&self, movie_id: &str) -> String {
        self.url(&format!("/video/stream/{}", movie_id))
    }

    /// Builder for an API call, paired with the token it carries
    fn request(&self, method: Method, path: &str) -> (RequestBuilder, Option<String>) {
        let mut req = self
            .client
            .request(method, self.url(path))
            .header("Accept", "application/json");
        let token = self.session.token();
        if let Some(token) = &token {
            req = req.bearer_auth(token);
        }
        (req, token)
    }

    /// Send a request and return the raw body of a 2xx reply
    async fn execute(&self, req: RequestBuilder, token: Option<String>) -> ApiResult<String> {
        let response = req.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message);

        match status {
            StatusCode::UNAUTHORIZED => {
                if let Some(token) = &token {
                    self.session.expire(token);
                }
                Err(ApiError::Unauthorized(message))
            }
            StatusCode::NOT_FOUND => Err(ApiError::NotFound),
            s if s.is_server_error() => Err(ApiError::ServerError(s.as_u16())),
            s => Err(ApiError::Rejected {
                status: s.as_u16(),
                message: message.unwrap_or_else(|| {
                    s.canonical_reason().unwrap_or("request rejected").to_string()
                }),
            }),
        }
    }

    fn decode<T: DeserializeOwned>(body: &str) -> ApiResult<T> {
        serde_json::from_str(body)
            .map_err(|e| ApiError::InvalidResponse(format!("JSON parse error: {}", e)))
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let (req, token) = self.request(Method::GET, path);
        let body = self.execute(req, token).await?;
        Self::decode(&body)
    }

    pub(crate) async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        payload: &B,
    ) -> ApiResult<T> {
        let (req, token) = self.request(Method::POST, path);
        let body = self.execute(req.json(payload), token).await?;
        Self::decode(&body)
    }

    /// POST where the reply body is not needed
    pub(crate) async fn post_unit<B: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &B,
    ) -> ApiResult<()> {
        let (req, token) = self.request(Method::POST, path);
        self.execute(req.json(payload), token)
            .await
            .map(|_| ())
    }

    pub(crate) async fn put_unit<B: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &B,
    ) -> ApiResult<()> {
        let (req, token) = self.request(Method::PUT, path);
        self.execute(req.json(payload), token)
            .await
            .map(|_| ())
    }

    pub(crate) async fn delete(&self, path: &str) -> ApiResult<()> {
        let (req, token) = self.request(Method::DELETE, path);
        self.execute(req, token)
            .await
            .map(|_| ())
    }
}
