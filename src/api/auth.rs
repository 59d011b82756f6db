//! Authentication endpoints
//!
//! Login and register only return credentials; storing them is the
//! caller's job (see [`crate::session::Session::login`]).

use serde::Serialize;

use super::client::{ApiClient, ApiError, ApiResult};
use crate::models::AuthResponse;

/// Shortest password the register form accepts
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

impl ApiClient {
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        self.post("/auth/login", &LoginRequest { email, password })
            .await
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> ApiResult<AuthResponse> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::InvalidArgument(
                "Password must be at least 6 characters long".into(),
            ));
        }
        self.post(
            "/auth/register",
            &RegisterRequest {
                name,
                email,
                password,
            },
        )
        .await
    }
}

/// One-line message for a failed login/register attempt
pub fn auth_failure_message(err: &ApiError, fallback: &str) -> String {
    match err {
        ApiError::RequestFailed(_) => "Network error. Please try again.".to_string(),
        ApiError::InvalidArgument(msg) => msg.clone(),
        other => other
            .backend_message()
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string()),
    }
}
