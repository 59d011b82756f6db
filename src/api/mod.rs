//! Backend API client
//!
//! - client: transport, bearer auth, error mapping
//! - catalog: movies, search, ratings
//! - library: my list, progress, downloads, profiles
//! - auth: login and register

pub mod auth;
pub mod catalog;
pub mod client;
pub mod library;

pub use auth::auth_failure_message;
pub use client::{ApiClient, ApiError, ApiResult};
pub use library::{NewProfile, ProfileUpdate};
