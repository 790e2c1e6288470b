//! API layer - client for the platform REST API
//!
//! This module contains everything that talks to the backend:
//! - `ApiClient`, a thin wrapper over `reqwest` rooted at the configured base URL
//! - The interceptor chain that attaches the bearer token and reacts to
//!   authentication failures
//! - Endpoint methods grouped by area (auth, documents, messages, rewards, admin)
//! - The `ApiError` taxonomy

pub mod admin;
pub mod auth;
pub mod client;
pub mod documents;
pub mod error;
pub mod interceptor;
pub mod messages;
pub mod rewards;

use serde::Deserialize;

pub use auth::{LoginResponse, UpdateModulesResponse, UserResponse};
pub use client::ApiClient;
pub use documents::{DocumentsResponse, UploadResponse};
pub use error::ApiError;
pub use interceptor::{AuthFailure, AuthFailureHandler, InterceptorChain, InterceptorHandle};

/// Body of endpoints that only report a message
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

/// Body of endpoints that only report success
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuccessResponse {
    #[serde(default)]
    pub success: bool,
}
