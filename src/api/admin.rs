//! Administrator endpoints

use reqwest::Method;
use serde::Serialize;

use super::{ApiClient, ApiError, SuccessResponse};

#[derive(Debug, Serialize)]
struct BroadcastRequest<'a> {
    title: &'a str,
    body: &'a str,
}

impl ApiClient {
    /// POST /admin/broadcast-message, delivered to every user's inbox
    pub async fn broadcast_message(&self, title: &str, body: &str) -> Result<SuccessResponse, ApiError> {
        let request = self
            .request(Method::POST, "admin/broadcast-message")
            .json(&BroadcastRequest { title, body });
        self.send(request).await
    }
}
