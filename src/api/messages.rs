//! Inbox endpoints

use reqwest::Method;
use serde::de::IgnoredAny;

use super::{ApiClient, ApiError};
use crate::models::InboxResponse;

impl ApiClient {
    /// GET /messages/inbox
    pub async fn inbox(&self) -> Result<InboxResponse, ApiError> {
        self.send(self.request(Method::GET, "messages/inbox")).await
    }

    /// POST /messages/mark-read/{id}
    pub async fn mark_read(&self, message_id: &str) -> Result<(), ApiError> {
        let path = format!("messages/mark-read/{}", urlencoding::encode(message_id));
        let _: IgnoredAny = self
            .send(self.request(Method::POST, &path).json(&serde_json::json!({})))
            .await?;
        Ok(())
    }
}
