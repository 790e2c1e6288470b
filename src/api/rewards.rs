//! Rewards shop endpoints

use reqwest::Method;
use serde::Serialize;

use super::{ApiClient, ApiError, MessageResponse};
use crate::models::{RewardBook, RewardBooksResponse};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RedeemRequest<'a> {
    book_id: &'a str,
}

impl ApiClient {
    /// GET /rewards/books
    pub async fn reward_books(&self) -> Result<Vec<RewardBook>, ApiError> {
        let res: RewardBooksResponse = self.send(self.request(Method::GET, "rewards/books")).await?;
        Ok(res.books)
    }

    /// POST /rewards/redeem
    pub async fn redeem(&self, book_id: &str) -> Result<MessageResponse, ApiError> {
        let request = self
            .request(Method::POST, "rewards/redeem")
            .json(&RedeemRequest { book_id });
        self.send(request).await
    }
}
