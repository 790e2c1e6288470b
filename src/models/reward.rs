//! Rewards shop model

use serde::{Deserialize, Serialize};

use super::User;

/// Book that can be unlocked with reward points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardBook {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    /// Cost in points
    pub price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    /// Path of the unlocked PDF
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl RewardBook {
    /// Whether `user` may redeem this book right now
    pub fn affordable_by(&self, user: &User) -> bool {
        !user.owns_book(&self.id) && user.points >= self.price
    }

    /// File name the reader route expects
    pub fn reader_file(&self) -> Option<&str> {
        self.pdf.as_deref().and_then(|p| p.rsplit('/').next())
    }
}

/// `GET /rewards/books`
#[derive(Debug, Clone, Deserialize)]
pub struct RewardBooksResponse {
    #[serde(default)]
    pub books: Vec<RewardBook>,
}
