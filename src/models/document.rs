//! Shared study documents

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::FileUpload;

/// A document uploaded by a student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub course_code: String,
    #[serde(default)]
    pub university: String,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub dislikes: i64,
    /// `false` once the document was taken down for too many dislikes
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_active() -> bool {
    true
}

impl Document {
    /// Whether this document belongs to `module`, ignoring case and padding
    pub fn in_module(&self, module: &str) -> bool {
        self.course_code.trim().eq_ignore_ascii_case(module.trim())
    }
}

/// Documents listed under one course code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentGroup {
    pub course_code: String,
    #[serde(default)]
    pub documents: Vec<Document>,
}

/// Group `documents` under each of `modules`, in module order.
///
/// Module codes are upper-cased; modules without documents are left out.
pub fn group_by_module(modules: &[String], documents: &[Document]) -> Vec<DocumentGroup> {
    modules
        .iter()
        .filter_map(|module| {
            let matching: Vec<Document> = documents
                .iter()
                .filter(|d| d.in_module(module))
                .cloned()
                .collect();
            (!matching.is_empty()).then(|| DocumentGroup {
                course_code: module.trim().to_uppercase(),
                documents: matching,
            })
        })
        .collect()
}

/// Curated document listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFeed {
    Newest,
    MostLiked,
    /// Requires a session
    RecentlyViewed,
}

impl DocumentFeed {
    pub fn path(&self) -> &'static str {
        match self {
            DocumentFeed::Newest => "auth/documents/newest",
            DocumentFeed::MostLiked => "auth/documents/most-liked",
            DocumentFeed::RecentlyViewed => "auth/documents/recently-viewed",
        }
    }
}

/// A like or a dislike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Like,
    Dislike,
}

impl Vote {
    pub fn add_action(&self) -> &'static str {
        match self {
            Vote::Like => "like",
            Vote::Dislike => "dislike",
        }
    }

    pub fn remove_action(&self) -> &'static str {
        match self {
            Vote::Like => "remove-like",
            Vote::Dislike => "remove-dislike",
        }
    }

    /// Actions that take a user from `current` to the vote after pressing
    /// `pressed`, and that resulting vote.
    ///
    /// Pressing the active vote clears it; pressing the other one swaps.
    pub fn toggle(current: Option<Vote>, pressed: Vote) -> (Vec<&'static str>, Option<Vote>) {
        match current {
            Some(vote) if vote == pressed => (vec![vote.remove_action()], None),
            Some(vote) => (vec![vote.remove_action(), pressed.add_action()], Some(pressed)),
            None => (vec![pressed.add_action()], Some(pressed)),
        }
    }
}

/// A document to share
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentUpload {
    pub file: FileUpload,
    pub title: String,
    pub university: String,
    pub course_code: String,
    pub year: Option<String>,
}

impl DocumentUpload {
    /// Every text field is filled in
    pub fn is_complete(&self) -> bool {
        [&self.title, &self.university, &self.course_code]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}
