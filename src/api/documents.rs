//! Document library endpoints

use reqwest::multipart::Form;
use reqwest::Method;
use serde::de::IgnoredAny;
use serde::Deserialize;

use super::auth::file_part;
use super::{ApiClient, ApiError, SuccessResponse};
use crate::models::{Document, DocumentFeed, DocumentGroup, DocumentUpload, Vote};

/// Document listing
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, Deserialize)]
struct DocumentResponse {
    document: Document,
}

/// `POST /auth/upload`
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    /// Points balance after the upload reward
    #[serde(default)]
    pub points: Option<i64>,
}

fn encode(id: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(id)
}

impl ApiClient {
    /// GET /auth/documents
    pub async fn documents(&self) -> Result<DocumentsResponse, ApiError> {
        self.send(self.request(Method::GET, "auth/documents")).await
    }

    /// GET /auth/documents/{newest,most-liked,recently-viewed}
    pub async fn document_feed(&self, feed: DocumentFeed) -> Result<DocumentsResponse, ApiError> {
        self.send(self.request(Method::GET, feed.path())).await
    }

    /// GET /auth/document/{id}
    pub async fn document(&self, id: &str) -> Result<Document, ApiError> {
        let path = format!("auth/document/{}", encode(id));
        let res: DocumentResponse = self.send(self.request(Method::GET, &path)).await?;
        Ok(res.document)
    }

    /// POST /auth/document/{id}/{like,dislike}
    pub async fn add_vote(&self, id: &str, vote: Vote) -> Result<(), ApiError> {
        self.vote_action(id, vote.add_action()).await
    }

    /// POST /auth/document/{id}/{remove-like,remove-dislike}
    pub async fn remove_vote(&self, id: &str, vote: Vote) -> Result<(), ApiError> {
        self.vote_action(id, vote.remove_action()).await
    }

    pub(crate) async fn vote_action(&self, id: &str, action: &str) -> Result<(), ApiError> {
        let path = format!("auth/document/{}/{}", encode(id), action);
        let _: IgnoredAny = self
            .send(self.request(Method::POST, &path).json(&serde_json::json!({})))
            .await?;
        Ok(())
    }

    /// POST /auth/save/{id}
    pub async fn save_document(&self, id: &str) -> Result<SuccessResponse, ApiError> {
        let path = format!("auth/save/{}", encode(id));
        self.send(self.request(Method::POST, &path)).await
    }

    /// DELETE /auth/unsave/{id}
    pub async fn unsave_document(&self, id: &str) -> Result<SuccessResponse, ApiError> {
        let path = format!("auth/unsave/{}", encode(id));
        self.send(self.request(Method::DELETE, &path)).await
    }

    /// DELETE /auth/documents/{id}
    pub async fn delete_document(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("auth/documents/{}", encode(id));
        let _: IgnoredAny = self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    /// GET /auth/my-documents, saved documents grouped by course
    pub async fn my_documents(&self) -> Result<Vec<DocumentGroup>, ApiError> {
        self.send(self.request(Method::GET, "auth/my-documents")).await
    }

    /// POST /auth/upload
    pub async fn upload_document(
        &self,
        user_id: &str,
        upload: &DocumentUpload,
    ) -> Result<UploadResponse, ApiError> {
        let form = Form::new()
            .part("file", file_part(&upload.file)?)
            .text("university", upload.university.clone())
            .text("courseCode", upload.course_code.clone())
            .text("title", upload.title.clone())
            .text("userId", user_id.to_string())
            .text("year", upload.year.clone().unwrap_or_default());

        self.send(self.request(Method::POST, "auth/upload").multipart(form))
            .await
    }
}
