//! User model
//!
//! This module defines the platform user as the client sees it, in two shapes:
//! - `UserPayload`: the record exactly as the API returns it, where `avatar`
//!   may be a string path, an upload object, or missing
//! - `User`: the canonical record held in the session, with `avatar` resolved
//!   to a single string path
//!
//! It also holds the input types for the profile and registration forms.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Avatar shown when the server has none on record
pub const DEFAULT_AVATAR: &str = "/images/avatar.png";

/// Canonical user held by the session.
///
/// Produced from a [`UserPayload`] by [`UserPayload::normalize`]; never
/// deserialized from server responses directly except through the persisted
/// session record, which only ever contains canonical users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
    /// `false` once an administrator suspends the account
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Reward points balance
    #[serde(default)]
    pub points: i64,
    #[serde(default, deserialize_with = "deserialize_ids")]
    pub owned_books: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_ids")]
    pub saved_documents: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_ids")]
    pub uploaded_documents: Vec<String>,
    /// Enrolled module codes
    #[serde(default)]
    pub current_modules: Vec<String>,
    /// Avatar path, always resolved
    pub avatar: String,
    /// Server fields this client does not interpret, carried through unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Check if the user is an administrator
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Check if the account has been suspended
    pub fn is_suspended(&self) -> bool {
        !self.is_active
    }

    /// Check if the user owns the given reward book
    pub fn owns_book(&self, book_id: &str) -> bool {
        self.owned_books.iter().any(|b| b == book_id)
    }
}

/// User record as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub points: i64,
    #[serde(default, deserialize_with = "deserialize_ids")]
    pub owned_books: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_ids")]
    pub saved_documents: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_ids")]
    pub uploaded_documents: Vec<String>,
    #[serde(default)]
    pub current_modules: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<AvatarRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserPayload {
    /// The server reports the email address as not yet confirmed.
    ///
    /// Records without the flag are treated as verified.
    pub fn email_unverified(&self) -> bool {
        self.extra.get("emailVerified") == Some(&Value::Bool(false))
    }

    /// Create a minimal payload with the given id and defaults elsewhere
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: String::new(),
            email: String::new(),
            role: UserRole::default(),
            is_active: true,
            points: 0,
            owned_books: Vec::new(),
            saved_documents: Vec::new(),
            uploaded_documents: Vec::new(),
            current_modules: Vec::new(),
            avatar: None,
            extra: Map::new(),
        }
    }

    /// Resolve the avatar and produce the canonical user.
    ///
    /// `placeholder` is used when the payload has no usable avatar path.
    pub fn normalize(self, placeholder: &str) -> User {
        let avatar = self
            .avatar
            .as_ref()
            .and_then(AvatarRef::path)
            .unwrap_or(placeholder)
            .to_string();

        User {
            id: self.id,
            username: self.username,
            email: self.email,
            role: self.role,
            is_active: self.is_active,
            points: self.points,
            owned_books: self.owned_books,
            saved_documents: self.saved_documents,
            uploaded_documents: self.uploaded_documents,
            current_modules: self.current_modules,
            avatar,
            extra: self.extra,
        }
    }
}

impl From<UserPayload> for User {
    fn from(payload: UserPayload) -> Self {
        payload.normalize(DEFAULT_AVATAR)
    }
}

/// Avatar reference as sent by the server: either a bare path or the stored
/// upload object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AvatarRef {
    Path(String),
    Upload {
        #[serde(default)]
        path: Option<String>,
    },
}

impl AvatarRef {
    /// The usable path, if any
    pub fn path(&self) -> Option<&str> {
        let path = match self {
            AvatarRef::Path(path) => path.as_str(),
            AvatarRef::Upload { path } => path.as_deref()?,
        };
        if path.trim().is_empty() {
            None
        } else {
            Some(path)
        }
    }
}

/// User role for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular student account
    #[default]
    User,
    /// Administrator - may broadcast messages and moderate
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::User => write!(f, "user"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

/// A file attached to a multipart form (the student ID card)
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// Input for updating the signed-in user's profile
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    /// Replacement ID card (optional)
    pub id_card: Option<FileUpload>,
}

impl ProfileUpdate {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            id_card: None,
        }
    }

    pub fn with_id_card(mut self, id_card: FileUpload) -> Self {
        self.id_card = Some(id_card);
        self
    }
}

/// Input for account registration
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    /// Plaintext password, sent once over TLS
    pub password: String,
    pub id_card: Option<FileUpload>,
}

impl RegistrationForm {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            id_card: None,
        }
    }
}

fn default_active() -> bool {
    true
}

/// Accept identifier lists as plain ids or as populated documents with `_id`.
fn deserialize_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRef {
        Id(String),
        Document {
            #[serde(rename = "_id")]
            id: String,
        },
    }

    let refs = Option::<Vec<IdRef>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(refs
        .into_iter()
        .map(|r| match r {
            IdRef::Id(id) => id,
            IdRef::Document { id } => id,
        })
        .collect())
}
