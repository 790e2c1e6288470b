//! Data models
//!
//! This module contains the data structures shared by the client layers:
//! - The user record in its wire and canonical shapes
//! - The session, its lifecycle phase and the consumer snapshot
//! - Warnings, inbox messages and reward books fetched from the API
//! - Shared documents, their listings and votes

mod document;
mod notification;
mod reward;
mod session;
mod user;

pub use document::{
    group_by_module, Document, DocumentFeed, DocumentGroup, DocumentUpload, Vote,
};
pub use notification::{
    InboxMessage, InboxResponse, Warning, WarningsResponse, DEFAULT_WARNING_MESSAGE,
};
pub use reward::{RewardBook, RewardBooksResponse};
pub use session::{AdminAccess, AuthSession, SessionPhase, SessionSignal, SessionSnapshot};
pub use user::{
    AvatarRef, FileUpload, ProfileUpdate, RegistrationForm, User, UserPayload, UserRole,
    DEFAULT_AVATAR,
};
