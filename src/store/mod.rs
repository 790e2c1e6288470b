//! Persisted session store
//!
//! Durable single-slot storage for the `{user, token}` pair so a session
//! survives restarts. Only the session context reads or writes it.
//!
//! This module provides:
//! - `SessionStore` trait defining the slot operations
//! - `FileSessionStore` keeping the record in a JSON file
//! - `MemorySessionStore` keeping it in process memory (tests, ephemeral hosts)

pub mod file;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{StorageConfig, StorageDriver};
use crate::models::{AuthSession, User};

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

/// On-disk representation of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub user: User,
    pub token: String,
}

impl From<AuthSession> for PersistedRecord {
    fn from(session: AuthSession) -> Self {
        Self {
            user: session.user,
            token: session.token,
        }
    }
}

impl From<PersistedRecord> for AuthSession {
    fn from(record: PersistedRecord) -> Self {
        AuthSession::new(record.user, record.token)
    }
}

/// Error types for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing medium failed
    #[error("Session store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A record exists but cannot be parsed
    #[error("Persisted session record is malformed: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The record could not be serialized
    #[error("Failed to serialize session record: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Session store trait
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read the record, `None` when the slot is empty
    async fn load(&self) -> Result<Option<PersistedRecord>, StoreError>;

    /// Overwrite the slot
    async fn save(&self, record: &PersistedRecord) -> Result<(), StoreError>;

    /// Empty the slot; clearing an empty slot succeeds
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Create a store based on configuration
pub fn create_store(config: &StorageConfig) -> Arc<dyn SessionStore> {
    match config.driver {
        StorageDriver::File => {
            tracing::info!("Using file session store at {}", config.path.display());
            FileSessionStore::boxed(config.path.clone())
        }
        StorageDriver::Memory => {
            tracing::info!("Using in-memory session store");
            MemorySessionStore::boxed()
        }
    }
}

pub(crate) fn decode(raw: &str) -> Result<PersistedRecord, StoreError> {
    serde_json::from_str(raw).map_err(StoreError::Malformed)
}

pub(crate) fn encode(record: &PersistedRecord) -> Result<String, StoreError> {
    serde_json::to_string(record).map_err(StoreError::Serialize)
}
