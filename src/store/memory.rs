//! In-memory session store
//!
//! Holds the serialized record in process memory. Nothing survives a
//! restart of the process, but a store shared between two contexts behaves
//! like a shared file, which is what reload tests need.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{decode, encode, PersistedRecord, SessionStore, StoreError};

/// Memory session store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    raw: RwLock<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a boxed store for use with dependency injection
    pub fn boxed() -> Arc<dyn SessionStore> {
        Arc::new(Self::new())
    }

    /// Seed the slot with raw text, valid or not
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: RwLock::new(Some(raw.into())),
        }
    }

    /// Raw contents of the slot
    pub async fn raw(&self) -> Option<String> {
        self.raw.read().await.clone()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<PersistedRecord>, StoreError> {
        match self.raw.read().await.as_deref() {
            Some(raw) => decode(raw).map(Some),
            None => Ok(None),
        }
    }

    async fn save(&self, record: &PersistedRecord) -> Result<(), StoreError> {
        let raw = encode(record)?;
        *self.raw.write().await = Some(raw);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.raw.write().await = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{User, UserPayload};

    #[tokio::test]
    async fn test_save_and_clear() {
        let store = MemorySessionStore::new();
        let record = PersistedRecord {
            user: User::from(UserPayload::new("u1")),
            token: "tok".to_string(),
        };

        store.save(&record).await.unwrap();
        assert!(store.raw().await.unwrap().contains("\"tok\""));
        assert_eq!(store.load().await.unwrap(), Some(record));

        store.clear().await.unwrap();
        assert!(store.raw().await.is_none());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_seed() {
        let store = MemorySessionStore::with_raw("[]");
        assert!(matches!(store.load().await, Err(StoreError::Malformed(_))));
    }
}
