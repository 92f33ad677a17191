//! Credential persistence seam.
//!
//! Only an in-memory store ships here; durable storage belongs to the host.

use std::sync::Mutex;

use crate::error::TokenStoreError;
use crate::identity::Credential;

/// Holds the ambient credential used for identity queries.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<Credential>;

    /// # Errors
    ///
    /// Returns a [`TokenStoreError`] if the credential cannot be written.
    fn store(&self, credential: Credential) -> Result<(), TokenStoreError>;

    /// # Errors
    ///
    /// Returns a [`TokenStoreError`] if the credential cannot be removed.
    fn clear(&self) -> Result<(), TokenStoreError>;
}

/// Process-local token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<Credential>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an already-established credential.
    #[must_use]
    pub fn seeded(credential: Credential) -> Self {
        Self { slot: Mutex::new(Some(credential)) }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<Credential> {
        self.slot.lock().ok()?.clone()
    }

    fn store(&self, credential: Credential) -> Result<(), TokenStoreError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| TokenStoreError::Unavailable(e.to_string()))?;
        *slot = Some(credential);
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| TokenStoreError::Unavailable(e.to_string()))?;
        *slot = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "token_store_test.rs"]
mod token_store_test;
