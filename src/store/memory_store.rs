use std::sync::RwLock;

use super::{CredentialStore, StoreError};
use crate::models::Credential;

/// A process-local store, used when persistence is disabled.
#[derive(Default)]
pub struct MemoryCredentialStore {
    credential: RwLock<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that starts out holding `credential`, as if persisted by an earlier run.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: RwLock::new(Some(credential)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credential>, StoreError> {
        Ok(self
            .credential
            .read()
            .expect("memory store lock poisoned")
            .clone())
    }

    fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        *self.credential.write().expect("memory store lock poisoned") = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.credential.write().expect("memory store lock poisoned") = None;
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip_and_clear() {
        let store = MemoryCredentialStore::new();
        assert!(store.load().expect("load").is_none());

        let credential = Credential::new("tok").expect("non-blank");
        store.save(&credential).expect("save");
        assert_eq!(store.load().expect("load"), Some(credential));

        store.clear().expect("clear");
        assert!(store.load().expect("load").is_none());
    }

    #[test]
    fn test_with_credential_is_preloaded() {
        let store = MemoryCredentialStore::with_credential(Credential::new("tok").expect("non-blank"));
        assert!(store.load().expect("load").is_some());
    }
}
