use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use super::{file_store::FileCredentialStore, memory_store::MemoryCredentialStore};
use crate::config::{CredentialBackend, CredentialStoreConfig};
use crate::models::Credential;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential store I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable storage for the single bearer credential.
///
/// Synchronous on purpose: logout has to be able to clear it without awaiting.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<Credential>, StoreError>;
    fn save(&self, credential: &Credential) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
    fn is_persistent(&self) -> bool {
        true
    }
}

/// Creates a concrete store implementation based on the CredentialStoreConfig.
/// If `persist = false` (or no backend is configured), the credential lives in memory only.
pub fn create_store(config: &CredentialStoreConfig) -> Arc<dyn CredentialStore> {
    if !config.persist {
        info!("Credential persistence is disabled. Using in-memory store.");
        return Arc::new(MemoryCredentialStore::new());
    }

    match &config.backend {
        Some(CredentialBackend::File(file_config)) => {
            info!(
                event_name = "store.created",
                event_domain = "store",
                store_type = "file",
                path = file_config.path.as_str(),
                "using file credential store"
            );
            Arc::new(FileCredentialStore::new(file_config))
        }
        None => {
            warn!("Credential persistence is enabled but no backend is configured; falling back to in-memory store.");
            Arc::new(MemoryCredentialStore::new())
        }
    }
}
