use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::store::file_store::FileStoreConfig;

/// A wrapper for the credential store configuration:
/// - persist: if false, the credential only lives for the current process.
/// - backend: the durable backend (a token file, for now).
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct CredentialStoreConfig {
    pub persist: bool,
    #[serde(flatten)]
    pub backend: Option<CredentialBackend>,
}

/// Durable credential backends, selected by a "type" tag in the YAML.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(tag = "type")]
pub enum CredentialBackend {
    #[serde(rename = "file")]
    File(FileStoreConfig),
}

impl Default for CredentialStoreConfig {
    fn default() -> Self {
        Self {
            persist: false,
            backend: None,
        }
    }
}
