use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where the LMS REST backend lives and how we talk to it.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct BackendConfig {
    /// Base URL every request path is appended to, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Optional per-request timeout. Without it a hung request simply never resolves.
    #[serde(default)]
    pub timeout_in_ms: Option<u64>,
}
