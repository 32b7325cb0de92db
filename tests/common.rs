#![allow(dead_code)]

use std::sync::Arc;

use figment::providers::{Format, Yaml};
use figment::Figment;
use lmsportal::config::{Config, ConfigV1};
use lmsportal::models::Credential;
use lmsportal::startup::build_state_with_store;
use lmsportal::state::AppState;
use lmsportal::store::MemoryCredentialStore;

pub const STUDENT_ME: &str = r#"{
    "id": "u-1",
    "email": "a@b.com",
    "first_name": "Ada",
    "last_name": "Byron",
    "role": "student"
}"#;

pub const ADMIN_ME: &str = r#"{
    "id": "u-2",
    "email": "root@b.com",
    "first_name": "Grace",
    "last_name": "Hopper",
    "role": "admin"
}"#;

/// A config pointing at `base_url`, parsed the way the binary parses its YAML.
pub fn config_for(base_url: &str) -> ConfigV1 {
    let yaml = format!(
        r#"
version: "1.0.0"
backend:
  base_url: "{}"
  timeout_in_ms: 5000
credentials:
  persist: false
logging:
  level: "debug"
  format: "console"
"#,
        base_url
    );
    let config: Config = Figment::new()
        .merge(Yaml::string(&yaml))
        .extract()
        .expect("test config should parse");
    match config {
        Config::ConfigV1(c) => c,
    }
}

/// Application state over a memory store, optionally holding a persisted credential.
pub fn build_app(base_url: &str, persisted: Option<&str>) -> (AppState, Arc<MemoryCredentialStore>) {
    let store = Arc::new(match persisted.and_then(Credential::new) {
        Some(credential) => MemoryCredentialStore::with_credential(credential),
        None => MemoryCredentialStore::new(),
    });
    let state = build_state_with_store(Arc::new(config_for(base_url)), store.clone())
        .expect("state should build");
    (state, store)
}
