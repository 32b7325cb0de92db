//! Application startup: wire the stores, client and session together, then run a command.

use std::sync::Arc;

use tracing::info;

use crate::commands::{self, Command};
use crate::config::ConfigV1;
use crate::navigation::Navigator;
use crate::session::SessionStore;
use crate::state::AppState;
use crate::store::{create_store, CredentialStore};
use crate::transport::{ApiClient, ApiError};

/// Build the application state on top of an explicit credential store.
pub fn build_state_with_store(
    config: Arc<ConfigV1>,
    store: Arc<dyn CredentialStore>,
) -> Result<AppState, ApiError> {
    let client = Arc::new(ApiClient::new(&config.backend, store)?);
    let session = SessionStore::new(client.clone());
    let navigator = Navigator::new("/", client.events());

    Ok(AppState {
        config,
        client,
        session,
        navigator,
    })
}

/// Build the application state with the credential store the config asks for.
pub fn build_state(config: Arc<ConfigV1>) -> Result<AppState, ApiError> {
    let store = create_store(&config.credentials);
    build_state_with_store(config, store)
}

/// Resolve the persisted session, then execute `command`.
///
/// # Errors
///
/// Returns an error only if the HTTP client cannot be built. Command failures
/// are reported to the user and are not errors of the process.
pub async fn run(config: Arc<ConfigV1>, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state(config)?;

    let phase = state.session.restore().await;
    info!(
        event_name = "startup.session_resolved",
        event_domain = "startup",
        phase = phase.name(),
        "session resolved"
    );

    let report = commands::execute(&state, command).await;
    commands::print_report(&report);
    Ok(())
}
