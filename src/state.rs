//! Shared application state.
//!
//! One client, one session, one navigator; built once at startup and handed to
//! every command.

use std::sync::Arc;

use crate::config::ConfigV1;
use crate::guard::{self, GuardDecision};
use crate::navigation::Navigator;
use crate::session::SessionStore;
use crate::transport::ApiClient;

#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// The shared backend client, carrying the current credential.
    pub client: Arc<ApiClient>,
    pub session: Arc<SessionStore>,
    pub navigator: Arc<Navigator>,
}

impl AppState {
    /// Ask to go to `path` and move the navigator wherever the guard says.
    ///
    /// While the session is still resolving the navigator stays put.
    pub fn visit(&self, path: &str) -> GuardDecision {
        let decision = guard::check(&self.session.phase(), path);
        match &decision {
            GuardDecision::Render(_) => self.navigator.navigate(path),
            GuardDecision::Redirect(to) => self.navigator.navigate(to.as_str()),
            GuardDecision::Loading => {}
        }
        decision
    }

    pub fn location(&self) -> String {
        self.navigator.location()
    }
}
