use std::sync::{Arc, RwLock};

use tracing::info;

use crate::guard::LOGIN_PATH;
use crate::transport::{AuthEvent, AuthEventListener, AuthEvents};

/// Holds the client's current location.
///
/// Subscribed to the transport's auth events so a rejected credential lands the
/// user on the login page wherever they were.
pub struct Navigator {
    location: RwLock<String>,
}

impl Navigator {
    pub fn new(initial: impl Into<String>, events: &AuthEvents) -> Arc<Self> {
        let navigator = Arc::new(Self {
            location: RwLock::new(initial.into()),
        });
        events.subscribe(&navigator);
        navigator
    }

    pub fn location(&self) -> String {
        self.location
            .read()
            .expect("navigator lock poisoned")
            .clone()
    }

    pub fn navigate(&self, path: impl Into<String>) {
        let path = path.into();
        let mut location = self.location.write().expect("navigator lock poisoned");
        if *location != path {
            info!(
                event_name = "navigation",
                event_domain = "navigation",
                from = location.as_str(),
                to = path.as_str(),
                "navigating"
            );
            *location = path;
        }
    }
}

impl AuthEventListener for Navigator {
    fn on_auth_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::AuthorizationLost => self.navigate(LOGIN_PATH),
        }
    }
}
