use std::sync::{Arc, RwLock, Weak};

/// Session-level events raised by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// A response came back 401; the credential has been discarded.
    AuthorizationLost,
}

/// Anything that reacts to session-level events (the session store, the navigator).
pub trait AuthEventListener: Send + Sync {
    fn on_auth_event(&self, event: AuthEvent);
}

/// Subscriber list for [`AuthEvent`]s.
///
/// Listeners are held weakly so a subscriber that owns the client does not keep
/// itself alive through it.
#[derive(Default)]
pub struct AuthEvents {
    listeners: RwLock<Vec<Weak<dyn AuthEventListener>>>,
}

impl AuthEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<L: AuthEventListener + 'static>(&self, listener: &Arc<L>) {
        let weak: Weak<dyn AuthEventListener> = Arc::downgrade(listener) as Weak<dyn AuthEventListener>;
        self.listeners
            .write()
            .expect("auth event listeners lock poisoned")
            .push(weak);
    }

    /// Deliver `event` to every live listener, in subscription order.
    pub fn emit(&self, event: AuthEvent) {
        // Upgrade under the lock, call outside of it: listeners may touch the client again.
        let live: Vec<Arc<dyn AuthEventListener>> = self
            .listeners
            .read()
            .expect("auth event listeners lock poisoned")
            .iter()
            .filter_map(Weak::upgrade)
            .collect();

        for listener in &live {
            listener.on_auth_event(event);
        }

        self.listeners
            .write()
            .expect("auth event listeners lock poisoned")
            .retain(|weak| weak.strong_count() > 0);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .expect("auth event listeners lock poisoned")
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}
