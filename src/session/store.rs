use std::sync::{Arc, RwLock};

use http::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::outcome::{
    LoginFailure, LoginResult, FEDERATED_LOGIN_FALLBACK, LOGIN_FALLBACK, REGISTER_FALLBACK,
};
use super::phase::SessionPhase;
use crate::models::{Credential, Identity, Registration, Role, TokenGrant};
use crate::transport::client::decode;
use crate::transport::{ApiClient, ApiError, AuthEvent, AuthEventListener};

/// Single owner of the credential and identity lifecycle.
///
/// Created once by the application shell and handed to whoever needs it.
/// Subscribes itself to the client's auth events so a 401 anywhere clears
/// the identity.
pub struct SessionStore {
    client: Arc<ApiClient>,
    phase: RwLock<SessionPhase>,
}

impl SessionStore {
    pub fn new(client: Arc<ApiClient>) -> Arc<Self> {
        let store = Arc::new(Self {
            client,
            phase: RwLock::new(SessionPhase::Unresolved),
        });
        store.client.events().subscribe(&store);
        store
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase.read().expect("session phase lock poisoned").clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.phase
            .read()
            .expect("session phase lock poisoned")
            .identity()
            .cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.phase
            .read()
            .expect("session phase lock poisoned")
            .is_loading()
    }

    fn set_phase(&self, phase: SessionPhase) {
        *self.phase.write().expect("session phase lock poisoned") = phase;
    }

    /// Resolve the persisted session. Only the first call does anything.
    ///
    /// Without a persisted credential this goes straight to `Anonymous` and makes
    /// no request. A credential the backend will not resolve into an identity is
    /// thrown away.
    pub async fn restore(&self) -> SessionPhase {
        {
            let mut phase = self.phase.write().expect("session phase lock poisoned");
            if *phase != SessionPhase::Unresolved {
                warn!(
                    event_name = "session.restore.repeated",
                    event_domain = "session",
                    phase = phase.name(),
                    "session already resolved; ignoring restore"
                );
                return phase.clone();
            }
            *phase = SessionPhase::Resolving;
        }

        let persisted = match self.client.store().load() {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, "could not read the persisted credential; starting anonymous");
                None
            }
        };

        let Some(credential) = persisted else {
            info!(
                event_name = "session.restore",
                event_domain = "session",
                outcome = "anonymous",
                "no persisted credential"
            );
            self.finish_resolving(SessionPhase::Anonymous, false);
            return self.phase();
        };

        self.client.set_credential(Some(credential));
        match self.fetch_identity().await {
            Ok(identity) => {
                info!(
                    event_name = "session.restore",
                    event_domain = "session",
                    outcome = "authenticated",
                    user_id = identity.id.as_str(),
                    role = identity.role.as_str(),
                    "restored persisted session"
                );
                self.finish_resolving(SessionPhase::Authenticated(identity), false);
            }
            Err(e) => {
                warn!(
                    event_name = "session.restore",
                    event_domain = "session",
                    outcome = "rejected",
                    error = %e,
                    "persisted credential could not be resolved; discarding it"
                );
                self.finish_resolving(SessionPhase::Anonymous, true);
            }
        }
        self.phase()
    }

    /// Settle `Resolving`, unless a login or logout already moved the session on.
    fn finish_resolving(&self, outcome: SessionPhase, discard_credential: bool) {
        let mut phase = self.phase.write().expect("session phase lock poisoned");
        if *phase != SessionPhase::Resolving {
            debug!(phase = phase.name(), "session changed while resolving; keeping it");
            return;
        }
        if discard_credential {
            self.discard_credential();
        }
        *phase = outcome;
    }

    /// Exchange an email and password for a session.
    pub async fn login(&self, identifier: &str, secret: &str) -> LoginResult {
        if identifier.trim().is_empty() || secret.is_empty() {
            return Err(LoginFailure::new("Email and password are required."));
        }

        let form = [("username", identifier), ("password", secret)];
        let result = match self.client.post_form::<_, TokenGrant>("/token", &form).await {
            Ok(grant) => self.establish(grant).await,
            Err(e) => Err(e),
        };
        self.conclude("password", result, LOGIN_FALLBACK)
    }

    /// Exchange a third-party (Google) ID token for a session.
    pub async fn login_with_federated_token(&self, token: &str) -> LoginResult {
        if token.trim().is_empty() {
            return Err(LoginFailure::new("A federated login token is required."));
        }

        // The backend reads the token as a query argument; the body carries it too.
        let request = self
            .client
            .request(Method::POST, "/google-login")
            .query(&[("token", token)])
            .json(&json!({ "token": token }));
        let result = match self.client.send(request).await {
            Ok(response) => match decode::<TokenGrant>(response).await {
                Ok(grant) => self.establish(grant).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        self.conclude("federated", result, FEDERATED_LOGIN_FALLBACK)
    }

    /// Create an account, then log straight into it.
    pub async fn register(&self, registration: &Registration) -> LoginResult {
        if let Some(field) = registration.missing_field() {
            return Err(LoginFailure::new(format!("{} is required.", field)));
        }

        match self
            .client
            .post_json::<_, Value>("/users/", registration)
            .await
        {
            Ok(_) => {
                info!(
                    event_name = "session.register",
                    event_domain = "session",
                    role = registration.role.as_str(),
                    "account created; logging in"
                );
                self.login(&registration.email, &registration.password).await
            }
            Err(e) => {
                warn!(
                    event_name = "session.register.failed",
                    event_domain = "session",
                    error = %e,
                    "registration failed"
                );
                Err(LoginFailure::from_api(&e, REGISTER_FALLBACK))
            }
        }
    }

    /// End the session. Never fails; a store that cannot be cleared is only logged.
    pub fn logout(&self) {
        self.discard_credential();
        self.set_phase(SessionPhase::Anonymous);
        info!(
            event_name = "session.logout",
            event_domain = "session",
            "logged out"
        );
    }

    /// Persist and install a freshly granted credential, then resolve its identity.
    async fn establish(&self, grant: TokenGrant) -> Result<Role, ApiError> {
        let credential = Credential::new(grant.access_token).ok_or(ApiError::EmptyToken)?;

        let store = self.client.store();
        if let Err(e) = store.save(&credential) {
            warn!(error = %e, "could not persist the credential; session will not survive a restart");
        } else if !store.is_persistent() {
            debug!("credential kept in memory only");
        }
        self.client.set_credential(Some(credential));

        match self.fetch_identity().await {
            Ok(identity) => {
                if identity.role != grant.role {
                    warn!(
                        granted = grant.role.as_str(),
                        resolved = identity.role.as_str(),
                        "token grant and identity disagree on the role"
                    );
                }
                self.set_phase(SessionPhase::Authenticated(identity));
                Ok(grant.role)
            }
            Err(e) => {
                // A credential without an identity is not a session.
                self.discard_credential();
                let mut phase = self.phase.write().expect("session phase lock poisoned");
                if matches!(*phase, SessionPhase::Authenticated(_)) {
                    *phase = SessionPhase::Anonymous;
                }
                Err(e)
            }
        }
    }

    async fn fetch_identity(&self) -> Result<Identity, ApiError> {
        self.client.get::<Identity>("/users/me").await
    }

    fn discard_credential(&self) {
        if let Err(e) = self.client.store().clear() {
            warn!(error = %e, "failed to clear the persisted credential");
        }
        self.client.set_credential(None);
    }

    fn conclude(&self, method: &'static str, result: Result<Role, ApiError>, fallback: &str) -> LoginResult {
        match result {
            Ok(role) => {
                info!(
                    event_name = "session.login",
                    event_domain = "session",
                    method,
                    role = role.as_str(),
                    "login succeeded"
                );
                Ok(role)
            }
            Err(e) => {
                warn!(
                    event_name = "session.login.failed",
                    event_domain = "session",
                    method,
                    error = %e,
                    "login failed"
                );
                Err(LoginFailure::from_api(&e, fallback))
            }
        }
    }
}

impl AuthEventListener for SessionStore {
    fn on_auth_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::AuthorizationLost => {
                let mut phase = self.phase.write().expect("session phase lock poisoned");
                // While resolving, restore() settles the outcome itself.
                if matches!(*phase, SessionPhase::Authenticated(_)) {
                    *phase = SessionPhase::Anonymous;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use crate::store::{CredentialStore, MemoryCredentialStore};
    use mockito::{Matcher, Server, ServerGuard};

    const STUDENT: &str = r#"{
        "id": "u-1",
        "email": "a@b.com",
        "first_name": "Ada",
        "last_name": "Byron",
        "role": "student",
        "created_at": "2024-01-02T03:04:05"
    }"#;

    fn session_for(
        server: &ServerGuard,
        store: Arc<MemoryCredentialStore>,
    ) -> Arc<SessionStore> {
        let client = ApiClient::new(
            &BackendConfig {
                base_url: server.url(),
                timeout_in_ms: None,
            },
            store,
        )
        .expect("client should build");
        SessionStore::new(Arc::new(client))
    }

    fn credential(token: &str) -> Credential {
        Credential::new(token).expect("non-blank token")
    }

    #[tokio::test]
    async fn test_restore_without_credential_makes_no_request() {
        let mut server = Server::new_async().await;
        let me = server
            .mock("GET", "/users/me")
            .expect(0)
            .create_async()
            .await;

        let session = session_for(&server, Arc::new(MemoryCredentialStore::new()));
        assert_eq!(session.phase(), SessionPhase::Unresolved);
        assert!(session.is_loading());

        let phase = session.restore().await;
        assert_eq!(phase, SessionPhase::Anonymous);
        assert!(!session.is_loading());
        me.assert_async().await;
    }

    #[tokio::test]
    async fn test_restore_with_valid_credential_authenticates() {
        let mut server = Server::new_async().await;
        let me = server
            .mock("GET", "/users/me")
            .match_header("authorization", "Bearer persisted")
            .with_status(200)
            .with_body(STUDENT)
            .create_async()
            .await;

        let store = Arc::new(MemoryCredentialStore::with_credential(credential("persisted")));
        let session = session_for(&server, store.clone());

        let phase = session.restore().await;
        me.assert_async().await;
        let identity = phase.identity().expect("authenticated");
        assert_eq!(identity.email, "a@b.com");
        assert_eq!(identity.role, Role::Student);
        assert!(session.client().has_credential());
        assert!(store.load().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_restore_with_rejected_credential_discards_it() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/users/me")
            .with_status(401)
            .with_body(r#"{"detail": "Could not validate credentials"}"#)
            .create_async()
            .await;

        let store = Arc::new(MemoryCredentialStore::with_credential(credential("expired")));
        let session = session_for(&server, store.clone());

        assert_eq!(session.restore().await, SessionPhase::Anonymous);
        assert!(store.load().unwrap().is_none());
        assert!(!session.client().has_credential());
    }

    #[tokio::test]
    async fn test_restore_discards_credential_on_any_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/users/me")
            .with_status(404)
            .with_body(r#"{"detail": "User not found"}"#)
            .create_async()
            .await;

        let store = Arc::new(MemoryCredentialStore::with_credential(credential("orphan")));
        let session = session_for(&server, store.clone());

        assert_eq!(session.restore().await, SessionPhase::Anonymous);
        assert!(store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_runs_only_once() {
        let mut server = Server::new_async().await;
        let me = server
            .mock("GET", "/users/me")
            .with_status(200)
            .with_body(STUDENT)
            .expect(1)
            .create_async()
            .await;

        let store = Arc::new(MemoryCredentialStore::with_credential(credential("tok")));
        let session = session_for(&server, store);

        session.restore().await;
        let second = session.restore().await;
        assert!(matches!(second, SessionPhase::Authenticated(_)));
        me.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_establishes_session() {
        let mut server = Server::new_async().await;
        let token = server
            .mock("POST", "/token")
            .match_header("accept", "application/json")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("username".into(), "a@b.com".into()),
                Matcher::UrlEncoded("password".into(), "right".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"access_token": "fresh", "token_type": "bearer", "role": "student"}"#)
            .create_async()
            .await;
        let me = server
            .mock("GET", "/users/me")
            .match_header("authorization", "Bearer fresh")
            .with_status(200)
            .with_body(STUDENT)
            .create_async()
            .await;

        let store = Arc::new(MemoryCredentialStore::new());
        let session = session_for(&server, store.clone());
        session.restore().await;

        let role = session.login("a@b.com", "right").await.expect("login succeeds");
        token.assert_async().await;
        me.assert_async().await;
        assert_eq!(role, Role::Student);
        assert_eq!(session.identity().map(|i| i.id), Some("u-1".to_string()));
        assert_eq!(store.load().unwrap(), Some(credential("fresh")));
    }

    #[tokio::test]
    async fn test_login_failure_uses_backend_detail() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"detail": "Invalid credentials"}"#)
            .create_async()
            .await;

        let session = session_for(&server, Arc::new(MemoryCredentialStore::new()));
        session.restore().await;

        let failure = session.login("a@b.com", "wrong").await.unwrap_err();
        assert_eq!(failure.message, "Invalid credentials");
        assert_eq!(session.phase(), SessionPhase::Anonymous);
    }

    #[tokio::test]
    async fn test_login_rejected_with_401_still_reports_detail() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(401)
            .with_header("www-authenticate", "Bearer")
            .with_body(r#"{"detail": "Incorrect email or password"}"#)
            .create_async()
            .await;

        let session = session_for(&server, Arc::new(MemoryCredentialStore::new()));
        session.restore().await;

        let failure = session.login("a@b.com", "nope").await.unwrap_err();
        assert_eq!(failure.message, "Incorrect email or password");
        assert_eq!(session.phase(), SessionPhase::Anonymous);
    }

    #[tokio::test]
    async fn test_login_failure_without_detail_uses_fallback() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        let session = session_for(&server, Arc::new(MemoryCredentialStore::new()));
        let failure = session.login("a@b.com", "pw").await.unwrap_err();
        assert_eq!(failure.message, LOGIN_FALLBACK);
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let mut server = Server::new_async().await;
        let token = server.mock("POST", "/token").expect(0).create_async().await;

        let session = session_for(&server, Arc::new(MemoryCredentialStore::new()));
        let failure = session.login("", "pw").await.unwrap_err();
        assert_eq!(failure.message, "Email and password are required.");
        token.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_discards_credential_when_identity_fails() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(r#"{"access_token": "fresh", "role": "admin"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/users/me")
            .with_status(404)
            .with_body(r#"{"detail": "User not found"}"#)
            .create_async()
            .await;

        let store = Arc::new(MemoryCredentialStore::new());
        let session = session_for(&server, store.clone());
        session.restore().await;

        let failure = session.login("a@b.com", "pw").await.unwrap_err();
        assert_eq!(failure.message, "User not found");
        assert!(store.load().unwrap().is_none());
        assert!(!session.client().has_credential());
        assert!(session.identity().is_none());
    }

    #[tokio::test]
    async fn test_federated_login() {
        let mut server = Server::new_async().await;
        let google = server
            .mock("POST", "/google-login")
            .match_query(Matcher::UrlEncoded("token".into(), "g-id-token".into()))
            .match_body(Matcher::Json(json!({"token": "g-id-token"})))
            .with_status(200)
            .with_body(r#"{"access_token": "from-google", "role": "student"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/users/me")
            .match_header("authorization", "Bearer from-google")
            .with_status(200)
            .with_body(STUDENT)
            .create_async()
            .await;

        let session = session_for(&server, Arc::new(MemoryCredentialStore::new()));
        session.restore().await;

        let role = session
            .login_with_federated_token("g-id-token")
            .await
            .expect("federated login succeeds");
        google.assert_async().await;
        assert_eq!(role, Role::Student);
        assert!(session.identity().is_some());
    }

    #[tokio::test]
    async fn test_federated_login_failure_fallback() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/google-login")
            .match_query(Matcher::Any)
            .with_status(502)
            .create_async()
            .await;

        let session = session_for(&server, Arc::new(MemoryCredentialStore::new()));
        let failure = session
            .login_with_federated_token("g-id-token")
            .await
            .unwrap_err();
        assert_eq!(failure.message, FEDERATED_LOGIN_FALLBACK);
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/users/")
            .match_body(Matcher::PartialJson(json!({
                "email": "new@b.com",
                "role": "student",
                "first_name": "New"
            })))
            .with_status(200)
            .with_body(r#"{"id": "u-9", "email": "new@b.com", "role": "student"}"#)
            .create_async()
            .await;
        let token = server
            .mock("POST", "/token")
            .match_body(Matcher::UrlEncoded("username".into(), "new@b.com".into()))
            .with_status(200)
            .with_body(r#"{"access_token": "welcome", "role": "student"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/users/me")
            .with_status(200)
            .with_body(STUDENT)
            .create_async()
            .await;

        let session = session_for(&server, Arc::new(MemoryCredentialStore::new()));
        session.restore().await;

        let registration = Registration {
            email: "new@b.com".to_string(),
            password: "pw".to_string(),
            role: Role::Student,
            first_name: "New".to_string(),
            last_name: "Student".to_string(),
        };
        let role = session.register(&registration).await.expect("register succeeds");
        create.assert_async().await;
        token.assert_async().await;
        assert_eq!(role, Role::Student);
    }

    #[tokio::test]
    async fn test_register_failure_detail_and_required_fields() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/users/")
            .with_status(400)
            .with_body(r#"{"detail": "Email already registered"}"#)
            .create_async()
            .await;

        let session = session_for(&server, Arc::new(MemoryCredentialStore::new()));
        let mut registration = Registration {
            email: "dup@b.com".to_string(),
            password: "pw".to_string(),
            role: Role::Admin,
            first_name: "Dup".to_string(),
            last_name: "User".to_string(),
        };
        let failure = session.register(&registration).await.unwrap_err();
        assert_eq!(failure.message, "Email already registered");

        registration.first_name.clear();
        let failure = session.register(&registration).await.unwrap_err();
        assert_eq!(failure.message, "First name is required.");
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/users/me")
            .with_status(200)
            .with_body(STUDENT)
            .create_async()
            .await;

        let store = Arc::new(MemoryCredentialStore::with_credential(credential("tok")));
        let session = session_for(&server, store.clone());
        session.restore().await;
        assert!(session.identity().is_some());

        session.logout();
        assert_eq!(session.phase(), SessionPhase::Anonymous);
        assert!(!session.client().has_credential());
        assert!(store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_authorization_lost_clears_identity() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/users/me")
            .with_status(200)
            .with_body(STUDENT)
            .create_async()
            .await;
        server
            .mock("GET", "/courses/")
            .with_status(401)
            .create_async()
            .await;

        let store = Arc::new(MemoryCredentialStore::with_credential(credential("tok")));
        let session = session_for(&server, store.clone());
        session.restore().await;

        let err = session.client().get::<Value>("/courses/").await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(session.phase(), SessionPhase::Anonymous);
        assert!(store.load().unwrap().is_none());
    }
}
