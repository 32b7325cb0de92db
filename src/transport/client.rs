use std::sync::{Arc, RwLock};
use std::time::Duration;

use http::header::{ACCEPT, AUTHORIZATION};
use http::{Method, StatusCode};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::error::ApiError;
use super::events::{AuthEvent, AuthEvents};
use crate::config::BackendConfig;
use crate::models::Credential;
use crate::store::CredentialStore;
use crate::utils::log_throttle::LogThrottle;
use crate::utils::value::detail_message;

const AUTH_LOST_LOG_WINDOW: Duration = Duration::from_secs(30);

/// The one HTTP client the whole application shares.
///
/// Holds the credential currently attached to outgoing requests. The session
/// store installs and removes it; a 401 response removes it here directly.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credential: RwLock<Option<Credential>>,
    store: Arc<dyn CredentialStore>,
    events: AuthEvents,
    throttle: LogThrottle,
}

impl ApiClient {
    pub fn new(config: &BackendConfig, store: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(ms) = config.timeout_in_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let http = builder.build().map_err(ApiError::Client)?;

        info!(
            event_name = "http.client.created",
            event_domain = "http",
            base_url = config.base_url.as_str(),
            timeout_in_ms = config.timeout_in_ms,
            "created backend client"
        );

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credential: RwLock::new(None),
            store,
            events: AuthEvents::new(),
            throttle: LogThrottle::new(AUTH_LOST_LOG_WINDOW),
        })
    }

    pub fn events(&self) -> &AuthEvents {
        &self.events
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Install (or with `None`, remove) the credential attached to every request.
    pub fn set_credential(&self, credential: Option<Credential>) {
        *self.credential.write().expect("credential lock poisoned") = credential;
    }

    pub fn credential(&self) -> Option<Credential> {
        self.credential
            .read()
            .expect("credential lock poisoned")
            .clone()
    }

    pub fn has_credential(&self) -> bool {
        self.credential
            .read()
            .expect("credential lock poisoned")
            .is_some()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Start a request against `path` on the backend.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header(ACCEPT, "application/json")
    }

    /// Send a request through both interceptors.
    ///
    /// The bearer header is added here rather than in [`request`](Self::request)
    /// so it always reflects the credential at the moment of sending.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let builder = match self.credential() {
            Some(credential) => builder.header(AUTHORIZATION, credential.bearer()),
            None => builder,
        };

        let response = builder.send().await.map_err(|e| {
            debug!(error = %e, "backend request failed before a response arrived");
            ApiError::Transport(e)
        })?;

        let status = response.status();
        debug!(
            event_name = "http.response",
            event_domain = "http",
            url = response.url().path(),
            status = status.as_u16(),
            "backend responded"
        );
        if status.is_success() {
            return Ok(response);
        }

        let detail = error_detail(response).await;
        if status == StatusCode::UNAUTHORIZED {
            self.authorization_lost();
        }
        Err(ApiError::from_status(status, detail))
    }

    /// Drop the credential everywhere and tell the subscribers.
    fn authorization_lost(&self) {
        let had_credential = self
            .credential
            .write()
            .expect("credential lock poisoned")
            .take()
            .is_some();
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear the persisted credential");
        }

        if let Some(suppressed_count) = self.throttle.should_emit("session.authorization_lost") {
            warn!(
                event_name = "session.authorization_lost",
                event_domain = "session",
                had_credential,
                suppressed_count,
                "backend rejected the credential; session reset"
            );
        }
        self.events.emit(AuthEvent::AuthorizationLost);
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.request(Method::GET, path)).await?;
        decode(response).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .send(self.request(Method::POST, path).json(body))
            .await?;
        decode(response).await
    }

    /// POST an `application/x-www-form-urlencoded` body.
    pub async fn post_form<B, T>(&self, path: &str, form: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .send(self.request(Method::POST, path).form(form))
            .await?;
        decode(response).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .send(self.request(Method::PUT, path).json(body))
            .await?;
        decode(response).await
    }

    /// DELETE a resource; whatever the backend says on success is discarded.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }
}

/// Read a successful response body as JSON.
pub async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await.map_err(ApiError::Transport)?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn error_detail(response: Response) -> Option<String> {
    let bytes = response.bytes().await.ok()?;
    let body: Value = serde_json::from_slice(&bytes).ok()?;
    detail_message(&body)
}
