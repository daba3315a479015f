//! HTTP gateway for the JSON API with consistent timeouts and error handling.
//!
//! Two logical clients share one gateway. The user client attaches the current
//! bearer credential, if any, and runs every response through the authorization
//! interceptor. The admin client attaches the fixed privileged credential pair
//! and is never intercepted. The interceptor does not reach into session or
//! navigation state itself; it emits an [`UnauthorizedEvent`] to whoever
//! subscribed through [`HttpGateway::on_unauthorized`].

use super::{
    config::ClientConfig,
    errors::{sanitize_body, AppError},
};
use crate::APP_USER_AGENT;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, instrument, warn};

/// Emitted when a bearer-authenticated call comes back with 401.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnauthorizedEvent {
    pub path: String,
    pub status: u16,
}

pub type UnauthorizedListener = Arc<dyn Fn(&UnauthorizedEvent) + Send + Sync>;

/// Status and body of a call whose status is interpreted by the caller.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

pub struct HttpGateway {
    base_url: String,
    user: Client,
    admin: Client,
    admin_username: String,
    admin_password: SecretString,
    credential: RwLock<Option<SecretString>>,
    listeners: RwLock<Vec<UnauthorizedListener>>,
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base_url", &self.base_url)
            .field("has_credential", &self.has_credential())
            .finish_non_exhaustive()
    }
}

impl HttpGateway {
    /// Builds both clients with the configured timeout and user agent.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the base URL is blank or a client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, AppError> {
        let base_url = config.api_base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(AppError::Config("API base URL is not configured.".to_string()));
        }

        Ok(Self {
            base_url,
            user: build_client(config)?,
            admin: build_client(config)?,
            admin_username: config.admin_username.clone(),
            admin_password: config.admin_password.clone(),
            credential: RwLock::new(None),
            listeners: RwLock::new(Vec::new()),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Attaches (or with `None`, detaches) the bearer credential for the user client.
    pub fn set_credential(&self, credential: Option<SecretString>) {
        debug!(attached = credential.is_some(), "updating bearer credential");
        *self
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner) = credential;
    }

    #[must_use]
    pub fn has_credential(&self) -> bool {
        self.credential
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Subscribes to authorization failures seen by the user client. Listeners run
    /// synchronously before the failing call returns to its caller.
    pub fn on_unauthorized(&self, listener: impl Fn(&UnauthorizedEvent) + Send + Sync + 'static) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    /// GET with the bearer credential, decoding a JSON body.
    ///
    /// # Errors
    /// Returns transport, HTTP, parse or `Unauthorized` errors.
    #[instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let request = self.with_bearer(self.user.get(self.url(path)));
        let response = self.intercept(path, send(request).await?).await?;
        handle_json_response(response).await
    }

    /// POST with the bearer credential and an empty body, expecting no payload back.
    ///
    /// # Errors
    /// Returns transport, HTTP or `Unauthorized` errors.
    #[instrument(skip(self))]
    pub async fn post_empty(&self, path: &str) -> Result<(), AppError> {
        let request = self.with_bearer(self.user.post(self.url(path)));
        let response = self.intercept(path, send(request).await?).await?;
        handle_empty_response(response).await
    }

    /// POST JSON without any credential and without interception. The caller
    /// decides what the status means, since login refusals arrive as 401/403
    /// with a structured body.
    ///
    /// # Errors
    /// Returns transport errors only.
    #[instrument(skip(self, body))]
    pub async fn post_json_public<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<RawResponse, AppError> {
        let request = self.user.post(self.url(path)).json(body);
        let response = send(request).await?;
        let status = response.status();
        let body = read_body(response).await?;
        Ok(RawResponse { status, body })
    }

    /// GET on the admin client with the privileged credential pair.
    ///
    /// # Errors
    /// Returns `AppError::Config` when admin credentials are missing, otherwise
    /// transport, HTTP or parse errors.
    #[instrument(skip(self))]
    pub async fn admin_get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let request = self.with_admin_auth(self.admin.get(self.url(path)))?;
        handle_json_response(send(request).await?).await
    }

    /// POST with an empty body on the admin client, decoding a JSON response.
    ///
    /// # Errors
    /// Returns `AppError::Config` when admin credentials are missing, otherwise
    /// transport, HTTP or parse errors.
    #[instrument(skip(self))]
    pub async fn admin_post_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let request = self.with_admin_auth(self.admin.post(self.url(path)))?;
        handle_json_response(send(request).await?).await
    }

    fn url(&self, path: &str) -> String {
        build_url_with_base(&self.base_url, path)
    }

    fn with_bearer(&self, builder: RequestBuilder) -> RequestBuilder {
        let credential = self
            .credential
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match credential.as_ref() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    fn with_admin_auth(&self, builder: RequestBuilder) -> Result<RequestBuilder, AppError> {
        if self.admin_username.is_empty() || self.admin_password.expose_secret().is_empty() {
            return Err(AppError::Config(
                "Admin credentials are not configured.".to_string(),
            ));
        }
        Ok(builder.basic_auth(&self.admin_username, Some(self.admin_password.expose_secret())))
    }

    /// Turns 401 responses into `Unauthorized` and notifies every listener.
    async fn intercept(&self, path: &str, response: Response) -> Result<Response, AppError> {
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(path, "authorization failure, notifying session listeners");

        let event = UnauthorizedEvent {
            path: path.to_string(),
            status: StatusCode::UNAUTHORIZED.as_u16(),
        };
        // Snapshot so listeners may register further listeners.
        let listeners: Vec<UnauthorizedListener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener(&event);
        }

        Err(AppError::Unauthorized(sanitize_body(&body)))
    }
}

fn build_client(config: &ClientConfig) -> Result<Client, AppError> {
    Client::builder()
        .user_agent(APP_USER_AGENT)
        .timeout(config.request_timeout)
        .build()
        .map_err(|err| AppError::Config(format!("Failed to build HTTP client: {err}")))
}

/// Builds a URL from an explicit base URL and the provided path.
fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

/// Maps client errors into user-facing `AppError` variants with timeout detection.
fn map_request_error(err: &reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Timeout("Request timed out. Please try again.".to_string())
    } else if err.is_builder() {
        AppError::Serialization(format!("Failed to build request: {err}"))
    } else {
        AppError::Network(format!("Unable to reach the server: {err}"))
    }
}

async fn send(request: RequestBuilder) -> Result<Response, AppError> {
    request.send().await.map_err(|err| map_request_error(&err))
}

async fn read_body(response: Response) -> Result<String, AppError> {
    response.text().await.map_err(|err| map_request_error(&err))
}

/// Parses JSON responses and surfaces HTTP errors with sanitized bodies.
async fn handle_json_response<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    let status = response.status();
    let body = read_body(response).await?;
    if status.is_success() {
        serde_json::from_str(&body)
            .map_err(|err| AppError::Parse(format!("Failed to decode response: {err}")))
    } else {
        Err(AppError::Http {
            status: status.as_u16(),
            message: sanitize_body(&body),
        })
    }
}

/// Handles empty responses and returns sanitized HTTP errors when needed.
async fn handle_empty_response(response: Response) -> Result<(), AppError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Http {
            status: status.as_u16(),
            message: sanitize_body(&body),
        })
    }
}
