//! HTTP client shared by every resource.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::instrument;

use super::{Backend, Endpoints};
use crate::error::ApiError;

/// Client for the SportGear REST backends.
///
/// Cloning is cheap; clones share the connection pool and the bearer token.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    endpoints: Endpoints,
    /// Bearer token of the current session
    token: RwLock<Option<SecretString>>,
    /// Set when a backend rejected the bearer token
    session_expired: AtomicBool,
}

/// Error body shapes used by the backends.
///
/// The Python services answer `{"detail": ...}` (a string, or a list of
/// validation errors), the auth service `{"message": ...}` and the user
/// service `{"error": ...}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.detail
            .and_then(|detail| match detail {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Array(items) => items
                    .first()
                    .and_then(|item| item.get("msg"))
                    .and_then(serde_json::Value::as_str)
                    .map(String::from),
                _ => None,
            })
            .or(self.message)
            .or(self.error)
            .filter(|m| !m.trim().is_empty())
    }
}

impl ApiClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                endpoints,
                token: RwLock::new(None),
                session_expired: AtomicBool::new(false),
            }),
        })
    }

    /// Resolved base URLs.
    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.inner.endpoints
    }

    // =========================================================================
    // Credentials
    // =========================================================================

    /// Attach `token` to every subsequent request.
    pub async fn set_token(&self, token: SecretString) {
        *self.inner.token.write().await = Some(token);
        self.inner.session_expired.store(false, Ordering::SeqCst);
    }

    /// Stop sending a bearer token.
    pub async fn clear_token(&self) {
        *self.inner.token.write().await = None;
    }

    /// Whether a bearer token is currently attached.
    pub async fn has_token(&self) -> bool {
        self.inner.token.read().await.is_some()
    }

    /// Returns `true` once after a backend rejected the bearer token.
    ///
    /// The token is already detached by then; the owner of the session is
    /// expected to end it.
    #[must_use]
    pub fn take_session_expired(&self) -> bool {
        self.inner.session_expired.swap(false, Ordering::SeqCst)
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// `GET` and decode a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn get<T: DeserializeOwned>(
        &self,
        backend: Backend,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self.send(Method::GET, backend, path, query, None::<&()>).await?;
        decode(response).await
    }

    /// `POST` a JSON body and decode the JSON answer.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn post<B, T>(&self, backend: Backend, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::POST, backend, path, &[], Some(body)).await?;
        decode(response).await
    }

    /// `POST` without a body and decode the JSON answer.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn post_empty<T: DeserializeOwned>(
        &self,
        backend: Backend,
        path: &str,
    ) -> Result<T, ApiError> {
        let response = self.send(Method::POST, backend, path, &[], None::<&()>).await?;
        decode(response).await
    }

    /// `PUT` a JSON body and decode the JSON answer.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn put<B, T>(&self, backend: Backend, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::PUT, backend, path, &[], Some(body)).await?;
        decode(response).await
    }

    /// `DELETE`; any success status counts, the body is ignored.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn delete(&self, backend: Backend, path: &str) -> Result<(), ApiError> {
        self.send(Method::DELETE, backend, path, &[], None::<&()>)
            .await
            .map(drop)
    }

    /// Issue one request and check its status.
    ///
    /// Empty query values are skipped so optional filters can be passed
    /// through unconditionally.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` on transport failure, `ApiError::Api` on a
    /// non-success status (with the server message when the body had one) and
    /// `ApiError::Url` if the URL cannot be built.
    #[instrument(skip(self, query, body), fields(backend = backend.as_str()))]
    pub async fn send<B>(
        &self,
        method: Method,
        backend: Backend,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<Response, ApiError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let mut url = self.inner.endpoints.url(backend, path)?;
        if query.iter().any(|(_, v)| !v.is_empty()) {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.iter().filter(|(_, v)| !v.is_empty()) {
                pairs.append_pair(key, value);
            }
        }

        let mut request: RequestBuilder = self.inner.client.request(method, url);
        let authenticated = {
            let token = self.inner.token.read().await;
            if let Some(token) = token.as_ref() {
                request = request.bearer_auth(token.expose_secret());
                true
            } else {
                false
            }
        };
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "Request failed before a response arrived");
            ApiError::Http(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED && authenticated {
            tracing::warn!("Bearer token rejected, detaching it");
            *self.inner.token.write().await = None;
            self.inner.session_expired.store(true, Ordering::SeqCst);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(ErrorBody::into_message);

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "Backend error");
        } else {
            tracing::debug!(status = status.as_u16(), message = ?message, "Request rejected");
        }

        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Parse(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn message_of(json: &str) -> Option<String> {
        serde_json::from_str::<ErrorBody>(json)
            .unwrap()
            .into_message()
    }

    #[test]
    fn test_error_body_detail_string() {
        assert_eq!(
            message_of(r#"{"detail": "Order not found"}"#).as_deref(),
            Some("Order not found")
        );
    }

    #[test]
    fn test_error_body_detail_validation_list() {
        let json = r#"{"detail": [{"loc": ["body", "total"], "msg": "field required"}]}"#;
        assert_eq!(message_of(json).as_deref(), Some("field required"));
    }

    #[test]
    fn test_error_body_message_and_error_keys() {
        assert_eq!(
            message_of(r#"{"message": "Invalid credentials"}"#).as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(
            message_of(r#"{"error": "User not found"}"#).as_deref(),
            Some("User not found")
        );
    }

    #[test]
    fn test_error_body_without_known_keys() {
        assert_eq!(message_of(r#"{"status": 500}"#), None);
        assert_eq!(message_of(r#"{"detail": ""}"#), None);
    }

    #[tokio::test]
    async fn test_token_lifecycle() {
        let endpoints = Endpoints::uniform(&url::Url::parse("http://127.0.0.1:9").unwrap());
        let client = ApiClient::new(endpoints, Duration::from_secs(1)).unwrap();
        assert!(!client.has_token().await);

        client.set_token(SecretString::from("abc")).await;
        assert!(client.has_token().await);
        assert!(!client.take_session_expired());

        client.clear_token().await;
        assert!(!client.has_token().await);
    }
}
