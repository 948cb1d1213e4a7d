//! Login and registration against the auth service.

use secrecy::{ExposeSecret, SecretString};
use sportgear_core::Email;
use tracing::instrument;

use crate::error::{Operation, ResourceError};
use crate::gateway::{ApiClient, Backend};
use crate::models::{AuthResponse, Registration};

const LOGIN_PATH: &str = "/api/auth/login";
const REGISTER_PATH: &str = "/api/auth/register";

const LOGIN: Operation = Operation::new("sign in to", "account");
const REGISTER: Operation = Operation::new("create", "account");

/// Credential exchange with the auth service.
///
/// Stateless: the caller decides what to do with the returned token. See
/// [`Storefront::login`](crate::state::Storefront::login) for the usual flow.
#[derive(Clone)]
pub struct AuthApi {
    api: ApiClient,
}

impl AuthApi {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Exchange email and password for a token and the user profile.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError` carrying the auth service's message, e.g.
    /// invalid credentials.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &SecretString) -> Result<AuthResponse, ResourceError> {
        let body = serde_json::json!({
            "email": email.as_str(),
            "password": password.expose_secret(),
        });
        self.api
            .post(Backend::Auth, LOGIN_PATH, &body)
            .await
            .map_err(|e| ResourceError::new(e, LOGIN))
    }

    /// Create an account. The auth service signs the new user in directly.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError` carrying the auth service's message, e.g. the
    /// email is already registered.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<AuthResponse, ResourceError> {
        self.api
            .post(Backend::Auth, REGISTER_PATH, &registration.to_body())
            .await
            .map_err(|e| ResourceError::new(e, REGISTER))
    }
}
