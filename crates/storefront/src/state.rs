//! The storefront context: configuration, gateway, session and cart.

use std::sync::Arc;

use secrecy::SecretString;
use sportgear_core::Email;
use thiserror::Error;
use tracing::instrument;

use crate::authz::{self, Action, Decision, Route, Viewer};
use crate::cart::Cart;
use crate::checkout::{self, CheckoutError, CheckoutRequest, Receipt};
use crate::config::StorefrontConfig;
use crate::error::{ApiError, ResourceError};
use crate::gateway::ApiClient;
use crate::models::{AuthResponse, ProfileUpdate, Registration};
use crate::resources::{
    AuthApi, OrdersResource, PaymentsResource, ProductsResource, ShipmentsResource, UsersResource,
};
use crate::session::{FileStorage, Session, SessionError, SessionStorage, SessionStore};
use crate::sync::ViewScope;

/// Errors raised by the storefront lifecycle operations.
#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error("Could not set up the API client: {0}")]
    Client(#[from] ApiError),

    #[error(transparent)]
    Auth(#[from] ResourceError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Root of the client.
///
/// Owns the single session store and the single cart. Resources are created
/// per view through the factory methods and share the gateway.
pub struct Storefront {
    config: StorefrontConfig,
    api: ApiClient,
    session: SessionStore,
    cart: Cart,
}

impl Storefront {
    /// Create a storefront persisting its session under `config.state_dir`.
    ///
    /// The persisted session is not picked up until [`Storefront::restore`].
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Client` if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, StorefrontError> {
        let storage = Arc::new(FileStorage::in_dir(&config.state_dir));
        Self::with_storage(config, storage)
    }

    /// Create a storefront over an explicit session storage.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Client` if the HTTP client cannot be built.
    pub fn with_storage(
        config: StorefrontConfig,
        storage: Arc<dyn SessionStorage>,
    ) -> Result<Self, StorefrontError> {
        let api = ApiClient::new(config.endpoints.clone(), config.http_timeout)?;
        Ok(Self {
            config,
            api,
            session: SessionStore::new(storage),
            cart: Cart::new(),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Pick up the persisted session, if any, and attach its token.
    pub async fn restore(&mut self) -> Option<&Session> {
        let token = self.session.restore().map(|session| session.token().clone());
        if let Some(token) = token {
            self.api.set_token(token).await;
            tracing::debug!("Restored session");
            self.session.current()
        } else {
            self.api.clear_token().await;
            None
        }
    }

    /// Sign in and persist the session.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Auth` with the auth service's message when
    /// the credentials are refused, or `StorefrontError::Session` if the
    /// session cannot be persisted.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&mut self, email: &Email, password: &SecretString) -> Result<&Session, StorefrontError> {
        let response = self.auth().login(email, password).await?;
        self.start_session(response).await
    }

    /// Create an account and sign straight into it.
    ///
    /// # Errors
    ///
    /// Same as [`Storefront::login`].
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&mut self, registration: &Registration) -> Result<&Session, StorefrontError> {
        let response = self.auth().register(registration).await?;
        self.start_session(response).await
    }

    async fn start_session(&mut self, response: AuthResponse) -> Result<&Session, StorefrontError> {
        let token = SecretString::from(response.token);
        self.session.login(token.clone(), response.user)?;
        self.api.set_token(token).await;
        self.session.current().ok_or(StorefrontError::Session(SessionError::NotAuthenticated))
    }

    /// Sign out. The token is detached even if the persisted slots cannot be
    /// cleared.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the slots cannot be removed.
    pub async fn logout(&mut self) -> Result<(), SessionError> {
        self.api.clear_token().await;
        self.session.logout()
    }

    /// Save the signed-in user's profile and keep the session's copy of the
    /// user in step with the server.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Session` when signed out,
    /// `StorefrontError::Auth` with the server's message when the update is
    /// refused.
    #[instrument(skip(self, scope, update))]
    pub async fn update_profile(
        &mut self,
        scope: &ViewScope,
        update: &ProfileUpdate,
    ) -> Result<&Session, StorefrontError> {
        let id = self
            .session
            .current()
            .and_then(|session| session.user().id())
            .ok_or(SessionError::NotAuthenticated)?;
        let user = self.users(scope).update_profile(&id, update).await?;
        Ok(self.session.refresh_user(user)?)
    }

    /// End the session if a backend rejected its token since the last call.
    ///
    /// Returns `true` when the session was ended.
    pub async fn end_session_if_expired(&mut self) -> bool {
        if !self.api.take_session_expired() {
            return false;
        }
        tracing::warn!("Session token was rejected, signing out");
        if let Err(e) = self.logout().await {
            tracing::warn!(error = %e, "Could not clear expired session");
        }
        true
    }

    // =========================================================================
    // Authorization
    // =========================================================================

    #[must_use]
    pub fn viewer(&self) -> Viewer {
        Viewer::of(&self.session)
    }

    #[must_use]
    pub fn guard(&self, route: Route) -> Decision {
        authz::guard(route, &self.session)
    }

    #[must_use]
    pub fn can(&self, action: Action) -> bool {
        authz::can(self.viewer(), action)
    }

    // =========================================================================
    // Resources
    // =========================================================================

    #[must_use]
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.api.clone())
    }

    #[must_use]
    pub fn orders(&self, scope: &ViewScope) -> OrdersResource {
        OrdersResource::new(self.api.clone(), scope.clone())
    }

    #[must_use]
    pub fn payments(&self, scope: &ViewScope) -> PaymentsResource {
        PaymentsResource::new(self.api.clone(), scope.clone())
    }

    #[must_use]
    pub fn products(&self, scope: &ViewScope) -> ProductsResource {
        ProductsResource::new(self.api.clone(), scope.clone())
    }

    #[must_use]
    pub fn shipments(&self, scope: &ViewScope) -> ShipmentsResource {
        ShipmentsResource::new(self.api.clone(), scope.clone())
    }

    #[must_use]
    pub fn users(&self, scope: &ViewScope) -> UsersResource {
        UsersResource::new(self.api.clone(), scope.clone())
    }

    /// Check out the cart for the signed-in user.
    ///
    /// # Errors
    ///
    /// See [`checkout::checkout`].
    pub async fn checkout(&mut self, scope: &ViewScope, request: &CheckoutRequest) -> Result<Receipt, CheckoutError> {
        let orders = self.orders(scope);
        let payments = self.payments(scope);
        let result = checkout::checkout(
            &orders,
            &payments,
            self.session.current(),
            &mut self.cart,
            request,
        )
        .await;
        self.end_session_if_expired().await;
        result
    }
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("cart", &self.cart)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use sportgear_core::{Role, UserId};
    use url::Url;

    use super::*;
    use crate::models::SessionUser;
    use crate::session::MemoryStorage;

    fn storefront(storage: Arc<MemoryStorage>) -> Storefront {
        let config = StorefrontConfig::single_origin(
            Url::parse("http://127.0.0.1:9").unwrap(),
            PathBuf::from("/nonexistent"),
        );
        Storefront::with_storage(config, storage).unwrap()
    }

    #[tokio::test]
    async fn test_restore_attaches_token() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let mut store = SessionStore::new(storage.clone());
            store
                .login(
                    SecretString::from("tok"),
                    SessionUser::new(&UserId::from("u-1"), "a@b.co", Role::Customer),
                )
                .unwrap();
        }

        let mut shop = storefront(storage);
        assert!(!shop.api().has_token().await);
        assert!(shop.restore().await.is_some());
        assert!(shop.api().has_token().await);
        assert_eq!(shop.guard(Route::Orders), Decision::Allow);

        shop.logout().await.unwrap();
        assert!(!shop.api().has_token().await);
        assert_eq!(shop.guard(Route::Orders), Decision::RedirectToLogin);
    }

    #[tokio::test]
    async fn test_restore_without_session_is_anonymous() {
        let mut shop = storefront(Arc::new(MemoryStorage::new()));
        assert!(shop.restore().await.is_none());
        assert_eq!(shop.viewer(), Viewer::Anonymous);
        assert!(!shop.can(Action::Checkout));
        assert!(!shop.end_session_if_expired().await);
    }
}
