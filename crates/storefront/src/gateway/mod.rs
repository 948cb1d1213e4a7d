//! REST gateway to the SportGear backends.
//!
//! # Architecture
//!
//! - Four backend families, each with its own base URL (see [`Endpoints`])
//! - One shared `reqwest` client behind an `Arc`, cheap to clone into tasks
//! - Bearer token attached to every request while a session exists
//! - Error bodies normalized from `detail`, `message` or `error`
//! - No retries; callers decide whether to surface a failure

mod client;

pub use client::ApiClient;

use url::Url;

/// Backend family a request is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Login and registration.
    Auth,
    /// Products, orders and payments.
    Business,
    /// Shipments.
    Shipment,
    /// User administration and profiles.
    User,
}

impl Backend {
    pub const ALL: [Self; 4] = [Self::Auth, Self::Business, Self::Shipment, Self::User];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Business => "business",
            Self::Shipment => "shipment",
            Self::User => "user",
        }
    }
}

/// Resolved base URL per backend family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub auth: Url,
    pub business: Url,
    pub shipment: Url,
    pub user: Url,
}

impl Endpoints {
    /// Route every family to the same base URL.
    #[must_use]
    pub fn uniform(base: &Url) -> Self {
        Self {
            auth: base.clone(),
            business: base.clone(),
            shipment: base.clone(),
            user: base.clone(),
        }
    }

    #[must_use]
    pub const fn base(&self, backend: Backend) -> &Url {
        match backend {
            Backend::Auth => &self.auth,
            Backend::Business => &self.business,
            Backend::Shipment => &self.shipment,
            Backend::User => &self.user,
        }
    }

    /// Absolute URL for `path` on `backend`.
    ///
    /// Any path prefix on the base URL is kept, so a gateway mounted at
    /// `https://host/shop` yields `https://host/shop/api/...`.
    ///
    /// # Errors
    ///
    /// Returns `url::ParseError` if the combined URL is invalid.
    pub fn url(&self, backend: Backend, path: &str) -> Result<Url, url::ParseError> {
        let base = self.base(backend).as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_url_keeps_base_prefix() {
        let endpoints = Endpoints::uniform(&Url::parse("https://shop.sportgear.co/gw/").unwrap());
        let url = endpoints.url(Backend::Business, "/api/v1/orders/7").unwrap();
        assert_eq!(url.as_str(), "https://shop.sportgear.co/gw/api/v1/orders/7");
    }

    #[test]
    fn test_each_backend_has_its_own_base() {
        let endpoints = Endpoints {
            auth: Url::parse("http://localhost:8080").unwrap(),
            business: Url::parse("http://localhost:8001").unwrap(),
            shipment: Url::parse("http://localhost:8002").unwrap(),
            user: Url::parse("http://localhost:8081").unwrap(),
        };
        assert_eq!(
            endpoints.url(Backend::Auth, "/api/auth/login").unwrap().as_str(),
            "http://localhost:8080/api/auth/login"
        );
        assert_eq!(
            endpoints.url(Backend::Shipment, "api/v1/shipments").unwrap().as_str(),
            "http://localhost:8002/api/v1/shipments"
        );
        assert_eq!(
            endpoints.url(Backend::User, "/api/users/stats").unwrap().port(),
            Some(8081)
        );
    }
}
