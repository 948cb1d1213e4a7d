//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; a bare environment talks to the local
//! development backends.
//!
//! - `SPORTGEAR_ENV` - `development` (default) or `production`
//! - `SPORTGEAR_ORIGIN` - Public origin all backends sit behind (required in production)
//! - `SPORTGEAR_AUTH_API_URL` - Auth service override (default: `http://localhost:8080`)
//! - `SPORTGEAR_BUSINESS_API_URL` - Product/order/payment service override (default: `http://localhost:8001`)
//! - `SPORTGEAR_SHIPMENT_API_URL` - Shipment service override (default: the business default)
//! - `SPORTGEAR_USER_API_URL` - User management service override (default: `http://localhost:8081`)
//! - `SPORTGEAR_STATE_DIR` - Directory for the persisted session (default: `$HOME/.sportgear`)
//! - `SPORTGEAR_HTTP_TIMEOUT_SECS` - Transport timeout per request (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//!
//! # Base URL precedence
//!
//! For every backend family: explicit override, then the production
//! same-origin assumption, then the hardcoded local default.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::gateway::{Backend, Endpoints};

const DEFAULT_AUTH_URL: &str = "http://localhost:8080";
const DEFAULT_BUSINESS_URL: &str = "http://localhost:8001";
const DEFAULT_USER_URL: &str = "http://localhost:8081";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Where the client is deployed, which drives base URL resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deployment {
    /// Each backend family on its own local port.
    Development,
    /// Every backend routed through one public origin.
    Production {
        /// The shared origin, e.g. `https://shop.sportgear.co`.
        origin: Url,
    },
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Deployment mode
    pub deployment: Deployment,
    /// Resolved base URL per backend family
    pub endpoints: Endpoints,
    /// Directory holding the persisted session
    pub state_dir: PathBuf,
    /// Transport timeout applied to every request
    pub http_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid, or if
    /// production mode is selected without an origin.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`StorefrontConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let deployment = parse_deployment(&lookup)?;

        let endpoints = Endpoints {
            auth: resolve_base_url(
                "SPORTGEAR_AUTH_API_URL",
                lookup("SPORTGEAR_AUTH_API_URL").as_deref(),
                &deployment,
                DEFAULT_AUTH_URL,
            )?,
            business: resolve_base_url(
                "SPORTGEAR_BUSINESS_API_URL",
                lookup("SPORTGEAR_BUSINESS_API_URL").as_deref(),
                &deployment,
                DEFAULT_BUSINESS_URL,
            )?,
            shipment: resolve_base_url(
                "SPORTGEAR_SHIPMENT_API_URL",
                lookup("SPORTGEAR_SHIPMENT_API_URL").as_deref(),
                &deployment,
                DEFAULT_BUSINESS_URL,
            )?,
            user: resolve_base_url(
                "SPORTGEAR_USER_API_URL",
                lookup("SPORTGEAR_USER_API_URL").as_deref(),
                &deployment,
                DEFAULT_USER_URL,
            )?,
        };

        let state_dir = lookup("SPORTGEAR_STATE_DIR").map_or_else(
            || {
                lookup("HOME")
                    .map_or_else(|| PathBuf::from("."), PathBuf::from)
                    .join(".sportgear")
            },
            PathBuf::from,
        );

        let http_timeout = lookup("SPORTGEAR_HTTP_TIMEOUT_SECS")
            .map(|raw| {
                raw.parse::<u64>().map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "SPORTGEAR_HTTP_TIMEOUT_SECS".to_string(),
                        e.to_string(),
                    )
                })
            })
            .transpose()?
            .map_or(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS), Duration::from_secs);

        Ok(Self {
            deployment,
            endpoints,
            state_dir,
            http_timeout,
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
        })
    }

    /// Configuration pointing every backend family at one base URL.
    ///
    /// Used by tests and by tooling that talks to a single gateway.
    #[must_use]
    pub fn single_origin(origin: Url, state_dir: PathBuf) -> Self {
        Self {
            deployment: Deployment::Production {
                origin: origin.clone(),
            },
            endpoints: Endpoints::uniform(&origin),
            state_dir,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            sentry_dsn: None,
        }
    }

    /// Base URL for a backend family.
    #[must_use]
    pub const fn base_url(&self, backend: Backend) -> &Url {
        self.endpoints.base(backend)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_deployment(lookup: &impl Fn(&str) -> Option<String>) -> Result<Deployment, ConfigError> {
    let mode = lookup("SPORTGEAR_ENV").unwrap_or_else(|| "development".to_string());
    match mode.trim().to_ascii_lowercase().as_str() {
        "development" | "dev" | "" => Ok(Deployment::Development),
        "production" | "prod" => {
            let raw = lookup("SPORTGEAR_ORIGIN")
                .ok_or_else(|| ConfigError::MissingEnvVar("SPORTGEAR_ORIGIN".to_string()))?;
            let origin = parse_url("SPORTGEAR_ORIGIN", &raw)?;
            Ok(Deployment::Production { origin })
        }
        other => Err(ConfigError::InvalidEnvVar(
            "SPORTGEAR_ENV".to_string(),
            format!("expected development or production, got '{other}'"),
        )),
    }
}

/// Resolve one backend's base URL.
///
/// Precedence: explicit override > production same-origin > local default.
fn resolve_base_url(
    var: &str,
    override_url: Option<&str>,
    deployment: &Deployment,
    local_default: &str,
) -> Result<Url, ConfigError> {
    if let Some(raw) = override_url.filter(|s| !s.trim().is_empty()) {
        return parse_url(var, raw);
    }
    match deployment {
        Deployment::Production { origin } => Ok(origin.clone()),
        Deployment::Development => parse_url(var, local_default),
    }
}

fn parse_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(var.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_development_uses_local_defaults() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.deployment, Deployment::Development);
        assert_eq!(config.endpoints.auth.as_str(), "http://localhost:8080/");
        assert_eq!(config.endpoints.business.as_str(), "http://localhost:8001/");
        assert_eq!(config.endpoints.shipment.as_str(), "http://localhost:8001/");
        assert_eq!(config.endpoints.user.as_str(), "http://localhost:8081/");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_production_assumes_same_origin() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[
            ("SPORTGEAR_ENV", "production"),
            ("SPORTGEAR_ORIGIN", "https://shop.sportgear.co"),
        ]))
        .unwrap();
        for backend in Backend::ALL {
            assert_eq!(config.base_url(backend).as_str(), "https://shop.sportgear.co/");
        }
    }

    #[test]
    fn test_explicit_override_beats_production_origin() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[
            ("SPORTGEAR_ENV", "production"),
            ("SPORTGEAR_ORIGIN", "https://shop.sportgear.co"),
            ("SPORTGEAR_USER_API_URL", "https://users.sportgear.co"),
        ]))
        .unwrap();
        assert_eq!(config.endpoints.user.as_str(), "https://users.sportgear.co/");
        assert_eq!(config.endpoints.auth.as_str(), "https://shop.sportgear.co/");
    }

    #[test]
    fn test_production_without_origin_is_an_error() {
        let err = StorefrontConfig::from_lookup(lookup_from(&[("SPORTGEAR_ENV", "production")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(var) if var == "SPORTGEAR_ORIGIN"));
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let err = StorefrontConfig::from_lookup(lookup_from(&[(
            "SPORTGEAR_AUTH_API_URL",
            "ftp://auth.internal",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(var, _) if var == "SPORTGEAR_AUTH_API_URL"));
    }

    #[test]
    fn test_state_dir_defaults_under_home() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[("HOME", "/home/ana")])).unwrap();
        assert_eq!(config.state_dir, PathBuf::from("/home/ana/.sportgear"));
    }

    #[test]
    fn test_invalid_timeout() {
        let err = StorefrontConfig::from_lookup(lookup_from(&[(
            "SPORTGEAR_HTTP_TIMEOUT_SECS",
            "soon",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }
}
