//! Error types shared by the gateway and the resources, plus Sentry helpers.
//!
//! [`ApiError`] is what the transport layer produces. Resources turn it into
//! a [`ResourceError`], which carries the message a person should see. The
//! message follows one taxonomy everywhere:
//!
//! - transport or parse failure: a generic connection error
//! - 404: "<thing> not found"
//! - any other 4xx with a server-supplied message: that message verbatim
//! - any other 4xx without one: "Could not <action> <thing>."
//! - 5xx: a generic failure; the body is never shown

use thiserror::Error;

/// Message shown when no HTTP response was received or it could not be read.
pub const CONNECTION_ERROR: &str =
    "Connection error. Check your network connection and try again.";

/// Errors returned by the API gateway.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("API error: {status} - {}", message.as_deref().unwrap_or("no message"))]
    Api {
        status: u16,
        /// Message extracted from the error body, when it was JSON.
        message: Option<String>,
    },

    /// Success response whose body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// HTTP status, if the backend answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The backend answered 404.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.status(), Some(404))
    }

    /// The backend rejected the credentials (401).
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401))
    }

    /// Message the backend supplied in its error body.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Human-readable message for this error in the context of `op`.
    #[must_use]
    pub fn user_message(&self, op: Operation) -> String {
        match self {
            Self::Http(_) | Self::Parse(_) | Self::Url(_) => CONNECTION_ERROR.to_string(),
            Self::Api { status: 404, .. } => op.not_found(),
            Self::Api { status, .. } if *status >= 500 => op.server_failure(),
            Self::Api {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            Self::Api { .. } => op.failed(),
        }
    }
}

/// What a resource was doing when a request failed.
///
/// ```
/// use sportgear_storefront::error::Operation;
///
/// let op = Operation::new("cancel", "order");
/// assert_eq!(op.failed(), "Could not cancel order.");
/// assert_eq!(op.not_found(), "Order not found.");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    /// Verb, e.g. `load` or `update`.
    pub action: &'static str,
    /// Singular noun for the entity, e.g. `order`.
    pub subject: &'static str,
}

impl Operation {
    #[must_use]
    pub const fn new(action: &'static str, subject: &'static str) -> Self {
        Self { action, subject }
    }

    /// Generic client-side failure message.
    #[must_use]
    pub fn failed(self) -> String {
        format!("Could not {} {}.", self.action, self.subject)
    }

    /// Message for a 404.
    #[must_use]
    pub fn not_found(self) -> String {
        let mut chars = self.subject.chars();
        let subject = chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars).collect::<String>()
        });
        format!("{subject} not found.")
    }

    /// Message for a 5xx.
    #[must_use]
    pub fn server_failure(self) -> String {
        format!(
            "The server failed to {} {}. Please try again later.",
            self.action, self.subject
        )
    }
}

/// Failure surfaced by a resource operation.
///
/// Displays as the user-facing message; the underlying [`ApiError`] stays
/// available as the source.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ResourceError {
    message: String,
    #[source]
    source: ApiError,
}

impl ResourceError {
    #[must_use]
    pub fn new(source: ApiError, op: Operation) -> Self {
        Self {
            message: source.user_message(op),
            source,
        }
    }

    /// The user-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The transport-level error.
    #[must_use]
    pub const fn api_error(&self) -> &ApiError {
        &self.source
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        self.source.is_not_found()
    }

    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.source.is_unauthorized()
    }
}

/// Set the Sentry user context.
///
/// Called by the session store on login so errors are associated with the
/// signed-in account.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a user action.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
