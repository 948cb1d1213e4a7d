//! Subcommand implementations.

pub mod account;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod shipments;
pub mod users;

use sportgear_core::EmailError;
use sportgear_storefront::authz::{Action, UnknownRoute};
use sportgear_storefront::checkout::CheckoutError;
use sportgear_storefront::config::ConfigError;
use sportgear_storefront::error::ResourceError;
use sportgear_storefront::session::{Session, SessionError};
use sportgear_storefront::{Storefront, StorefrontError};
use thiserror::Error;

/// Errors surfaced to the terminal.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storefront(#[from] StorefrontError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error(transparent)]
    Route(#[from] UnknownRoute),

    #[error("Invalid item `{0}`: expected ID or ID:QUANTITY")]
    InvalidItem(String),

    #[error("Nothing to update: pass at least one field to change.")]
    NothingToUpdate,

    #[error("Please sign in first.")]
    NotSignedIn,

    #[error("Access denied: your role may not {0}.")]
    Forbidden(&'static str),

    #[error("Could not wait for Ctrl-C: {0}")]
    Signal(#[from] std::io::Error),
}

/// The current session, or `NotSignedIn`.
pub(crate) fn signed_in(shop: &Storefront) -> Result<&Session, AppError> {
    shop.session().current().ok_or(AppError::NotSignedIn)
}

/// Fail unless the signed-in user may perform `action`.
pub(crate) fn require(shop: &Storefront, action: Action, what: &'static str) -> Result<(), AppError> {
    signed_in(shop)?;
    if shop.can(action) {
        Ok(())
    } else {
        Err(AppError::Forbidden(what))
    }
}
