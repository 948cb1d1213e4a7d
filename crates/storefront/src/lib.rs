//! SportGear storefront client library.
//!
//! The state model behind the SportGear shop front-ends: the session store,
//! the gateway to the auth, business, shipment and user backends, per-view
//! resource caches, the cart and checkout, polling synchronization and
//! role-based authorization. [`state::Storefront`] ties them together.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod authz;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod resources;
pub mod session;
pub mod state;
pub mod sync;

pub use state::{Storefront, StorefrontError};
